use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Capability trait for request and response payloads.
///
/// Both methods have defaults, so most types only need an empty impl:
/// ```rust
/// use serde::Serialize;
/// use svcvisor::Payload;
///
/// #[derive(Serialize)]
/// struct ListServices { services: Vec<String> }
///
/// impl Payload for ListServices {}
/// ```
///
/// A body that knows its own HTTP status reports it through
/// [`Payload::status_code`]; that status wins over any other.
pub trait Payload: Send + Sync + 'static {
    /// Set only by the [`NoBody`] marker: nothing is read from or written to the wire.
    const NO_BODY: bool = false;

    /// Status this value wants to be sent with, if any.
    fn status_code(&self) -> Option<StatusCode> {
        None
    }
}

/// Marker payload for handlers that take or return no body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoBody;

impl Payload for NoBody {
    const NO_BODY: bool = true;
}

impl Payload for serde_json::Value {}

impl Payload for String {}

impl<T: Send + Sync + 'static> Payload for Vec<T> {}
