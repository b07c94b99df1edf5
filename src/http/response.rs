use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

/// Outbound response produced by a typed handler.
///
/// - `status`: overrides the default `200 OK` (a body's own
///   [`Payload::status_code`](crate::Payload::status_code) still wins);
/// - `headers`: merged into the response headers;
/// - `body`: encoded with the app's encoding when present. `None` writes the
///   status line and headers only, with no `Content-Type`; it is never encoded
///   as a `null` value.
#[derive(Debug)]
pub struct Response<T> {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Option<T>,
}

impl<T> Default for Response<T> {
    fn default() -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl<T> Response<T> {
    /// Response carrying `body` with the default status.
    pub fn ok(body: T) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// `204 No Content`.
    pub fn no_content() -> Self {
        Self::default().with_status(StatusCode::NO_CONTENT)
    }

    /// Overrides the status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Appends a header to the response.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}
