//! # Wire encodings.
//!
//! An [`Encoding`] turns values into bytes and back and names the content type it
//! produces. The HTTP dispatch layer uses it for every request and response body,
//! so one [`App`](crate::App) speaks exactly one encoding for its whole route tree.
//!
//! ## Contents
//! - [`Encoding`] the strategy trait
//! - [`Json`] JavaScript Object Notation via `serde_json`

mod json;

pub use json::Json;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::EncodingError;

/// Pluggable marshal/unmarshal strategy with a content-type identity.
///
/// Implementations are stateless and shared; both directions are pure.
/// For any serializable `v`, `decode(&encode(&v)?)` must yield a value equal to `v`.
pub trait Encoding: Clone + Send + Sync + 'static {
    /// MIME-compatible name of the encoding.
    fn content_type(&self) -> &'static str;

    /// Marshals `value` into bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, EncodingError>;

    /// Unmarshals `bytes` into a fresh `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, EncodingError>;
}
