use serde::{Serialize, de::DeserializeOwned};

use super::Encoding;
use crate::error::EncodingError;

/// JavaScript Object Notation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

impl Encoding for Json {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, EncodingError> {
        serde_json::to_vec(value).map_err(|e| EncodingError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, EncodingError> {
        serde_json::from_slice(bytes).map_err(|e| EncodingError::Decode(e.to_string()))
    }
}
