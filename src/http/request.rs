use std::collections::HashMap;

use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri};

/// Inbound request with its body decoded into `T`.
///
/// `body` is a fresh value owned by this request; it stays `T::default()` when
/// the method carries no body or `T` is [`NoBody`](crate::NoBody).
#[derive(Debug)]
pub struct Request<T> {
    parts: Parts,
    params: HashMap<String, String>,
    /// Decoded request body.
    pub body: T,
}

impl<T> Request<T> {
    pub(crate) fn new(parts: Parts, params: HashMap<String, String>, body: T) -> Self {
        Self {
            parts,
            params,
            body,
        }
    }

    /// Value of a path parameter, e.g. `name` for a route `/services/{name}`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Request extensions (set by middleware).
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Consumes the request, returning the decoded body.
    pub fn into_body(self) -> T {
        self.body
    }
}
