//! # App: typed route dispatch scope.
//!
//! [`App`] wraps an axum [`Router`] and carries the cross-cutting configuration
//! every handler in its sub-tree shares: the [`Encoding`], an optional error
//! handler, a logger span and the request body limit.
//!
//! ```text
//! App::new(Json, span)
//!   .with_error_handler(to_wire_error)
//!   ├─ get("/services", list)
//!   └─ route("/services/{name}", |svc| {      child scope: same encoding,
//!         svc.post("/start", start);            error handler, logger
//!         svc.post("/stop", stop);
//!      })
//! ```

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path};
use axum::response::IntoResponse;
use axum::routing::{MethodFilter, Route, on};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::{Layer, Service};
use tracing::Span;

use crate::encoding::{Encoding, Json};
use crate::error::{BoxError, DispatchError};
use crate::http::{Payload, Request, Response};

/// Default limit for request bodies read by typed handlers (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

type AxumResponse = axum::response::Response;
type ErrorWriter<E> = Arc<dyn Fn(&Scope<E>, &DispatchError) -> AxumResponse + Send + Sync>;
type Fallback = Arc<dyn Fn() -> AxumResponse + Send + Sync>;

/// Typed request handler.
///
/// Implemented for every `Fn(Request<REQ>) -> impl Future<Output = Result<Response<RES>, E>>`,
/// so plain `async fn`s register directly:
/// ```rust
/// use svcvisor::{BoxError, NoBody, Request, Response};
///
/// async fn health(_req: Request<NoBody>) -> Result<Response<String>, BoxError> {
///     Ok(Response::ok("ok".to_string()))
/// }
/// ```
pub trait Handler<REQ, RES>: Clone + Send + Sync + 'static {
    /// Error returned by the handler.
    type Error: Into<BoxError>;
    /// Future returned by [`Handler::call`].
    type Future: Future<Output = Result<Response<RES>, Self::Error>> + Send + 'static;

    /// Invokes the handler.
    fn call(&self, req: Request<REQ>) -> Self::Future;
}

impl<REQ, RES, F, Fut, Err> Handler<REQ, RES> for F
where
    F: Fn(Request<REQ>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<RES>, Err>> + Send + 'static,
    Err: Into<BoxError>,
{
    type Error = Err;
    type Future = Fut;

    fn call(&self, req: Request<REQ>) -> Self::Future {
        self(req)
    }
}

/// Configuration shared by an app and all its child scopes.
struct Scope<E: Encoding> {
    encoding: E,
    error_handler: Option<ErrorWriter<E>>,
    logger: Span,
    body_limit: usize,
}

impl<E: Encoding> Clone for Scope<E> {
    fn clone(&self) -> Self {
        Self {
            encoding: self.encoding.clone(),
            error_handler: self.error_handler.clone(),
            logger: self.logger.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<E: Encoding> Scope<E> {
    /// Reads and decodes the request body, unless the method or `REQ` opts out.
    async fn read_body<REQ>(&self, method: &Method, body: Body) -> Result<REQ, DispatchError>
    where
        REQ: Payload + DeserializeOwned + Default,
    {
        if *method == Method::GET || *method == Method::HEAD || REQ::NO_BODY {
            return Ok(REQ::default());
        }

        let bytes = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| DispatchError::Body(e.to_string()))?;
        self.encoding.decode(&bytes).map_err(DispatchError::Decode)
    }

    /// Resolves the status and writes `body` through the encoding.
    fn write_response<B>(
        &self,
        fallback: StatusCode,
        status: Option<StatusCode>,
        headers: HeaderMap,
        body: Option<&B>,
    ) -> AxumResponse
    where
        B: Payload + Serialize,
    {
        let status = body
            .and_then(Payload::status_code)
            .or(status)
            .unwrap_or(fallback);

        let mut res = AxumResponse::new(Body::empty());
        *res.status_mut() = status;
        res.headers_mut().extend(headers);

        let body = match body {
            Some(body) if status != StatusCode::NO_CONTENT && !B::NO_BODY => body,
            _ => return res,
        };

        match self.encoding.encode(body) {
            Ok(bytes) => {
                let content_type = format!("{}; charset=utf-8", self.encoding.content_type());
                if let Ok(value) = HeaderValue::from_str(&content_type) {
                    res.headers_mut().insert(CONTENT_TYPE, value);
                }
                *res.body_mut() = Body::from(bytes);
            }
            Err(err) => {
                // Status is already decided; the client gets it without a body.
                self.logger.in_scope(|| {
                    tracing::error!(error = %err, status = status.as_u16(), "error marshaling response body")
                });
            }
        }
        res
    }

    /// Translates a dispatch failure into a response.
    fn write_error(&self, err: DispatchError) -> AxumResponse {
        match &self.error_handler {
            Some(handler) => handler(self, &err),
            None => {
                self.logger.in_scope(|| {
                    tracing::error!(error = %err, label = err.as_label(), "an unexpected error occurred")
                });
                (StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR).into_response()
            }
        }
    }
}

/// Typed dispatch scope over a route sub-tree.
///
/// The encoding is fixed for the lifetime of the app and all its child scopes.
pub struct App<E: Encoding = Json> {
    scope: Arc<Scope<E>>,
    router: Router,
    not_found: Option<Fallback>,
    method_not_allowed: Option<Fallback>,
}

impl App<Json> {
    /// App speaking JSON.
    pub fn json(logger: Span) -> Self {
        Self::new(Json, logger)
    }
}

impl<E: Encoding> App<E> {
    /// Creates an app on a fresh router.
    pub fn new(encoding: E, logger: Span) -> Self {
        Self::from_router(encoding, logger, Router::new())
    }

    /// Creates an app on an existing router.
    pub fn from_router(encoding: E, logger: Span, router: Router) -> Self {
        Self {
            scope: Arc::new(Scope {
                encoding,
                error_handler: None,
                logger,
                body_limit: DEFAULT_BODY_LIMIT,
            }),
            router,
            not_found: None,
            method_not_allowed: None,
        }
    }

    /// Sets the error handler that turns dispatch failures into a wire body.
    ///
    /// The body is written with `500` unless it reports its own status. Child
    /// scopes created afterwards with [`App::route`] inherit it; routes registered
    /// before this call keep the previous handler.
    pub fn with_error_handler<B, F>(mut self, f: F) -> Self
    where
        B: Payload + Serialize,
        F: Fn(&DispatchError) -> B + Send + Sync + 'static,
    {
        let writer: ErrorWriter<E> = Arc::new(move |scope: &Scope<E>, err: &DispatchError| {
            let body = f(err);
            scope.write_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                HeaderMap::new(),
                Some(&body),
            )
        });
        Arc::make_mut(&mut self.scope).error_handler = Some(writer);
        self
    }

    /// Sets the maximum request body size for typed handlers.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        Arc::make_mut(&mut self.scope).body_limit = limit;
        self
    }

    /// Encoding of this app.
    pub fn encoding(&self) -> &E {
        &self.scope.encoding
    }

    /// Logger span of this app.
    pub fn logger(&self) -> &Span {
        &self.scope.logger
    }

    /// Registers a `GET` handler.
    pub fn get<REQ, RES, H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        REQ: Payload + DeserializeOwned + Default,
        RES: Payload + Serialize,
        H: Handler<REQ, RES>,
    {
        self.on(MethodFilter::GET, path, handler)
    }

    /// Registers a `POST` handler.
    pub fn post<REQ, RES, H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        REQ: Payload + DeserializeOwned + Default,
        RES: Payload + Serialize,
        H: Handler<REQ, RES>,
    {
        self.on(MethodFilter::POST, path, handler)
    }

    /// Registers a `PUT` handler.
    pub fn put<REQ, RES, H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        REQ: Payload + DeserializeOwned + Default,
        RES: Payload + Serialize,
        H: Handler<REQ, RES>,
    {
        self.on(MethodFilter::PUT, path, handler)
    }

    /// Registers a `PATCH` handler.
    pub fn patch<REQ, RES, H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        REQ: Payload + DeserializeOwned + Default,
        RES: Payload + Serialize,
        H: Handler<REQ, RES>,
    {
        self.on(MethodFilter::PATCH, path, handler)
    }

    /// Registers a `DELETE` handler.
    pub fn delete<REQ, RES, H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        REQ: Payload + DeserializeOwned + Default,
        RES: Payload + Serialize,
        H: Handler<REQ, RES>,
    {
        self.on(MethodFilter::DELETE, path, handler)
    }

    /// Creates a child scope under `prefix` sharing this app's configuration.
    pub fn route(&mut self, prefix: &str, setup: impl FnOnce(&mut App<E>)) -> &mut Self {
        let mut child = App {
            scope: Arc::clone(&self.scope),
            router: Router::new(),
            not_found: None,
            method_not_allowed: None,
        };
        setup(&mut child);

        let child = child.into_router();
        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = match prefix.trim_end_matches('/') {
            "" => router.merge(child),
            prefix => router.nest(prefix, child),
        };
        self
    }

    /// Mounts plain axum routes (static assets, probes) next to the typed ones.
    pub fn merge(&mut self, other: Router) -> &mut Self {
        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.merge(other);
        self
    }

    /// Wraps the routes registered so far in a tower middleware.
    pub fn layer<L>(&mut self, layer: L) -> &mut Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<axum::extract::Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<axum::extract::Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<axum::extract::Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<axum::extract::Request>>::Future: Send + 'static,
    {
        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.layer(layer);
        self
    }

    /// Body written with `404` for paths that match no route.
    pub fn not_found<B>(&mut self, body: B) -> &mut Self
    where
        B: Payload + Serialize,
    {
        self.not_found = Some(self.fixed(StatusCode::NOT_FOUND, body));
        self
    }

    /// Body written with `405` for known paths requested with an unhandled method.
    pub fn method_not_allowed<B>(&mut self, body: B) -> &mut Self
    where
        B: Payload + Serialize,
    {
        self.method_not_allowed = Some(self.fixed(StatusCode::METHOD_NOT_ALLOWED, body));
        self
    }

    /// Finishes the app, returning the router to serve.
    pub fn into_router(self) -> Router {
        let mut router = self.router;
        if let Some(f) = self.method_not_allowed {
            router = router.method_not_allowed_fallback(move || {
                let f = Arc::clone(&f);
                async move { f() }
            });
        }
        if let Some(f) = self.not_found {
            router = router.fallback(move || {
                let f = Arc::clone(&f);
                async move { f() }
            });
        }
        router
    }

    fn fixed<B>(&self, status: StatusCode, body: B) -> Fallback
    where
        B: Payload + Serialize,
    {
        let scope = Arc::clone(&self.scope);
        Arc::new(move || scope.write_response(status, None, HeaderMap::new(), Some(&body)))
    }

    fn on<REQ, RES, H>(&mut self, filter: MethodFilter, path: &str, handler: H) -> &mut Self
    where
        REQ: Payload + DeserializeOwned + Default,
        RES: Payload + Serialize,
        H: Handler<REQ, RES>,
    {
        let scope = Arc::clone(&self.scope);
        let route = on(filter, move |request: axum::extract::Request| {
            let scope = Arc::clone(&scope);
            let handler = handler.clone();
            async move { dispatch(scope, handler, request).await }
        });

        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.route(path, route);
        self
    }
}

/// decode → invoke → encode for one request.
async fn dispatch<E, REQ, RES, H>(
    scope: Arc<Scope<E>>,
    handler: H,
    request: axum::extract::Request,
) -> AxumResponse
where
    E: Encoding,
    REQ: Payload + DeserializeOwned + Default,
    RES: Payload + Serialize,
    H: Handler<REQ, RES>,
{
    let (mut parts, body) = request.into_parts();
    let params = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, &()).await {
        Ok(Path(params)) => params,
        Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
        Err(rejection) => return scope.write_error(DispatchError::Params(rejection.body_text())),
    };

    let body = match scope.read_body::<REQ>(&parts.method, body).await {
        Ok(body) => body,
        Err(err) => return scope.write_error(err),
    };

    match handler.call(Request::new(parts, params, body)).await {
        Ok(res) => scope.write_response(StatusCode::OK, res.status, res.headers, res.body.as_ref()),
        Err(err) => scope.write_error(DispatchError::Handler(err.into())),
    }
}
