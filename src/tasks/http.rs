//! # HTTP server task.
//!
//! Adapts a blocking serve loop into the [`Task`] contract:
//! ```text
//! run(ctx)
//!   ├─► bind listener            (error → TaskError::Fail "listen: ...")
//!   ├─► serve(router)
//!   │     └─ graceful shutdown armed on ctx.cancelled()
//!   └─► serve returns
//!         ├─ ctx cancelled → Err(TaskError::Canceled)
//!         ├─ serve error   → Err(TaskError::Fail "serve: ...")
//!         └─ otherwise     → Ok(())
//! ```

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::http::App;
use crate::encoding::Encoding;
use crate::tasks::task::Task;

/// Task that serves an axum [`Router`] on a TCP address until cancelled.
pub struct HttpServer {
    name: String,
    addr: String,
    router: Router,
}

impl HttpServer {
    /// Creates a server task listening on `addr` (`host:port`).
    ///
    /// The task name is `HTTPServer(<name>,<addr>)`.
    pub fn new(name: &str, addr: impl Into<String>, router: Router) -> Self {
        let addr = addr.into();
        Self {
            name: format!("HTTPServer({name},{addr})"),
            addr,
            router,
        }
    }

    /// Creates a server task from an assembled [`App`].
    pub fn from_app<E: Encoding>(name: &str, addr: impl Into<String>, app: App<E>) -> Self {
        Self::new(name, addr, app.into_router())
    }

    /// Address this task binds to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Binds the listener and serves until `ctx` fires.
    ///
    /// `on_bound` receives the local address once listening; useful when binding port 0.
    pub async fn serve_with(
        &self,
        ctx: CancellationToken,
        on_bound: impl FnOnce(SocketAddr),
    ) -> Result<(), TaskError> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|e| TaskError::fail(format!("listen: {e}")))?;
        if let Ok(local) = listener.local_addr() {
            tracing::debug!(task = %self.name, addr = %local, "http server listening");
            on_bound(local);
        }

        let shutdown = ctx.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| TaskError::fail(format!("serve: {e}")))?;

        if ctx.is_cancelled() {
            return Err(TaskError::Canceled);
        }
        Ok(())
    }
}

#[async_trait]
impl Task for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        self.serve_with(ctx, |_| {}).await
    }
}
