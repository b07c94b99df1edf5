//! # svcvisor
//!
//! **Svcvisor** is a small service runtime for Rust.
//!
//! It supervises a fixed set of long-running tasks to completion or failure and
//! dispatches typed HTTP requests to handlers through one encode/decode and
//! error-handling pipeline. A concrete service registers a handful of tasks and
//! routes; everything else lives here.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  main()
//!    └─► Service::run(config, setup)
//!          ├─ load_config ─► Logs::try_init
//!          ├─ setup(&mut ServiceRunner, cfg)
//!          │     ├─ tasks.add(HttpServer::from_app(app))
//!          │     ├─ tasks.add(TaskFn::arc("consumer", ..))
//!          │     └─ tasks.add(..)
//!          └─ Runner::run(shutdown)
//!
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  HttpServer  │   │    TaskFn    │   │  user Task   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner                                                           │
//! │  - one tokio task per Task, joined with wait-for-all              │
//! │  - Hooks: on_starting / on_stopped / on_failed                    │
//! │  - FailurePolicy: Continue | CancelSiblings                       │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Request dispatch
//! ```text
//! HttpServer ──► axum Router ──► App handler for (method, path)
//!
//!   ├─► REQ::default()
//!   ├─► GET/HEAD or NoBody?  skip decode
//!   │   otherwise            Encoding::decode(body) ──► DispatchError::Decode
//!   ├─► handler(Request<REQ>) ──► Result<Response<RES>, E>
//!   ├─► status = body.status_code() ▸ response.status ▸ 200
//!   └─► 204 / NoBody?        no body
//!       otherwise            Encoding::encode(body)
//!
//! on error: error handler(DispatchError) ──► body at 500 (or its own status)
//!           no handler                   ──► 500 "An unexpected error occurred."
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Named, cancellable units of long-running work.                | [`Task`], [`TaskFn`], [`TaskRef`]           |
//! | **Runner**        | Runs tasks concurrently, reports lifecycle, joins them all.   | [`Runner`], [`Hooks`], [`RunReport`]        |
//! | **Policies**      | Sibling handling after a failure.                             | [`FailurePolicy`]                           |
//! | **Encoding**      | Pluggable wire format with a content type.                    | [`Encoding`], [`Json`]                      |
//! | **HTTP**          | Typed route dispatch and a server task.                       | [`App`], [`Request`], [`Response`], [`HttpServer`] |
//! | **Service**       | Config loading, logging, exit codes.                          | [`Service`], [`ServiceConfig`], [`Logs`]    |
//! | **Errors**        | Typed errors per concern.                                     | [`TaskError`], [`DispatchError`], [`ServiceError`] |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use svcvisor::{Hooks, Runner, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut runner = Runner::new().with_hooks(Hooks::logging());
//!
//!     runner.add(TaskFn::arc("ticker", |ctx: CancellationToken| async move {
//!         loop {
//!             tokio::select! {
//!                 _ = ctx.cancelled() => return Err(TaskError::Canceled),
//!                 _ = tokio::time::sleep(Duration::from_millis(10)) => {}
//!             }
//!         }
//!     }));
//!     runner.add(TaskFn::arc("once", |_ctx: CancellationToken| async {
//!         Ok::<_, TaskError>(())
//!     }));
//!
//!     let token = CancellationToken::new();
//!     let stop = token.clone();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         stop.cancel();
//!     });
//!
//!     let report = runner.run(token).await;
//!     assert!(report.is_success());
//!     assert_eq!(report.stopped().len(), 2);
//! }
//! ```

mod core;
mod encoding;
mod error;
mod http;
mod policies;
mod service;
mod tasks;

// ---- Public re-exports ----

pub use core::{FailedTask, Hooks, RunReport, Runner, RunnerConfig};
pub use encoding::{Encoding, Json};
pub use error::{BoxError, ConfigError, DispatchError, EncodingError, ServiceError, TaskError};
pub use http::{App, Handler, NoBody, Payload, Request, Response};
pub use policies::FailurePolicy;
pub use service::{
    Args, LogFormat, Logs, Service, ServiceConfig, ServiceRunner, ValidationError, build,
    load_config,
};
pub use tasks::{HttpServer, Task, TaskFn, TaskRef, TaskStatus};
