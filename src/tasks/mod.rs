//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async cancelable tasks
//! - [`TaskFn`] - function-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskStatus`] - snapshot handed to runner lifecycle callbacks
//! - [`HttpServer`] - task serving an HTTP router until cancellation

mod http;
mod status;
mod task;
mod task_fn;

pub use http::HttpServer;
pub use status::TaskStatus;
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
