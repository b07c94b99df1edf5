//! # Task abstraction.
//!
//! A [`Task`] is a named, cancelable unit of long-running work with exactly one
//! outcome. The common handle type is [`TaskRef`], an `Arc<dyn Task>` suitable for
//! sharing across the runtime.
//!
//! A task receives a [`CancellationToken`] and must observe it within bounded time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Shared handle to a task object.
///
/// This is the type the [`Runner`](crate::Runner) stores.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit.
///
/// A `Task` has a stable [`name`](Task::name) and an async [`run`](Task::run) method
/// that receives a [`CancellationToken`].
///
/// `run` resolves when:
/// - the work finished normally → `Ok(())`;
/// - the token fired → `Err(TaskError::Canceled)`;
/// - an unrecoverable condition occurred → any other [`TaskError`].
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use svcvisor::{Task, TaskError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Task for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         loop {
///             tokio::select! {
///                 _ = ctx.cancelled() => return Err(TaskError::Canceled),
///                 _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name (used for logging and keying).
    fn name(&self) -> &str;

    /// Executes the task until completion, failure or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
