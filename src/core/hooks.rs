//! # Lifecycle callbacks.
//!
//! [`Hooks`] holds the three optional callback slots a [`Runner`](crate::Runner)
//! reports through:
//! ```text
//! on_starting(status)          before the task runs
//! on_stopped(status)           task returned Ok or was cancelled
//! on_failed(status, error)     task returned any other error (or panicked)
//! ```
//!
//! A task that returns [`TaskError::Canceled`](crate::TaskError::Canceled) is
//! reported through `on_stopped`, not `on_failed`: cancellation is the requested
//! shutdown path, even though the task returned an error value.
//!
//! Callbacks are invoked from the execution unit running the task, so several
//! may run at once. They must be `Fn + Send + Sync`: any shared state they touch
//! needs its own synchronization.

use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::TaskStatus;

type StatusFn = Arc<dyn Fn(&TaskStatus) + Send + Sync>;
type FailureFn = Arc<dyn Fn(&TaskStatus, &TaskError) + Send + Sync>;

/// Optional lifecycle callbacks for a runner.
#[derive(Clone, Default)]
pub struct Hooks {
    on_starting: Option<StatusFn>,
    on_stopped: Option<StatusFn>,
    on_failed: Option<FailureFn>,
}

impl Hooks {
    /// Hooks with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks that write every lifecycle transition to `tracing`.
    ///
    /// ```text
    /// INFO  task starting...  task="HTTPServer(api,0.0.0.0:8080)"
    /// INFO  task stopped      task="HTTPServer(api,0.0.0.0:8080)"
    /// ERROR task failed       task="consumer" error="execution failed: ..."
    /// ```
    pub fn logging() -> Self {
        Self::new()
            .on_starting(|st| tracing::info!(task = %st.name, "task starting..."))
            .on_stopped(|st| tracing::info!(task = %st.name, "task stopped"))
            .on_failed(|st, err| {
                tracing::error!(task = %st.name, error = %err, label = err.as_label(), "task failed")
            })
    }

    /// Sets the callback invoked before each task starts.
    pub fn on_starting(mut self, f: impl Fn(&TaskStatus) + Send + Sync + 'static) -> Self {
        self.on_starting = Some(Arc::new(f));
        self
    }

    /// Sets the callback invoked after a task stops gracefully.
    pub fn on_stopped(mut self, f: impl Fn(&TaskStatus) + Send + Sync + 'static) -> Self {
        self.on_stopped = Some(Arc::new(f));
        self
    }

    /// Sets the callback invoked after a task fails.
    pub fn on_failed(
        mut self,
        f: impl Fn(&TaskStatus, &TaskError) + Send + Sync + 'static,
    ) -> Self {
        self.on_failed = Some(Arc::new(f));
        self
    }

    pub(crate) fn starting(&self, status: &TaskStatus) {
        if let Some(f) = &self.on_starting {
            f(status);
        }
    }

    pub(crate) fn stopped(&self, status: &TaskStatus) {
        if let Some(f) = &self.on_stopped {
            f(status);
        }
    }

    pub(crate) fn failed(&self, status: &TaskStatus, err: &TaskError) {
        if let Some(f) = &self.on_failed {
            f(status, err);
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_starting", &self.on_starting.is_some())
            .field("on_stopped", &self.on_stopped.is_some())
            .field("on_failed", &self.on_failed.is_some())
            .finish()
    }
}
