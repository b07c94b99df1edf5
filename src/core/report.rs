use crate::error::TaskError;

/// A task that terminated with an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedTask {
    /// Task name.
    pub name: String,
    /// Stable label of the error (see [`TaskError::as_label`]).
    pub label: &'static str,
    /// Rendered error message.
    pub error: String,
}

/// Aggregate outcome of [`Runner::run`](crate::Runner::run).
///
/// Every task appears exactly once, in `stopped` or in `failed`.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    stopped: Vec<String>,
    failed: Vec<FailedTask>,
}

impl RunReport {
    pub(crate) fn record_stopped(&mut self, name: String) {
        self.stopped.push(name);
    }

    pub(crate) fn record_failed(&mut self, name: String, err: &TaskError) {
        self.failed.push(FailedTask {
            name,
            label: err.as_label(),
            error: err.to_string(),
        });
    }

    /// Names of tasks that finished normally or were cancelled.
    pub fn stopped(&self) -> &[String] {
        &self.stopped
    }

    /// Tasks that terminated with an error.
    pub fn failed(&self) -> &[FailedTask] {
        &self.failed
    }

    /// Number of terminated tasks.
    pub fn total(&self) -> usize {
        self.stopped.len() + self.failed.len()
    }

    /// True when no task failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
