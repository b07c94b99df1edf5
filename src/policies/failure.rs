//! # Failure policy for the task runner.
//!
//! [`FailurePolicy`] decides whether one task's failure stops its siblings.
//!
//! ```text
//! task A fails ──► on_failed(A)
//!                    ├─ Continue       → B, C keep running
//!                    └─ CancelSiblings → runner token cancelled → B, C observe ctx
//! ```
//!
//! Graceful cancellation (`TaskError::Canceled`) never counts as a failure.
//! `TaskError::Fatal` cancels siblings under either policy.

use serde::Deserialize;

/// Policy controlling sibling tasks after a task failure.
///
/// Deserializes from `continue` / `cancel_siblings`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Report the failure and leave siblings running (default).
    #[default]
    Continue,
    /// Report the failure and cancel every sibling through the runner's token.
    ///
    /// Only the runner's own child token is cancelled; the caller's token is untouched.
    CancelSiblings,
}

impl FailurePolicy {
    /// True when a failure must cancel the remaining tasks.
    pub fn cancels_siblings(self) -> bool {
        matches!(self, FailurePolicy::CancelSiblings)
    }
}
