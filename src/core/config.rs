//! # Task runner configuration.
//!
//! [`RunnerConfig`] is deserializable so a service can expose it in its own
//! configuration file:
//! ```yaml
//! runner:
//!   failure: cancel_siblings
//! ```

use serde::Deserialize;

use crate::policies::FailurePolicy;

/// Settings for a [`Runner`](crate::Runner).
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// What happens to siblings when one task fails.
    pub failure: FailurePolicy,
}

impl RunnerConfig {
    /// Config that cancels all tasks on the first failure.
    pub fn cancel_on_failure() -> Self {
        Self {
            failure: FailurePolicy::CancelSiblings,
        }
    }
}
