//! Runtime core: task supervision and lifecycle.
//!
//! Internal modules:
//! - [`runner`]: starts every task on its own tokio task and joins them all;
//! - [`hooks`]: lifecycle callback slots;
//! - [`report`]: aggregate outcome of a run;
//! - [`config`]: runner settings;
//! - [`shutdown`]: cross-platform OS shutdown signal handling.

mod config;
mod hooks;
mod report;
mod runner;
pub(crate) mod shutdown;

pub use config::RunnerConfig;
pub use hooks::Hooks;
pub use report::{FailedTask, RunReport};
pub use runner::Runner;
