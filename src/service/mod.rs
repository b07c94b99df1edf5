//! # Process-level plumbing for service binaries.
//!
//! - [`Service`] loads configuration, wires logging, runs setup and the tasks,
//!   and maps the outcome to an exit code.
//! - [`load_config`] / [`ServiceConfig`] / [`ValidationError`] read and check a
//!   YAML or JSON configuration file.
//! - [`Logs`] installs the `tracing` subscriber.
//! - [`build::revision`] exposes the revision embedded at compile time.

pub mod build;
mod config;
mod logs;
mod runner;

pub use config::{ServiceConfig, ValidationError, load_config};
pub use logs::{LogFormat, Logs};
pub use runner::{Args, Service, ServiceRunner};
