//! Error types used by the service runtime, its tasks and the HTTP dispatch layer.
//!
//! - [`TaskError`] - errors returned by individual task executions.
//! - [`EncodingError`] - wire (de)serialization failures.
//! - [`DispatchError`] - per-request failures handed to an [`App`](crate::App) error handler.
//! - [`ConfigError`] - configuration file loading and validation failures.
//! - [`ServiceError`] - fatal process-level failures, mapped to exit codes.
//!
//! Task and service errors provide `as_label` for logs.

use std::path::PathBuf;

use thiserror::Error;

use crate::service::ValidationError;

/// Boxed error used at the handler and setup seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by task execution.
///
/// A task returns exactly one outcome: `Ok(())` for a normal finish, or one of these.
/// [`TaskError::Canceled`] is the reason a task reports when the shared
/// cancellation token fired; the runner treats it as a graceful stop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task hit an unrecoverable condition.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task hit a condition that must also stop the surrounding service.
    ///
    /// The runner cancels every sibling whatever the [`FailurePolicy`](crate::FailurePolicy).
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task observed cancellation of its context.
    #[error("context cancelled")]
    Canceled,

    /// Task panicked; the panic was caught by the runner.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from any displayable error.
    pub fn fail(err: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: err.to_string(),
        }
    }

    /// Builds a [`TaskError::Fatal`] from any displayable error.
    pub fn fatal(err: impl std::fmt::Display) -> Self {
        TaskError::Fatal {
            error: err.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use svcvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// True when the task stopped because its context was cancelled.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

/// Failure of an [`Encoding`](crate::Encoding) strategy.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EncodingError {
    /// The value could not be serialized.
    #[error("encode: {0}")]
    Encode(String),

    /// The bytes were malformed or did not match the target type.
    #[error("decode: {0}")]
    Decode(String),
}

/// # Per-request failure inside typed dispatch.
///
/// Handed to the error handler configured on an [`App`](crate::App). Handler errors keep
/// their concrete type so a service can map its own error schema with
/// [`DispatchError::downcast_ref`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Request body could not be read from the connection.
    #[error("read body: {0}")]
    Body(String),

    /// Path parameters could not be extracted (e.g. invalid percent-encoding).
    #[error("path params: {0}")]
    Params(String),

    /// Request body could not be decoded into the handler's request type.
    #[error(transparent)]
    Decode(EncodingError),

    /// The handler returned an error.
    #[error(transparent)]
    Handler(BoxError),
}

impl DispatchError {
    /// Returns the handler error as `E`, if that is what the handler returned.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            DispatchError::Handler(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Body(_) => "dispatch_body",
            DispatchError::Params(_) => "dispatch_params",
            DispatchError::Decode(_) => "dispatch_decode",
            DispatchError::Handler(_) => "dispatch_handler",
        }
    }
}

/// Failure loading a service configuration file.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML/JSON for the configuration type.
    #[error("yaml {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration parsed but failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// # Fatal process-level errors.
///
/// Each variant names the phase that failed; [`ServiceError::exit_code`] maps it
/// to the process exit status.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration could not be loaded (exit code 2).
    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    /// The setup callback failed (exit code 1).
    #[error("Setup: {0}")]
    Setup(BoxError),

    /// Tasks ran but at least one failed (exit code 1).
    #[error("Run: {0}")]
    Run(String),
}

impl ServiceError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ServiceError::Config(_) => 2,
            ServiceError::Setup(_) | ServiceError::Run(_) => 1,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Config(_) => "service_config",
            ServiceError::Setup(_) => "service_setup",
            ServiceError::Run(_) => "service_run",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("not found: {0}")]
    struct Missing(String);

    #[test]
    fn test_dispatch_downcast_handler_error() {
        let err = DispatchError::Handler(Box::new(Missing("svc".into())));
        assert_eq!(err.downcast_ref::<Missing>().map(|m| m.0.as_str()), Some("svc"));
        assert_eq!(err.as_label(), "dispatch_handler");

        let decode = DispatchError::Decode(EncodingError::Decode("eof".into()));
        assert!(decode.downcast_ref::<Missing>().is_none());
    }

    #[test]
    fn test_service_error_exit_codes() {
        let cfg = ServiceError::Config(ConfigError::Invalid(ValidationError::new("a", "b")));
        assert_eq!(cfg.exit_code(), 2);
        assert!(cfg.to_string().starts_with("Config: "));

        let setup = ServiceError::Setup("no tasks registered".into());
        assert_eq!(setup.exit_code(), 1);
        assert_eq!(setup.to_string(), "Setup: no tasks registered");

        assert_eq!(ServiceError::Run("x".into()).exit_code(), 1);
    }
}
