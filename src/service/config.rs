//! # Service configuration files.
//!
//! [`load_config`] reads a YAML file (JSON is valid YAML) into any type that
//! implements [`ServiceConfig`], then validates it.
//!
//! ```yaml
//! logs:
//!   debug: true
//!   format: text
//! runner:
//!   failure: cancel_siblings
//! listen: 127.0.0.1:8080
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::RunnerConfig;
use crate::error::ConfigError;
use crate::service::logs::Logs;

/// Capabilities a configuration type may expose to the process runner.
///
/// Every method is optional; a plain `#[derive(Deserialize)]` struct only needs
/// an empty `impl ServiceConfig for MyConfig {}`.
pub trait ServiceConfig: DeserializeOwned {
    /// Checks the parsed values.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Logging settings. `None` falls back to JSON at `DEBUG`.
    fn logs(&self) -> Option<&Logs> {
        None
    }

    /// Task runner settings. `None` uses [`RunnerConfig::default`].
    fn runner(&self) -> Option<&RunnerConfig> {
        None
    }
}

/// A configuration field that failed validation.
///
/// `field` is a dotted path built up with [`wrap`](Self::wrap) and
/// [`wrap_idx`](Self::wrap_idx) as the error travels up nested sections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ValidationError:{field}: {message}")]
pub struct ValidationError {
    /// Path to the offending field.
    pub field: String,
    /// Why the field is invalid.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefixes the field path with `parent.`.
    pub fn wrap(self, parent: &str) -> Self {
        Self {
            field: format!("{parent}.{}", self.field),
            message: self.message,
        }
    }

    /// Prefixes the field path with `parent[idx].`.
    pub fn wrap_idx(self, parent: &str, idx: usize) -> Self {
        Self {
            field: format!("{parent}[{idx}].{}", self.field),
            message: self.message,
        }
    }
}

/// Reads, parses and validates a configuration file.
pub fn load_config<C: ServiceConfig>(path: impl AsRef<Path>) -> Result<C, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let cfg: C = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde::Deserialize;

    use super::*;
    use crate::policies::FailurePolicy;
    use crate::service::logs::LogFormat;

    #[derive(Debug, Deserialize)]
    struct Upstream {
        url: String,
    }

    impl Upstream {
        fn validate(&self) -> Result<(), ValidationError> {
            if !self.url.starts_with("nats://") {
                return Err(ValidationError::new("url", "must use the nats:// scheme"));
            }
            Ok(())
        }
    }

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        listen: String,
        #[serde(default)]
        upstreams: Vec<Upstream>,
        #[serde(default)]
        logs: Logs,
        #[serde(default)]
        runner: RunnerConfig,
    }

    impl ServiceConfig for TestConfig {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.listen.is_empty() {
                return Err(ValidationError::new("listen", "must not be empty"));
            }
            for (idx, up) in self.upstreams.iter().enumerate() {
                up.validate().map_err(|e| e.wrap_idx("upstreams", idx))?;
            }
            Ok(())
        }

        fn logs(&self) -> Option<&Logs> {
            Some(&self.logs)
        }

        fn runner(&self) -> Option<&RunnerConfig> {
            Some(&self.runner)
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_yaml() {
        let file = write_config(
            "listen: 127.0.0.1:8080\nlogs:\n  debug: true\n  format: text\nrunner:\n  failure: cancel_siblings\n",
        );
        let cfg: TestConfig = load_config(file.path()).unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:8080");
        assert!(cfg.logs.debug);
        assert_eq!(cfg.logs.format, LogFormat::Text);
        assert_eq!(cfg.runner.failure, FailurePolicy::CancelSiblings);
    }

    #[test]
    fn test_loads_json() {
        let file = write_config(r#"{"listen": ":9090", "upstreams": [{"url": "nats://a:4222"}]}"#);
        let cfg: TestConfig = load_config(file.path()).unwrap();
        assert_eq!(cfg.listen, ":9090");
        assert_eq!(cfg.upstreams.len(), 1);
        assert!(!cfg.logs.debug);
        assert_eq!(cfg.logs.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config::<TestConfig>(dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Open { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = write_config("listen: [unterminated\n");
        let err = load_config::<TestConfig>(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validation_error_carries_nested_path() {
        let file = write_config("listen: x\nupstreams:\n  - url: nats://a\n  - url: http://b\n");
        let err = load_config::<TestConfig>(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ValidationError:upstreams[1].url: must use the nats:// scheme"
        );
    }

    #[test]
    fn test_wrap_builds_dotted_path() {
        let err = ValidationError::new("url", "bad").wrap("nats").wrap("bridge");
        assert_eq!(err.field, "bridge.nats.url");
        assert_eq!(err.to_string(), "ValidationError:bridge.nats.url: bad");
    }
}
