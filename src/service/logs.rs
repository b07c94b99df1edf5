//! # Logging configuration.
//!
//! [`Logs`] is the `logs:` section shared by every service configuration. It
//! installs a global `tracing-subscriber` writing to stdout:
//! ```text
//! format: json  → {"timestamp":"...","level":"INFO","fields":{"message":"task starting...","task":"..."},...}
//! format: text  → 2024-01-01T00:00:00Z  INFO service{service="ui"}: task starting... task="..."
//! ```
//! `RUST_LOG`, when set, takes precedence over `debug`.

use serde::Deserialize;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::BoxError;

/// Output format of the log stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable lines.
    Text,
}

/// Logging settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Logs {
    /// Emit `DEBUG` records; otherwise `INFO` and above.
    pub debug: bool,
    /// Output format.
    pub format: LogFormat,
}

impl Logs {
    /// Settings used when a configuration has no `logs` section: JSON at `DEBUG`.
    pub fn fallback() -> Self {
        Self {
            debug: true,
            format: LogFormat::Json,
        }
    }

    /// Maximum level emitted when `RUST_LOG` is unset.
    pub fn level(&self) -> Level {
        if self.debug { Level::DEBUG } else { Level::INFO }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level()).into())
            .from_env_lossy()
    }

    /// Installs the global subscriber.
    ///
    /// Fails when a global subscriber is already set.
    pub fn try_init(&self) -> Result<(), BoxError> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stdout);

        match self.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Text => builder.try_init(),
        }
    }
}
