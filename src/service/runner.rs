//! # Process runner.
//!
//! [`Service`] is the one-shot orchestration behind a service's `main`:
//! ```text
//! Service::run(config_path, setup)
//!   ├─► load_config::<C>(path)           error → "Error: Config: ..."  exit 2
//!   ├─► install logging (cfg.logs())
//!   ├─► ServiceRunner { tasks: Runner + logging hooks, logger, shutdown }
//!   ├─► setup(&mut runner, cfg)          error → "Error: Setup: ..."   exit 1
//!   │      └─ no task registered         error → "Error: Setup: ..."   exit 1
//!   ├─► SIGINT/SIGTERM/SIGQUIT → shutdown.cancel()
//!   └─► tasks.run(shutdown)
//!          ├─ any task failed            error → "Error: Run: ..."     exit 1
//!          └─ otherwise                                                exit 0
//! ```
//!
//! # Example
//! ```no_run
//! use std::process::ExitCode;
//!
//! use serde::Deserialize;
//! use svcvisor::{App, BoxError, HttpServer, NoBody, Request, Response, Service, ServiceConfig};
//!
//! #[derive(Deserialize)]
//! struct Config {
//!     listen: String,
//! }
//!
//! impl ServiceConfig for Config {}
//!
//! async fn health(_req: Request<NoBody>) -> Result<Response<String>, BoxError> {
//!     Ok(Response::ok("ok".to_string()))
//! }
//!
//! #[tokio::main]
//! async fn main() -> ExitCode {
//!     Service::new("health")
//!         .run_from_args(|svc, cfg: Config| {
//!             let mut app = App::json(svc.logger.clone());
//!             app.get("/health", health);
//!             svc.tasks.add_task(HttpServer::from_app("api", cfg.listen, app));
//!             Ok(())
//!         })
//!         .await
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::core::{Hooks, RunReport, Runner, shutdown};
use crate::error::{BoxError, ServiceError};
use crate::service::build;
use crate::service::config::{ServiceConfig, load_config};
use crate::service::logs::Logs;

/// Command line of a service binary.
///
/// The command name and version come from the [`Service`], see [`Service::command`].
#[derive(Debug, Clone, Parser)]
pub struct Args {
    /// Path to JSON or YAML configuration file.
    #[arg(long, default_value = "config.yml")]
    pub config: PathBuf,
}

/// Runtime environment handed to a service's setup callback.
pub struct ServiceRunner {
    /// Tasks to run; at least one must be registered.
    pub tasks: Runner,
    /// Span carrying the service name; hand it to [`App`](crate::App)s and tasks.
    pub logger: Span,
    /// Token cancelled on termination signals. Every task observes it.
    pub shutdown: CancellationToken,
}

/// One-shot process runner for a named service.
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    version: Option<String>,
    signals: bool,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            signals: true,
        }
    }

    /// Disables the OS signal watcher; shutdown then relies on the token alone.
    pub fn without_signals(mut self) -> Self {
        self.signals = false;
        self
    }

    /// Version reported by `--version`, typically `env!("CARGO_PKG_VERSION")` of the binary.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Command line parser named after this service.
    ///
    /// `--version` is only accepted when a version was set with [`Service::with_version`].
    pub fn command(&self) -> clap::Command {
        let cmd = Args::command().name(self.name.clone()).bin_name(self.name.clone());
        match &self.version {
            Some(version) => cmd.version(version.clone()),
            None => cmd,
        }
    }

    /// Service name, recorded on every log line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parses `--config` from the command line, then calls [`Service::run`].
    pub async fn run_from_args<C, F>(&self, setup: F) -> ExitCode
    where
        C: ServiceConfig,
        F: FnOnce(&mut ServiceRunner, C) -> Result<(), BoxError>,
    {
        let matches = self.command().get_matches();
        let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
        self.run(&args.config, setup).await
    }

    /// Runs the service and maps the outcome to a process exit code.
    ///
    /// Failures are written to stderr as one line: `Error: <phase>: <detail>`.
    pub async fn run<C, F>(&self, config_path: impl AsRef<Path>, setup: F) -> ExitCode
    where
        C: ServiceConfig,
        F: FnOnce(&mut ServiceRunner, C) -> Result<(), BoxError>,
    {
        match self.try_run(config_path, setup).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err}");
                ExitCode::from(err.exit_code())
            }
        }
    }

    /// Same as [`Service::run`], returning the error instead of an exit code.
    pub async fn try_run<C, F>(
        &self,
        config_path: impl AsRef<Path>,
        setup: F,
    ) -> Result<RunReport, ServiceError>
    where
        C: ServiceConfig,
        F: FnOnce(&mut ServiceRunner, C) -> Result<(), BoxError>,
    {
        let cfg: C = load_config(config_path)?;

        let logs = cfg.logs().cloned().unwrap_or_else(Logs::fallback);
        let installed = logs.try_init().is_ok();

        let logger = tracing::info_span!("service", service = %self.name);
        logger.in_scope(|| {
            if !installed {
                tracing::debug!("global subscriber already set, keeping it");
            }
            tracing::info!(revision = build::revision(8), "service starting");
        });

        let mut svc = ServiceRunner {
            tasks: Runner::with_config(cfg.runner().copied().unwrap_or_default())
                .with_hooks(Hooks::logging()),
            logger: logger.clone(),
            shutdown: CancellationToken::new(),
        };

        setup(&mut svc, cfg).map_err(ServiceError::Setup)?;
        if svc.tasks.is_empty() {
            return Err(ServiceError::Setup("no tasks registered".into()));
        }

        let watcher = self
            .signals
            .then(|| shutdown::cancel_on_signal(svc.shutdown.clone()));

        let ServiceRunner {
            tasks,
            logger,
            shutdown,
        } = svc;
        let report = tasks.run(shutdown.clone()).instrument(logger.clone()).await;

        shutdown.cancel();
        if let Some(watcher) = watcher {
            let _ = watcher.await;
        }

        if !report.is_success() {
            let names: Vec<&str> = report.failed().iter().map(|f| f.name.as_str()).collect();
            return Err(ServiceError::Run(format!(
                "{} task(s) failed: {}",
                names.len(),
                names.join(", ")
            )));
        }

        logger.in_scope(|| tracing::info!(tasks = report.total(), "service stopped"));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde::Deserialize;

    use super::*;
    use crate::error::{ConfigError, TaskError};
    use crate::service::config::ValidationError;
    use crate::tasks::TaskFn;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        name: String,
    }

    impl ServiceConfig for TestConfig {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.name.is_empty() {
                return Err(ValidationError::new("name", "must not be empty"));
            }
            Ok(())
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn service() -> Service {
        Service::new("test").without_signals()
    }

    #[test]
    fn test_command_is_named_after_service() {
        let svc = Service::new("unit-ui").with_version("1.4.0");
        let cmd = svc.command();
        assert_eq!(cmd.get_name(), "unit-ui");
        assert_eq!(cmd.render_version().trim(), "unit-ui 1.4.0");

        let matches = svc
            .command()
            .try_get_matches_from(["unit-ui", "--config", "/etc/unit-ui.yml"])
            .unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/unit-ui.yml"));

        let defaults = Args::from_arg_matches(
            &service().command().try_get_matches_from(["test"]).unwrap(),
        )
        .unwrap();
        assert_eq!(defaults.config, PathBuf::from("config.yml"));
    }

    #[test]
    fn test_version_flag_requires_service_version() {
        let err = service()
            .command()
            .try_get_matches_from(["test", "--version"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);

        let err = service()
            .with_version("2.0.1")
            .command()
            .try_get_matches_from(["test", "--version"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[tokio::test]
    async fn test_runs_tasks_to_completion() {
        let file = write_config("name: demo\n");
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        let report = service()
            .try_run(file.path(), move |svc, cfg: TestConfig| {
                assert_eq!(cfg.name, "demo");
                for name in ["a", "b"] {
                    let counter = Arc::clone(&counter);
                    svc.tasks.add(TaskFn::arc(name, move |_ctx: CancellationToken| {
                        let counter = Arc::clone(&counter);
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, TaskError>(())
                        }
                    }));
                }
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(report.stopped().len(), 2);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_missing_config_exits_2() {
        let dir = tempfile::tempdir().unwrap();
        let err = service()
            .try_run(dir.path().join("config.yml"), |_svc, _cfg: TestConfig| Ok(()))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Config(ConfigError::Open { .. })));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_exits_2() {
        let file = write_config("name: ''\n");
        let err = service()
            .try_run(file.path(), |_svc, _cfg: TestConfig| Ok(()))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "Config: ValidationError:name: must not be empty"
        );
    }

    #[tokio::test]
    async fn test_setup_error_exits_1() {
        let file = write_config("name: demo\n");
        let err = service()
            .try_run(file.path(), |_svc, _cfg: TestConfig| Err("nats unreachable".into()))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Setup: nats unreachable");
    }

    #[tokio::test]
    async fn test_no_tasks_is_setup_error() {
        let file = write_config("name: demo\n");
        let err = service()
            .try_run(file.path(), |_svc, _cfg: TestConfig| Ok(()))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Setup(_)));
        assert_eq!(err.to_string(), "Setup: no tasks registered");
    }

    #[tokio::test]
    async fn test_failed_task_exits_1() {
        let file = write_config("name: demo\n");
        let err = service()
            .try_run(file.path(), |svc, _cfg: TestConfig| {
                svc.tasks.add(TaskFn::arc("ok", |_ctx: CancellationToken| async {
                    Ok::<_, TaskError>(())
                }));
                svc.tasks.add(TaskFn::arc("consumer", |_ctx: CancellationToken| async {
                    Err::<(), _>(TaskError::fail("stream closed"))
                }));
                Ok(())
            })
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Run: 1 task(s) failed: consumer");
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_service_gracefully() {
        let file = write_config("name: demo\n");
        let res = tokio::time::timeout(
            Duration::from_secs(5),
            service().try_run(file.path(), |svc, _cfg: TestConfig| {
                svc.tasks.add(TaskFn::arc("waiter", |ctx: CancellationToken| async move {
                    ctx.cancelled().await;
                    Err::<(), _>(TaskError::Canceled)
                }));

                let shutdown = svc.shutdown.clone();
                svc.tasks.add(TaskFn::arc("trigger", move |_ctx: CancellationToken| {
                    let shutdown = shutdown.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        shutdown.cancel();
                        Ok::<_, TaskError>(())
                    }
                }));
                Ok(())
            }),
        )
        .await
        .expect("service stops after shutdown");

        let report = res.unwrap();
        assert_eq!(report.stopped().len(), 2);
    }
}
