//! # Example: typed JSON API service
//!
//! A small service-control API over an in-memory unit table:
//! - typed handlers with `NoBody` / payload types
//! - a service-defined wire error schema through the error handler
//! - fixed 404 / 405 bodies
//! - config file loading and exit codes via `Service`
//!
//! ```text
//! cargo run --example api_service -- --config demos/config.yml
//! curl localhost:8080/api/v1/services
//! curl -XPOST localhost:8080/api/v1/services/cron/start
//! ```

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use svcvisor::{
    App, BoxError, DispatchError, HttpServer, NoBody, Payload, Request, Response, Service,
    ServiceConfig, ValidationError,
};
use svcvisor::{Logs, RunnerConfig};

#[derive(Debug, Deserialize)]
struct Config {
    listen: String,
    hostname: String,
    #[serde(default)]
    units: Vec<UnitConfig>,
    #[serde(default)]
    logs: Logs,
    #[serde(default)]
    runner: RunnerConfig,
}

#[derive(Debug, Deserialize)]
struct UnitConfig {
    name: String,
    #[serde(default)]
    active: bool,
}

impl ServiceConfig for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.listen.is_empty() {
            return Err(ValidationError::new("listen", "must not be empty"));
        }
        for (idx, unit) in self.units.iter().enumerate() {
            if unit.name.is_empty() {
                return Err(ValidationError::new("name", "must not be empty").wrap_idx("units", idx));
            }
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

/// Error returned by handlers; mapped onto the wire by [`wire_error`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
}

impl ApiError {
    fn not_found(unit: &str) -> Self {
        Self {
            code: "NotFound",
            message: format!("unit {unit} not found"),
            status: StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorWrapper {
    error: ErrorBody,
    #[serde(skip)]
    status: Option<StatusCode>,
}

impl Payload for ErrorWrapper {
    fn status_code(&self) -> Option<StatusCode> {
        self.status
    }
}

impl ErrorWrapper {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            status: None,
        }
    }
}

fn wire_error(err: &DispatchError) -> ErrorWrapper {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        let mut body = ErrorWrapper::new(api.code, &api.message);
        body.status = Some(api.status);
        return body;
    }
    match err {
        DispatchError::Decode(_) | DispatchError::Body(_) | DispatchError::Params(_) => {
            let mut body = ErrorWrapper::new("BadRequest", &err.to_string());
            body.status = Some(StatusCode::BAD_REQUEST);
            body
        }
        _ => {
            tracing::error!(error = %err, "an unexpected error occurred");
            ErrorWrapper::new("Unknown", "An unknown error occurred, check the logs.")
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Unit {
    name: String,
    active: bool,
}

#[derive(Debug, Serialize)]
struct ListUnitsRes {
    hostname: String,
    units: Vec<Unit>,
}

impl Payload for ListUnitsRes {}

#[derive(Debug, Default, Deserialize)]
struct CreateUnitReq {
    name: String,
}

impl Payload for CreateUnitReq {}

struct Units {
    hostname: String,
    table: Mutex<BTreeMap<String, bool>>,
}

impl Units {
    fn set_active(&self, name: &str, active: bool) -> Result<(), ApiError> {
        let mut table = self.table.lock().map_err(|_| ApiError {
            code: "Unavailable",
            message: "unit table poisoned".into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        })?;
        match table.get_mut(name) {
            Some(state) => {
                *state = active;
                Ok(())
            }
            None => Err(ApiError::not_found(name)),
        }
    }
}

fn routes(app: &mut App, units: Arc<Units>) {
    app.not_found(ErrorWrapper::new("NotFound", "Resource not found."));
    app.method_not_allowed(ErrorWrapper::new(
        "MethodNotAllowed",
        "Method Not Allowed for Resource.",
    ));

    app.route("/api/v1", |api| {
        let list = Arc::clone(&units);
        api.get("/services", move |_req: Request<NoBody>| {
            let units = Arc::clone(&list);
            async move {
                let table = units.table.lock().map_err(|_| "unit table poisoned")?;
                let body = ListUnitsRes {
                    hostname: units.hostname.clone(),
                    units: table
                        .iter()
                        .map(|(name, active)| Unit {
                            name: name.clone(),
                            active: *active,
                        })
                        .collect(),
                };
                Ok::<_, BoxError>(Response::ok(body))
            }
        });

        let create = Arc::clone(&units);
        api.post("/services", move |req: Request<CreateUnitReq>| {
            let units = Arc::clone(&create);
            async move {
                let name = req.into_body().name;
                let mut table = units.table.lock().map_err(|_| "unit table poisoned")?;
                table.insert(name, false);
                Ok::<_, BoxError>(Response::<NoBody>::default().with_status(StatusCode::CREATED))
            }
        });

        api.route("/services/{service}", |svc| {
            for (action, active) in [("start", true), ("stop", false), ("restart", true)] {
                let units = Arc::clone(&units);
                svc.post(&format!("/{action}"), move |req: Request<NoBody>| {
                    let units = Arc::clone(&units);
                    async move {
                        let name = req.param("service").unwrap_or_default();
                        units.set_active(name, active)?;
                        Ok::<_, ApiError>(Response::<NoBody>::no_content())
                    }
                });
            }
        });
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    Service::new("api_service")
        .with_version(env!("CARGO_PKG_VERSION"))
        .run_from_args(|svc, cfg: Config| {
            let units = Arc::new(Units {
                hostname: cfg.hostname,
                table: Mutex::new(cfg.units.into_iter().map(|u| (u.name, u.active)).collect()),
            });

            let mut app = App::json(svc.logger.clone()).with_error_handler(wire_error);
            routes(&mut app, units);
            svc.tasks
                .add_task(HttpServer::from_app("api", cfg.listen, app));
            Ok(())
        })
        .await
}
