//! Request routing for the diagram API.

use super::error::ApiError;
use super::response;
use super::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

/// Default time window of the arch diagram, in hours.
const DEFAULT_ARCH_HOURS: u32 = 24;

/// Largest accepted time window (30 days).
const MAX_ARCH_HOURS: u32 = 720;

/// Route an incoming request to the appropriate handler.
pub async fn route(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    tracing::debug!(method = %method, path = %path, "routing request");

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") => health(&state),
        (Method::GET, "/diagram/arch") => arch(req.uri().query().unwrap_or(""), &state),
        (Method::GET, p) if p.starts_with("/diagram/action/") => {
            let id = p.strip_prefix("/diagram/action/").unwrap_or("");
            if id.is_empty() {
                response::not_found()
            } else {
                action(&state, id)
            }
        }
        (_, "/diagram/arch") => response::method_not_allowed(&["GET"]),
        (_, p) if p.starts_with("/diagram/action/") => response::method_not_allowed(&["GET"]),
        _ => response::not_found(),
    };

    Ok(response)
}

/// GET /health
fn health(state: &AppState) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "status": "ok",
        "actions": state.store.len(),
        "uptime_secs": state.uptime_secs()
    });
    response::ok(&body)
}

/// GET /diagram/arch?hours=N&exclude=a,b
fn arch(query: &str, state: &AppState) -> Response<Full<Bytes>> {
    let params = match ArchParams::parse(query) {
        Ok(params) => params,
        Err(e) => return e.into_response(),
    };
    let dot = state.diagram.arch(params.hours, &params.exclude_apps);
    response::dot(dot)
}

/// GET /diagram/action/{id}
fn action(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.diagram.action(id) {
        Ok(dot) => response::dot(dot),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Parsed query parameters of the arch endpoint.
#[derive(Debug, PartialEq, Eq)]
struct ArchParams {
    hours: u32,
    exclude_apps: HashSet<String>,
}

impl ArchParams {
    fn parse(query: &str) -> Result<Self, ApiError> {
        let mut hours = DEFAULT_ARCH_HOURS;
        let mut exclude_apps = HashSet::new();

        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, urlencoding::decode(v).unwrap_or_default()),
                None => continue,
            };
            match key {
                "hours" => {
                    hours = value.parse::<u32>().map_err(|_| {
                        ApiError::bad_request(format!("invalid hours: '{}'", value))
                    })?;
                    if hours == 0 || hours > MAX_ARCH_HOURS {
                        return Err(ApiError::bad_request(format!(
                            "hours must be between 1 and {}",
                            MAX_ARCH_HOURS
                        )));
                    }
                }
                "exclude" => {
                    exclude_apps.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|app| !app.is_empty())
                            .map(str::to_string),
                    );
                }
                _ => {}
            }
        }

        Ok(Self {
            hours,
            exclude_apps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryStore;
    use hyper::StatusCode;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn arch_params_defaults() {
        let params = ArchParams::parse("").unwrap();
        assert_eq!(params.hours, DEFAULT_ARCH_HOURS);
        assert!(params.exclude_apps.is_empty());
    }

    #[test]
    fn arch_params_parsing() {
        let params = ArchParams::parse("hours=48&exclude=monitoring,cron").unwrap();
        assert_eq!(params.hours, 48);
        assert!(params.exclude_apps.contains("monitoring"));
        assert!(params.exclude_apps.contains("cron"));
    }

    #[test]
    fn arch_params_reject_bad_hours() {
        assert!(ArchParams::parse("hours=abc").is_err());
        assert!(ArchParams::parse("hours=0").is_err());
        assert!(ArchParams::parse("hours=100000").is_err());
    }

    #[test]
    fn arch_handler_returns_dot() {
        let state = test_state();
        let response = arch("hours=24", &state);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            response::GRAPHVIZ_CONTENT_TYPE
        );
    }

    #[test]
    fn action_handler_unknown_id_is_404() {
        let state = test_state();
        let response = action(&state, "missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn health_handler() {
        let state = test_state();
        let response = health(&state);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
