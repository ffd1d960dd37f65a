use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use intake_core::config::AppConfig;
use intake_core::Collaborator;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub collaborator: Collaborator,
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub collaborators: Vec<HealthCheck>,
    pub checked_at: String,
}

pub fn router(config: Arc<AppConfig>) -> Router {
    Router::new().route("/health", get(health)).with_state(config)
}

/// Reports whether every collaborator has the credentials and addresses it
/// needs. No provider is contacted.
pub async fn health(State(config): State<Arc<AppConfig>>) -> (StatusCode, Json<HealthResponse>) {
    let collaborators: Vec<HealthCheck> = config
        .collaborator_readiness()
        .into_iter()
        .map(|readiness| {
            if readiness.is_ready() {
                HealthCheck {
                    collaborator: readiness.collaborator,
                    status: "ready",
                    detail: "credentials configured".to_string(),
                }
            } else {
                HealthCheck {
                    collaborator: readiness.collaborator,
                    status: "degraded",
                    detail: format!("missing {}", readiness.missing.join(", ")),
                }
            }
        })
        .collect();
    let ready = collaborators.iter().all(|check| check.status == "ready");

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        collaborators,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
