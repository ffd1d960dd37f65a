//! Opt-in configuration presence report, mounted only when
//! `server.debug_endpoint` is enabled.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use intake_core::config::{AppConfig, VariableReport};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct DebugEnvResponse {
    pub variables: Vec<VariableReport>,
}

pub fn router(config: Arc<AppConfig>) -> Router {
    Router::new().route("/api/debug-env", get(debug_env)).with_state(config)
}

async fn debug_env(State(config): State<Arc<AppConfig>>) -> Json<DebugEnvResponse> {
    let variables = config.variable_reports();
    info!(
        event_name = "intake.debug_env.served",
        correlation_id = "debug-env",
        present = variables.iter().filter(|variable| variable.present).count(),
        "configuration presence report served"
    );
    Json(DebugEnvResponse { variables })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use intake_core::config::AppConfig;
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::router;

    #[tokio::test]
    async fn reports_presence_with_redacted_previews() {
        let mut config = AppConfig::default();
        config.airtable.api_key = Some(SecretString::from("patSECRETVALUE123".to_string()));
        config.airtable.base_id = Some("app42".to_string());

        let response = router(Arc::new(config))
            .oneshot(Request::get("/api/debug-env").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        let variables = body["variables"].as_array().expect("variables");
        assert_eq!(variables.len(), 8);

        let find = |name: &str| {
            variables.iter().find(|variable| variable["name"] == json!(name)).cloned()
        };
        assert_eq!(
            find("INTAKE_AIRTABLE_API_KEY"),
            Some(json!({"name": "INTAKE_AIRTABLE_API_KEY", "present": true, "preview": "patS***"}))
        );
        assert_eq!(
            find("INTAKE_AIRTABLE_BASE_ID"),
            Some(json!({"name": "INTAKE_AIRTABLE_BASE_ID", "present": true, "preview": "***"}))
        );
        assert_eq!(
            find("INTAKE_RESEND_API_KEY"),
            Some(json!({"name": "INTAKE_RESEND_API_KEY", "present": false, "preview": null}))
        );
        assert!(!String::from_utf8_lossy(&bytes).contains("SECRETVALUE"));
    }
}
