use std::sync::Arc;

use axum::Router;
use intake_core::config::{AppConfig, ConfigError, LoadOptions};
use intake_core::{IntakeDispatcher, RenderError, TemplateRenderer};
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::{http_client, Collaborators};
use crate::{debug_env, health, intake};

pub struct Application {
    pub config: Arc<AppConfig>,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("template setup failed: {0}")]
    Render(#[from] RenderError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        response_policy = ?config.intake.response_policy,
        dispatch_mode = ?config.intake.dispatch_mode,
        "starting application bootstrap"
    );

    let readiness = config.collaborator_readiness();
    for readiness in readiness.iter().filter(|readiness| !readiness.is_ready()) {
        warn!(
            event_name = "system.bootstrap.collaborator_unconfigured",
            correlation_id = "bootstrap",
            collaborator = %readiness.collaborator,
            missing = %readiness.missing.join(", "),
            "collaborator is missing configuration and will fail every call"
        );
    }

    let client =
        http_client(config.intake.outbound_timeout_secs).map_err(BootstrapError::HttpClient)?;
    let renderer = Arc::new(TemplateRenderer::new()?);
    let collaborators = Collaborators::from_config(&config, client, renderer);
    let dispatcher = IntakeDispatcher::new(
        collaborators.record_store,
        collaborators.sms,
        collaborators.email,
        config.intake.dispatch_mode,
    );

    let config = Arc::new(config);
    let mut router = intake::router(dispatcher, config.intake.response_policy)
        .merge(health::router(config.clone()));

    if config.server.debug_endpoint {
        warn!(
            event_name = "system.bootstrap.debug_endpoint_enabled",
            correlation_id = "bootstrap",
            "configuration presence report mounted at /api/debug-env"
        );
        router = router.merge(debug_env::router(config.clone()));
    }

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application bootstrap complete"
    );

    Ok(Application { config, router })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use intake_core::config::{ConfigOverrides, LoadOptions};
    use tower::ServiceExt;

    use crate::bootstrap::bootstrap;

    fn options(overrides: ConfigOverrides) -> LoadOptions {
        LoadOptions { ignore_env: true, overrides, ..LoadOptions::default() }
    }

    #[tokio::test]
    async fn bootstrap_succeeds_without_credentials_and_reports_degraded() {
        let app = bootstrap(options(ConfigOverrides::default())).expect("bootstrap");

        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn debug_endpoint_is_not_mounted_by_default() {
        let app = bootstrap(options(ConfigOverrides::default())).expect("bootstrap");

        let response = app
            .router
            .oneshot(Request::get("/api/debug-env").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn debug_endpoint_is_mounted_when_enabled() {
        let app = bootstrap(options(ConfigOverrides {
            debug_endpoint: Some(true),
            ..ConfigOverrides::default()
        }))
        .expect("bootstrap");

        let response = app
            .router
            .oneshot(Request::get("/api/debug-env").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unconfigured_collaborators_do_not_break_intake() {
        let app = bootstrap(options(ConfigOverrides::default())).expect("bootstrap");

        let request = Request::post("/api/quote")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Jane","phone":"555","address":"1 Elm"}"#))
            .expect("request");
        let response = app.router.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn invalid_configuration_fails_fast() {
        let result = bootstrap(options(ConfigOverrides {
            airtable_api_url: Some("ftp://api.airtable.com".to_string()),
            ..ConfigOverrides::default()
        }));

        let message = result.err().expect("error").to_string();
        assert!(message.contains("airtable.api_url"));
    }
}
