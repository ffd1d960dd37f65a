//! Public quote intake endpoint.
//!
//! - `POST    /api/quote` validate, fan out, answer `{success: true}`
//! - `OPTIONS /api/quote` CORS preflight, empty body
//!
//! Any other method on the path is answered with 405 by the router.

use std::any::Any;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, CONTENT_TYPE},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use intake_core::config::ResponsePolicy;
use intake_core::{
    IntakeDispatcher, IntakeError, IntakeResponse, InterfaceError, QuoteRequest, QuoteSubmission,
};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

const ALLOWED_METHODS: &str = "POST,OPTIONS";
const ALLOWED_HEADERS: &str = "content-type";

#[derive(Clone)]
pub struct IntakeState {
    dispatcher: IntakeDispatcher,
    policy: ResponsePolicy,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

pub fn router(dispatcher: IntakeDispatcher, policy: ResponsePolicy) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/quote", post(submit_quote).options(preflight))
        .with_state(IntakeState { dispatcher, policy })
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
}

async fn submit_quote(
    State(state): State<IntakeState>,
    payload: Result<Json<QuoteSubmission>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            warn!(
                event_name = "intake.request.malformed",
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "quote request body could not be parsed"
            );
            let error = IntakeError::Unhandled(rejection.body_text());
            return error_response(&error.into_interface(correlation_id));
        }
    };

    info!(
        event_name = "intake.request.received",
        correlation_id = %correlation_id,
        "quote request received"
    );

    let request = match QuoteRequest::from_submission(submission) {
        Ok(request) => request,
        Err(validation) => {
            info!(
                event_name = "intake.request.rejected",
                correlation_id = %correlation_id,
                error = %validation,
                "quote request rejected"
            );
            return error_response(&IntakeError::from(validation).into_interface(correlation_id));
        }
    };

    let report = state.dispatcher.dispatch(&request, &correlation_id).await;

    info!(
        event_name = "intake.request.completed",
        correlation_id = %correlation_id,
        failed_collaborators = report.failed_count(),
        "quote request completed"
    );

    (StatusCode::OK, Json(IntakeResponse::from_report(state.policy, &report))).into_response()
}

/// `OPTIONS` is normally answered by the CORS layer; this keeps the route
/// answering 200 with the same headers if a request gets past it.
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
        ],
    )
}

fn error_response(error: &InterfaceError) -> Response {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { error: error.user_message() })).into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|message| message.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());

    let error = IntakeError::Unhandled(detail).into_interface("unknown");
    error!(
        event_name = "intake.request.panicked",
        correlation_id = %error.correlation_id(),
        error = %error,
        "quote request handler panicked"
    );
    error_response(&error)
}
