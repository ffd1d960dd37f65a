//! reqwest-backed adapters for the three intake collaborators.

pub mod airtable;
pub mod resend;
pub mod textbelt;

use std::sync::Arc;
use std::time::Duration;

use intake_core::config::AppConfig;
use intake_core::{CollaboratorFailure, EmailGateway, RecordStore, SmsGateway, TemplateRenderer};
use reqwest::{Client, Response};
use serde_json::Value;

pub use airtable::AirtableRecordStore;
pub use resend::ResendEmailGateway;
pub use textbelt::TextbeltSmsGateway;

const MAX_PROVIDER_MESSAGE_CHARS: usize = 200;

pub struct Collaborators {
    pub record_store: Arc<dyn RecordStore>,
    pub sms: Arc<dyn SmsGateway>,
    pub email: Arc<dyn EmailGateway>,
}

impl Collaborators {
    pub fn from_config(
        config: &AppConfig,
        client: Client,
        renderer: Arc<TemplateRenderer>,
    ) -> Self {
        let sms = TextbeltSmsGateway::new(client.clone(), &config.textbelt, renderer.clone());
        Self {
            record_store: Arc::new(AirtableRecordStore::new(client.clone(), &config.airtable)),
            sms: Arc::new(sms),
            email: Arc::new(ResendEmailGateway::new(client, &config.resend, renderer)),
        }
    }
}

/// Shared outbound client. The timeout here is the only bound on how long a
/// collaborator call may take.
pub fn http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(Duration::from_secs(timeout_secs)).build()
}

pub(crate) fn transport_failure(error: reqwest::Error) -> CollaboratorFailure {
    CollaboratorFailure::Transport(error.to_string())
}

pub(crate) async fn status_failure(response: Response) -> CollaboratorFailure {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    CollaboratorFailure::Status { status, message: provider_message(&body) }
}

/// Pulls a human-readable message out of a provider error body. Providers
/// use `{"error": {"message": ..}}`, `{"message": ..}` or `{"error": ".."}`.
pub(crate) fn provider_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .or_else(|| value.pointer("/error/type"))
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response body".to_string()
        } else {
            trimmed.chars().take(MAX_PROVIDER_MESSAGE_CHARS).collect()
        }
    })
}
