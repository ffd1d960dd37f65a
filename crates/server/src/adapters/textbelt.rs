use std::sync::Arc;

use async_trait::async_trait;
use intake_core::config::TextbeltConfig;
use intake_core::{
    Collaborator, CollaboratorError, CollaboratorFailure, QuoteRequest, SmsGateway,
    TemplateRenderer,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{status_failure, transport_failure};

/// Texts the operator phone through Textbelt.
pub struct TextbeltSmsGateway {
    client: Client,
    api_key: Option<SecretString>,
    notify_phone: Option<String>,
    api_url: String,
    renderer: Arc<TemplateRenderer>,
}

#[derive(Serialize)]
struct SendTextBody<'a> {
    phone: &'a str,
    message: &'a str,
    key: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTextReply {
    success: bool,
    #[serde(default)]
    text_id: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

// Live replies carry a numeric textId; older docs and sandboxes show a string.
fn text_id_string(text_id: Option<Value>) -> String {
    match text_id {
        Some(Value::String(id)) => id,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl TextbeltSmsGateway {
    pub fn new(client: Client, config: &TextbeltConfig, renderer: Arc<TemplateRenderer>) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            notify_phone: config.notify_phone.clone(),
            api_url: config.api_url.clone(),
            renderer,
        }
    }

    async fn send(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, CollaboratorFailure> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(CollaboratorFailure::NotConfigured("textbelt.api_key"))?;
        let phone = self
            .notify_phone
            .as_deref()
            .filter(|phone| !phone.trim().is_empty())
            .ok_or(CollaboratorFailure::NotConfigured("textbelt.notify_phone"))?;

        let message = self.renderer.sms_text(request, record_link);
        let url = format!("{}/text", self.api_url.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .json(&SendTextBody { phone, message: &message, key: api_key.expose_secret() })
            .send()
            .await
            .map_err(transport_failure)?;

        if !response.status().is_success() {
            return Err(status_failure(response).await);
        }

        let reply: SendTextReply = response
            .json()
            .await
            .map_err(|error| CollaboratorFailure::Decode(error.to_string()))?;

        // Textbelt reports quota and carrier problems as 200 + success:false.
        if !reply.success {
            let reason = reply.error.unwrap_or_else(|| "textbelt reported failure".to_string());
            return Err(CollaboratorFailure::Rejected(reason));
        }

        Ok(text_id_string(reply.text_id))
    }
}

#[async_trait]
impl SmsGateway for TextbeltSmsGateway {
    async fn send_quote_alert(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        self.send(request, record_link)
            .await
            .map_err(|failure| CollaboratorError::new(Collaborator::Sms, failure))
    }
}
