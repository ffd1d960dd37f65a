use std::sync::Arc;

use async_trait::async_trait;
use intake_core::config::ResendConfig;
use intake_core::{
    Collaborator, CollaboratorError, CollaboratorFailure, EmailGateway, QuoteRequest,
    TemplateRenderer,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{status_failure, transport_failure};

/// Emails the operator inbox through Resend.
pub struct ResendEmailGateway {
    client: Client,
    api_key: Option<SecretString>,
    from_email: Option<String>,
    notify_email: Option<String>,
    reply_to: Option<String>,
    api_url: String,
    renderer: Arc<TemplateRenderer>,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct SentEmail {
    id: String,
}

fn required<'a>(
    value: &'a Option<String>,
    key: &'static str,
) -> Result<&'a str, CollaboratorFailure> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or(CollaboratorFailure::NotConfigured(key))
}

impl ResendEmailGateway {
    pub fn new(client: Client, config: &ResendConfig, renderer: Arc<TemplateRenderer>) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            from_email: config.from_email.clone(),
            notify_email: config.notify_email.clone(),
            reply_to: config.reply_to.clone(),
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
            .ok_or(CollaboratorFailure::NotConfigured("resend.api_key"))?;
        let from = required(&self.from_email, "resend.from_email")?;
        let to = required(&self.notify_email, "resend.notify_email")?;

        let html = self
            .renderer
            .email_html(request, record_link)
            .map_err(|error| CollaboratorFailure::Render(error.to_string()))?;
        let subject = self.renderer.email_subject(request);
        let reply_to = self.reply_to.as_deref().filter(|value| !value.trim().is_empty());
        let body = SendEmailBody { from, to: [to], subject, html, reply_to };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url.trim_end_matches('/')))
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport_failure)?;

        if !response.status().is_success() {
            return Err(status_failure(response).await);
        }

        let sent: SentEmail = response
            .json()
            .await
            .map_err(|error| CollaboratorFailure::Decode(error.to_string()))?;
        Ok(sent.id)
    }
}

#[async_trait]
impl EmailGateway for ResendEmailGateway {
    async fn send_quote_email(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        self.send(request, record_link)
            .await
            .map_err(|failure| CollaboratorError::new(Collaborator::Email, failure))
    }
}
