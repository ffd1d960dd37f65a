//! Outbound collaborator ports.
//!
//! The intake dispatcher only talks to these traits; the HTTP adapters for
//! Airtable, Textbelt and Resend live in the server crate and tests swap in
//! recording fakes.

use async_trait::async_trait;

use crate::domain::quote_request::QuoteRequest;
use crate::errors::CollaboratorError;

/// Identifier and browsable link of a record created by the record store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRef {
    pub id: String,
    pub link: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_record(&self, request: &QuoteRequest) -> Result<RecordRef, CollaboratorError>;
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Sends the operator alert. Returns the provider's message id, or an
    /// empty string when the provider does not return one.
    async fn send_quote_alert(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send_quote_email(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, CollaboratorError>;
}
