use async_trait::async_trait;
use intake_core::config::AirtableConfig;
use intake_core::{
    Collaborator, CollaboratorError, CollaboratorFailure, QuoteRequest, RecordRef, RecordStore,
};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{status_failure, transport_failure};

const RECORD_LINK_BASE: &str = "https://airtable.com";

/// Creates one row per quote request in an Airtable table.
pub struct AirtableRecordStore {
    client: Client,
    api_key: Option<SecretString>,
    base_id: Option<String>,
    table: String,
    api_url: String,
}

#[derive(Serialize)]
struct CreateRecordBody {
    fields: Map<String, Value>,
    typecast: bool,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: String,
}

impl AirtableRecordStore {
    pub fn new(client: Client, config: &AirtableConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
            table: config.table.clone(),
            api_url: config.api_url.clone(),
        }
    }

    fn records_url(&self, base_id: &str) -> Result<Url, CollaboratorFailure> {
        segment_url(&self.api_url, &["v0", base_id, self.table.as_str()])
    }

    async fn create(&self, request: &QuoteRequest) -> Result<RecordRef, CollaboratorFailure> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(CollaboratorFailure::NotConfigured("airtable.api_key"))?;
        let base_id = self
            .base_id
            .as_deref()
            .filter(|base_id| !base_id.trim().is_empty())
            .ok_or(CollaboratorFailure::NotConfigured("airtable.base_id"))?;

        let response = self
            .client
            .post(self.records_url(base_id)?)
            .bearer_auth(api_key.expose_secret())
            .json(&CreateRecordBody { fields: request.record_fields(), typecast: true })
            .send()
            .await
            .map_err(transport_failure)?;

        if !response.status().is_success() {
            return Err(status_failure(response).await);
        }

        let created: CreatedRecord = response
            .json()
            .await
            .map_err(|error| CollaboratorFailure::Decode(error.to_string()))?;

        let link = record_link(base_id, &self.table, &created.id)?;
        Ok(RecordRef { id: created.id, link: Some(link) })
    }
}

/// Appends percent-encoded path segments to `base`.
fn segment_url(base: &str, segments: &[&str]) -> Result<Url, CollaboratorFailure> {
    let mut url = Url::parse(base)
        .map_err(|error| CollaboratorFailure::Transport(format!("invalid url {base}: {error}")))?;
    url.path_segments_mut()
        .map_err(|_| CollaboratorFailure::Transport(format!("url {base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn record_link(base_id: &str, table: &str, record_id: &str) -> Result<String, CollaboratorFailure> {
    segment_url(RECORD_LINK_BASE, &[base_id, table, record_id]).map(String::from)
}

#[async_trait]
impl RecordStore for AirtableRecordStore {
    async fn create_record(&self, request: &QuoteRequest) -> Result<RecordRef, CollaboratorError> {
        self.create(request)
            .await
            .map_err(|failure| CollaboratorError::new(Collaborator::Airtable, failure))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use intake_core::config::AppConfig;
    use intake_core::{CollaboratorFailure, QuoteRequest, QuoteSubmission, RecordStore};
    use secrecy::SecretString;
    use serde_json::json;

    use crate::adapters::{http_client, stub};

    use super::{record_link, AirtableRecordStore};

    fn request() -> QuoteRequest {
        QuoteRequest::from_submission(QuoteSubmission {
            name: Some("Jane Doe".to_string()),
            phone: Some("760-555-0100".to_string()),
            address: Some("123 Oak St".to_string()),
            service: Some("Mowing".to_string()),
            urgency: None,
            details: Some("Gate code 4521".to_string()),
        })
        .expect("valid request")
    }

    fn store(api_url: &str, api_key: Option<&str>) -> AirtableRecordStore {
        let mut config = AppConfig::default().airtable;
        config.api_key = api_key.map(|key| SecretString::from(key.to_string()));
        config.base_id = Some("appBase".to_string());
        config.table = "Quotes".to_string();
        config.api_url = api_url.to_string();
        AirtableRecordStore::new(http_client(5).expect("client"), &config)
    }

    #[tokio::test]
    async fn creates_record_with_flat_fields_and_new_status() {
        let provider = stub::spawn(
            "/v0/appBase/Quotes",
            StatusCode::OK,
            json!({"id": "recABC", "createdTime": "2026-01-01T00:00:00.000Z", "fields": {}}),
        )
        .await;

        let record = store(&provider.base_url, Some("patKEY"))
            .create_record(&request())
            .await
            .expect("record created");

        assert_eq!(record.id, "recABC");
        assert_eq!(record.link.as_deref(), Some("https://airtable.com/appBase/Quotes/recABC"));

        let captured = provider.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].authorization.as_deref(), Some("Bearer patKEY"));
        let fields = &captured[0].body["fields"];
        assert_eq!(fields["Name"], json!("Jane Doe"));
        assert_eq!(fields["Status"], json!("New"));
        assert_eq!(fields["Service"], json!("Mowing"));
        assert!(fields.get("Urgency").is_none());
    }

    #[tokio::test]
    async fn non_success_status_carries_provider_message() {
        let provider = stub::spawn(
            "/v0/appBase/Quotes",
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"error": {"type": "UNKNOWN_FIELD_NAME", "message": "Unknown field name: \"Urgency\""}}),
        )
        .await;

        let error = store(&provider.base_url, Some("patKEY"))
            .create_record(&request())
            .await
            .expect_err("422 should fail");

        assert_eq!(
            error.failure,
            CollaboratorFailure::Status {
                status: 422,
                message: "Unknown field name: \"Urgency\"".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network_call() {
        let provider = stub::spawn("/v0/appBase/Quotes", StatusCode::OK, json!({"id": "rec"})).await;

        let error = store(&provider.base_url, None)
            .create_record(&request())
            .await
            .expect_err("unconfigured store should fail");

        assert_eq!(error.failure, CollaboratorFailure::NotConfigured("airtable.api_key"));
        assert!(provider.captured().is_empty());
    }

    #[test]
    fn record_link_encodes_table_names() {
        assert_eq!(
            record_link("appBase", "Quote Requests", "rec1").expect("link"),
            "https://airtable.com/appBase/Quote%20Requests/rec1"
        );
    }
}
