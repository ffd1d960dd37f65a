//! Quote intake fan-out.
//!
//! A validated [`QuoteRequest`] is handed to the record store, the SMS
//! gateway and the email gateway. Every call is attempted exactly once and
//! the dispatcher waits for all of them to settle; a failure in one never
//! cancels or rolls back the others.

pub mod response;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::DispatchMode;
use crate::domain::quote_request::QuoteRequest;
use crate::errors::{Collaborator, CollaboratorError};
use crate::ports::{EmailGateway, RecordRef, RecordStore, SmsGateway};

pub use response::{IntakeResponse, OutcomeStatus, OutcomeSummary};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollaboratorOutcome {
    Ok { detail: Option<String> },
    Failed { reason: String },
}

impl CollaboratorOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Settled outcome of one fan-out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub airtable: CollaboratorOutcome,
    pub sms: CollaboratorOutcome,
    pub email: CollaboratorOutcome,
}

impl DispatchReport {
    pub fn outcome(&self, collaborator: Collaborator) -> &CollaboratorOutcome {
        match collaborator {
            Collaborator::Airtable => &self.airtable,
            Collaborator::Sms => &self.sms,
            Collaborator::Email => &self.email,
        }
    }

    pub fn failed_count(&self) -> usize {
        Collaborator::ALL
            .into_iter()
            .filter(|collaborator| !self.outcome(*collaborator).is_ok())
            .count()
    }
}

#[derive(Clone)]
pub struct IntakeDispatcher {
    record_store: Arc<dyn RecordStore>,
    sms: Arc<dyn SmsGateway>,
    email: Arc<dyn EmailGateway>,
    mode: DispatchMode,
}

impl IntakeDispatcher {
    pub fn new(
        record_store: Arc<dyn RecordStore>,
        sms: Arc<dyn SmsGateway>,
        email: Arc<dyn EmailGateway>,
        mode: DispatchMode,
    ) -> Self {
        Self { record_store, sms, email, mode }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub async fn dispatch(&self, request: &QuoteRequest, correlation_id: &str) -> DispatchReport {
        match self.mode {
            DispatchMode::Concurrent => {
                let (record, sms, email) = tokio::join!(
                    self.record_store.create_record(request),
                    self.sms.send_quote_alert(request, None),
                    self.email.send_quote_email(request, None),
                );

                DispatchReport {
                    airtable: settle_record(record, correlation_id),
                    sms: settle(Collaborator::Sms, sms, correlation_id),
                    email: settle(Collaborator::Email, email, correlation_id),
                }
            }
            DispatchMode::RecordFirst => {
                let record = self.record_store.create_record(request).await;
                let link = record.as_ref().ok().and_then(|created| created.link.clone());

                let (sms, email) = tokio::join!(
                    self.sms.send_quote_alert(request, link.as_deref()),
                    self.email.send_quote_email(request, link.as_deref()),
                );

                DispatchReport {
                    airtable: settle_record(record, correlation_id),
                    sms: settle(Collaborator::Sms, sms, correlation_id),
                    email: settle(Collaborator::Email, email, correlation_id),
                }
            }
        }
    }
}

fn settle_record(
    result: Result<RecordRef, CollaboratorError>,
    correlation_id: &str,
) -> CollaboratorOutcome {
    settle(Collaborator::Airtable, result.map(|record| record.id), correlation_id)
}

fn settle(
    collaborator: Collaborator,
    result: Result<String, CollaboratorError>,
    correlation_id: &str,
) -> CollaboratorOutcome {
    match result {
        Ok(detail) => {
            info!(
                event_name = "intake.collaborator.succeeded",
                correlation_id,
                collaborator = collaborator.as_str(),
                detail = %detail,
                "collaborator call succeeded"
            );
            CollaboratorOutcome::Ok { detail: Some(detail).filter(|value| !value.is_empty()) }
        }
        Err(error) => {
            warn!(
                event_name = "intake.collaborator.failed",
                correlation_id,
                collaborator = collaborator.as_str(),
                error = %error.failure,
                "collaborator call failed"
            );
            CollaboratorOutcome::Failed { reason: error.failure.to_string() }
        }
    }
}
