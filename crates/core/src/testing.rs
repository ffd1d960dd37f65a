//! Recording fakes for the collaborator ports.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::quote_request::QuoteRequest;
use crate::errors::{Collaborator, CollaboratorError, CollaboratorFailure};
use crate::ports::{EmailGateway, RecordRef, RecordStore, SmsGateway};

type Calls = Arc<Mutex<Vec<(QuoteRequest, Option<String>)>>>;

fn record_call(calls: &Calls, request: &QuoteRequest, link: Option<&str>) {
    if let Ok(mut calls) = calls.lock() {
        calls.push((request.clone(), link.map(str::to_string)));
    }
}

fn snapshot(calls: &Calls) -> Vec<(QuoteRequest, Option<String>)> {
    calls.lock().map(|calls| calls.clone()).unwrap_or_default()
}

#[derive(Default)]
pub struct FakeRecordStore {
    failure: Option<CollaboratorFailure>,
    record_id: String,
    requests: Arc<Mutex<Vec<QuoteRequest>>>,
}

impl FakeRecordStore {
    /// Succeeds with `record_id` and link `https://airtable.test/{record_id}`.
    pub fn succeeding(record_id: &str) -> Self {
        Self { record_id: record_id.to_string(), ..Self::default() }
    }

    pub fn failing(failure: CollaboratorFailure) -> Self {
        Self { failure: Some(failure), ..Self::default() }
    }

    pub fn requests(&self) -> Vec<QuoteRequest> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn create_record(&self, request: &QuoteRequest) -> Result<RecordRef, CollaboratorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.failure {
            Some(failure) => Err(CollaboratorError::new(Collaborator::Airtable, failure.clone())),
            None => Ok(RecordRef {
                id: self.record_id.clone(),
                link: Some(format!("https://airtable.test/{}", self.record_id)),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeSmsGateway {
    failure: Option<CollaboratorFailure>,
    calls: Calls,
}

impl FakeSmsGateway {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(failure: CollaboratorFailure) -> Self {
        Self { failure: Some(failure), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<(QuoteRequest, Option<String>)> {
        snapshot(&self.calls)
    }
}

#[async_trait]
impl SmsGateway for FakeSmsGateway {
    async fn send_quote_alert(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        record_call(&self.calls, request, record_link);
        match &self.failure {
            Some(failure) => Err(CollaboratorError::new(Collaborator::Sms, failure.clone())),
            None => Ok("text-1".to_string()),
        }
    }
}

#[derive(Default)]
pub struct FakeEmailGateway {
    failure: Option<CollaboratorFailure>,
    calls: Calls,
}

impl FakeEmailGateway {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(failure: CollaboratorFailure) -> Self {
        Self { failure: Some(failure), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<(QuoteRequest, Option<String>)> {
        snapshot(&self.calls)
    }
}

#[async_trait]
impl EmailGateway for FakeEmailGateway {
    async fn send_quote_email(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        record_call(&self.calls, request, record_link);
        match &self.failure {
            Some(failure) => Err(CollaboratorError::new(Collaborator::Email, failure.clone())),
            None => Ok("email-1".to_string()),
        }
    }
}
