use serde::Serialize;

use crate::config::ResponsePolicy;
use crate::intake::{CollaboratorOutcome, DispatchReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAIL")]
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&CollaboratorOutcome> for OutcomeSummary {
    fn from(outcome: &CollaboratorOutcome) -> Self {
        match outcome {
            CollaboratorOutcome::Ok { detail } => {
                Self { status: OutcomeStatus::Ok, detail: detail.clone() }
            }
            CollaboratorOutcome::Failed { reason } => {
                Self { status: OutcomeStatus::Fail, detail: Some(reason.clone()) }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DebugSummary {
    pub airtable: OutcomeSummary,
    pub sms: OutcomeSummary,
    pub email: OutcomeSummary,
}

/// Body returned to the submitter for every valid request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntakeResponse {
    pub success: bool,
    #[serde(rename = "_debug", skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugSummary>,
}

impl IntakeResponse {
    /// Shapes the submitter response. `success` is true under either policy:
    /// collaborator failures never turn into a user-visible error.
    pub fn from_report(policy: ResponsePolicy, report: &DispatchReport) -> Self {
        let debug = match policy {
            ResponsePolicy::Silent => None,
            ResponsePolicy::Diagnostic => Some(DebugSummary {
                airtable: OutcomeSummary::from(&report.airtable),
                sms: OutcomeSummary::from(&report.sms),
                email: OutcomeSummary::from(&report.email),
            }),
        };

        Self { success: true, debug }
    }
}
