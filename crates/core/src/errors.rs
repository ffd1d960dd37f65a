use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::quote_request::RequiredField;

pub const VALIDATION_USER_MESSAGE: &str = "Name, phone, and address are required.";
pub const INTERNAL_USER_MESSAGE: &str = "Something went wrong. Please call us instead.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("missing required fields: {}", join_fields(.missing))]
pub struct ValidationError {
    pub missing: Vec<RequiredField>,
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields.iter().map(RequiredField::as_str).collect::<Vec<_>>().join(", ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Airtable,
    Sms,
    Email,
}

impl Collaborator {
    pub const ALL: [Collaborator; 3] = [Self::Airtable, Self::Sms, Self::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Airtable => "airtable",
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorFailure {
    #[error("not configured: {0} is missing")]
    NotConfigured(&'static str),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("provider rejected the request: {0}")]
    Rejected(String),
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("could not render message body: {0}")]
    Render(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{collaborator} call failed: {failure}")]
pub struct CollaboratorError {
    pub collaborator: Collaborator,
    pub failure: CollaboratorFailure,
}

impl CollaboratorError {
    pub fn new(collaborator: Collaborator, failure: CollaboratorFailure) -> Self {
        Self { collaborator, failure }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unhandled failure: {0}")]
    Unhandled(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => VALIDATION_USER_MESSAGE,
            Self::Internal { .. } => INTERNAL_USER_MESSAGE,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl IntakeError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Validation(error) => {
                InterfaceError::BadRequest { message: error.to_string(), correlation_id }
            }
            Self::Unhandled(message) => InterfaceError::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::quote_request::RequiredField;
    use crate::errors::{
        Collaborator, CollaboratorError, CollaboratorFailure, IntakeError, InterfaceError,
        ValidationError,
    };

    #[test]
    fn validation_error_maps_to_bad_request_with_fixed_message() {
        let interface = IntakeError::from(ValidationError {
            missing: vec![RequiredField::Name, RequiredField::Address],
        })
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref message, .. } if message.contains("name, address")
        ));
        assert_eq!(interface.correlation_id(), "req-1");
        assert_eq!(interface.user_message(), "Name, phone, and address are required.");
    }

    #[test]
    fn unhandled_error_maps_to_internal_with_call_us_message() {
        let interface =
            IntakeError::Unhandled("expected value at line 1".to_owned()).into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "Something went wrong. Please call us instead.");
    }

    #[test]
    fn collaborator_error_names_collaborator_and_reason() {
        let error = CollaboratorError::new(
            Collaborator::Sms,
            CollaboratorFailure::Rejected("Out of quota".to_owned()),
        );

        assert_eq!(error.to_string(), "sms call failed: provider rejected the request: Out of quota");
    }
}
