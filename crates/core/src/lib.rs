//! Quote intake core: the validated request model, the collaborator ports,
//! message rendering and the fan-out dispatcher.
//!
//! HTTP concerns (routing, CORS, the concrete Airtable/Textbelt/Resend
//! adapters) live in `intake-server`.

pub mod config;
pub mod domain;
pub mod errors;
pub mod intake;
pub mod ports;
pub mod render;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use domain::quote_request::{QuoteRequest, QuoteSubmission, RequiredField};
pub use errors::{
    Collaborator, CollaboratorError, CollaboratorFailure, IntakeError, InterfaceError,
    ValidationError,
};
pub use intake::{CollaboratorOutcome, DispatchReport, IntakeDispatcher, IntakeResponse};
pub use ports::{EmailGateway, RecordRef, RecordStore, SmsGateway};
pub use render::{RenderError, TemplateRenderer};
