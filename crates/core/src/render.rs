//! Message bodies for the SMS and email notifications.
//!
//! Pure functions of a [`QuoteRequest`] and an optional record link. Absent
//! optional fields never produce a line or table row.

use tera::{Context, Tera};
use thiserror::Error;

use crate::domain::quote_request::QuoteRequest;

const EMAIL_TEMPLATE: &str = "quote_request.html";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
}

#[derive(Clone, Debug)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            EMAIL_TEMPLATE,
            include_str!("../../../templates/email/quote_request.html"),
        )
        .map_err(|error| RenderError::Template(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn sms_text(&self, request: &QuoteRequest, record_link: Option<&str>) -> String {
        let mut lines = vec![
            "New quote request".to_string(),
            format!("Name: {}", request.name()),
            format!("Phone: {}", request.phone()),
            format!("Address: {}", request.address()),
        ];

        for (label, value) in [
            ("Service", request.service()),
            ("Urgency", request.urgency()),
            ("Details", request.details()),
        ] {
            if let Some(value) = value {
                lines.push(format!("{label}: {value}"));
            }
        }

        if let Some(link) = record_link {
            lines.push(format!("Record: {link}"));
        }

        lines.join("\n")
    }

    pub fn email_subject(&self, request: &QuoteRequest) -> String {
        match request.service() {
            Some(service) => format!("New Quote Request: {} ({service})", request.name()),
            None => format!("New Quote Request: {}", request.name()),
        }
    }

    pub fn email_html(
        &self,
        request: &QuoteRequest,
        record_link: Option<&str>,
    ) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("name", request.name());
        context.insert("phone", request.phone());
        context.insert("address", request.address());
        context.insert("service", &request.service());
        context.insert("urgency", &request.urgency());
        context.insert("details", &request.details());
        context.insert("record_link", &record_link);

        self.tera
            .render(EMAIL_TEMPLATE, &context)
            .map_err(|error| RenderError::Template(error.to_string()))
    }
}
