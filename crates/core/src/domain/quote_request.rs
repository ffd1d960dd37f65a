use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ValidationError;

/// Status label written with every new record.
pub const NEW_RECORD_STATUS: &str = "New";

/// Raw inbound form body. Every field is optional here so that a missing
/// required field surfaces as a validation failure instead of a decode error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Name,
    Phone,
    Address,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated quote request. `name`, `phone` and `address` are guaranteed
/// non-empty; optional fields are either meaningful text or absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    name: String,
    phone: String,
    address: String,
    service: Option<String>,
    urgency: Option<String>,
    details: Option<String>,
}

impl QuoteRequest {
    pub fn from_submission(submission: QuoteSubmission) -> Result<Self, ValidationError> {
        let name = normalize(submission.name);
        let phone = normalize(submission.phone);
        let address = normalize(submission.address);

        let missing: Vec<RequiredField> = [
            (RequiredField::Name, name.is_none()),
            (RequiredField::Phone, phone.is_none()),
            (RequiredField::Address, address.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, is_missing)| is_missing.then_some(field))
        .collect();

        match (name, phone, address) {
            (Some(name), Some(phone), Some(address)) => Ok(Self {
                name,
                phone,
                address,
                service: normalize(submission.service),
                urgency: normalize(submission.urgency),
                details: normalize(submission.details),
            }),
            _ => Err(ValidationError { missing }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn urgency(&self) -> Option<&str> {
        self.urgency.as_deref()
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Flat field mapping for the record store. Absent optional fields are
    /// left out rather than written as empty strings.
    pub fn record_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("Name".to_string(), Value::from(self.name.as_str()));
        fields.insert("Phone".to_string(), Value::from(self.phone.as_str()));
        fields.insert("Address".to_string(), Value::from(self.address.as_str()));

        for (key, value) in [
            ("Service", self.service()),
            ("Urgency", self.urgency()),
            ("Details", self.details()),
        ] {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::from(value));
            }
        }

        fields.insert("Status".to_string(), Value::from(NEW_RECORD_STATUS));
        fields
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.map(|raw| raw.trim().to_string()).filter(|trimmed| !trimmed.is_empty())
}
