//! Payload validation at registration.
//!
//! Upstream layers are expected to schema-check payloads; the registry only
//! enforces the fields its own lifecycle depends on.

use serde::{Deserialize, Serialize};

/// Outcome of validating a payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the payload passed
    pub valid: bool,
    /// Problems found
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// A passing report.
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing report.
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates a payload against a named schema.
pub trait PayloadValidator: Send + Sync {
    /// Validate `payload` for `schema_name` (`"decision"` or `"proposal"`).
    fn validate(&self, payload: &serde_json::Value, schema_name: &str) -> ValidationReport;
}

/// Requires a JSON object carrying a fixed set of top-level fields on
/// decision payloads. Proposal payloads are accepted as-is.
#[derive(Clone, Debug)]
pub struct RequiredFieldsValidator {
    fields: Vec<String>,
}

impl RequiredFieldsValidator {
    /// Require `fields` on decision payloads.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl Default for RequiredFieldsValidator {
    fn default() -> Self {
        Self::new(vec![
            "type".to_string(),
            "content".to_string(),
            "metadata".to_string(),
        ])
    }
}

impl PayloadValidator for RequiredFieldsValidator {
    fn validate(&self, payload: &serde_json::Value, schema_name: &str) -> ValidationReport {
        if schema_name != "decision" {
            return ValidationReport::ok();
        }
        let object = match payload.as_object() {
            Some(object) => object,
            None => return ValidationReport::failed(vec!["payload must be an object".to_string()]),
        };
        let errors = self
            .fields
            .iter()
            .filter(|field| !object.contains_key(field.as_str()))
            .map(|field| format!("missing required field '{}'", field))
            .collect();
        ValidationReport::failed(errors)
    }
}
