use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{CoreError, ValidationError};

/// Warning category attached by the platform itself.
pub const FINPLEX_WARNING: &str = "FinplexWarning";

/// Uniform response envelope for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub results: T,
    pub provider: Option<String>,
    #[serde(default)]
    pub warnings: Vec<Warning>,
    #[serde(default)]
    pub chart: Option<Value>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl<T> Envelope<T> {
    pub fn new(results: T) -> Self {
        Self {
            results,
            provider: None,
            warnings: Vec::new(),
            chart: None,
            extra: Map::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Result<Self, ValidationError> {
        for warning in &warnings {
            warning.validate()?;
        }
        self.warnings.extend(warnings);
        Ok(self)
    }

    pub fn push_warning(&mut self, warning: Warning) -> Result<(), ValidationError> {
        warning.validate()?;
        self.warnings.push(warning);
        Ok(())
    }

    /// Stores `metadata` under `extra.metadata`.
    pub fn with_metadata(mut self, metadata: &EnvelopeMetadata) -> Result<Self, CoreError> {
        self.extra
            .insert(String::from("metadata"), serde_json::to_value(metadata)?);
        Ok(self)
    }

    pub fn metadata(&self) -> Option<EnvelopeMetadata> {
        self.extra
            .get("metadata")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

impl Envelope<Value> {
    /// Results as typed records; a single object is treated as one record.
    pub fn records<D: DeserializeOwned>(&self) -> Result<Vec<D>, CoreError> {
        let items = match &self.results {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        };
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(CoreError::from))
            .collect()
    }
}

/// Non-fatal message carried alongside results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub category: String,
    pub message: String,
}

impl Warning {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Result<Self, ValidationError> {
        let warning = Self {
            category: category.into(),
            message: message.into(),
        };
        warning.validate()?;
        Ok(warning)
    }

    pub fn platform(message: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(FINPLEX_WARNING, message)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category.trim().is_empty() || self.message.trim().is_empty() {
            return Err(ValidationError::EmptyWarning);
        }
        Ok(())
    }
}

/// Request bookkeeping stored in `extra.metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub request_id: String,
    pub route: String,
    pub provider: Option<String>,
    pub duration_ms: u64,
    pub timestamp: String,
}

impl EnvelopeMetadata {
    pub fn new(route: &str, provider: Option<&str>, duration_ms: u64) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            route: route.to_owned(),
            provider: provider.map(str::to_owned),
            duration_ms,
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        }
    }
}

/// Error body returned instead of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub error_kind: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>, error_kind: impl Into<String>) -> Result<Self, ValidationError> {
        let detail = detail.into();
        if detail.trim().is_empty() {
            return Err(ValidationError::EmptyErrorDetail);
        }
        Ok(Self {
            detail,
            error_kind: error_kind.into(),
        })
    }

    pub fn from_error(error: &CoreError) -> Self {
        Self {
            detail: error.to_string(),
            error_kind: error.error_kind().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_serializes_uniform_shape() {
        let envelope = Envelope::new(json!([{"symbol": "AAPL"}]))
            .with_provider("fmp")
            .with_warnings(vec![Warning::platform("dropped 'x'").expect("valid")])
            .expect("warnings are valid");

        let value = serde_json::to_value(&envelope).expect("serializes");
        assert_eq!(value["provider"], json!("fmp"));
        assert_eq!(value["warnings"][0]["category"], json!(FINPLEX_WARNING));
        assert_eq!(value["chart"], Value::Null);
        assert!(value["extra"].is_object());
    }

    #[test]
    fn metadata_round_trips_through_extra() {
        let metadata = EnvelopeMetadata::new("/equity/calendar/dividend", Some("fmp"), 12);
        let envelope = Envelope::new(json!([]))
            .with_metadata(&metadata)
            .expect("metadata serializes");

        assert_eq!(envelope.metadata(), Some(metadata));
        assert!(Uuid::parse_str(&envelope.metadata().expect("present").request_id).is_ok());
    }

    #[test]
    fn rejects_empty_warnings_and_details() {
        assert!(matches!(
            Warning::platform(" "),
            Err(ValidationError::EmptyWarning)
        ));
        assert!(matches!(
            ErrorResponse::new("", "X"),
            Err(ValidationError::EmptyErrorDetail)
        ));
    }

    #[test]
    fn error_response_uses_error_kind() {
        let response = ErrorResponse::from_error(&CoreError::EmptyResults);
        assert_eq!(response.error_kind, "EmptyResults");
        assert_eq!(response.detail, "no results found");
    }
}
