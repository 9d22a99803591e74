use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Severity of a validation message.
///
/// Serialized as `"error"` / `"warning"`; the backend's numeric encoding is
/// handled by [`severity_code`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// Numeric severity codes used by the backend: `0` is an error, `1` a warning.
pub mod severity_code {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::Severity;

    pub fn serialize<S: Serializer>(value: &Severity, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match value {
            Severity::Error => 0,
            Severity::Warning => 1,
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Severity, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Severity::Error),
            1 => Ok(Severity::Warning),
            other => Err(D::Error::custom(format!("unknown severity code {other}"))),
        }
    }
}

/// A single field-keyed validation message as received from the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub key: String,
    pub error_message: String,
    #[serde(with = "severity_code", default)]
    pub severity: Severity,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            key: key.into(),
            error_message: message.into(),
            severity,
        }
    }
}

/// Failure reported by an order backend collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// Flat list of `{key, errorMessage, severity}` records.
    #[error("validation failed with {} message(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Field name mapped to its messages; every message is an error.
    #[error("validation failed for {} field(s)", .0.len())]
    FieldMessages(BTreeMap<String, Vec<String>>),

    /// Single top-level message.
    #[error("{0}")]
    Message(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

const MESSAGE_KEYS: [&str; 4] = ["message", "title", "detail", "error"];

impl BackendError {
    /// Detects which of the supported failure shapes a JSON error body uses.
    ///
    /// Recognized shapes, in order: an `errors` list of validation records, an
    /// `errors` object mapping fields to one or many messages, a bare list of
    /// validation records, and a top-level `message`/`title`/`detail`/`error`
    /// string. Anything else becomes a generic message.
    pub fn from_json(body: &Value) -> Self {
        if let Some(errors) = body.get("errors") {
            if let Some(shape) = Self::from_errors_value(errors) {
                return shape;
            }
        }

        if body.is_array() {
            if let Some(shape) = Self::from_errors_value(body) {
                return shape;
            }
        }

        if let Some(message) = MESSAGE_KEYS
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .or_else(|| body.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
        {
            return BackendError::Message(message.to_string());
        }

        BackendError::Message("Unexpected error".to_string())
    }

    fn from_errors_value(errors: &Value) -> Option<Self> {
        match errors {
            Value::Array(items) => {
                let list: Vec<ValidationError> = items
                    .iter()
                    .filter_map(|item| match ValidationError::deserialize(item) {
                        Ok(error) => Some(error),
                        Err(e) => {
                            log::warn!("Skipping malformed validation record {item}: {e}");
                            None
                        }
                    })
                    .collect();
                (!list.is_empty()).then_some(BackendError::Validation(list))
            }
            Value::Object(map) => {
                let fields: BTreeMap<String, Vec<String>> = map
                    .iter()
                    .map(|(field, messages)| {
                        let messages = match messages {
                            Value::String(s) => vec![s.clone()],
                            Value::Array(items) => items
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect(),
                            _ => Vec::new(),
                        };
                        (field.clone(), messages)
                    })
                    .filter(|(_, messages)| !messages.is_empty())
                    .collect();
                (!fields.is_empty()).then_some(BackendError::FieldMessages(fields))
            }
            _ => None,
        }
    }
}
