//! Normalization of backend and local validation failures into form errors.
//!
//! Three backend shapes are accepted (see [`BackendError`]) and all of them
//! come out as a flat list of [`FormValidationError`]s whose field names have
//! been translated through a [`FieldMapping`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

use crate::repository::errors::{BackendError, Severity};

/// Field used for failures that do not belong to any input.
pub const ROOT_FIELD: &str = "root";

/// Where a form error originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorOrigin {
    Server,
    Client,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormValidationError {
    pub field: String,
    pub message: String,
    #[serde(rename = "type")]
    pub origin: ErrorOrigin,
    pub severity: Severity,
}

impl FormValidationError {
    pub fn server(field: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            field: field.into(),
            message: message.into().trim().to_string(),
            origin: ErrorOrigin::Server,
            severity,
        }
    }

    pub fn client(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into().trim().to_string(),
            origin: ErrorOrigin::Client,
            severity: Severity::Error,
        }
    }

    /// Identity used to suppress repeated notifications.
    pub fn dedupe_key(&self) -> String {
        format!("{}-{}", self.field, self.message)
    }
}

/// Translation from backend keys to UI field names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(HashMap<String, String>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend_key: impl Into<String>, field: impl Into<String>) -> Self {
        self.0.insert(backend_key.into(), field.into());
        self
    }

    /// Returns the UI field for `key`, or `key` itself when unmapped.
    pub fn translate(&self, key: &str) -> String {
        self.0
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

impl From<HashMap<String, String>> for FieldMapping {
    fn from(value: HashMap<String, String>) -> Self {
        Self(value)
    }
}

/// Converts any backend failure into form errors.
pub fn normalize(error: &BackendError, mapping: &FieldMapping) -> Vec<FormValidationError> {
    match error {
        BackendError::Validation(errors) => errors
            .iter()
            .map(|e| FormValidationError::server(mapping.translate(&e.key), &e.error_message, e.severity))
            .collect(),
        BackendError::FieldMessages(fields) => fields
            .iter()
            .flat_map(|(key, messages)| {
                let field = mapping.translate(key);
                messages.iter().map(move |message| {
                    FormValidationError::server(field.clone(), message, Severity::Error)
                })
            })
            .collect(),
        other => vec![FormValidationError::server(
            ROOT_FIELD,
            other.to_string(),
            Severity::Error,
        )],
    }
}

/// Converts locally detected `validator` failures into form errors.
pub fn normalize_local(errors: &ValidationErrors, mapping: &FieldMapping) -> Vec<FormValidationError> {
    let fields: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({})", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();

    fields
        .into_iter()
        .flat_map(|(key, messages)| {
            let field = mapping.translate(&key);
            messages
                .into_iter()
                .map(move |message| FormValidationError::client(field.clone(), message))
        })
        .collect()
}

/// Payload delivered to a form field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub origin: ErrorOrigin,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("field `{0}` is not part of the active form")]
pub struct FieldRejected(pub String);

/// Receives errors addressed to individual form fields.
pub trait FormFieldSink {
    fn set_error(&self, field: &str, error: &FieldError) -> Result<(), FieldRejected>;
}

/// Delivers each error to `sink` and returns those that could not be placed.
pub fn route(
    errors: Vec<FormValidationError>,
    sink: Option<&dyn FormFieldSink>,
) -> Vec<FormValidationError> {
    let Some(sink) = sink else {
        return errors;
    };

    errors
        .into_iter()
        .filter(|error| {
            let payload = FieldError {
                origin: error.origin,
                message: error.message.clone(),
            };
            match sink.set_error(&error.field, &payload) {
                Ok(()) => false,
                Err(rejected) => {
                    log::debug!("Keeping error unrouted: {rejected}");
                    true
                }
            }
        })
        .collect()
}

/// Counts errors and warnings, e.g. `"2 errors and 1 warning"`.
pub fn summarize(errors: &[FormValidationError]) -> String {
    let count = |severity| errors.iter().filter(|e| e.severity == severity).count();
    let plural = |n: usize, word: &str| {
        if n == 1 {
            format!("1 {word}")
        } else {
            format!("{n} {word}s")
        }
    };

    let parts: Vec<String> = [
        (count(Severity::Error), "error"),
        (count(Severity::Warning), "warning"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, word)| plural(n, word))
    .collect();

    parts.join(" and ")
}

/// In-memory field sink for a form with a fixed set of inputs.
#[derive(Debug, Default)]
pub struct FieldErrorBag {
    fields: HashSet<String>,
    errors: Mutex<BTreeMap<String, Vec<FieldError>>>,
}

impl FieldErrorBag {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            errors: Mutex::default(),
        }
    }

    pub fn errors_for(&self, field: &str) -> Vec<FieldError> {
        self.errors
            .lock()
            .map(|errors| errors.get(field).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.clear();
        }
    }
}

impl FormFieldSink for FieldErrorBag {
    fn set_error(&self, field: &str, error: &FieldError) -> Result<(), FieldRejected> {
        if !self.fields.contains(field) {
            return Err(FieldRejected(field.to_string()));
        }
        let mut errors = self
            .errors
            .lock()
            .map_err(|_| FieldRejected(field.to_string()))?;
        errors.entry(field.to_string()).or_default().push(error.clone());
        Ok(())
    }
}
