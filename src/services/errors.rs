//! Single entry point for surfacing failures to the user.

use std::sync::Arc;

use crate::forms::validation::{
    FieldMapping, FormFieldSink, FormValidationError, ROOT_FIELD, normalize, route, summarize,
};
use crate::repository::errors::{BackendError, Severity};
use crate::services::notifications::NotificationCenter;

/// How unrouted and routed errors are surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// Emit notifications for errors no form field accepted.
    pub notify: bool,
    /// When every error landed on a field, still emit one summary toast.
    pub summarize_routed: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            notify: true,
            summarize_routed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReport {
    pub errors: Vec<FormValidationError>,
    pub unrouted: Vec<FormValidationError>,
    /// Text suitable for an inline error banner.
    pub message: String,
    pub notified: usize,
}

#[derive(Clone)]
pub struct ErrorNormalizer {
    mapping: FieldMapping,
    notifications: Arc<NotificationCenter>,
}

impl ErrorNormalizer {
    pub fn new(notifications: Arc<NotificationCenter>) -> Self {
        Self {
            mapping: FieldMapping::default(),
            notifications,
        }
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn normalize(&self, error: &BackendError) -> Vec<FormValidationError> {
        normalize(error, &self.mapping)
    }

    /// Banner text for `error` without touching the notification channel.
    pub fn message_for(&self, error: &BackendError) -> String {
        user_message(&self.normalize(error))
    }

    /// Normalizes `error`, places what it can on `form`, and notifies the rest.
    pub fn report(
        &self,
        error: &BackendError,
        form: Option<&dyn FormFieldSink>,
        options: ReportOptions,
    ) -> ErrorReport {
        let errors = self.normalize(error);
        let unrouted = route(errors.clone(), form);

        let notified = if !options.notify {
            0
        } else if !unrouted.is_empty() {
            self.notifications.notify(&unrouted)
        } else if options.summarize_routed && !errors.is_empty() {
            self.notifications.notify(&[summary_error(&errors)])
        } else {
            0
        };

        ErrorReport {
            message: user_message(&errors),
            errors,
            unrouted,
            notified,
        }
    }
}

fn summary_error(errors: &[FormValidationError]) -> FormValidationError {
    let severity = if errors.iter().any(|e| e.severity == Severity::Error) {
        Severity::Error
    } else {
        Severity::Warning
    };
    FormValidationError::server(
        ROOT_FIELD,
        format!("Form has {}", summarize(errors)),
        severity,
    )
}

/// A single error speaks for itself; several are summarized.
pub fn user_message(errors: &[FormValidationError]) -> String {
    match errors {
        [] => "Unexpected error".to_string(),
        [single] => single.message.clone(),
        many => summarize(many),
    }
}
