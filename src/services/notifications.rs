//! Process-wide notification channel with duplicate suppression.
//!
//! One [`NotificationCenter`] is shared by every view. Each emitted message
//! leaves a [`ToastRecord`] behind; while the record is alive any message
//! with the same dedupe key is swallowed. Records expire after the cooldown
//! and are purged lazily against the injected [`Clock`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::TOAST_COOLDOWN;
use crate::forms::validation::FormValidationError;
use crate::repository::errors::Severity;
use crate::runtime::clock::{Clock, TokioClock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Error,
    Warning,
}

impl From<Severity> for NotificationKind {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Error => NotificationKind::Error,
            Severity::Warning => NotificationKind::Warning,
        }
    }
}

/// Destination of user-facing notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);
}

/// Writes notifications to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Error => log::error!("{message}"),
            NotificationKind::Warning => log::warn!("{message}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastRecord {
    pub dedupe_key: String,
    pub expires_at: Instant,
}

pub struct NotificationCenter {
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    active: Mutex<HashMap<String, Instant>>,
}

impl NotificationCenter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            clock: Arc::new(TokioClock),
            cooldown: TOAST_COOLDOWN,
            active: Mutex::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    fn active(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Emits every error whose dedupe key is not already on screen and
    /// returns how many were emitted.
    pub fn notify(&self, errors: &[FormValidationError]) -> usize {
        let now = self.clock.now();
        let fresh: Vec<&FormValidationError> = {
            let mut active = self.active();
            active.retain(|_, expires_at| *expires_at > now);
            errors
                .iter()
                .filter(|error| {
                    let key = error.dedupe_key();
                    if active.contains_key(&key) {
                        log::debug!("Suppressing duplicate notification `{key}`");
                        return false;
                    }
                    active.insert(key, now + self.cooldown);
                    true
                })
                .collect()
        };

        // The sink may call back into this center.
        for error in &fresh {
            self.sink.notify(&error.message, error.severity.into());
        }
        fresh.len()
    }

    /// Drops expired records, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut active = self.active();
        let before = active.len();
        active.retain(|_, expires_at| *expires_at > now);
        before - active.len()
    }

    pub fn is_active(&self, dedupe_key: &str) -> bool {
        let now = self.clock.now();
        self.active()
            .get(dedupe_key)
            .is_some_and(|expires_at| *expires_at > now)
    }

    /// Live records ordered by expiry.
    pub fn records(&self) -> Vec<ToastRecord> {
        let now = self.clock.now();
        let mut records: Vec<ToastRecord> = self
            .active()
            .iter()
            .filter(|(_, expires_at)| **expires_at > now)
            .map(|(key, expires_at)| ToastRecord {
                dedupe_key: key.clone(),
                expires_at: *expires_at,
            })
            .collect();
        records.sort_by(|a, b| {
            a.expires_at
                .cmp(&b.expires_at)
                .then_with(|| a.dedupe_key.cmp(&b.dedupe_key))
        });
        records
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::runtime::clock::ManualClock;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) seen: Mutex<Vec<(String, NotificationKind)>>,
    }

    impl RecordingSink {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, message: &str, kind: NotificationKind) {
            self.seen.lock().unwrap().push((message.to_string(), kind));
        }
    }

    fn center() -> (NotificationCenter, Arc<RecordingSink>, Arc<ManualClock>) {
        let sink = Arc::new(RecordingSink::default());
        let clock = Arc::new(ManualClock::default());
        let center = NotificationCenter::new(sink.clone()).with_clock(clock.clone());
        (center, sink, clock)
    }

    fn required() -> FormValidationError {
        FormValidationError::server("name", "Required", Severity::Error)
    }

    #[test]
    fn duplicates_within_cooldown_are_suppressed() {
        let (center, sink, clock) = center();

        assert_eq!(center.notify(&[required()]), 1);
        clock.advance(Duration::from_secs(4));
        assert_eq!(center.notify(&[required()]), 0);

        assert_eq!(sink.messages(), vec!["Required"]);
    }

    #[test]
    fn same_message_notifies_again_after_cooldown() {
        let (center, sink, clock) = center();

        center.notify(&[required()]);
        clock.advance(Duration::from_secs(5));
        center.notify(&[required()]);

        assert_eq!(sink.messages(), vec!["Required", "Required"]);
    }

    #[test]
    fn duplicates_inside_one_batch_collapse() {
        let (center, sink, _) = center();

        let emitted = center.notify(&[required(), required()]);

        assert_eq!(emitted, 1);
        assert_eq!(sink.messages().len(), 1);
    }

    #[test]
    fn key_includes_field() {
        let (center, sink, _) = center();
        let other_field = FormValidationError::server("batch", "Required", Severity::Warning);

        center.notify(&[required(), other_field]);

        let seen = sink.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1, NotificationKind::Warning);
    }

    /// Sink that inspects the center it is attached to.
    struct ReentrantSink {
        center: std::sync::OnceLock<std::sync::Weak<NotificationCenter>>,
        seen: Mutex<Vec<(String, bool)>>,
    }

    impl NotificationSink for ReentrantSink {
        fn notify(&self, message: &str, _kind: NotificationKind) {
            let active = self
                .center
                .get()
                .and_then(std::sync::Weak::upgrade)
                .is_some_and(|center| center.is_active(&format!("name-{message}")));
            self.seen.lock().unwrap().push((message.to_string(), active));
        }
    }

    #[test]
    fn sink_can_call_back_into_the_center() {
        let sink = Arc::new(ReentrantSink {
            center: std::sync::OnceLock::new(),
            seen: Mutex::default(),
        });
        let center = Arc::new(
            NotificationCenter::new(sink.clone()).with_clock(Arc::new(ManualClock::default())),
        );
        sink.center.set(Arc::downgrade(&center)).unwrap();

        assert_eq!(center.notify(&[required()]), 1);

        assert_eq!(
            *sink.seen.lock().unwrap(),
            vec![("Required".to_string(), true)]
        );
    }

    #[test]
    fn purge_removes_only_expired_records() {
        let (center, _, clock) = center();

        center.notify(&[required()]);
        clock.advance(Duration::from_secs(3));
        center.notify(&[FormValidationError::server("root", "Later", Severity::Error)]);
        clock.advance(Duration::from_secs(2));

        assert_eq!(center.purge_expired(), 1);
        assert!(!center.is_active("name-Required"));
        assert!(center.is_active("root-Later"));
        assert_eq!(center.records().len(), 1);
    }
}
