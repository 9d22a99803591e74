//! Trailing-edge debouncing on top of tokio timers.
//!
//! A [`Debouncer`] owns at most one armed timer task. Scheduling a new value
//! aborts the armed task before arming a fresh one, so a burst of calls
//! commits exactly once with its last value, while two bursts separated by
//! more than the delay commit twice.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

type Commit<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct Debouncer<T> {
    delay: Duration,
    commit: Commit<T>,
    pending: Option<JoinHandle<()>>,
    disposed: bool,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    /// Creates a debouncer that calls `commit` once `delay` has passed
    /// without a newer [`schedule`](Self::schedule).
    pub fn new<F>(delay: Duration, commit: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            commit: Arc::new(commit),
            pending: None,
            disposed: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value with `value` and restarts the quiet period.
    ///
    /// Must be called from within a tokio runtime. Ignored after
    /// [`dispose`](Self::dispose).
    pub fn schedule(&mut self, value: T) {
        if self.disposed {
            log::debug!("Ignoring schedule on a disposed debouncer");
            return;
        }

        self.cancel();

        let commit = Arc::clone(&self.commit);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            commit(value);
        }));
    }

    /// Drops the pending value without committing it. Returns whether a timer
    /// was still armed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Cancels pending work and refuses any further scheduling.
    pub fn dispose(&mut self) {
        self.cancel();
        self.disposed = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::time::{Instant, sleep};

    use super::*;

    type Log = Arc<Mutex<Vec<(String, Instant)>>>;

    fn recording(delay_ms: u64) -> (Debouncer<String>, Log) {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        let debouncer = Debouncer::new(Duration::from_millis(delay_ms), move |value: String| {
            sink.lock().unwrap().push((value, Instant::now()));
        });
        (debouncer, log)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_commits_once_with_last_value() {
        let (mut debouncer, log) = recording(300);
        let start = Instant::now();

        for text in ["a", "ab", "abc"] {
            debouncer.schedule(text.to_string());
            sleep(Duration::from_millis(50)).await;
        }

        // Last input at t=100; nothing may fire before t=400.
        sleep(Duration::from_millis(245)).await;
        assert!(log.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(10)).await;
        let commits = log.lock().unwrap().clone();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].0, "abc");
        let fired_after = commits[0].1 - start;
        assert!(fired_after >= Duration::from_millis(400));
        assert!(fired_after < Duration::from_millis(405));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_bursts_commit_twice() {
        let (mut debouncer, log) = recording(300);

        debouncer.schedule("first".to_string());
        sleep(Duration::from_millis(350)).await;
        debouncer.schedule("second".to_string());
        sleep(Duration::from_millis(350)).await;

        let values: Vec<String> = log.lock().unwrap().iter().map(|(v, _)| v.clone()).collect();
        assert_eq!(values, vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_after_dispose() {
        let (mut debouncer, log) = recording(300);

        debouncer.schedule("pending".to_string());
        sleep(Duration::from_millis(100)).await;
        debouncer.dispose();
        debouncer.schedule("late".to_string());
        sleep(Duration::from_secs(2)).await;

        assert!(log.lock().unwrap().is_empty());
        assert!(debouncer.is_disposed());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels_pending_commit() {
        let (mut debouncer, log) = recording(300);

        debouncer.schedule("dropped".to_string());
        drop(debouncer);
        sleep(Duration::from_secs(1)).await;

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_armed_timer() {
        let (mut debouncer, log) = recording(300);

        assert!(!debouncer.cancel());
        debouncer.schedule("x".to_string());
        assert!(debouncer.cancel());
        sleep(Duration::from_secs(1)).await;

        assert!(log.lock().unwrap().is_empty());
    }
}
