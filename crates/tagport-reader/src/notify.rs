//! Notification sinks.

use crate::traits::NotificationSink;
use std::sync::{Mutex, PoisonError};
use tagport_core::{Notification, Severity};
use tracing::{error, info, warn};

/// Writes notifications to the log, with the level following the severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let sticky = notification.sticky;
        let message = notification.message;
        match notification.severity {
            Severity::Info | Severity::Success => info!(sticky, "{message}"),
            Severity::Warning => warn!(sticky, "{message}"),
            Severity::Danger => error!(sticky, "{message}"),
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drain and return the recorded notifications.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification::info("one"));
        notifier.notify(Notification::warning("two").sticky());

        assert_eq!(notifier.count(), 2);
        let last = notifier.last().unwrap();
        assert_eq!(last.severity, Severity::Warning);
        assert!(last.sticky);

        let drained = notifier.take();
        assert_eq!(drained.len(), 2);
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_tracing_notifier_accepts_every_severity() {
        let notifier = TracingNotifier;
        notifier.notify(Notification::info("info"));
        notifier.notify(Notification::success("success"));
        notifier.notify(Notification::warning("warning"));
        notifier.notify(Notification::danger("danger"));
    }
}
