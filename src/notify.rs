//! Notification sink
//!
//! Success and failure surfacing for the presentation layer. Calls are
//! fire-and-forget: the core never inspects a return value.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Success,
    Error,
    Info,
}

/// One user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub status: NotificationStatus,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: NotificationStatus::Success,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: NotificationStatus::Error,
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: NotificationStatus::Info,
        }
    }
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as log events
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.status {
            NotificationStatus::Error => {
                error!(title = %n.title, description = %n.description, "Notification")
            }
            _ => info!(
                title = %n.title,
                description = %n.description,
                status = ?n.status,
                "Notification"
            ),
        }
    }
}

/// Keeps every notification in memory. Used by the CLI to print results and
/// by tests to assert on what the user would have seen.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// Remove and return everything received so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }

    pub fn count(&self, status: NotificationStatus) -> usize {
        self.received
            .lock()
            .iter()
            .filter(|n| n.status == status)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier() {
        let sink = RecordingNotifier::new();
        sink.notify(Notification::success("Done", "School deactivated"));
        sink.notify(Notification::error("Failed", "timeout"));

        assert_eq!(sink.count(NotificationStatus::Success), 1);
        assert_eq!(sink.count(NotificationStatus::Error), 1);
        assert_eq!(sink.notifications()[0].description, "School deactivated");

        assert_eq!(sink.drain().len(), 2);
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn test_tracing_notifier_does_not_panic() {
        TracingNotifier.notify(Notification::info("Hello", "world"));
    }
}
