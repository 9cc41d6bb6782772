//! Locally simulated technician notifications.
//!
//! Nothing leaves the process: "sending" an email or in-app notice means
//! publishing a [`Notification`] that any interested view can pick up.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// How a technician is told about an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Asynchronous, trackable and resendable. Used for contractors.
    Email,
    /// Instant in-system notice with no delivery tracking.
    AppNotification,
}

/// Why a notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Assigned,
    Resent,
}

/// A notification addressed to a technician about a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub job_id: String,
    pub technician_id: String,
    pub channel: NotificationChannel,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        job_id: &str,
        technician_id: &str,
        channel: NotificationChannel,
        kind: NotificationKind,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            technician_id: technician_id.to_string(),
            channel,
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts notifications to subscribers. Fire-and-forget.
#[derive(Clone)]
pub struct NotificationBroadcaster {
    sender: Arc<broadcast::Sender<Notification>>,
}

impl NotificationBroadcaster {
    /// Creates a broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a notification to all subscribers.
    pub fn send(&self, notification: Notification) {
        log::info!(
            "Notifying {} of job {} via {:?} ({:?})",
            notification.technician_id,
            notification.job_id,
            notification.channel,
            notification.kind
        );
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(notification);
    }

    /// Creates a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
