//! Event types for real-time communication with the frontend
//!
//! Defines the events emitted by the orchestrator for user-facing display:
//! notifications for start/stop outcomes plus job lifecycle markers.
//! Transient poll failures are deliberately never surfaced here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Events emitted by the sync orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// User-facing message (snackbar/toast material).
    Notification {
        id: String,
        level: NotificationLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// A sync job was submitted and accepted by the backend.
    JobStarted { timestamp: DateTime<Utc> },
    /// A stop was requested; termination is confirmed by a later poll tick.
    JobStopRequested { timestamp: DateTime<Utc> },
    /// A poll tick reported the job as no longer running.
    JobFinished { timestamp: DateTime<Utc> },
}

impl SyncEvent {
    /// Event name used for routing/logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            SyncEvent::Notification { .. } => "sync-notification",
            SyncEvent::JobStarted { .. } => "sync-job-started",
            SyncEvent::JobStopRequested { .. } => "sync-job-stop-requested",
            SyncEvent::JobFinished { .. } => "sync-job-finished",
        }
    }

    /// Build a notification event with a fresh id.
    pub fn notification(level: NotificationLevel, message: impl Into<String>) -> Self {
        SyncEvent::Notification {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn job_started() -> Self {
        SyncEvent::JobStarted { timestamp: Utc::now() }
    }

    pub fn job_stop_requested() -> Self {
        SyncEvent::JobStopRequested { timestamp: Utc::now() }
    }

    pub fn job_finished() -> Self {
        SyncEvent::JobFinished { timestamp: Utc::now() }
    }
}
