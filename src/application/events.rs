//! Event emission system for real-time communication with the frontend
//!
//! Centralized emitter the orchestrator uses to push notifications and job
//! lifecycle events to whoever is listening. Emission never blocks and a
//! missing subscriber is not an error.

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::events::{NotificationLevel, SyncEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Event emitter for sending real-time updates to the frontend.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventEmitter {
    /// Create a new event emitter.
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to the event stream. Slow subscribers that fall more than
    /// the channel capacity behind see `RecvError::Lagged` and skip ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: SyncEvent) {
        let event_name = event.event_name();
        match self.tx.send(event) {
            Ok(count) => debug!("emitted {} to {} subscriber(s)", event_name, count),
            Err(_) => debug!("no subscribers for {}", event_name),
        }
    }

    /// Emit an informational user-facing notification.
    pub fn notify_info(&self, message: impl Into<String>) {
        self.emit(SyncEvent::notification(NotificationLevel::Info, message));
    }

    /// Emit an error notification.
    pub fn notify_error(&self, message: impl Into<String>) {
        self.emit(SyncEvent::notification(NotificationLevel::Error, message));
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
