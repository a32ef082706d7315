//! Application layer module
//!
//! Orchestration logic: the polling loop, the job controller state machine,
//! and the event emitter that feeds user-facing notifications.

pub mod events;
pub mod job_controller;
pub mod poller;

// Re-export commonly used items
pub use events::EventEmitter;
pub use job_controller::JobController;
pub use poller::{JobStatusPoller, StatusCallback};
