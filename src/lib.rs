//! CEX Sync - background catalog synchronization orchestrator
//!
//! This crate drives the long-running product refresh against the external
//! exchange ("CEX"): tri-state selection over the catalog tree, job
//! start/stop, and poll-driven status convergence against the store backend.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;

// Re-export the main entry points for easier access
pub use application::job_controller::JobController;
pub use application::poller::JobStatusPoller;
pub use domain::selection::SelectionTree;
pub use domain::services::SyncService;
