//! Domain services
//!
//! Service boundaries that abstract the network operations the orchestrator
//! depends on. Implementations live in the infrastructure layer.

pub mod sync_service;

// Re-export from services directory
pub use sync_service::{SyncError, SyncService};
