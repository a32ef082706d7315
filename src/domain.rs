//! Domain module - catalog model, selection logic, and job state
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod catalog;
pub mod events;
pub mod job;
pub mod selection;
pub mod services;

// Re-export commonly used items for convenience
pub use catalog::{Category, CategoryId, ProductLine, ProductLineId, SuperCategory, SuperCategoryId};
pub use events::{NotificationLevel, SyncEvent};
pub use job::{CategoryVisibility, JobAccepted, JobControllerState, JobStatus, SyncSelection};
pub use selection::{SelectionState, SelectionTree};
pub use services::{SyncError, SyncService};
