//! Job status and selection types shared with the frontend
//!
//! `JobStatus` is owned by the backend; the client only ever holds a
//! read-only snapshot refreshed on each poll tick.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::catalog::{CategoryId, ProductLineId};

/// Snapshot of the backend refresh job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JobStatus {
    pub is_running: bool,
    /// Name of the category currently being refreshed, if any.
    pub current_category: Option<String>,
    /// Name of the item currently being refreshed, if any.
    pub current_item: Option<String>,
    /// Append-only backend log lines, oldest first.
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Which part of the catalog a sync job should operate on.
///
/// Category and product-line selection are independent axes; empty on both
/// axes means "sync everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncSelection {
    pub category_ids: Vec<CategoryId>,
    pub product_line_ids: Vec<ProductLineId>,
}

impl SyncSelection {
    pub fn is_empty(&self) -> bool {
        self.category_ids.is_empty() && self.product_line_ids.is_empty()
    }
}

/// Lifecycle of the client-side job controller.
///
/// `Idle` is reachable from every other state; the session simply ends
/// there. Transitions are driven only by controller operations and poll
/// ticks, never by optimistic local updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum JobControllerState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
}

impl std::fmt::Display for JobControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobControllerState::Idle => write!(f, "Idle"),
            JobControllerState::Starting => write!(f, "Starting"),
            JobControllerState::Running => write!(f, "Running"),
            JobControllerState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Backend acknowledgement for start/stop requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAccepted {
    pub accepted: bool,
    pub message: Option<String>,
}

/// Result of toggling a category's visibility in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryVisibility {
    pub is_active: bool,
}
