//! Sync service boundary
//!
//! Contract to the store backend that actually owns the refresh job. The
//! orchestrator only starts, observes, and stops the job; the actual
//! synchronization work against the exchange happens server-side.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::{CategoryId, SuperCategory};
use crate::domain::job::{CategoryVisibility, JobAccepted, JobStatus, SyncSelection};

/// Errors surfaced by sync service operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network unreachable, timeout, or other transport-level failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend declined the request (e.g. a job is already running).
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The controller was driven from a state that does not allow the call.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

/// Network operations for job control and catalog access.
#[async_trait]
pub trait SyncService: Send + Sync {
    /// Fetch the catalog tree (super-categories with nested product lines
    /// and categories).
    async fn fetch_catalog_tree(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<SuperCategory>, SyncError>;

    /// Submit a refresh job scoped to the given selection.
    async fn start_job(&self, selection: &SyncSelection) -> Result<JobAccepted, SyncError>;

    /// Query the current job status.
    async fn get_job_status(&self) -> Result<JobStatus, SyncError>;

    /// Request that the running job halts. Termination is only confirmed by
    /// a later status query.
    async fn stop_job(&self) -> Result<JobAccepted, SyncError>;

    /// Show or hide a category in the catalog. Mutates catalog data, not
    /// job state; consumed by the presentation layer directly.
    async fn toggle_category_visibility(
        &self,
        category_id: CategoryId,
    ) -> Result<CategoryVisibility, SyncError>;
}
