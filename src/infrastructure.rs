//! Infrastructure layer for configuration, logging, and backend access
//!
//! Concrete adapters behind the domain service boundaries: the HTTP client
//! for the store backend, configuration persistence, and logging setup.

pub mod config;
pub mod http_sync_service;
pub mod logging;

// Re-export commonly used items
pub use config::{ConfigManager, LoggingConfig, PresetConfig, SyncConfig};
pub use http_sync_service::HttpSyncService;
pub use logging::{get_log_directory, init_logging};
