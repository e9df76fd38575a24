//! Shared Module
//!
//! Types shared between the sync core, the metrics engine and the API
//! client: wire types for the analytics API, the error taxonomy and the
//! application configuration.

/// Request/response bodies of the analytics API
pub mod api_types;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use api_types::{
    AutoSyncResponse, BucketData, DealFilters, LeadFunnelResponse, MqlSqlResponse,
    SyncResponse, SyncStatusResponse,
};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::ApiError;
