//! Pipeline Dashboard - Main Library
//!
//! Sync coordination and metric derivation for a sales pipeline dashboard
//! backed by a spreadsheet-fed analytics API.
//!
//! # Overview
//!
//! - Keeps the dashboard fresh with background auto-sync polling and an
//!   on-demand manual sync, never running two syncs at once
//! - Derives conversion rates, growth series, gauge attainment and summaries
//!   from the raw counts the API returns
//! - Publishes an immutable, fully derived view on every data change
//!
//! # Module Structure
//!
//! - **`shared`** - API wire types, error types and configuration
//! - **`metrics`** - Pure, synchronous metric derivations
//! - **`dashboard`** - API client, sync controller, view and orchestrator
//!
//! # Usage
//!
//! ```rust,no_run
//! use pipeline_dashboard::dashboard::{Config, DashboardOrchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dashboard = DashboardOrchestrator::from_config(Config::from_env()?)?;
//! let view = dashboard.start().await;
//! println!("US overall conversion: {:.1}%", view.funnel.value.us.overall);
//!
//! dashboard.sync_now().await?;
//! dashboard.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Sync state lives behind `Arc<RwLock<>>` and is only mutated by the sync
//! controller. Views are published as `Arc<DashboardView>` and never mutated.
//! Changes are announced over `broadcast::Sender`.
//!
//! # Error Handling
//!
//! - `shared::error::ApiError` for transport, server and decoding failures
//! - `dashboard::SyncError` for rejected or failed manual syncs
//! - `shared::config::ConfigError` for invalid configuration
//!
//! Background failures never surface as errors: they are recorded in the
//! sync state and the affected views fall back to their last good values.

/// Shared types and data structures
pub mod shared;

/// Metric derivations
pub mod metrics;

/// Dashboard runtime
pub mod dashboard;
