//! # Pipeline Dashboard
//!
//! Client-side coordination for the sales pipeline dashboard.
//!
//! ## Architecture
//!
//! - **API Client**: `SyncApi` / `AnalyticsApi` traits and their reqwest
//!   implementation
//! - **Sync**: the sync state machine, manual trigger and background polling
//! - **View**: the derived snapshot, each view tagged live or fallback
//! - **Orchestrator**: wires sync completions to view refreshes and
//!   publishes `DashboardEvent`s
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_dashboard::dashboard::{Config, DashboardOrchestrator, DashboardEvent};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let dashboard = DashboardOrchestrator::from_config(Config::from_env()?)?;
//! let mut events = dashboard.subscribe();
//! dashboard.start().await;
//!
//! while let Ok(event) = events.recv().await {
//!     if let DashboardEvent::DataChanged(view) = event {
//!         println!("India MQL→SQL: {:.1}%", view.funnel.value.india.mql_to_sql);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api_client;
pub mod config;
pub mod events;
pub mod orchestrator;
pub mod sync;
pub mod view;

pub use api_client::{AnalyticsApi, ApiClient, SyncApi};
pub use config::Config;
pub use events::DashboardEvent;
pub use orchestrator::DashboardOrchestrator;
pub use sync::{
    CheckOutcome, PollHandle, SyncController, SyncError, SyncEvent, SyncOutcome, SyncPhase,
    SyncState, SyncStats, SyncTrigger,
};
pub use view::{DashboardView, DataSource, Sourced};
