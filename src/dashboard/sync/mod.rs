//! # Sync Controller
//!
//! Keeps the dashboard's data fresh against the remote spreadsheet.
//!
//! ## Architecture
//!
//! - **Sync State**: the `Idle / Checking / Syncing / Error` machine
//! - **Scheduler**: fixed-interval polling with an idempotent stop
//! - **Stats**: attempt counters and timings
//!
//! A single `RwLock<SyncState>` guards the machine. Every operation claims it
//! with one check-and-set (`Idle | Error` to an in-flight phase), so a manual
//! trigger and a background check can never overlap: whichever arrives second
//! is rejected (`SyncError::Busy`) or skipped (`CheckOutcome::Skipped`).
//!
//! Background failures are absorbed into the state and never returned as
//! errors. Manual failures are returned to the caller as well.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pipeline_dashboard::dashboard::{ApiClient, Config, SyncController};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ApiClient::new(Config::new())?);
//! let controller = SyncController::new(client);
//!
//! let poller = controller.start_polling(Duration::from_secs(30), |outcome| {
//!     println!("{} records landed", outcome.records_synced);
//! });
//!
//! controller.trigger_sync().await?;
//! poller.stop();
//! # Ok(())
//! # }
//! ```

pub mod scheduler;
pub mod stats;
pub mod sync_state;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::Instrument;
use uuid::Uuid;

use crate::dashboard::api_client::SyncApi;
use crate::dashboard::events::broadcast_event;
use crate::shared::api_types::AutoSyncResponse;
use crate::shared::error::ApiError;

pub use scheduler::{ChangeHandler, PollHandle};
pub use stats::SyncStats;
pub use sync_state::{SyncPhase, SyncState};

const EVENT_CAPACITY: usize = 64;

/// What started a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// A background check found the sheet changed
    Automatic,
    /// The user asked for it
    Manual,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => f.write_str("automatic"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// A sync that landed records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub records_synced: u64,
    pub last_sync: DateTime<Utc>,
    pub trigger: SyncTrigger,
}

/// Result of one background check. Checks never fail outward.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Another operation owned the state
    Skipped,
    /// Nothing new on the server
    Unchanged,
    /// New records landed
    Changed(SyncOutcome),
    /// The check failed; the message is also in `SyncState::last_error`
    Failed(String),
}

/// Errors returned to a manual trigger
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    #[error("A sync operation is already in progress ({phase})")]
    Busy { phase: SyncPhase },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SyncError {
    /// Text suitable for the dashboard's error banner
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy { .. } => self.to_string(),
            Self::Api(e) => e.user_message(),
        }
    }
}

/// Events published by the controller
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Any visible change to the sync state
    StateChanged(SyncState),
    /// A sync landed records; dependent views should refresh
    DataChanged(SyncOutcome),
}

struct Inner {
    api: Arc<dyn SyncApi>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    events: broadcast::Sender<SyncEvent>,
}

/// Sync controller
///
/// Cheap to clone; all clones share one state machine.
#[derive(Clone)]
pub struct SyncController {
    inner: Arc<Inner>,
}

impl fmt::Debug for SyncController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncController")
            .field("subscribers", &self.inner.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl SyncController {
    pub fn new(api: Arc<dyn SyncApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                api,
                state: RwLock::new(SyncState::default()),
                stats: RwLock::new(SyncStats::new()),
                events,
            }),
        }
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> SyncState {
        self.inner.state.read().await.clone()
    }

    pub async fn stats(&self) -> SyncStats {
        self.inner.stats.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Ask the server to sync if the sheet changed.
    ///
    /// Skipped when another operation is in flight. Failures land in the
    /// state as `Error` and are logged, never returned.
    pub async fn check_and_sync(&self) -> CheckOutcome {
        let attempt_id = Uuid::new_v4();
        let span = tracing::debug_span!("sync_check", %attempt_id);

        async move {
            if let Err(phase) = self.begin(SyncPhase::Checking).await {
                tracing::debug!("Skipping check, {} in progress", phase);
                self.inner.stats.write().await.record_skip();
                return CheckOutcome::Skipped;
            }
            self.inner.stats.write().await.record_start();

            match self.inner.api.auto_sync().await {
                Ok(response) => self.apply_check(response).await,
                Err(e) => {
                    let message = e.user_message();
                    tracing::warn!("Auto-sync check failed: {}", e);
                    self.fail(&message).await;
                    CheckOutcome::Failed(message)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run an unconditional sync now.
    ///
    /// Rejected with `SyncError::Busy` while another operation is in flight;
    /// otherwise starts from `Idle` or `Error`.
    pub async fn trigger_sync(&self) -> Result<SyncOutcome, SyncError> {
        let attempt_id = Uuid::new_v4();
        let span = tracing::info_span!("manual_sync", %attempt_id);

        async move {
            if let Err(phase) = self.begin(SyncPhase::Syncing).await {
                tracing::debug!("Manual sync rejected, {} in progress", phase);
                self.inner.stats.write().await.record_skip();
                return Err(SyncError::Busy { phase });
            }
            self.inner.stats.write().await.record_start();

            match self.inner.api.sync().await {
                Ok(response) => {
                    let outcome = SyncOutcome {
                        records_synced: response.records_synced,
                        last_sync: response.last_sync,
                        trigger: SyncTrigger::Manual,
                    };
                    self.land(&outcome, None).await;
                    Ok(outcome)
                }
                Err(e) => {
                    tracing::error!("Manual sync failed: {}", e);
                    self.fail(&e.user_message()).await;
                    Err(SyncError::Api(e))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Poll `check_and_sync` every `interval`, first check immediately.
    ///
    /// `on_changed` runs on the polling task for every sync that lands
    /// records, manual ones included, until the handle is stopped.
    pub fn start_polling<F>(&self, interval: Duration, on_changed: F) -> PollHandle
    where
        F: Fn(&SyncOutcome) + Send + Sync + 'static,
    {
        scheduler::spawn_poller(self.clone(), interval, Box::new(on_changed))
    }

    async fn begin(&self, next: SyncPhase) -> Result<(), SyncPhase> {
        let snapshot = {
            let mut state = self.inner.state.write().await;
            state.begin(next)?;
            state.clone()
        };
        self.publish(SyncEvent::StateChanged(snapshot));
        Ok(())
    }

    async fn apply_check(&self, response: AutoSyncResponse) -> CheckOutcome {
        let now = Utc::now();

        if response.synced {
            let (outcome, snapshot) = {
                let mut state = self.inner.state.write().await;
                state.last_checked_at = Some(now);
                if state.transition(SyncPhase::Syncing).is_err() {
                    tracing::warn!("Check settled from unexpected phase {}", state.phase);
                }
                let outcome = SyncOutcome {
                    records_synced: response
                        .records_synced
                        .or(response.records_count)
                        .unwrap_or(state.records_synced),
                    last_sync: response.last_sync.unwrap_or(now),
                    trigger: SyncTrigger::Automatic,
                };
                (outcome, state.clone())
            };
            self.publish(SyncEvent::StateChanged(snapshot));
            self.land(&outcome, response.error).await;
            return CheckOutcome::Changed(outcome);
        }

        let snapshot = {
            let mut state = self.inner.state.write().await;
            state.last_checked_at = Some(now);
            if let Some(last_sync) = response.last_sync {
                let records = response.records_count.unwrap_or(state.records_synced);
                state.record_sync(last_sync, records);
            }
            match &response.error {
                Some(message) => state.fail(message.clone()),
                None => state.finish(),
            }
            state.clone()
        };
        self.publish(SyncEvent::StateChanged(snapshot));

        match response.error {
            Some(message) => {
                tracing::warn!("Auto-sync reported an error: {}", message);
                self.inner.stats.write().await.record_failure();
                CheckOutcome::Failed(message)
            }
            None => {
                tracing::debug!("No changes on the server");
                self.inner.stats.write().await.record_unchanged();
                CheckOutcome::Unchanged
            }
        }
    }

    /// Record landed records and settle the operation
    async fn land(&self, outcome: &SyncOutcome, error: Option<String>) {
        let snapshot = {
            let mut state = self.inner.state.write().await;
            state.record_sync(outcome.last_sync, outcome.records_synced);
            match &error {
                Some(message) => state.fail(message.clone()),
                None => state.finish(),
            }
            state.clone()
        };

        tracing::info!(
            records = outcome.records_synced,
            trigger = %outcome.trigger,
            "Synced {} records",
            outcome.records_synced
        );
        if let Some(message) = &error {
            tracing::warn!("Sync landed with an error: {}", message);
        }

        self.inner.stats.write().await.record_changed();
        self.publish(SyncEvent::StateChanged(snapshot));
        self.publish(SyncEvent::DataChanged(outcome.clone()));
    }

    async fn fail(&self, message: &str) {
        let snapshot = {
            let mut state = self.inner.state.write().await;
            state.fail(message);
            state.clone()
        };
        self.inner.stats.write().await.record_failure();
        self.publish(SyncEvent::StateChanged(snapshot));
    }

    fn publish(&self, event: SyncEvent) {
        broadcast_event(&self.inner.events, event);
    }
}
