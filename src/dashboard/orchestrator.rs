//! # Dashboard Orchestrator
//!
//! Owns the sync controller and the derived view. On start it fetches every
//! analytics view once, then refreshes them whenever a sync lands new data,
//! whether the sync was started by background polling or by the user.
//!
//! Refreshes are serialized and each one replaces the whole view, so a
//! consumer never observes a half-updated dashboard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::dashboard::api_client::{AnalyticsApi, ApiClient, SyncApi};
use crate::dashboard::config::Config;
use crate::dashboard::events::{broadcast_event, DashboardEvent};
use crate::dashboard::sync::{
    PollHandle, SyncController, SyncError, SyncEvent, SyncOutcome, SyncState, SyncStats,
};
use crate::dashboard::view::{DashboardView, Fetched, RawViews};
use crate::metrics::{BucketKey, FunnelSnapshot, GrowthSeries};
use crate::shared::api_types::DealFilters;
use crate::shared::error::ApiError;

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Default)]
struct Snapshot {
    raw: Option<RawViews>,
    view: Option<Arc<DashboardView>>,
}

/// Dashboard orchestrator
pub struct DashboardOrchestrator {
    analytics: Arc<dyn AnalyticsApi>,
    controller: SyncController,
    config: Config,
    snapshot: RwLock<Snapshot>,
    deal_filters: RwLock<DealFilters>,
    /// Serializes refreshes
    refresh_lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    events: broadcast::Sender<DashboardEvent>,
    poller: Mutex<Option<PollHandle>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for DashboardOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardOrchestrator")
            .field("controller", &self.controller)
            .field("generation", &self.generation())
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}

impl DashboardOrchestrator {
    pub fn new(
        sync_api: Arc<dyn SyncApi>,
        analytics: Arc<dyn AnalyticsApi>,
        config: Config,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            analytics,
            controller: SyncController::new(sync_api),
            config,
            snapshot: RwLock::new(Snapshot::default()),
            deal_filters: RwLock::new(DealFilters::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            events,
            poller: Mutex::new(None),
            listener: Mutex::new(None),
        })
    }

    /// Build an orchestrator talking to the configured HTTP API
    pub fn from_config(config: Config) -> Result<Arc<Self>, ApiError> {
        let client = Arc::new(ApiClient::new(config.clone())?);
        Ok(Self::new(client.clone(), client, config))
    }

    /// Fetch the initial view, then follow sync events and start polling if
    /// enabled. Calling it again only refreshes.
    pub async fn start(self: &Arc<Self>) -> Arc<DashboardView> {
        self.spawn_listener();
        let view = self.refresh().await;
        if self.config.polling_enabled() {
            self.set_polling_enabled(true);
        } else {
            tracing::info!("Background polling disabled by configuration");
        }
        view
    }

    /// Stop polling and event forwarding. Checks already in flight settle on
    /// their own.
    pub fn shutdown(&self) {
        self.stop_polling();
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
        tracing::info!("Dashboard shut down");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    /// Run a manual sync. Dependent views refresh once it lands.
    pub async fn sync_now(&self) -> Result<SyncOutcome, SyncError> {
        self.controller.trigger_sync().await
    }

    /// Start or stop background polling. Disabling leaves the sync state
    /// untouched.
    pub fn set_polling_enabled(&self, enabled: bool) {
        if !enabled {
            self.stop_polling();
            return;
        }

        let mut poller = lock(&self.poller);
        if poller.as_ref().map(PollHandle::is_active).unwrap_or(false) {
            return;
        }
        *poller = Some(self.controller.start_polling(
            self.config.poll_interval(),
            |outcome| {
                tracing::debug!(
                    records = outcome.records_synced,
                    "Polling observed new data ({})",
                    outcome.trigger
                );
            },
        ));
    }

    /// No-op when polling never started
    pub fn stop_polling(&self) {
        if let Some(handle) = lock(&self.poller).take() {
            handle.stop();
        }
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.poller)
            .as_ref()
            .map(PollHandle::is_active)
            .unwrap_or(false)
    }

    pub async fn sync_state(&self) -> SyncState {
        self.controller.state().await
    }

    pub async fn sync_stats(&self) -> SyncStats {
        self.controller.stats().await
    }

    /// Current view, `None` before the first refresh
    pub async fn view(&self) -> Option<Arc<DashboardView>> {
        self.snapshot.read().await.view.clone()
    }

    pub async fn funnel(&self) -> Option<FunnelSnapshot> {
        self.view().await.map(|view| view.funnel.value)
    }

    /// Totals growth for one bucket
    pub async fn growth(&self, bucket: BucketKey) -> Option<GrowthSeries> {
        self.view()
            .await
            .and_then(|view| view.growth(bucket).cloned())
    }

    /// Number of refreshes completed
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn deal_filters(&self) -> DealFilters {
        self.deal_filters.read().await.clone()
    }

    /// Change the deal filters and refresh
    pub async fn set_deal_filters(&self, filters: DealFilters) -> Arc<DashboardView> {
        *self.deal_filters.write().await = filters;
        self.refresh().await
    }

    /// Re-fetch every view and replace the dashboard snapshot.
    ///
    /// Never fails: a view whose fetch fails keeps its previous value, tagged
    /// as fallback.
    pub async fn refresh(&self) -> Arc<DashboardView> {
        let _guard = self.refresh_lock.lock().await;
        let filters = self.deal_filters().await;
        let api = &self.analytics;

        let (
            sync_status,
            lead_funnel,
            mql_sql,
            pipeline,
            ae_performance,
            regional,
            filter_options,
            deals,
        ) = tokio::join!(
            api.sync_status(),
            api.lead_funnel(),
            api.mql_sql(),
            api.pipeline(),
            api.ae_performance(),
            api.regional(),
            api.filter_options(),
            api.deals(&filters),
        );
        let fetched = Fetched {
            sync_status,
            lead_funnel,
            mql_sql,
            pipeline,
            ae_performance,
            regional,
            filter_options,
            deals,
        };

        let view = {
            let mut snapshot = self.snapshot.write().await;
            let raw = RawViews::merge(snapshot.raw.as_ref(), fetched, Utc::now());
            let view = Arc::new(DashboardView::derive(&raw));
            snapshot.raw = Some(raw);
            snapshot.view = Some(view.clone());
            view
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let fallbacks = view.fallback_views();
        if fallbacks.is_empty() {
            tracing::info!(generation, "Dashboard refreshed");
        } else {
            tracing::warn!(generation, "Dashboard refreshed with fallback data for {:?}", fallbacks);
        }
        for (bucket, channel) in view.normalised_channels() {
            tracing::warn!("{} channel {} did not match the date axis", bucket, channel);
        }

        broadcast_event(&self.events, DashboardEvent::DataChanged(view.clone()));
        view
    }

    fn spawn_listener(self: &Arc<Self>) {
        let mut listener = lock(&self.listener);
        if listener.as_ref().map(|task| !task.is_finished()).unwrap_or(false) {
            return;
        }

        let mut sync_events = self.controller.subscribe();
        let this: Weak<Self> = Arc::downgrade(self);

        *listener = Some(tokio::spawn(async move {
            loop {
                let event = match sync_events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Dashboard missed {} sync events", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(orchestrator) = this.upgrade() else {
                    break;
                };
                match event {
                    SyncEvent::StateChanged(state) => {
                        broadcast_event(&orchestrator.events, DashboardEvent::SyncStateChanged(state));
                    }
                    SyncEvent::DataChanged(outcome) => {
                        tracing::info!(
                            records = outcome.records_synced,
                            "New data synced ({}), refreshing views",
                            outcome.trigger
                        );
                        orchestrator.refresh().await;
                    }
                }
            }
            tracing::debug!("Dashboard event listener exited");
        }));
    }
}

impl Drop for DashboardOrchestrator {
    fn drop(&mut self) {
        self.stop_polling();
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
    }
}

/// Lock a std mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
