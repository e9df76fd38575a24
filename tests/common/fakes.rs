//! In-memory fakes of the API traits
//!
//! `FakeSyncApi` can be gated so that calls block until the test releases
//! them, which makes in-flight operations observable.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use tokio::sync::Semaphore;

use pipeline_dashboard::dashboard::{AnalyticsApi, SyncApi, SyncController, SyncPhase};
use pipeline_dashboard::shared::api_types::{
    AePerformance, BucketData, DealFilters, DealsResponse, FilterOptions, PipelineMetrics,
    RegionalMetrics, StageMetrics,
};
use pipeline_dashboard::shared::{
    ApiError, AutoSyncResponse, LeadFunnelResponse, MqlSqlResponse, SyncResponse,
    SyncStatusResponse,
};

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
}

pub fn unchanged_check() -> AutoSyncResponse {
    AutoSyncResponse {
        synced: false,
        last_sync: None,
        records_synced: None,
        records_count: None,
        error: None,
    }
}

pub fn changed_check(records: u64) -> AutoSyncResponse {
    AutoSyncResponse {
        synced: true,
        last_sync: Some(fixed_time()),
        records_synced: Some(records),
        records_count: None,
        error: None,
    }
}

pub struct FakeSyncApi {
    auto: Mutex<Result<AutoSyncResponse, ApiError>>,
    manual: Mutex<Result<SyncResponse, ApiError>>,
    gated: bool,
    gate: Semaphore,
    auto_calls: AtomicUsize,
    manual_calls: AtomicUsize,
}

impl FakeSyncApi {
    /// Checks report no change; manual syncs land 10 records
    pub fn new() -> Self {
        Self {
            auto: Mutex::new(Ok(unchanged_check())),
            manual: Mutex::new(Ok(SyncResponse {
                status: Some("success".to_string()),
                records_synced: 10,
                last_sync: fixed_time(),
            })),
            gated: false,
            gate: Semaphore::new(0),
            auto_calls: AtomicUsize::new(0),
            manual_calls: AtomicUsize::new(0),
        }
    }

    /// Every call blocks until `release` hands it a permit
    pub fn gated() -> Self {
        Self {
            gated: true,
            ..Self::new()
        }
    }

    pub fn set_auto(&self, response: Result<AutoSyncResponse, ApiError>) {
        *self.auto.lock().unwrap() = response;
    }

    pub fn set_manual(&self, response: Result<SyncResponse, ApiError>) {
        *self.manual.lock().unwrap() = response;
    }

    pub fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    pub fn auto_calls(&self) -> usize {
        self.auto_calls.load(Ordering::SeqCst)
    }

    pub fn manual_calls(&self) -> usize {
        self.manual_calls.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        if self.gated {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl SyncApi for FakeSyncApi {
    async fn auto_sync(&self) -> Result<AutoSyncResponse, ApiError> {
        self.auto_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.auto.lock().unwrap().clone()
    }

    async fn sync(&self) -> Result<SyncResponse, ApiError> {
        self.manual_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.manual.lock().unwrap().clone()
    }
}

/// Channels `{A: [10, 20], B: [5, 0]}` over `[W1, W2]`
pub fn scenario_bucket() -> BucketData {
    let mut channels = IndexMap::new();
    channels.insert("A".to_string(), vec![10, 20]);
    channels.insert("B".to_string(), vec![5, 0]);
    BucketData {
        channels,
        dates: vec!["W1".to_string(), "W2".to_string()],
        totals: vec![15, 20],
    }
}

pub fn sample_lead_funnel() -> LeadFunnelResponse {
    LeadFunnelResponse {
        mql_india: 200,
        sql_india: 50,
        deals_india: 10,
        mql_us: 80,
        sql_us: 0,
        deals_us: 0,
        ..Default::default()
    }
}

pub fn sample_pipeline() -> PipelineMetrics {
    let mut stages = IndexMap::new();
    stages.insert("Proposal".to_string(), StageMetrics { count: 3, value: 300_000.0 });
    stages.insert("SAL".to_string(), StageMetrics { count: 1, value: 50_000.0 });
    PipelineMetrics {
        total_deals: 4,
        total_value: 350_000.0,
        avg_deal_size: 87_500.0,
        win_rate: 25.0,
        stages,
    }
}

pub struct FakeAnalyticsApi {
    lead_funnel: Mutex<LeadFunnelResponse>,
    mql_sql: Mutex<MqlSqlResponse>,
    failing: Mutex<HashSet<&'static str>>,
    last_deal_filters: Mutex<Option<DealFilters>>,
    refreshes: AtomicUsize,
}

impl FakeAnalyticsApi {
    pub fn new() -> Self {
        Self {
            lead_funnel: Mutex::new(sample_lead_funnel()),
            mql_sql: Mutex::new(MqlSqlResponse {
                mql_india: Some(scenario_bucket()),
                ..Default::default()
            }),
            failing: Mutex::new(HashSet::new()),
            last_deal_filters: Mutex::new(None),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn set_lead_funnel(&self, funnel: LeadFunnelResponse) {
        *self.lead_funnel.lock().unwrap() = funnel;
    }

    /// Make one view's endpoint fail (or succeed again)
    pub fn set_failing(&self, view: &'static str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(view);
        } else {
            set.remove(view);
        }
    }

    /// Number of times the lead funnel was fetched
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn last_deal_filters(&self) -> Option<DealFilters> {
        self.last_deal_filters.lock().unwrap().clone()
    }

    fn check(&self, view: &'static str) -> Result<(), ApiError> {
        if self.failing.lock().unwrap().contains(view) {
            Err(ApiError::transport("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AnalyticsApi for FakeAnalyticsApi {
    async fn sync_status(&self) -> Result<SyncStatusResponse, ApiError> {
        self.check("sync_status")?;
        Ok(SyncStatusResponse {
            status: Some("success".to_string()),
            last_sync: Some(fixed_time()),
            records_synced: 120,
            error: None,
        })
    }

    async fn lead_funnel(&self) -> Result<LeadFunnelResponse, ApiError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.check("lead_funnel")?;
        Ok(self.lead_funnel.lock().unwrap().clone())
    }

    async fn mql_sql(&self) -> Result<MqlSqlResponse, ApiError> {
        self.check("mql_sql")?;
        Ok(self.mql_sql.lock().unwrap().clone())
    }

    async fn pipeline(&self) -> Result<PipelineMetrics, ApiError> {
        self.check("pipeline")?;
        Ok(sample_pipeline())
    }

    async fn ae_performance(&self) -> Result<Vec<AePerformance>, ApiError> {
        self.check("ae_performance")?;
        Ok(vec![
            AePerformance {
                ae_name: "Priya".to_string(),
                total_deals: 2,
                total_value: 100_000.0,
                ..Default::default()
            },
            AePerformance {
                ae_name: "Marcus".to_string(),
                total_deals: 2,
                total_value: 250_000.0,
                ..Default::default()
            },
        ])
    }

    async fn regional(&self) -> Result<Vec<RegionalMetrics>, ApiError> {
        self.check("regional")?;
        Ok(vec![
            RegionalMetrics {
                region: "India".to_string(),
                total_deals: 1,
                total_value: 50_000.0,
                avg_deal_size: 50_000.0,
            },
            RegionalMetrics {
                region: "US".to_string(),
                total_deals: 3,
                total_value: 300_000.0,
                avg_deal_size: 100_000.0,
            },
        ])
    }

    async fn filter_options(&self) -> Result<FilterOptions, ApiError> {
        self.check("filters")?;
        Ok(FilterOptions {
            aes: vec!["Marcus".to_string(), "Priya".to_string()],
            regions: vec!["India".to_string(), "US".to_string()],
            ..Default::default()
        })
    }

    async fn deals(&self, filters: &DealFilters) -> Result<DealsResponse, ApiError> {
        *self.last_deal_filters.lock().unwrap() = Some(filters.clone());
        self.check("deals")?;
        Ok(DealsResponse::default())
    }
}

/// Yield until the controller reaches `phase`
pub async fn wait_for_phase(controller: &SyncController, phase: SyncPhase) {
    for _ in 0..1_000 {
        if controller.state().await.phase == phase {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("controller never reached {}", phase);
}
