//! # Dashboard View
//!
//! The derived, read-only snapshot a consumer renders. Each view carries a
//! [`DataSource`] tag: `Live` when the last refresh fetched it, `Fallback`
//! when the fetch failed and the previous value (or the empty default) is
//! shown instead.
//!
//! Derivation is pure: the same [`RawViews`] always produce an equal
//! [`DashboardView`], so repeating a refresh with unchanged data is
//! indistinguishable from doing it once.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::{
    rank_account_executives, regional_breakdown, stage_breakdown, AeRanking, Attainment,
    BucketKey, BucketTable, FunnelSnapshot, GrowthSeries, RegionShare, StageShare,
};
use crate::shared::api_types::{
    AePerformance, DealsResponse, FilterOptions, LeadFunnelResponse, MqlSqlResponse,
    PipelineMetrics, RegionalMetrics, SyncStatusResponse,
};
use crate::shared::error::ApiError;

/// Where a view's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Fallback,
}

/// A value tagged with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
    /// When the value was last fetched live
    pub fetched_at: Option<DateTime<Utc>>,
    /// Why the latest fetch failed, for fallback values
    pub error: Option<String>,
}

impl<T: Default> Default for Sourced<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            source: DataSource::Fallback,
            fetched_at: None,
            error: None,
        }
    }
}

impl<T> Sourced<T> {
    pub fn live(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self {
            value,
            source: DataSource::Live,
            fetched_at: Some(fetched_at),
            error: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == DataSource::Live
    }

    /// Derive a new value, keeping the provenance
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Sourced<U> {
        Sourced {
            value: f(&self.value),
            source: self.source,
            fetched_at: self.fetched_at,
            error: self.error.clone(),
        }
    }
}

impl<T: Clone + Default> Sourced<T> {
    /// Combine a fetch result with the previous value: success is live,
    /// failure keeps the last good value (or the default) as a fallback.
    pub fn merge(previous: Option<&Sourced<T>>, result: Result<T, ApiError>, now: DateTime<Utc>) -> Self {
        match result {
            Ok(value) => Self::live(value, now),
            Err(e) => {
                let mut fallback = previous.cloned().unwrap_or_default();
                fallback.source = DataSource::Fallback;
                fallback.error = Some(e.user_message());
                fallback
            }
        }
    }
}

/// Results of one round of fetches
#[derive(Debug)]
pub struct Fetched {
    pub sync_status: Result<SyncStatusResponse, ApiError>,
    pub lead_funnel: Result<LeadFunnelResponse, ApiError>,
    pub mql_sql: Result<MqlSqlResponse, ApiError>,
    pub pipeline: Result<PipelineMetrics, ApiError>,
    pub ae_performance: Result<Vec<AePerformance>, ApiError>,
    pub regional: Result<Vec<RegionalMetrics>, ApiError>,
    pub filter_options: Result<FilterOptions, ApiError>,
    pub deals: Result<DealsResponse, ApiError>,
}

/// Raw API responses as of the last refresh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawViews {
    pub sync_status: Sourced<SyncStatusResponse>,
    pub lead_funnel: Sourced<LeadFunnelResponse>,
    pub mql_sql: Sourced<MqlSqlResponse>,
    pub pipeline: Sourced<PipelineMetrics>,
    pub ae_performance: Sourced<Vec<AePerformance>>,
    pub regional: Sourced<Vec<RegionalMetrics>>,
    pub filter_options: Sourced<FilterOptions>,
    pub deals: Sourced<DealsResponse>,
}

impl RawViews {
    pub fn merge(previous: Option<&RawViews>, fetched: Fetched, now: DateTime<Utc>) -> Self {
        Self {
            sync_status: Sourced::merge(previous.map(|p| &p.sync_status), fetched.sync_status, now),
            lead_funnel: Sourced::merge(previous.map(|p| &p.lead_funnel), fetched.lead_funnel, now),
            mql_sql: Sourced::merge(previous.map(|p| &p.mql_sql), fetched.mql_sql, now),
            pipeline: Sourced::merge(previous.map(|p| &p.pipeline), fetched.pipeline, now),
            ae_performance: Sourced::merge(
                previous.map(|p| &p.ae_performance),
                fetched.ae_performance,
                now,
            ),
            regional: Sourced::merge(previous.map(|p| &p.regional), fetched.regional, now),
            filter_options: Sourced::merge(
                previous.map(|p| &p.filter_options),
                fetched.filter_options,
                now,
            ),
            deals: Sourced::merge(previous.map(|p| &p.deals), fetched.deals, now),
        }
    }
}

/// Everything a dashboard renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub sync_status: Sourced<SyncStatusResponse>,
    pub lead_funnel: Sourced<LeadFunnelResponse>,
    /// Conversion rates recomputed from the counts
    pub funnel: Sourced<FunnelSnapshot>,
    pub buckets: Sourced<BTreeMap<BucketKey, BucketTable>>,
    pub pipeline: Sourced<PipelineMetrics>,
    pub stages: Sourced<Vec<StageShare>>,
    pub regions: Sourced<Vec<RegionShare>>,
    pub account_executives: Sourced<Vec<AeRanking>>,
    pub filter_options: Sourced<FilterOptions>,
    pub deals: Sourced<DealsResponse>,
}

impl DashboardView {
    pub fn derive(raw: &RawViews) -> Self {
        Self {
            sync_status: raw.sync_status.clone(),
            lead_funnel: raw.lead_funnel.clone(),
            funnel: raw.lead_funnel.map(FunnelSnapshot::from_counts),
            buckets: raw.mql_sql.map(|response| {
                BucketKey::ALL
                    .into_iter()
                    .map(|key| {
                        let table = match key.select(response) {
                            Some(data) => BucketTable::from_bucket(key, data),
                            None => BucketTable::empty(key),
                        };
                        (key, table)
                    })
                    .collect()
            }),
            pipeline: raw.pipeline.clone(),
            stages: raw.pipeline.map(stage_breakdown),
            regions: raw.regional.map(|regions| regional_breakdown(regions)),
            account_executives: raw.ae_performance.map(|aes| rank_account_executives(aes)),
            filter_options: raw.filter_options.clone(),
            deals: raw.deals.clone(),
        }
    }

    pub fn bucket(&self, key: BucketKey) -> Option<&BucketTable> {
        self.buckets.value.get(&key)
    }

    /// Period-over-period growth of a bucket's totals
    pub fn growth(&self, key: BucketKey) -> Option<&GrowthSeries> {
        self.bucket(key).map(|table| &table.totals_growth)
    }

    pub fn channel_growth(&self, key: BucketKey, channel: &str) -> Option<&GrowthSeries> {
        self.bucket(key).and_then(|table| table.growth(channel))
    }

    /// Pipeline value against a target
    pub fn pipeline_attainment(&self, target: f64) -> Attainment {
        Attainment::new(self.pipeline.value.total_value, target)
    }

    /// Names of views currently showing fallback data
    pub fn fallback_views(&self) -> Vec<&'static str> {
        [
            ("sync_status", self.sync_status.source),
            ("lead_funnel", self.lead_funnel.source),
            ("mql_sql", self.buckets.source),
            ("pipeline", self.pipeline.source),
            ("ae_performance", self.account_executives.source),
            ("regional", self.regions.source),
            ("filters", self.filter_options.source),
            ("deals", self.deals.source),
        ]
        .into_iter()
        .filter(|(_, source)| *source == DataSource::Fallback)
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_fully_live(&self) -> bool {
        self.fallback_views().is_empty()
    }

    /// `(bucket, channel)` pairs whose rows were padded or truncated
    pub fn normalised_channels(&self) -> Vec<(BucketKey, &str)> {
        self.buckets
            .value
            .iter()
            .flat_map(|(key, table)| {
                table
                    .normalised_channels
                    .iter()
                    .map(move |channel| (*key, channel.as_str()))
            })
            .collect()
    }
}
