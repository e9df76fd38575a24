/**
 * API Wire Types
 *
 * Request and response bodies of the analytics/sync API. Every analytics
 * field defaults when absent so that a partially populated response degrades
 * to empty data instead of failing the whole dashboard.
 */
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Error body carried by non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// `POST /api/sheets/sync`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub records_synced: u64,
    pub last_sync: DateTime<Utc>,
}

/// `POST /api/sheets/auto-sync`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSyncResponse {
    pub synced: bool,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub records_synced: Option<u64>,
    #[serde(default)]
    pub records_count: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api/sync-status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub records_synced: u64,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api/analytics/lead-funnel`
///
/// The server-side conversion percentages are kept for comparison only; the
/// dashboard recomputes them from the counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadFunnelResponse {
    pub mql_india: u64,
    pub sql_india: u64,
    pub deals_india: u64,
    pub mql_us: u64,
    pub sql_us: u64,
    pub deals_us: u64,
    pub conversion_mql_to_sql_india: f64,
    pub conversion_sql_to_deal_india: f64,
    pub overall_conversion_india: f64,
    pub conversion_mql_to_sql_us: f64,
    pub conversion_sql_to_deal_us: f64,
    pub overall_conversion_us: f64,
}

/// One bucket of `GET /api/analytics/mql-sql`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketData {
    /// Channel name to weekly counts, in server order
    pub channels: IndexMap<String, Vec<i64>>,
    pub dates: Vec<String>,
    pub totals: Vec<i64>,
}

/// `GET /api/analytics/mql-sql`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqlSqlResponse {
    pub mql_india: Option<BucketData>,
    pub sql_india: Option<BucketData>,
    pub mql_us: Option<BucketData>,
    pub sql_us: Option<BucketData>,
}

/// Per-stage slice of `GET /api/analytics/pipeline`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageMetrics {
    pub count: u64,
    pub value: f64,
}

/// `GET /api/analytics/pipeline`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineMetrics {
    pub total_deals: u64,
    pub total_value: f64,
    pub avg_deal_size: f64,
    pub win_rate: f64,
    pub stages: IndexMap<String, StageMetrics>,
}

/// One account executive from `GET /api/analytics/ae-performance`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AePerformance {
    pub ae_name: String,
    pub total_deals: u64,
    pub total_value: f64,
    pub won_deals: u64,
    pub avg_deal_size: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AePerformanceResponse {
    pub ae_performance: Vec<AePerformance>,
}

/// One region from `GET /api/analytics/regional`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalMetrics {
    pub region: String,
    pub total_deals: u64,
    pub total_value: f64,
    pub avg_deal_size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalResponse {
    pub regional_metrics: Vec<RegionalMetrics>,
}

/// `GET /api/analytics/filters`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub aes: Vec<String>,
    pub regions: Vec<String>,
    pub stages: Vec<String>,
    pub industries: Vec<String>,
}

/// A single deal row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deal {
    pub id: String,
    pub deal_name: String,
    pub stage: String,
    pub ae: String,
    pub region: String,
    pub industry: String,
    pub amount: f64,
    pub potential_size: f64,
    pub confidence: String,
    pub date: String,
    pub close_date: Option<String>,
    pub lead_source: Option<String>,
}

/// `GET /api/deals`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealsResponse {
    pub deals: Vec<Deal>,
    pub count: u64,
}

/// Optional filters for `GET /api/deals`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealFilters {
    pub ae: Option<String>,
    pub region: Option<String>,
    pub stage: Option<String>,
    pub industry: Option<String>,
}

impl DealFilters {
    /// Query parameters for the set filters, in a stable order
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("ae", &self.ae),
            ("region", &self.region),
            ("stage", &self.stage),
            ("industry", &self.industry),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}
