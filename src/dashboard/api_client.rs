/**
 * Analytics API Client
 *
 * HTTP client for the dashboard's `/api` surface. The sync controller and the
 * orchestrator only see the `SyncApi` and `AnalyticsApi` traits, so tests can
 * substitute in-memory fakes for the network.
 */

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::dashboard::config::Config;
use crate::shared::api_types::{
    AePerformance, AePerformanceResponse, AutoSyncResponse, DealFilters, DealsResponse,
    ErrorBody, FilterOptions, LeadFunnelResponse, MqlSqlResponse, PipelineMetrics,
    RegionalMetrics, RegionalResponse, SyncResponse, SyncStatusResponse,
};
use crate::shared::error::ApiError;

pub const SYNC_PATH: &str = "/api/sheets/sync";
pub const AUTO_SYNC_PATH: &str = "/api/sheets/auto-sync";
pub const SYNC_STATUS_PATH: &str = "/api/sync-status";
pub const LEAD_FUNNEL_PATH: &str = "/api/analytics/lead-funnel";
pub const MQL_SQL_PATH: &str = "/api/analytics/mql-sql";
pub const PIPELINE_PATH: &str = "/api/analytics/pipeline";
pub const AE_PERFORMANCE_PATH: &str = "/api/analytics/ae-performance";
pub const REGIONAL_PATH: &str = "/api/analytics/regional";
pub const FILTERS_PATH: &str = "/api/analytics/filters";
pub const DEALS_PATH: &str = "/api/deals";

/// Synchronization endpoints used by the sync controller
#[async_trait]
pub trait SyncApi: Send + Sync {
    /// Conditional sync: the server only re-reads the sheet if it changed
    async fn auto_sync(&self) -> Result<AutoSyncResponse, ApiError>;

    /// Unconditional sync
    async fn sync(&self) -> Result<SyncResponse, ApiError>;
}

/// Read-only analytics views used by the orchestrator
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn sync_status(&self) -> Result<SyncStatusResponse, ApiError>;
    async fn lead_funnel(&self) -> Result<LeadFunnelResponse, ApiError>;
    async fn mql_sql(&self) -> Result<MqlSqlResponse, ApiError>;
    async fn pipeline(&self) -> Result<PipelineMetrics, ApiError>;
    async fn ae_performance(&self) -> Result<Vec<AePerformance>, ApiError>;
    async fn regional(&self) -> Result<Vec<RegionalMetrics>, ApiError>;
    async fn filter_options(&self) -> Result<FilterOptions, ApiError>;
    async fn deals(&self, filters: &DealFilters) -> Result<DealsResponse, ApiError>;
}

/// reqwest-backed implementation of both API traits
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.config.api_url(path);
        tracing::debug!("GET {}", url);

        let response = self.http.get(&url).query(query).send().await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.config.api_url(path);
        tracing::debug!("POST {}", url);

        let response = self.http.post(&url).send().await?;
        decode(response).await
    }
}

/// Map a response to its body, or to a `ServerError` carrying the `detail`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error_body) => error_body.detail,
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            Err(_) => body,
        };
        return Err(ApiError::server(status.as_u16(), detail));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl SyncApi for ApiClient {
    async fn auto_sync(&self) -> Result<AutoSyncResponse, ApiError> {
        self.post_json(AUTO_SYNC_PATH).await
    }

    async fn sync(&self) -> Result<SyncResponse, ApiError> {
        self.post_json(SYNC_PATH).await
    }
}

#[async_trait]
impl AnalyticsApi for ApiClient {
    async fn sync_status(&self) -> Result<SyncStatusResponse, ApiError> {
        self.get_json(SYNC_STATUS_PATH, &[]).await
    }

    async fn lead_funnel(&self) -> Result<LeadFunnelResponse, ApiError> {
        self.get_json(LEAD_FUNNEL_PATH, &[]).await
    }

    async fn mql_sql(&self) -> Result<MqlSqlResponse, ApiError> {
        self.get_json(MQL_SQL_PATH, &[]).await
    }

    async fn pipeline(&self) -> Result<PipelineMetrics, ApiError> {
        self.get_json(PIPELINE_PATH, &[]).await
    }

    async fn ae_performance(&self) -> Result<Vec<AePerformance>, ApiError> {
        let response: AePerformanceResponse = self.get_json(AE_PERFORMANCE_PATH, &[]).await?;
        Ok(response.ae_performance)
    }

    async fn regional(&self) -> Result<Vec<RegionalMetrics>, ApiError> {
        let response: RegionalResponse = self.get_json(REGIONAL_PATH, &[]).await?;
        Ok(response.regional_metrics)
    }

    async fn filter_options(&self) -> Result<FilterOptions, ApiError> {
        self.get_json(FILTERS_PATH, &[]).await
    }

    async fn deals(&self, filters: &DealFilters) -> Result<DealsResponse, ApiError> {
        self.get_json(DEALS_PATH, &filters.query_pairs()).await
    }
}
