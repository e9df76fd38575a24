//! Pipeline, regional and account-executive breakdowns.

use serde::{Deserialize, Serialize};

use crate::shared::api_types::{AePerformance, PipelineMetrics, RegionalMetrics};

/// Canonical display order of pipeline stages. Stages outside this list sort
/// after it, keeping their server order.
pub const STAGE_ORDER: [&str; 10] = [
    "Initial Interest",
    "SAL",
    "SQL",
    "Solutioning",
    "Proposal",
    "Contract",
    "Deal Won",
    "Deal Lost",
    "Dormant",
    "Revisit",
];

/// `part / whole * 100`, or `0.0` for a non-positive whole.
pub fn share_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageShare {
    pub stage: String,
    pub count: u64,
    pub value: f64,
    /// Share of all deals, by count
    pub share: f64,
}

/// Stage rows in canonical order with their share of the deal count.
pub fn stage_breakdown(metrics: &PipelineMetrics) -> Vec<StageShare> {
    let total: u64 = metrics.stages.values().map(|s| s.count).sum();

    let mut rows: Vec<(usize, StageShare)> = metrics
        .stages
        .iter()
        .enumerate()
        .map(|(server_idx, (stage, data))| {
            let rank = STAGE_ORDER
                .iter()
                .position(|known| *known == stage.as_str())
                .unwrap_or(STAGE_ORDER.len() + server_idx);
            (
                rank,
                StageShare {
                    stage: stage.clone(),
                    count: data.count,
                    value: data.value,
                    share: share_of(data.count as f64, total as f64),
                },
            )
        })
        .collect();

    rows.sort_by_key(|(rank, _)| *rank);
    rows.into_iter().map(|(_, row)| row).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionShare {
    pub region: String,
    pub total_deals: u64,
    pub total_value: f64,
    pub avg_deal_size: f64,
    /// Share of the whole pipeline value
    pub share: f64,
}

/// Regions by pipeline value, largest first.
pub fn regional_breakdown(regions: &[RegionalMetrics]) -> Vec<RegionShare> {
    let total: f64 = regions.iter().map(|r| r.total_value).sum();
    let mut rows: Vec<RegionShare> = regions
        .iter()
        .map(|r| RegionShare {
            region: r.region.clone(),
            total_deals: r.total_deals,
            total_value: r.total_value,
            avg_deal_size: r.avg_deal_size,
            share: share_of(r.total_value, total),
        })
        .collect();
    rows.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AeRanking {
    pub ae: AePerformance,
    pub rank: usize,
    pub top_performer: bool,
}

/// Account executives by pipeline value, largest first. Rank 1 is flagged as
/// the top performer.
pub fn rank_account_executives(performance: &[AePerformance]) -> Vec<AeRanking> {
    let mut sorted = performance.to_vec();
    sorted.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, ae)| AeRanking {
            ae,
            rank: idx + 1,
            top_performer: idx == 0,
        })
        .collect()
}
