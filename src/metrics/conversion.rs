//! Funnel conversion rates.
//!
//! A conversion rate is the share of entries at one funnel stage that reached
//! the next one. A zero denominator yields `0.0`: a region with no MQLs has a
//! 0% conversion rate rather than an undefined one.

use serde::{Deserialize, Serialize};

use crate::shared::LeadFunnelResponse;

/// `numerator / denominator * 100`, or `0.0` when the denominator is zero.
pub fn conversion_rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Colour band of a conversion badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionBand {
    /// 30% and above
    Strong,
    /// 15% up to 30%
    Moderate,
    /// Below 15%
    Weak,
}

impl ConversionBand {
    pub fn classify(rate: f64) -> Self {
        if rate >= 30.0 {
            Self::Strong
        } else if rate >= 15.0 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

/// MQL → SQL → Deal funnel for a single region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionFunnel {
    pub mql: u64,
    pub sql: u64,
    pub deals: u64,
    pub mql_to_sql: f64,
    pub sql_to_deal: f64,
    pub overall: f64,
}

impl RegionFunnel {
    pub fn new(mql: u64, sql: u64, deals: u64) -> Self {
        Self {
            mql,
            sql,
            deals,
            mql_to_sql: conversion_rate(sql, mql),
            sql_to_deal: conversion_rate(deals, sql),
            overall: conversion_rate(deals, mql),
        }
    }

    pub fn overall_band(&self) -> ConversionBand {
        ConversionBand::classify(self.overall)
    }
}

/// Lead funnel for both regions, rebuilt wholesale on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FunnelSnapshot {
    pub india: RegionFunnel,
    pub us: RegionFunnel,
}

impl FunnelSnapshot {
    /// Derive a snapshot from the raw counts, ignoring the server's own
    /// percentages so every rate follows the same zero policy.
    pub fn from_counts(counts: &LeadFunnelResponse) -> Self {
        Self {
            india: RegionFunnel::new(counts.mql_india, counts.sql_india, counts.deals_india),
            us: RegionFunnel::new(counts.mql_us, counts.sql_us, counts.deals_us),
        }
    }
}

impl Default for FunnelSnapshot {
    fn default() -> Self {
        Self {
            india: RegionFunnel::new(0, 0, 0),
            us: RegionFunnel::new(0, 0, 0),
        }
    }
}
