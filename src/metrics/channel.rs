//! Per-channel weekly tables for the MQL/SQL buckets.
//!
//! A bucket shares one date axis across all of its channels. Rows that do not
//! match the axis are zero-padded or truncated, and the affected channel names
//! are recorded on the table so the caller can report them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::growth::GrowthSeries;
use super::summary::{summarize_counts, SeriesSummary};
use crate::shared::{BucketData, MqlSqlResponse};

/// The four named buckets of the MQL/SQL view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    MqlIndia,
    SqlIndia,
    MqlUs,
    SqlUs,
}

impl BucketKey {
    pub const ALL: [BucketKey; 4] = [
        BucketKey::MqlIndia,
        BucketKey::SqlIndia,
        BucketKey::MqlUs,
        BucketKey::SqlUs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MqlIndia => "MQL India",
            Self::SqlIndia => "SQL India",
            Self::MqlUs => "MQL US",
            Self::SqlUs => "SQL US",
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::MqlIndia => "mql_india",
            Self::SqlIndia => "sql_india",
            Self::MqlUs => "mql_us",
            Self::SqlUs => "sql_us",
        }
    }

    pub fn select<'a>(&self, response: &'a MqlSqlResponse) -> Option<&'a BucketData> {
        match self {
            Self::MqlIndia => response.mql_india.as_ref(),
            Self::SqlIndia => response.sql_india.as_ref(),
            Self::MqlUs => response.mql_us.as_ref(),
            Self::SqlUs => response.sql_us.as_ref(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BucketKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace(&[' ', '-'][..], "_");
        Self::ALL
            .into_iter()
            .find(|key| key.wire_name() == normalised)
            .ok_or_else(|| format!("unknown bucket: {}", s))
    }
}

/// One acquisition channel's counts on the bucket's date axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSeries {
    pub channel: String,
    pub values: Vec<i64>,
    pub periods: Vec<String>,
}

impl ChannelSeries {
    pub fn total(&self) -> i64 {
        self.values.iter().sum()
    }

    pub fn growth(&self) -> GrowthSeries {
        GrowthSeries::from_series(self.channel.clone(), &self.values, &self.periods)
    }

    /// Table cells: the count, or `-` when nothing came through that week.
    pub fn display_cells(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| if *v > 0 { v.to_string() } else { "-".to_string() })
            .collect()
    }
}

/// A derived, immutable table for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketTable {
    pub bucket: BucketKey,
    pub periods: Vec<String>,
    pub rows: Vec<ChannelSeries>,
    /// Column totals, one per period
    pub totals: Vec<i64>,
    /// `false` when the server totals were missing or misaligned and were recomputed
    pub totals_from_server: bool,
    pub grand_total: i64,
    pub totals_growth: GrowthSeries,
    pub channel_growth: Vec<GrowthSeries>,
    /// Channels whose row length did not match the date axis
    pub normalised_channels: Vec<String>,
}

impl BucketTable {
    pub fn empty(bucket: BucketKey) -> Self {
        Self::from_bucket(bucket, &BucketData::default())
    }

    pub fn from_bucket(bucket: BucketKey, data: &BucketData) -> Self {
        let periods = axis(data);
        let width = periods.len();

        let mut normalised_channels = Vec::new();
        let rows: Vec<ChannelSeries> = data
            .channels
            .iter()
            .map(|(channel, raw)| {
                if raw.len() != width {
                    normalised_channels.push(channel.clone());
                }
                let mut values = raw.clone();
                values.resize(width, 0);
                ChannelSeries {
                    channel: channel.clone(),
                    values,
                    periods: periods.clone(),
                }
            })
            .collect();

        let totals_from_server = !data.totals.is_empty() && data.totals.len() == width;
        let totals = if totals_from_server {
            data.totals.clone()
        } else {
            (0..width)
                .map(|col| rows.iter().map(|row| row.values[col]).sum::<i64>())
                .collect()
        };

        let grand_total = totals.iter().sum();
        let totals_growth = GrowthSeries::from_series("Total", &totals, &periods);
        let channel_growth = rows.iter().map(ChannelSeries::growth).collect();

        Self {
            bucket,
            periods,
            rows,
            totals,
            totals_from_server,
            grand_total,
            totals_growth,
            channel_growth,
            normalised_channels,
        }
    }

    /// Whether the bucket has no channel rows ("No MQL India data available").
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, channel: &str) -> Option<&ChannelSeries> {
        self.rows.iter().find(|row| row.channel == channel)
    }

    pub fn growth(&self, channel: &str) -> Option<&GrowthSeries> {
        self.channel_growth.iter().find(|g| g.label == channel)
    }

    pub fn totals_summary(&self) -> SeriesSummary {
        summarize_counts(&self.totals, &self.periods)
    }

    /// Channel with the highest row total (first on ties)
    pub fn top_channel(&self) -> Option<&ChannelSeries> {
        self.rows.iter().fold(None, |best: Option<&ChannelSeries>, row| match best {
            Some(current) if row.total() <= current.total() => Some(current),
            _ => Some(row),
        })
    }
}

/// The bucket's date axis. Without dates, the longest row sets the width and
/// periods are numbered.
fn axis(data: &BucketData) -> Vec<String> {
    if !data.dates.is_empty() {
        return data.dates.clone();
    }
    let width = data.channels.values().map(Vec::len).max().unwrap_or(0);
    (1..=width).map(|n| format!("Period {}", n)).collect()
}
