//! Period-over-period growth.
//!
//! Growth is defined between consecutive periods, so a series of `n` points
//! yields `n - 1` growth values. A zero baseline cannot be divided by: a jump
//! from 0 to a positive count reads as +100%, and 0 to 0 (or to a negative
//! count) reads as 0%.

use serde::{Deserialize, Serialize};

/// Growth in percent from `prev` to `curr`.
pub fn growth_rate(prev: i64, curr: i64) -> f64 {
    if prev == 0 {
        return if curr > 0 { 100.0 } else { 0.0 };
    }
    (curr as f64 - prev as f64) / prev as f64 * 100.0
}

/// Growth between every pair of consecutive values.
pub fn growth_rates(values: &[i64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|pair| growth_rate(pair[0], pair[1]))
        .collect()
}

/// Round half away from zero to `decimals` places for display.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Growth of one labelled series.
///
/// `periods[i]` is the later period of the pair `values[i]` was computed
/// from, so the first period of the source series has no growth entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSeries {
    pub label: String,
    pub values: Vec<f64>,
    pub periods: Vec<String>,
}

impl GrowthSeries {
    pub fn from_series(label: impl Into<String>, values: &[i64], periods: &[String]) -> Self {
        let growth = growth_rates(values);
        let periods = periods
            .iter()
            .skip(1)
            .take(growth.len())
            .cloned()
            .collect();
        Self {
            label: label.into(),
            values: growth,
            periods,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values rounded for display
    pub fn rounded(&self, decimals: u32) -> Vec<f64> {
        self.values.iter().map(|v| round_to(*v, decimals)).collect()
    }

    /// The most recent growth value, if any
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }
}
