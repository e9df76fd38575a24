//! Reductions over a value series: max (with its period), mean and sum.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// `None` for an empty series
    pub max: Option<f64>,
    /// Period label of the first maximum, when labels were supplied
    pub max_period: Option<String>,
    /// `0.0` for an empty series
    pub mean: f64,
    pub sum: f64,
    pub count: usize,
}

/// Summarise `values`, taking the label of the first maximum from `periods`.
///
/// NaN values are skipped.
pub fn summarize(values: &[f64], periods: &[String]) -> SeriesSummary {
    let mut best: Option<(usize, f64)> = None;
    let mut sum = 0.0;
    let mut count = 0usize;

    for (idx, value) in values.iter().copied().enumerate() {
        if value.is_nan() {
            continue;
        }
        sum += value;
        count += 1;
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }

    SeriesSummary {
        max: best.map(|(_, v)| v),
        max_period: best.and_then(|(idx, _)| periods.get(idx).cloned()),
        mean: if count == 0 { 0.0 } else { sum / count as f64 },
        sum,
        count,
    }
}

/// Integer convenience wrapper for count series.
pub fn summarize_counts(values: &[i64], periods: &[String]) -> SeriesSummary {
    let as_f64: Vec<f64> = values.iter().map(|v| *v as f64).collect();
    summarize(&as_f64, periods)
}
