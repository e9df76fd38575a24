//! Target attainment for semicircle gauges.

use serde::{Deserialize, Serialize};

/// Four-tier status shown under a gauge, banded on the clamped percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugeStatus {
    TargetMet,
    OnTrack,
    MakingProgress,
    NeedsAttention,
}

impl GaugeStatus {
    pub fn classify(display_percentage: f64) -> Self {
        if display_percentage >= 100.0 {
            Self::TargetMet
        } else if display_percentage >= 75.0 {
            Self::OnTrack
        } else if display_percentage >= 50.0 {
            Self::MakingProgress
        } else {
            Self::NeedsAttention
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TargetMet => "Target Met",
            Self::OnTrack => "On Track",
            Self::MakingProgress => "Making Progress",
            Self::NeedsAttention => "Needs Attention",
        }
    }
}

/// Colour of the progress bar below the gauge. Three tiers only: a met
/// target shares the `Good` band with on-track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    Good,
    Warning,
    Critical,
}

impl ProgressBand {
    pub fn classify(display_percentage: f64) -> Self {
        if display_percentage >= 75.0 {
            Self::Good
        } else if display_percentage >= 50.0 {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

/// Current value against a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attainment {
    pub current: f64,
    pub target: f64,
    /// Unclamped percentage, may exceed 100 or drop below 0
    pub ratio: f64,
    /// Percentage clamped to `[0, 100]` for drawing
    pub display: f64,
    pub status: GaugeStatus,
}

impl Attainment {
    /// A non-positive target yields 0%.
    pub fn new(current: f64, target: f64) -> Self {
        let ratio = if target > 0.0 {
            current / target * 100.0
        } else {
            0.0
        };
        // a NaN ratio draws as an empty gauge
        let display = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 100.0) };
        Self {
            current,
            target,
            ratio,
            display,
            status: GaugeStatus::classify(display),
        }
    }

    pub fn target_exceeded(&self) -> bool {
        self.ratio > 100.0
    }

    /// Needle angle in degrees, -90 (empty) to +90 (full).
    pub fn needle_rotation(&self) -> f64 {
        -90.0 + self.display / 100.0 * 180.0
    }

    pub fn progress_band(&self) -> ProgressBand {
        ProgressBand::classify(self.display)
    }
}

/// Compact money-style formatting: `1.5M`, `150K`, `999`.
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.0}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}
