//! # Metrics Engine
//!
//! Pure derivations of secondary metrics from the primary counts returned by
//! the analytics API. Nothing in this module performs I/O, holds state or
//! fails: malformed or absent input degrades to policy-defined defaults
//! (0%, empty series, empty summaries).
//!
//! ## Policies
//!
//! - **Conversion**: `rate(n, 0) == 0`
//! - **Growth**: `n` points give `n - 1` values; a zero baseline reads as
//!   +100% when the next value is positive and 0% otherwise
//! - **Gauge**: attainment is clamped to `[0, 100]` for display while the
//!   unclamped ratio stays available for "target exceeded" messaging
//! - **Summaries**: the first maximum wins ties; empty input yields no max
//!   and a zero mean
//!
//! ## Usage
//!
//! ```rust
//! use pipeline_dashboard::metrics::{conversion_rate, growth_rates, Attainment, GaugeStatus};
//!
//! assert_eq!(conversion_rate(5, 0), 0.0);
//! assert_eq!(growth_rates(&[0, 5]), vec![100.0]);
//! assert_eq!(Attainment::new(150.0, 100.0).status, GaugeStatus::TargetMet);
//! ```

pub mod breakdown;
pub mod channel;
pub mod conversion;
pub mod gauge;
pub mod growth;
pub mod summary;

pub use breakdown::{
    rank_account_executives, regional_breakdown, share_of, stage_breakdown, AeRanking,
    RegionShare, StageShare,
};
pub use channel::{BucketKey, BucketTable, ChannelSeries};
pub use conversion::{conversion_rate, ConversionBand, FunnelSnapshot, RegionFunnel};
pub use gauge::{format_compact, Attainment, GaugeStatus, ProgressBand};
pub use growth::{growth_rate, growth_rates, round_to, GrowthSeries};
pub use summary::{summarize, summarize_counts, SeriesSummary};
