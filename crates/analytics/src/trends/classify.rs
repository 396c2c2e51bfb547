//! Moving averages, growth rates and trend labels

use litgraph_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Emerging,
    Growing,
    Declining,
    Stable,
}

/// Classification cutoffs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TrendThresholds {
    /// Growth rate a bucket must exceed to start an emerging run
    pub growth_high: f64,

    /// Consecutive same-sign buckets for growing / declining
    #[validate(range(min = 1))]
    pub sustained_periods: usize,

    /// Trailing average the previous bucket must stay under for emerging
    #[validate(range(min = 0.0))]
    pub emerging_baseline: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            growth_high: 0.5,
            sustained_periods: 2,
            emerging_baseline: 5.0,
        }
    }
}

impl TrendThresholds {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if !self.growth_high.is_finite() || !self.emerging_baseline.is_finite() {
            return Err(AppError::invalid_parameter("thresholds", "must be finite numbers"));
        }
        Ok(())
    }
}

/// Trailing moving average.
///
/// Each bucket averages the last `window` buckets, or all buckets so far
/// when fewer exist, so every bucket has a value.
pub fn moving_average(counts: &[u32], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut sum = 0u64;
    counts
        .iter()
        .enumerate()
        .map(|(t, count)| {
            sum += u64::from(*count);
            if t >= window {
                sum -= u64::from(counts[t - window]);
            }
            sum as f64 / window.min(t + 1) as f64
        })
        .collect()
}

/// Period-over-period growth; the first bucket has none
pub fn growth_rates(counts: &[u32]) -> Vec<f64> {
    counts
        .iter()
        .enumerate()
        .map(|(t, count)| {
            if t == 0 {
                return 0.0;
            }
            let previous = f64::from(counts[t - 1]);
            (f64::from(*count) - previous) / previous.max(1.0)
        })
        .collect()
}

/// Label every bucket, most specific label first.
///
/// `baseline` is the trailing average used for the emerging check; the
/// value at `t - 1` must be under the baseline cutoff for bucket `t`.
pub fn classify(growth: &[f64], baseline: &[f64], thresholds: &TrendThresholds) -> Vec<TrendLabel> {
    let mut labels = Vec::with_capacity(growth.len());
    let mut rising = 0usize;
    let mut falling = 0usize;

    for (t, rate) in growth.iter().copied().enumerate() {
        rising = if rate > 0.0 { rising + 1 } else { 0 };
        falling = if rate < 0.0 { falling + 1 } else { 0 };

        let previously_rare = t > 0 && baseline[t - 1] < thresholds.emerging_baseline;
        let continues_emerging = t > 0 && labels[t - 1] == TrendLabel::Emerging && rate > 0.0;

        let label = if previously_rare && (rate > thresholds.growth_high || continues_emerging) {
            TrendLabel::Emerging
        } else if rising >= thresholds.sustained_periods {
            TrendLabel::Growing
        } else if falling >= thresholds.sustained_periods {
            TrendLabel::Declining
        } else {
            TrendLabel::Stable
        };
        labels.push(label);
    }

    labels
}
