//! Standardised mean difference between two groups.

use course_stats_core::{SampleSummary, StatsError, StatsResult};
use serde::{Deserialize, Serialize};

/// Conventional interpretation of `|d|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    /// <0.2 negligible, <0.5 small, <0.8 medium, else large.
    #[must_use]
    pub fn from_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            Self::Negligible
        } else if d < 0.5 {
            Self::Small
        } else if d < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    /// `(mean_a - mean_b) / pooled_sd`.
    pub d: f64,
    pub pooled_std_dev: f64,
    pub magnitude: EffectMagnitude,
}

/// Pooled standard deviation with `n1 + n2 - 2` degrees of freedom.
fn pooled_std_dev(a: &SampleSummary, b: &SampleSummary) -> f64 {
    let (n1, n2) = (a.n as f64, b.n as f64);
    (((n1 - 1.0) * a.variance() + (n2 - 1.0) * b.variance()) / (n1 + n2 - 2.0)).sqrt()
}

/// Cohen's d of `a` relative to `b`.
///
/// # Errors
/// - [`StatsError::InsufficientSample`] if a group has fewer than 2 values
/// - [`StatsError::DegenerateInput`] if the pooled standard deviation is zero
pub fn cohens_d(a: &[f64], b: &[f64]) -> StatsResult<EffectSize> {
    if a.len() < 2 || b.len() < 2 {
        return Err(StatsError::InsufficientSample(format!(
            "Cohen's d needs at least 2 values per group, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    let (sa, sb) = (SampleSummary::of(a), SampleSummary::of(b));
    let pooled = pooled_std_dev(&sa, &sb);
    if !(pooled > 0.0) {
        return Err(StatsError::DegenerateInput(
            "pooled standard deviation is zero".to_string(),
        ));
    }

    let d = (sa.mean - sb.mean) / pooled;
    Ok(EffectSize {
        d,
        pooled_std_dev: pooled,
        magnitude: EffectMagnitude::from_d(d),
    })
}
