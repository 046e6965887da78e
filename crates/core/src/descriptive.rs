//! Descriptive statistics over `f64` slices.
//!
//! The primitive helpers follow the guard style used elsewhere in the
//! workspace: degenerate inputs return `0.0` instead of panicking, and the
//! callers that need a hard failure check lengths first.

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Arithmetic mean, `0.0` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
///
/// Returns `0.0` when `n <= ddof`.
#[must_use]
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - ddof) as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
#[must_use]
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// Sum of squared deviations from the mean.
#[must_use]
pub fn sum_of_squares(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum()
}

/// Returns a sorted copy using IEEE total ordering.
#[must_use]
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile of an already sorted slice by linear interpolation between the
/// two closest ranks (position `q * (n - 1)`).
///
/// `q` is clamped to `[0, 1]`. Returns `0.0` for an empty slice.
#[must_use]
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Quantile of an unsorted slice, see [`quantile_sorted`].
#[must_use]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted(values), q)
}

/// Median by linear interpolation.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Adjusted Fisher-Pearson sample skewness (G1).
///
/// `None` for fewer than 3 values or zero variance.
#[must_use]
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let n_f = n as f64;
    let m = mean(values);
    let m2 = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n_f;
    if m2 <= f64::EPSILON {
        return None;
    }
    let m3 = values.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n_f;
    let g1 = m3 / m2.powf(1.5);
    Some((n_f * (n_f - 1.0)).sqrt() / (n_f - 2.0) * g1)
}

/// Bias-corrected sample excess kurtosis (G2, normal distribution = 0).
///
/// `None` for fewer than 4 values or zero variance.
#[must_use]
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let n_f = n as f64;
    let m = mean(values);
    let m2 = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n_f;
    if m2 <= f64::EPSILON {
        return None;
    }
    let m4 = values.iter().map(|x| (x - m).powi(4)).sum::<f64>() / n_f;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some(((n_f + 1.0) * g2 + 6.0) * (n_f - 1.0) / ((n_f - 2.0) * (n_f - 3.0)))
}

/// Count, mean and sample standard deviation of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1), `0.0` for a single value.
    pub std_dev: f64,
}

impl SampleSummary {
    /// Summarises a sample.
    #[must_use]
    pub fn of(values: &[f64]) -> Self {
        Self {
            n: values.len(),
            mean: mean(values),
            std_dev: std_dev(values, 1),
        }
    }

    /// Sample variance (ddof = 1).
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}

/// Five-number summary plus mean and standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    /// Describes a numeric sample.
    ///
    /// # Errors
    /// [`StatsError::InsufficientSample`] for an empty slice.
    pub fn describe(values: &[f64]) -> StatsResult<Self> {
        if values.is_empty() {
            return Err(StatsError::InsufficientSample(
                "cannot describe an empty sample".to_string(),
            ));
        }
        let s = sorted(values);
        Ok(Self {
            count: s.len(),
            mean: mean(&s),
            std_dev: std_dev(&s, 1),
            min: s[0],
            q1: quantile_sorted(&s, 0.25),
            median: quantile_sorted(&s, 0.5),
            q3: quantile_sorted(&s, 0.75),
            max: s[s.len() - 1],
        })
    }

    /// Interquartile range.
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Average ranks (1-based) with ties sharing the mean of their positions.
#[must_use]
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        // Positions i..j hold ranks (i+1)..=j
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Sizes of each group of tied values, used by rank-test tie corrections.
#[must_use]
pub fn tie_counts(values: &[f64]) -> Vec<usize> {
    let s = sorted(values);
    let mut counts = Vec::new();
    let mut i = 0;
    while i < s.len() {
        let mut j = i + 1;
        while j < s.len() && s[j] == s[i] {
            j += 1;
        }
        counts.push(j - i);
        i = j;
    }
    counts
}
