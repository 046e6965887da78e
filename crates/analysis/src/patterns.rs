//! Categorical patterns and simple trends: per-group success rates, level
//! shares, right-inclusive binning, least-squares trends and distribution
//! shape.

use std::collections::BTreeMap;

use course_stats_core::descriptive::{excess_kurtosis, mean, median, skewness};
use course_stats_core::{StatsError, StatsResult};
use serde::{Deserialize, Serialize};

/// Below this absolute slope (percentage points per bin) a rate trend is stable.
pub const STABLE_SLOPE: f64 = 1.0;

/// Below this absolute skewness a distribution is treated as symmetric.
pub const SYMMETRIC_SKEW: f64 = 0.5;

/// Below this absolute excess kurtosis tails are treated as normal.
pub const MESOKURTIC_LIMIT: f64 = 3.0;

fn ensure_same_len(a: usize, b: usize, what: &str) -> StatsResult<()> {
    if a == b {
        Ok(())
    } else {
        Err(StatsError::InvalidParameter(format!(
            "{what}: lengths differ ({a} vs {b})"
        )))
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

// ============================================
// Categorical patterns
// ============================================

/// Success rate of one level of a grouping variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRate {
    pub level: String,
    pub total: usize,
    pub positives: usize,
    pub rate_percent: f64,
}

/// Row-normalised cross tabulation of `groups` against a binary outcome.
/// Levels are sorted.
///
/// # Errors
/// [`StatsError::InvalidParameter`] if the columns differ in length.
pub fn rate_by_group(
    groups: &[String],
    outcomes: &[String],
    positive: &str,
) -> StatsResult<Vec<GroupRate>> {
    ensure_same_len(groups.len(), outcomes.len(), "rate_by_group")?;

    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (group, outcome) in groups.iter().zip(outcomes) {
        let entry = counts.entry(group.as_str()).or_insert((0, 0));
        entry.0 += 1;
        if outcome == positive {
            entry.1 += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|(level, (total, positives))| GroupRate {
            level: level.to_string(),
            total,
            positives,
            rate_percent: percent(positives, total),
        })
        .collect())
}

/// Splits `values` by the parallel `labels` column. Levels are sorted.
///
/// # Errors
/// [`StatsError::InvalidParameter`] if the columns differ in length.
pub fn group_values(values: &[f64], labels: &[String]) -> StatsResult<Vec<(String, Vec<f64>)>> {
    ensure_same_len(values.len(), labels.len(), "group_values")?;
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (&v, label) in values.iter().zip(labels) {
        groups.entry(label.as_str()).or_default().push(v);
    }
    Ok(groups
        .into_iter()
        .map(|(label, values)| (label.to_string(), values))
        .collect())
}

/// Count and share of one categorical level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelShare {
    pub level: String,
    pub count: usize,
    pub percent: f64,
}

/// Level counts ordered by descending count, ties by level.
#[must_use]
pub fn category_distribution(values: &[String]) -> Vec<LevelShare> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    let mut shares: Vec<LevelShare> = counts
        .into_iter()
        .map(|(level, count)| LevelShare {
            level: level.to_string(),
            count,
            percent: percent(count, values.len()),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.level.cmp(&b.level)));
    shares
}

/// Assigns each value to a right-inclusive bin `(edges[i], edges[i + 1]]`.
///
/// Values outside `(edges[0], edges[last]]` map to `None`.
///
/// # Errors
/// [`StatsError::InvalidParameter`] unless `edges` has at least two strictly
/// increasing entries.
pub fn cut(values: &[f64], edges: &[f64]) -> StatsResult<Vec<Option<usize>>> {
    if edges.len() < 2 || edges.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(StatsError::InvalidParameter(
            "bin edges must be at least two strictly increasing values".to_string(),
        ));
    }
    Ok(values
        .iter()
        .map(|&v| {
            edges
                .windows(2)
                .position(|w| v > w[0] && v <= w[1])
        })
        .collect())
}

// ============================================
// Trends
// ============================================

/// Least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

/// Fits a least-squares line.
///
/// # Errors
/// - [`StatsError::InvalidParameter`] if the inputs differ in length
/// - [`StatsError::InsufficientSample`] with fewer than 2 points
/// - [`StatsError::InsufficientVariance`] if `x` is constant
pub fn linear_trend(x: &[f64], y: &[f64]) -> StatsResult<LinearTrend> {
    ensure_same_len(x.len(), y.len(), "linear_trend")?;
    if x.len() < 2 {
        return Err(StatsError::InsufficientSample(format!(
            "trend needs at least 2 points, got {}",
            x.len()
        )));
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let ss_xx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    if ss_xx.abs() < f64::EPSILON {
        return Err(StatsError::InsufficientVariance(
            "trend x values are constant".to_string(),
        ));
    }
    let ss_xy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();

    let slope = ss_xy / ss_xx;
    Ok(LinearTrend {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Stable,
    Upward,
    Downward,
}

impl TrendDirection {
    #[must_use]
    pub fn from_slope(slope: f64) -> Self {
        if slope.abs() < STABLE_SLOPE {
            Self::Stable
        } else if slope > 0.0 {
            Self::Upward
        } else {
            Self::Downward
        }
    }
}

/// Success rate inside one id bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinRate {
    pub index: usize,
    pub lower: f64,
    pub upper: f64,
    pub total: usize,
    pub rate_percent: f64,
}

/// Success rate across equal-width id bins and its linear slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTrend {
    /// Non-empty bins only.
    pub bins: Vec<BinRate>,
    /// Percentage points per bin.
    pub slope: f64,
    pub direction: TrendDirection,
}

/// Splits `ids` into `bins` equal-width, right-inclusive bins spanning
/// `[min, max]` (the minimum falls into the first bin) and fits a line through
/// the success rate of each non-empty bin against the bin index.
///
/// # Errors
/// - [`StatsError::InvalidParameter`] for mismatched lengths or `bins < 2`
/// - [`StatsError::InsufficientVariance`] if all ids are equal
/// - [`StatsError::InsufficientSample`] if fewer than two bins are populated
pub fn binned_rate_trend(ids: &[f64], outcomes: &[bool], bins: usize) -> StatsResult<RateTrend> {
    ensure_same_len(ids.len(), outcomes.len(), "binned_rate_trend")?;
    if bins < 2 {
        return Err(StatsError::InvalidParameter(format!(
            "rate trend needs at least 2 bins, got {bins}"
        )));
    }
    let min = ids.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ids.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max > min) {
        return Err(StatsError::InsufficientVariance(
            "ids span no range; cannot bin".to_string(),
        ));
    }

    let width = (max - min) / bins as f64;
    let mut totals = vec![(0usize, 0usize); bins];
    for (&id, &ok) in ids.iter().zip(outcomes) {
        let raw = ((id - min) / width).ceil() as usize;
        let index = raw.saturating_sub(1).min(bins - 1);
        totals[index].0 += 1;
        if ok {
            totals[index].1 += 1;
        }
    }

    let bin_rates: Vec<BinRate> = totals
        .iter()
        .enumerate()
        .filter(|(_, (total, _))| *total > 0)
        .map(|(index, &(total, positives))| BinRate {
            index,
            lower: min + width * index as f64,
            upper: min + width * (index + 1) as f64,
            total,
            rate_percent: percent(positives, total),
        })
        .collect();

    let x: Vec<f64> = bin_rates.iter().map(|b| b.index as f64).collect();
    let y: Vec<f64> = bin_rates.iter().map(|b| b.rate_percent).collect();
    if x.len() < 2 {
        return Err(StatsError::InsufficientSample(
            "fewer than two populated bins".to_string(),
        ));
    }
    let trend = linear_trend(&x, &y)?;

    Ok(RateTrend {
        bins: bin_rates,
        slope: trend.slope,
        direction: TrendDirection::from_slope(trend.slope),
    })
}

// ============================================
// Distribution shape
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symmetry {
    Symmetric,
    RightSkewed,
    LeftSkewed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tailedness {
    Mesokurtic,
    Leptokurtic,
    Platykurtic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionShape {
    pub mean: f64,
    pub median: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal = 0).
    pub kurtosis: f64,
    pub symmetry: Symmetry,
    pub tailedness: Tailedness,
}

/// Adjusted skewness and excess kurtosis with their classifications.
///
/// # Errors
/// [`StatsError::InsufficientSample`] with fewer than 4 values or zero variance.
pub fn distribution_shape(values: &[f64]) -> StatsResult<DistributionShape> {
    let (Some(skew), Some(kurt)) = (skewness(values), excess_kurtosis(values)) else {
        return Err(StatsError::InsufficientSample(format!(
            "shape needs at least 4 non-constant values, got {}",
            values.len()
        )));
    };

    let symmetry = if skew.abs() < SYMMETRIC_SKEW {
        Symmetry::Symmetric
    } else if skew > 0.0 {
        Symmetry::RightSkewed
    } else {
        Symmetry::LeftSkewed
    };
    let tailedness = if kurt.abs() < MESOKURTIC_LIMIT {
        Tailedness::Mesokurtic
    } else if kurt > 0.0 {
        Tailedness::Leptokurtic
    } else {
        Tailedness::Platykurtic
    };

    Ok(DistributionShape {
        mean: mean(values),
        median: median(values),
        skewness: skew,
        kurtosis: kurt,
        symmetry,
        tailedness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    // ============================================
    // Categorical
    // ============================================

    #[test]
    fn rate_by_group_normalises_rows() {
        let groups = strings(&["Mobile", "Tablet", "Mobile", "Mobile", "Tablet"]);
        let outcomes = strings(&["Yes", "No", "No", "Yes", "Yes"]);
        let rates = rate_by_group(&groups, &outcomes, "Yes").unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].level, "Mobile");
        assert_eq!((rates[0].total, rates[0].positives), (3, 2));
        assert!((rates[0].rate_percent - 200.0 / 3.0).abs() < 1e-9);
        assert!((rates[1].rate_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rate_by_group_rejects_mismatch() {
        let result = rate_by_group(&strings(&["a"]), &strings(&[]), "Yes");
        assert!(matches!(result, Err(StatsError::InvalidParameter(_))));
    }

    #[test]
    fn group_values_splits_by_label() {
        let groups = group_values(
            &[1.0, 2.0, 3.0, 4.0],
            &strings(&["Tablet", "Desktop", "Tablet", "Mobile"]),
        )
        .unwrap();
        let labels: Vec<&str> = groups.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Desktop", "Mobile", "Tablet"]);
        assert_eq!(groups[2].1, vec![1.0, 3.0]);
    }

    #[test]
    fn category_distribution_orders_by_count() {
        let shares = category_distribution(&strings(&["b", "a", "b", "c", "a", "b"]));
        let order: Vec<&str> = shares.iter().map(|s| s.level.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert!((shares[0].percent - 50.0).abs() < 1e-9);
        let total: f64 = shares.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn category_distribution_of_empty_is_empty() {
        assert!(category_distribution(&[]).is_empty());
    }

    #[test]
    fn cut_is_right_inclusive() {
        let bins = cut(&[0.0, 18.0, 30.0, 31.0, 45.0, 59.0, 61.0], &[0.0, 30.0, 45.0, 60.0]).unwrap();
        assert_eq!(
            bins,
            vec![None, Some(0), Some(0), Some(1), Some(1), Some(2), None]
        );
    }

    #[test]
    fn cut_rejects_unsorted_edges() {
        assert!(cut(&[1.0], &[5.0, 1.0]).is_err());
        assert!(cut(&[1.0], &[5.0]).is_err());
    }

    // ============================================
    // Trends
    // ============================================

    #[test]
    fn linear_trend_recovers_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let t = linear_trend(&x, &y).unwrap();
        assert!((t.slope - 2.0).abs() < 1e-12);
        assert!((t.intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_trend_rejects_constant_x() {
        let result = linear_trend(&[1.0, 1.0], &[2.0, 3.0]);
        assert!(matches!(result, Err(StatsError::InsufficientVariance(_))));
    }

    #[test]
    fn flat_rate_is_stable() {
        let ids: Vec<f64> = (1..=100).map(f64::from).collect();
        let outcomes: Vec<bool> = (1..=100).map(|i| i % 2 == 0).collect();
        let trend = binned_rate_trend(&ids, &outcomes, 10).unwrap();
        assert_eq!(trend.bins.len(), 10);
        assert_eq!(trend.bins.iter().map(|b| b.total).sum::<usize>(), 100);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn rising_rate_is_upward() {
        let ids: Vec<f64> = (0..100).map(f64::from).collect();
        let outcomes: Vec<bool> = (0..100).map(|i| i >= 50).collect();
        let trend = binned_rate_trend(&ids, &outcomes, 10).unwrap();
        assert!(trend.slope > STABLE_SLOPE);
        assert_eq!(trend.direction, TrendDirection::Upward);
    }

    #[test]
    fn constant_ids_cannot_be_binned() {
        let result = binned_rate_trend(&[3.0, 3.0], &[true, false], 10);
        assert!(matches!(result, Err(StatsError::InsufficientVariance(_))));
    }

    // ============================================
    // Shape
    // ============================================

    #[test]
    fn symmetric_sample() {
        let shape = distribution_shape(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).unwrap();
        assert!(shape.skewness.abs() < 1e-12);
        assert_eq!(shape.symmetry, Symmetry::Symmetric);
        assert_eq!(shape.tailedness, Tailedness::Mesokurtic);
        assert!((shape.mean - shape.median).abs() < 1e-12);
    }

    #[test]
    fn long_right_tail_is_right_skewed() {
        let shape = distribution_shape(&[1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0, 25.0]).unwrap();
        assert!(shape.skewness > SYMMETRIC_SKEW);
        assert_eq!(shape.symmetry, Symmetry::RightSkewed);
    }

    #[test]
    fn constant_sample_has_no_shape() {
        assert!(distribution_shape(&[4.0; 6]).is_err());
    }
}
