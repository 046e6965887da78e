//! Z-score and IQR outlier classification.
//!
//! Both classifiers are descriptive only. They return flags and never drop
//! rows; retention policy belongs to the caller. The two methods are computed
//! independently and routinely disagree on which records they flag.

use course_stats_core::descriptive::{mean, quantile_sorted, sorted, std_dev};
use course_stats_core::{Dataset, StatsError, StatsResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default |z| threshold.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;
/// Default IQR fence multiplier.
pub const DEFAULT_IQR_K: f64 = 1.5;

/// Flags values with `|z| > threshold`, standardising by the population mean
/// and standard deviation (ddof = 0) of the input itself.
///
/// # Errors
/// [`StatsError::DegenerateInput`] for an empty or constant input.
pub fn classify_zscore(values: &[f64], threshold: f64) -> StatsResult<Vec<bool>> {
    Ok(zscores(values)?
        .into_iter()
        .map(|z| z.abs() > threshold)
        .collect())
}

/// Standard scores of every value (population standard deviation).
///
/// # Errors
/// [`StatsError::DegenerateInput`] for an empty or constant input.
pub fn zscores(values: &[f64]) -> StatsResult<Vec<f64>> {
    if values.is_empty() {
        return Err(StatsError::DegenerateInput(
            "z-scores of an empty sample are undefined".to_string(),
        ));
    }
    let m = mean(values);
    let sd = std_dev(values, 0);
    if sd <= f64::EPSILON * m.abs().max(1.0) {
        return Err(StatsError::DegenerateInput(
            "standard deviation is zero; z-scores are undefined".to_string(),
        ));
    }
    Ok(values.iter().map(|v| (v - m) / sd).collect())
}

/// Result of the IQR fence classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqrClassification {
    pub flags: Vec<bool>,
    pub q1: f64,
    pub q3: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
}

impl IqrClassification {
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Flags values strictly outside `[Q1 - k·IQR, Q3 + k·IQR]`, with quartiles
/// taken by linear interpolation.
///
/// # Errors
/// [`StatsError::InsufficientSample`] for an empty input.
pub fn classify_iqr(values: &[f64], k: f64) -> StatsResult<IqrClassification> {
    if values.is_empty() {
        return Err(StatsError::InsufficientSample(
            "IQR fences need at least one value".to_string(),
        ));
    }
    let s = sorted(values);
    let q1 = quantile_sorted(&s, 0.25);
    let q3 = quantile_sorted(&s, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - k * iqr;
    let upper_fence = q3 + k * iqr;

    let flags = values
        .iter()
        .map(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Ok(IqrClassification {
        flags,
        q1,
        q3,
        lower_fence,
        upper_fence,
    })
}

/// Both classifications for one dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub column: String,
    pub z_threshold: f64,
    pub mean: f64,
    /// Population standard deviation used for the z-scores.
    pub std_dev: f64,
    pub zscore_flags: Vec<bool>,
    pub iqr_k: f64,
    pub iqr: IqrClassification,
}

impl OutlierReport {
    #[must_use]
    pub fn zscore_count(&self) -> usize {
        self.zscore_flags.iter().filter(|&&f| f).count()
    }

    #[must_use]
    pub fn iqr_count(&self) -> usize {
        self.iqr.flags.iter().filter(|&&f| f).count()
    }

    /// Row indices flagged by the z-score method.
    #[must_use]
    pub fn zscore_indices(&self) -> Vec<usize> {
        flagged(&self.zscore_flags)
    }

    /// Row indices flagged by the IQR method.
    #[must_use]
    pub fn iqr_indices(&self) -> Vec<usize> {
        flagged(&self.iqr.flags)
    }

    /// Row indices flagged by exactly one of the two methods.
    #[must_use]
    pub fn disagreements(&self) -> Vec<usize> {
        self.zscore_flags
            .iter()
            .zip(&self.iqr.flags)
            .enumerate()
            .filter_map(|(i, (z, q))| (z != q).then_some(i))
            .collect()
    }

    /// Share of IQR-flagged rows in percent.
    #[must_use]
    pub fn iqr_percentage(&self) -> f64 {
        if self.iqr.flags.is_empty() {
            return 0.0;
        }
        self.iqr_count() as f64 / self.iqr.flags.len() as f64 * 100.0
    }
}

fn flagged(flags: &[bool]) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter_map(|(i, &f)| f.then_some(i))
        .collect()
}

/// Runs both classifiers on a numeric dataset column.
///
/// # Errors
/// Propagates column lookup failures and the classifiers' own errors.
pub fn outlier_report(
    dataset: &Dataset,
    column: &str,
    z_threshold: f64,
    iqr_k: f64,
) -> StatsResult<OutlierReport> {
    let values = dataset.numeric(column)?;
    let zscore_flags = classify_zscore(&values, z_threshold)?;
    let iqr = classify_iqr(&values, iqr_k)?;

    let report = OutlierReport {
        column: column.to_string(),
        z_threshold,
        mean: mean(&values),
        std_dev: std_dev(&values, 0),
        zscore_flags,
        iqr_k,
        iqr,
    };
    debug!(
        column,
        zscore = report.zscore_count(),
        iqr = report.iqr_count(),
        "Outlier classification complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_stats_core::dataset::TIME_SPENT_HOURS;
    use course_stats_core::Column;

    // ============================================
    // Z-score
    // ============================================

    #[test]
    fn zscore_flags_extreme_value() {
        let mut values = vec![10.0; 30];
        values.push(11.0);
        values.push(100.0);
        let flags = classify_zscore(&values, 3.0).unwrap();
        assert!(flags[31]);
        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
    }

    #[test]
    fn zscore_constant_column_is_degenerate() {
        let result = classify_zscore(&[4.0, 4.0, 4.0], 3.0);
        assert!(matches!(result, Err(StatsError::DegenerateInput(_))));
    }

    #[test]
    fn zscore_empty_is_degenerate() {
        assert!(matches!(
            classify_zscore(&[], 3.0),
            Err(StatsError::DegenerateInput(_))
        ));
    }

    #[test]
    fn zscores_use_population_std() {
        let z = zscores(&[1.0, 3.0]).unwrap();
        // mean 2, population sd 1
        assert!((z[0] + 1.0).abs() < 1e-12);
        assert!((z[1] - 1.0).abs() < 1e-12);
    }

    // ============================================
    // IQR
    // ============================================

    #[test]
    fn iqr_fences_use_interpolated_quartiles() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let result = classify_iqr(&values, 1.5).unwrap();
        assert!((result.q1 - 3.0).abs() < 1e-12);
        assert!((result.q3 - 7.0).abs() < 1e-12);
        assert!((result.lower_fence + 3.0).abs() < 1e-12);
        assert!((result.upper_fence - 13.0).abs() < 1e-12);
        assert_eq!(
            result.flags,
            vec![false, false, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn iqr_value_on_fence_is_not_flagged() {
        // q1 = 2, q3 = 4, iqr = 2 -> fences -1 and 7
        let values = [-1.0, 2.0, 3.0, 4.0, 7.0];
        let result = classify_iqr(&values, 1.5).unwrap();
        assert!(result.flags.iter().all(|&f| !f));
    }

    #[test]
    fn iqr_empty_fails() {
        assert!(classify_iqr(&[], 1.5).is_err());
    }

    // ============================================
    // Independence of the two methods
    // ============================================

    #[test]
    fn methods_disagree_on_constructed_input() {
        // Tight cluster with a mild straggler: IQR flags it, |z| stays below 3
        let mut values = vec![10.0, 10.0, 10.0, 10.0, 11.0, 11.0, 11.0, 11.0];
        values.push(14.0);
        let ds = Dataset::new(vec![(
            TIME_SPENT_HOURS.to_string(),
            Column::Numeric(values.clone()),
        )])
        .unwrap();

        let report = outlier_report(&ds, TIME_SPENT_HOURS, 3.0, 1.5).unwrap();

        assert_eq!(report.iqr_indices(), vec![8]);
        assert!(report.zscore_indices().is_empty());
        assert_eq!(report.disagreements(), vec![8]);
        assert!(report.zscore_indices().iter().all(|&i| i < values.len()));
        assert!(report.iqr_indices().iter().all(|&i| i < values.len()));
    }

    #[test]
    fn report_does_not_remove_rows() {
        let values: Vec<f64> = (0..20).map(f64::from).chain([500.0]).collect();
        let ds = Dataset::new(vec![(
            TIME_SPENT_HOURS.to_string(),
            Column::Numeric(values),
        )])
        .unwrap();
        let report = outlier_report(&ds, TIME_SPENT_HOURS, 3.0, 1.5).unwrap();
        assert_eq!(report.zscore_flags.len(), 21);
        assert_eq!(report.iqr.flags.len(), 21);
        assert!(report.iqr_percentage() > 0.0);
        assert_eq!(ds.len(), 21);
    }
}
