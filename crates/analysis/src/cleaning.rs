//! Data-quality filtering of physically impossible values.
//!
//! Rejected rows are excluded from the clean view; they are never imputed
//! or corrected.

use course_stats_core::{Dataset, StatsResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Reason attached to records below the lower bound.
pub const BELOW_LOWER_BOUND: &str = "value below physical lower bound";
/// Reason attached to missing (NaN) or infinite values.
pub const NON_FINITE_VALUE: &str = "missing or non-finite value";

fn rejection_reason(value: f64, lower_bound: f64) -> Option<&'static str> {
    if value.is_nan() || value == f64::INFINITY {
        Some(NON_FINITE_VALUE)
    } else if value < lower_bound {
        Some(BELOW_LOWER_BOUND)
    } else {
        None
    }
}

/// A record excluded by the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Row index in the original dataset.
    pub index: usize,
    /// The offending value.
    pub value: f64,
    pub reason: String,
}

/// Outcome of a data-quality pass over one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningResult {
    /// Column that was checked.
    pub column: String,
    pub lower_bound: f64,
    /// Row count of the original dataset.
    pub original_len: usize,
    /// `true` for rows kept in the clean view.
    pub keep_mask: Vec<bool>,
    pub rejected: Vec<RejectedRecord>,
}

impl CleaningResult {
    /// Number of rows in the clean view.
    #[must_use]
    pub fn kept_count(&self) -> usize {
        self.original_len - self.rejected.len()
    }

    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Indices of kept rows, in original order.
    #[must_use]
    pub fn kept_indices(&self) -> Vec<usize> {
        self.keep_mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect()
    }

    /// Share of rejected rows in percent, `0.0` for an empty dataset.
    #[must_use]
    pub fn rejection_percentage(&self) -> f64 {
        if self.original_len == 0 {
            return 0.0;
        }
        self.rejected.len() as f64 / self.original_len as f64 * 100.0
    }

    /// Applies the keep-mask to the dataset the result was computed from.
    ///
    /// # Errors
    /// Fails if `dataset` has a different row count than the filtered one.
    pub fn clean_view(&self, dataset: &Dataset) -> StatsResult<Dataset> {
        dataset.select(&self.keep_mask)
    }
}

/// Flags every row whose `column` value is below `lower_bound`, missing
/// or infinite. The clean view keeps only finite values `>= lower_bound`.
///
/// # Errors
/// [`course_stats_core::StatsError::InvalidColumn`] if the column is missing
/// or not numeric.
pub fn filter(dataset: &Dataset, column: &str, lower_bound: f64) -> StatsResult<CleaningResult> {
    let values = dataset.numeric(column)?;

    let mut keep_mask = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for (index, &value) in values.iter().enumerate() {
        match rejection_reason(value, lower_bound) {
            Some(reason) => {
                keep_mask.push(false);
                rejected.push(RejectedRecord {
                    index,
                    value,
                    reason: reason.to_string(),
                });
            }
            None => keep_mask.push(true),
        }
    }

    let result = CleaningResult {
        column: column.to_string(),
        lower_bound,
        original_len: dataset.len(),
        keep_mask,
        rejected,
    };

    if result.rejected_count() > 0 {
        warn!(
            column,
            rejected = result.rejected_count(),
            percentage = result.rejection_percentage(),
            "Rejected values below lower bound {lower_bound} or non-finite"
        );
    }
    info!(
        column,
        original = result.original_len,
        kept = result.kept_count(),
        "Data-quality filter applied"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_stats_core::dataset::{AGE, COMPLETED, TIME_SPENT_HOURS};
    use course_stats_core::{Column, StatsError};

    fn durations(values: Vec<f64>) -> Dataset {
        Dataset::new(vec![(TIME_SPENT_HOURS.to_string(), Column::Numeric(values))]).unwrap()
    }

    #[test]
    fn single_negative_value_among_hundred_rejected() {
        let mut values: Vec<f64> = (0..99).map(|i| 5.0 + f64::from(i) * 0.2).collect();
        values.insert(42, -4.75);
        let ds = durations(values);

        let result = filter(&ds, TIME_SPENT_HOURS, 0.0).unwrap();

        assert_eq!(result.rejected_count(), 1);
        assert_eq!(result.rejected[0].index, 42);
        assert!((result.rejected[0].value + 4.75).abs() < f64::EPSILON);
        assert_eq!(result.rejected[0].reason, BELOW_LOWER_BOUND);
        assert!((result.rejection_percentage() - 1.0).abs() < 1e-12);
        assert_eq!(result.kept_count(), 99);
    }

    #[test]
    fn all_valid_means_nothing_rejected() {
        let ds = durations(vec![0.0, 1.0, 2.0]);
        let result = filter(&ds, TIME_SPENT_HOURS, 0.0).unwrap();
        assert!(result.rejected.is_empty());
        assert!((result.rejection_percentage() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_dataset_has_zero_percentage() {
        let ds = durations(vec![]);
        let result = filter(&ds, TIME_SPENT_HOURS, 0.0).unwrap();
        assert_eq!(result.original_len, 0);
        assert!((result.rejection_percentage() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn value_equal_to_bound_is_kept() {
        let ds = durations(vec![0.0, -0.0, -0.01]);
        let result = filter(&ds, TIME_SPENT_HOURS, 0.0).unwrap();
        assert_eq!(result.keep_mask, vec![true, true, false]);
    }

    #[test]
    fn missing_durations_are_rejected_separately() {
        let ds = durations(vec![1.0, f64::NAN, 3.0, -1.0, f64::INFINITY]);
        let result = filter(&ds, TIME_SPENT_HOURS, 0.0).unwrap();

        assert_eq!(result.keep_mask, vec![true, false, true, false, false]);
        let reasons: Vec<(usize, &str)> = result
            .rejected
            .iter()
            .map(|r| (r.index, r.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (1, NON_FINITE_VALUE),
                (3, BELOW_LOWER_BOUND),
                (4, NON_FINITE_VALUE)
            ]
        );
        assert_eq!(result.kept_count() + result.rejected_count(), 5);

        let clean = result.clean_view(&ds).unwrap();
        assert_eq!(clean.numeric(TIME_SPENT_HOURS).unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn clean_view_is_subset() {
        let ds = durations(vec![3.0, -1.0, 4.0, -2.0]);
        let result = filter(&ds, TIME_SPENT_HOURS, 0.0).unwrap();
        let clean = result.clean_view(&ds).unwrap();
        assert_eq!(clean.numeric(TIME_SPENT_HOURS).unwrap(), vec![3.0, 4.0]);
        assert_eq!(result.kept_indices(), vec![0, 2]);
    }

    #[test]
    fn missing_or_categorical_column_fails() {
        let ds = Dataset::new(vec![
            (AGE.to_string(), Column::Integer(vec![20, 30])),
            (
                COMPLETED.to_string(),
                Column::Categorical(vec!["Yes".into(), "No".into()]),
            ),
        ])
        .unwrap();

        assert!(matches!(
            filter(&ds, TIME_SPENT_HOURS, 0.0),
            Err(StatsError::InvalidColumn { .. })
        ));
        assert!(matches!(
            filter(&ds, COMPLETED, 0.0),
            Err(StatsError::InvalidColumn { .. })
        ));
        // Integer columns are numeric
        assert!(filter(&ds, AGE, 0.0).is_ok());
    }
}
