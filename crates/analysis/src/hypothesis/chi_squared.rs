//! Chi-squared test of independence on a contingency table.

use std::collections::BTreeMap;

use course_stats_core::distributions::chi_squared_sf;
use course_stats_core::{validate_alpha, StatsError, StatsResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{
    AssumptionWarning, ContingencySummary, Tail, TestKind, TestResult, TestSummary,
};

/// Expected cell frequency below which the chi-squared approximation is flagged.
pub const MIN_EXPECTED_FREQUENCY: f64 = 5.0;

/// Cross tabulation of two categorical variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `counts[row][col]`.
    pub counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Builds a table from explicit labels and counts.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if the counts do not match the labels.
    pub fn new(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        counts: Vec<Vec<u64>>,
    ) -> StatsResult<Self> {
        if counts.len() != row_labels.len()
            || counts.iter().any(|row| row.len() != col_labels.len())
        {
            return Err(StatsError::InvalidParameter(format!(
                "contingency counts do not match {}x{} labels",
                row_labels.len(),
                col_labels.len()
            )));
        }
        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    /// Cross-tabulates two equally long label columns. Labels are sorted.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if the columns differ in length.
    pub fn from_labels(rows: &[String], cols: &[String]) -> StatsResult<Self> {
        if rows.len() != cols.len() {
            return Err(StatsError::InvalidParameter(format!(
                "label columns differ in length: {} vs {}",
                rows.len(),
                cols.len()
            )));
        }

        let mut cells: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        let mut row_set = BTreeMap::new();
        let mut col_set = BTreeMap::new();
        for (r, c) in rows.iter().zip(cols) {
            *cells.entry((r.as_str(), c.as_str())).or_insert(0) += 1;
            row_set.insert(r.as_str(), ());
            col_set.insert(c.as_str(), ());
        }

        let row_labels: Vec<String> = row_set.keys().map(|s| (*s).to_string()).collect();
        let col_labels: Vec<String> = col_set.keys().map(|s| (*s).to_string()).collect();
        let counts = row_labels
            .iter()
            .map(|r| {
                col_labels
                    .iter()
                    .map(|c| cells.get(&(r.as_str(), c.as_str())).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    #[must_use]
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    #[must_use]
    pub fn col_totals(&self) -> Vec<u64> {
        (0..self.col_labels.len())
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }

    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Expected frequencies under independence: `row_total * col_total / N`.
    #[must_use]
    pub fn expected(&self) -> Vec<Vec<f64>> {
        let n = self.grand_total() as f64;
        let cols = self.col_totals();
        self.row_totals()
            .into_iter()
            .map(|r| {
                cols.iter()
                    .map(|&c| if n > 0.0 { r as f64 * c as f64 / n } else { 0.0 })
                    .collect()
            })
            .collect()
    }
}

/// Chi-squared test of independence.
///
/// H0: row and column variables are independent. H1: they are associated.
/// With one degree of freedom the Yates continuity correction is applied:
/// each |O - E| is reduced by at most 0.5. Expected cells below 5 produce a
/// [`AssumptionWarning::LowExpectedFrequency`] warning; the test still completes.
///
/// # Errors
/// - [`StatsError::InsufficientGroups`] with fewer than two rows or columns
/// - [`StatsError::DegenerateInput`] if any row or column total is zero
pub fn chi_squared_independence(table: &ContingencyTable, alpha: f64) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    let (r, c) = (table.row_labels.len(), table.col_labels.len());
    if r < 2 || c < 2 {
        return Err(StatsError::InsufficientGroups {
            required: 2,
            actual: r.min(c),
        });
    }
    if table.row_totals().contains(&0) || table.col_totals().contains(&0) {
        return Err(StatsError::DegenerateInput(
            "contingency table has an empty row or column".to_string(),
        ));
    }

    let expected = table.expected();
    let df = ((r - 1) * (c - 1)) as f64;
    let yates = r == 2 && c == 2;

    let mut statistic = 0.0;
    for (obs_row, exp_row) in table.counts.iter().zip(&expected) {
        for (&o, &e) in obs_row.iter().zip(exp_row) {
            let mut diff = (o as f64 - e).abs();
            if yates {
                diff -= diff.min(0.5);
            }
            statistic += diff * diff / e;
        }
    }
    let p_value = chi_squared_sf(statistic, df)?;
    debug!(statistic, df, p_value, yates, "Chi-squared test of independence");

    let summary = ContingencySummary {
        row_labels: table.row_labels.clone(),
        col_labels: table.col_labels.clone(),
        observed: table.counts.clone(),
        expected,
        yates_corrected: yates,
    };

    let min_expected = summary.min_expected();
    let cells_below = summary
        .expected
        .iter()
        .flatten()
        .filter(|&&e| e < MIN_EXPECTED_FREQUENCY)
        .count();
    let mut warnings = Vec::new();
    if cells_below > 0 {
        warn!(min_expected, cells_below, "Expected frequencies below 5");
        warnings.push(AssumptionWarning::LowExpectedFrequency {
            min_expected,
            cells_below,
        });
    }

    Ok(TestResult::new(
        TestKind::ChiSquaredIndependence,
        statistic,
        Some(df),
        p_value,
        alpha,
        Tail::TwoTailed,
        TestSummary::Contingency(summary),
    )?
    .with_warnings(warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(counts: Vec<Vec<u64>>) -> ContingencyTable {
        let rows = (0..counts.len()).map(|i| format!("r{i}")).collect();
        let cols = (0..counts[0].len()).map(|j| format!("c{j}")).collect();
        ContingencyTable::new(rows, cols, counts).unwrap()
    }

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    // ============================================
    // Table construction
    // ============================================

    #[test]
    fn from_labels_sorts_and_counts() {
        let rows = labels(&["Science", "Arts", "Science", "Arts", "Science"]);
        let cols = labels(&["Yes", "No", "No", "No", "Yes"]);
        let t = ContingencyTable::from_labels(&rows, &cols).unwrap();

        assert_eq!(t.row_labels, labels(&["Arts", "Science"]));
        assert_eq!(t.col_labels, labels(&["No", "Yes"]));
        assert_eq!(t.counts, vec![vec![2, 0], vec![1, 2]]);
        assert_eq!(t.grand_total(), 5);
    }

    #[test]
    fn from_labels_rejects_length_mismatch() {
        let result = ContingencyTable::from_labels(&labels(&["a"]), &labels(&["x", "y"]));
        assert!(matches!(result, Err(StatsError::InvalidParameter(_))));
    }

    #[test]
    fn new_rejects_ragged_counts() {
        let result = ContingencyTable::new(
            labels(&["a", "b"]),
            labels(&["x", "y"]),
            vec![vec![1, 2], vec![3]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn expected_totals_match_observed() {
        let t = table(vec![vec![12, 7, 30], vec![5, 19, 8]]);
        let expected = t.expected();
        for (i, row) in expected.iter().enumerate() {
            let total: f64 = row.iter().sum();
            assert!((total - t.row_totals()[i] as f64).abs() < 1e-9);
        }
        for j in 0..3 {
            let total: f64 = expected.iter().map(|row| row[j]).sum();
            assert!((total - t.col_totals()[j] as f64).abs() < 1e-9);
        }
    }

    // ============================================
    // Test statistic
    // ============================================

    #[test]
    fn balanced_table_is_independent() {
        let r = chi_squared_independence(&table(vec![vec![50, 50], vec![50, 50]]), 0.05).unwrap();
        assert!(r.statistic.abs() < 1e-12);
        assert!((r.p_value - 1.0).abs() < 1e-9);
        assert!(!r.rejects_null());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn two_by_two_applies_yates() {
        let r = chi_squared_independence(&table(vec![vec![10, 20], vec![30, 40]]), 0.05).unwrap();
        // Expected 12, 18, 28, 42; corrected |O - E| = 1.5
        let expected_stat = 2.25 / 12.0 + 2.25 / 18.0 + 2.25 / 28.0 + 2.25 / 42.0;
        assert!((r.statistic - expected_stat).abs() < 1e-9);
        assert!((r.p_value - 0.504).abs() < 0.005, "p was {}", r.p_value);
        match &r.summary {
            TestSummary::Contingency(s) => assert!(s.yates_corrected),
            other => panic!("unexpected summary {other:?}"),
        }
    }

    #[test]
    fn larger_table_has_no_correction() {
        let r = chi_squared_independence(
            &table(vec![vec![10, 20], vec![20, 10], vec![15, 15]]),
            0.05,
        )
        .unwrap();
        assert!((r.statistic - 100.0 / 15.0).abs() < 1e-9);
        assert_eq!(r.df, Some(2.0));
        // Chi-squared with 2 df: sf(x) = exp(-x / 2)
        assert!((r.p_value - (-50.0_f64 / 15.0).exp()).abs() < 1e-9);
        assert!(r.rejects_null());
    }

    #[test]
    fn small_expected_cells_warn_but_complete() {
        let r = chi_squared_independence(&table(vec![vec![3, 1], vec![1, 3]]), 0.05).unwrap();
        assert!(r.is_assumption_uncertain());
        match &r.warnings[0] {
            AssumptionWarning::LowExpectedFrequency {
                min_expected,
                cells_below,
            } => {
                assert!((min_expected - 2.0).abs() < 1e-9);
                assert_eq!(*cells_below, 4);
            }
            other => panic!("unexpected warning {other:?}"),
        }
    }

    // ============================================
    // Errors
    // ============================================

    #[test]
    fn single_column_is_insufficient() {
        let result = chi_squared_independence(&table(vec![vec![5], vec![7]]), 0.05);
        assert!(matches!(
            result,
            Err(StatsError::InsufficientGroups { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn empty_row_is_degenerate() {
        let result = chi_squared_independence(&table(vec![vec![5, 6], vec![0, 0]]), 0.05);
        assert!(matches!(result, Err(StatsError::DegenerateInput(_))));
    }
}
