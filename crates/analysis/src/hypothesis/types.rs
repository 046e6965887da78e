//! Value types shared by every hypothesis test.

use course_stats_core::{validate_alpha, SampleSummary, StatsResult};
use serde::{Deserialize, Serialize};

/// Conventional significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Identity of the test that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestKind {
    /// Pooled-variance two-sample t-test. H0: μ1 = μ2.
    StudentT,
    /// Unequal-variance two-sample t-test. H0: μ1 = μ2.
    WelchT,
    /// Rank-sum test. H0: the two distributions are equal.
    MannWhitneyU,
    /// One-sample t-test. H0: μ = reference.
    OneSampleT,
    /// Chi-squared test of independence. H0: the two categorical variables are independent.
    ChiSquaredIndependence,
    /// One-way ANOVA. H0: all group means are equal.
    OneWayAnova,
    /// Kruskal-Wallis H test. H0: all group distributions are equal.
    KruskalWallis,
    /// Levene test (median-centred). H0: all group variances are equal.
    Levene,
    /// Pooled two-proportion z-test. H0: p1 <= p2.
    TwoProportionZ,
    /// D'Agostino-Pearson omnibus K² test. H0: the sample comes from a normal distribution.
    Normality,
}

impl TestKind {
    /// Human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StudentT => "Two-sample t-test",
            Self::WelchT => "Welch's t-test",
            Self::MannWhitneyU => "Mann-Whitney U test",
            Self::OneSampleT => "One-sample t-test",
            Self::ChiSquaredIndependence => "Chi-squared test of independence",
            Self::OneWayAnova => "One-way ANOVA",
            Self::KruskalWallis => "Kruskal-Wallis H test",
            Self::Levene => "Levene's test",
            Self::TwoProportionZ => "Two-proportion z-test",
            Self::Normality => "D'Agostino-Pearson normality test",
        }
    }

    /// Returns true for rank-based tests.
    #[must_use]
    pub const fn is_non_parametric(&self) -> bool {
        matches!(self, Self::MannWhitneyU | Self::KruskalWallis)
    }
}

/// Outcome of comparing a p-value with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Reject,
    FailToReject,
}

impl Decision {
    /// Reject iff `p_value < alpha`, strictly.
    #[must_use]
    pub fn from_p_value(p_value: f64, alpha: f64) -> Self {
        if p_value < alpha {
            Self::Reject
        } else {
            Self::FailToReject
        }
    }

    #[must_use]
    pub const fn is_reject(&self) -> bool {
        matches!(self, Self::Reject)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reject => "REJECT H0",
            Self::FailToReject => "FAIL TO REJECT H0",
        }
    }
}

/// Alternative hypothesis of a one-sample test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alternative {
    TwoSided,
    /// H1: parameter > reference.
    Greater,
    /// H1: parameter < reference.
    Less,
}

/// Tail of the reported p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tail {
    TwoTailed,
    OneTailed(Alternative),
}

/// Assumption violation attached to an otherwise successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssumptionWarning {
    /// Some expected contingency-table cells are below 5.
    LowExpectedFrequency { min_expected: f64, cells_below: usize },
    /// A group is small enough that the normal approximation is doubtful.
    SmallSample { group: String, n: usize },
}

/// Observed and expected counts of a chi-squared test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencySummary {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub observed: Vec<Vec<u64>>,
    pub expected: Vec<Vec<f64>>,
    pub yates_corrected: bool,
}

impl ContingencySummary {
    /// Smallest expected cell frequency.
    #[must_use]
    pub fn min_expected(&self) -> f64 {
        self.expected
            .iter()
            .flatten()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }
}

/// Sums of squares and mean squares of a one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaTable {
    pub ss_between: f64,
    pub ss_within: f64,
    pub ss_total: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub ms_between: f64,
    pub ms_within: f64,
}

/// One group of a two-proportion test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionGroup {
    pub successes: u64,
    pub size: u64,
}

impl ProportionGroup {
    #[must_use]
    pub const fn new(successes: u64, size: u64) -> Self {
        Self { successes, size }
    }

    /// Success rate, `0.0` for an empty group.
    #[must_use]
    pub fn proportion(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.successes as f64 / self.size as f64
        }
    }
}

/// Inputs that produced a test result, kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestSummary {
    TwoSample {
        group_a: SampleSummary,
        group_b: SampleSummary,
    },
    OneSample {
        sample: SampleSummary,
        reference: f64,
        p_two_tailed: f64,
    },
    Contingency(ContingencySummary),
    Groups {
        labels: Vec<String>,
        groups: Vec<SampleSummary>,
        /// Present for ANOVA-family tests.
        anova: Option<AnovaTable>,
    },
    Proportions {
        group_a: ProportionGroup,
        group_b: ProportionGroup,
        pooled_proportion: f64,
        standard_error: f64,
    },
    Normality {
        sample: SampleSummary,
        /// Biased sample skewness g1.
        skewness: f64,
        /// Pearson kurtosis b2 (normal distribution = 3).
        kurtosis: f64,
        z_skewness: f64,
        z_kurtosis: f64,
    },
}

/// Result of one hypothesis test.
///
/// `decision` is always `Decision::from_p_value(p_value, alpha)`; build
/// results through [`TestResult::new`] to keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub kind: TestKind,
    pub statistic: f64,
    /// Degrees of freedom, absent for rank and z tests.
    pub df: Option<f64>,
    pub p_value: f64,
    pub alpha: f64,
    pub decision: Decision,
    pub tail: Tail,
    pub summary: TestSummary,
    pub warnings: Vec<AssumptionWarning>,
}

impl TestResult {
    /// Builds a result and derives the decision from `p_value` and `alpha`.
    ///
    /// # Errors
    /// [`course_stats_core::StatsError::InvalidParameter`] if alpha is outside (0, 1).
    pub fn new(
        kind: TestKind,
        statistic: f64,
        df: Option<f64>,
        p_value: f64,
        alpha: f64,
        tail: Tail,
        summary: TestSummary,
    ) -> StatsResult<Self> {
        validate_alpha(alpha)?;
        Ok(Self {
            kind,
            statistic,
            df,
            p_value,
            alpha,
            decision: Decision::from_p_value(p_value, alpha),
            tail,
            summary,
            warnings: Vec::new(),
        })
    }

    /// Attaches assumption warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<AssumptionWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    #[must_use]
    pub fn rejects_null(&self) -> bool {
        self.decision.is_reject()
    }

    /// True when a warning makes the decision assumption-uncertain.
    #[must_use]
    pub fn is_assumption_uncertain(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TestSummary {
        TestSummary::TwoSample {
            group_a: SampleSummary::of(&[1.0, 2.0]),
            group_b: SampleSummary::of(&[3.0, 4.0]),
        }
    }

    #[test]
    fn decision_is_strictly_less_than() {
        assert_eq!(Decision::from_p_value(0.049, 0.05), Decision::Reject);
        assert_eq!(Decision::from_p_value(0.05, 0.05), Decision::FailToReject);
        assert_eq!(Decision::from_p_value(0.5, 0.05), Decision::FailToReject);
    }

    #[test]
    fn nan_p_value_never_rejects() {
        assert_eq!(Decision::from_p_value(f64::NAN, 0.05), Decision::FailToReject);
    }

    #[test]
    fn result_derives_decision() {
        let result = TestResult::new(
            TestKind::StudentT,
            2.5,
            Some(10.0),
            0.03,
            0.05,
            Tail::TwoTailed,
            summary(),
        )
        .unwrap();
        assert!(result.rejects_null());
        assert!(!result.is_assumption_uncertain());
    }

    #[test]
    fn result_rejects_invalid_alpha() {
        let result = TestResult::new(
            TestKind::StudentT,
            2.5,
            None,
            0.03,
            0.0,
            Tail::TwoTailed,
            summary(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn warnings_mark_result_uncertain() {
        let result = TestResult::new(
            TestKind::ChiSquaredIndependence,
            1.0,
            Some(1.0),
            0.3,
            0.05,
            Tail::TwoTailed,
            summary(),
        )
        .unwrap()
        .with_warnings(vec![AssumptionWarning::LowExpectedFrequency {
            min_expected: 2.5,
            cells_below: 1,
        }]);
        assert!(result.is_assumption_uncertain());
    }

    #[test]
    fn proportion_of_empty_group_is_zero() {
        assert!((ProportionGroup::new(0, 0).proportion() - 0.0).abs() < f64::EPSILON);
        assert!((ProportionGroup::new(3, 4).proportion() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_kind_serializes_by_name() {
        let json = serde_json::to_string(&TestKind::WelchT).unwrap();
        assert_eq!(json, "\"WelchT\"");
        assert!(TestKind::KruskalWallis.is_non_parametric());
        assert!(!TestKind::OneWayAnova.is_non_parametric());
    }
}
