//! Base-versus-perturbed comparisons.

use course_stats_analysis::hypothesis::TestResult;
use serde::{Deserialize, Serialize};

use crate::bootstrap::BootstrapInterval;

/// A bootstrap interval for one named group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledInterval {
    pub label: String,
    pub interval: BootstrapInterval,
}

/// What the perturbed analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evidence {
    Test(TestResult),
    Intervals(Vec<LabelledInterval>),
}

impl Evidence {
    /// Whether the evidence implies rejecting H0 at `alpha`.
    ///
    /// A test rejects iff `p < alpha`. A set of intervals rejects iff some
    /// pair does not overlap.
    #[must_use]
    pub fn implies_reject(&self, alpha: f64) -> bool {
        match self {
            Self::Test(result) => result.p_value < alpha,
            Self::Intervals(intervals) => intervals.iter().enumerate().any(|(i, a)| {
                intervals[i + 1..]
                    .iter()
                    .any(|b| !a.interval.overlaps(&b.interval))
            }),
        }
    }

    #[must_use]
    pub fn as_test(&self) -> Option<&TestResult> {
        match self {
            Self::Test(result) => Some(result),
            Self::Intervals(_) => None,
        }
    }
}

/// Outcome of re-running an analysis under one perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessComparison {
    pub label: String,
    pub base: TestResult,
    pub evidence: Evidence,
    /// `(p_base < alpha) == implied decision of the evidence`.
    pub agrees: bool,
}

impl RobustnessComparison {
    #[must_use]
    pub fn new(label: impl Into<String>, base: TestResult, evidence: Evidence) -> Self {
        let agrees = (base.p_value < base.alpha) == evidence.implies_reject(base.alpha);
        Self {
            label: label.into(),
            base,
            evidence,
            agrees,
        }
    }

    /// Absolute change in p-value, when the evidence is a test.
    #[must_use]
    pub fn p_value_change(&self) -> Option<f64> {
        self.evidence
            .as_test()
            .map(|t| (t.p_value - self.base.p_value).abs())
    }
}
