//! Two independent samples: Student/Welch t-tests and the Mann-Whitney U test.

use course_stats_core::descriptive::{rank_average, tie_counts};
use course_stats_core::distributions::{normal_sf, student_t_two_tailed};
use course_stats_core::{validate_alpha, SampleSummary, StatsError, StatsResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{AssumptionWarning, Tail, TestKind, TestResult, TestSummary};

/// Below this group size the rank-sum normal approximation is flagged.
const MANN_WHITNEY_SMALL_GROUP: usize = 8;

/// Variance assumption of the two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarianceAssumption {
    /// Pooled variance, `n1 + n2 - 2` degrees of freedom.
    Equal,
    /// Separate variances, Welch-Satterthwaite degrees of freedom.
    Welch,
}

/// Two-sample t-test of H0: μa = μb against the two-sided alternative.
///
/// A zero standard error (both samples constant) fails with
/// [`StatsError::DegenerateInput`] rather than reporting p = 1: the statistic
/// is 0/0 and no decision can be derived from it.
///
/// # Errors
/// - [`StatsError::InsufficientSample`] if a group has fewer than 2 values
/// - [`StatsError::DegenerateInput`] if the standard error is zero
/// - [`StatsError::InvalidParameter`] if alpha is outside (0, 1)
pub fn two_sample_t_test(
    a: &[f64],
    b: &[f64],
    variance: VarianceAssumption,
    alpha: f64,
) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    if a.len() < 2 || b.len() < 2 {
        return Err(StatsError::InsufficientSample(format!(
            "t-test needs at least 2 values per group, got {} and {}",
            a.len(),
            b.len()
        )));
    }

    let sa = SampleSummary::of(a);
    let sb = SampleSummary::of(b);
    let (n1, n2) = (sa.n as f64, sb.n as f64);
    let (v1, v2) = (sa.variance(), sb.variance());

    let (kind, std_error, df) = match variance {
        VarianceAssumption::Equal => {
            let df = n1 + n2 - 2.0;
            let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
            (
                TestKind::StudentT,
                (pooled * (1.0 / n1 + 1.0 / n2)).sqrt(),
                df,
            )
        }
        VarianceAssumption::Welch => {
            let q1 = v1 / n1;
            let q2 = v2 / n2;
            let se2 = q1 + q2;
            let denom = q1 * q1 / (n1 - 1.0) + q2 * q2 / (n2 - 1.0);
            let df = if denom > 0.0 { se2 * se2 / denom } else { f64::NAN };
            (TestKind::WelchT, se2.sqrt(), df)
        }
    };

    let scale = sa.mean.abs().max(sb.mean.abs()).max(1.0);
    if !(std_error > f64::EPSILON * scale) {
        return Err(StatsError::DegenerateInput(
            "both samples have zero variance; t statistic is undefined".to_string(),
        ));
    }

    let t = (sa.mean - sb.mean) / std_error;
    let p_value = student_t_two_tailed(t, df)?;
    debug!(kind = kind.name(), t, df, p_value, "Two-sample t-test");

    TestResult::new(
        kind,
        t,
        Some(df),
        p_value,
        alpha,
        Tail::TwoTailed,
        TestSummary::TwoSample {
            group_a: sa,
            group_b: sb,
        },
    )
}

/// Mann-Whitney U (Wilcoxon rank-sum) test of H0: both samples come from the
/// same distribution, two-sided.
///
/// The statistic is U of the first sample. The p-value uses the normal
/// approximation with tie and continuity corrections; groups smaller than 8
/// get a [`AssumptionWarning::SmallSample`] warning.
///
/// # Errors
/// - [`StatsError::InsufficientSample`] if either group is empty
/// - [`StatsError::DegenerateInput`] if every value is tied
pub fn mann_whitney_u(a: &[f64], b: &[f64], alpha: f64) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    if a.is_empty() || b.is_empty() {
        return Err(StatsError::InsufficientSample(format!(
            "Mann-Whitney U needs non-empty groups, got {} and {}",
            a.len(),
            b.len()
        )));
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let n = n1 + n2;
    let combined: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranks = rank_average(&combined);
    let rank_sum_a: f64 = ranks[..a.len()].iter().sum();
    let u1 = rank_sum_a - n1 * (n1 + 1.0) / 2.0;

    let tie_term: f64 = tie_counts(&combined)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if !(sigma > 0.0) {
        return Err(StatsError::DegenerateInput(
            "all observations are tied; rank test is undefined".to_string(),
        ));
    }

    let z = ((u1 - mu).abs() - 0.5) / sigma;
    let p_value = (2.0 * normal_sf(z)).clamp(0.0, 1.0);
    debug!(u = u1, z, p_value, "Mann-Whitney U test");

    let mut warnings = Vec::new();
    for (label, len) in [("a", a.len()), ("b", b.len())] {
        if len < MANN_WHITNEY_SMALL_GROUP {
            warnings.push(AssumptionWarning::SmallSample {
                group: label.to_string(),
                n: len,
            });
        }
    }

    Ok(TestResult::new(
        TestKind::MannWhitneyU,
        u1,
        None,
        p_value,
        alpha,
        Tail::TwoTailed,
        TestSummary::TwoSample {
            group_a: SampleSummary::of(a),
            group_b: SampleSummary::of(b),
        },
    )?
    .with_warnings(warnings))
}
