//! One-sample t-test against a fixed reference value.

use course_stats_core::distributions::student_t_two_tailed;
use course_stats_core::{validate_alpha, SampleSummary, StatsError, StatsResult};
use tracing::debug;

use super::types::{Alternative, Tail, TestKind, TestResult, TestSummary};

/// Converts a two-tailed p-value into a one-tailed one.
///
/// Policy: `p / 2` when the statistic lies in the hypothesised direction
/// (`t > 0` for [`Alternative::Greater`], `t < 0` for [`Alternative::Less`]),
/// otherwise `1 - p / 2`. For a symmetric reference distribution this matches
/// the directly computed one-tailed tail area; it is kept as an explicit
/// policy so it can be tested on its own.
#[must_use]
pub fn one_tailed_p_value(p_two_tailed: f64, statistic: f64, alternative: Alternative) -> f64 {
    let in_direction = match alternative {
        Alternative::TwoSided => return p_two_tailed,
        Alternative::Greater => statistic > 0.0,
        Alternative::Less => statistic < 0.0,
    };
    let half = p_two_tailed / 2.0;
    let p = if in_direction { half } else { 1.0 - half };
    p.clamp(0.0, 1.0)
}

/// One-sample t-test of H0: μ = `reference`.
///
/// H1 follows `alternative`: μ ≠ reference, μ > reference or μ < reference.
/// The reported p-value matches the alternative; the two-tailed value is kept
/// in the summary.
///
/// # Errors
/// - [`StatsError::InsufficientSample`] for fewer than 2 values
/// - [`StatsError::DegenerateInput`] for a constant sample
pub fn one_sample_t_test(
    sample: &[f64],
    reference: f64,
    alternative: Alternative,
    alpha: f64,
) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    if sample.len() < 2 {
        return Err(StatsError::InsufficientSample(format!(
            "one-sample t-test needs at least 2 values, got {}",
            sample.len()
        )));
    }

    let summary = SampleSummary::of(sample);
    let std_error = summary.std_dev / (summary.n as f64).sqrt();
    if !(std_error > f64::EPSILON * summary.mean.abs().max(1.0)) {
        return Err(StatsError::DegenerateInput(
            "sample has zero variance; t statistic is undefined".to_string(),
        ));
    }

    let t = (summary.mean - reference) / std_error;
    let df = (summary.n - 1) as f64;
    let p_two_tailed = student_t_two_tailed(t, df)?;
    let p_value = one_tailed_p_value(p_two_tailed, t, alternative);

    let tail = match alternative {
        Alternative::TwoSided => Tail::TwoTailed,
        one_sided => Tail::OneTailed(one_sided),
    };
    debug!(t, df, p_two_tailed, p_value, "One-sample t-test");

    TestResult::new(
        TestKind::OneSampleT,
        t,
        Some(df),
        p_value,
        alpha,
        tail,
        TestSummary::OneSample {
            sample: summary,
            reference,
            p_two_tailed,
        },
    )
}
