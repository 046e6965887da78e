//! Pooled two-proportion z-test.

use course_stats_core::distributions::normal_sf;
use course_stats_core::{validate_alpha, StatsError, StatsResult};
use tracing::debug;

use super::types::{Alternative, ProportionGroup, Tail, TestKind, TestResult, TestSummary};

/// Two-proportion z-test of H0: p1 <= p2 against H1: p1 > p2.
///
/// Uses the pooled proportion for the standard error and reports the upper
/// tail `1 - Φ(z)`.
///
/// # Errors
/// - [`StatsError::InsufficientSample`] if either group is empty
/// - [`StatsError::InvalidParameter`] if successes exceed the group size
/// - [`StatsError::DegenerateInput`] if the pooled proportion is 0 or 1
pub fn two_proportion_z_test(
    group1: ProportionGroup,
    group2: ProportionGroup,
    alpha: f64,
) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    for group in [&group1, &group2] {
        if group.size == 0 {
            return Err(StatsError::InsufficientSample(
                "two-proportion test needs non-empty groups".to_string(),
            ));
        }
        if group.successes > group.size {
            return Err(StatsError::InvalidParameter(format!(
                "{} successes exceed group size {}",
                group.successes, group.size
            )));
        }
    }

    let (n1, n2) = (group1.size as f64, group2.size as f64);
    let pooled = (group1.successes + group2.successes) as f64 / (n1 + n2);
    if pooled <= 0.0 || pooled >= 1.0 {
        return Err(StatsError::DegenerateInput(format!(
            "pooled proportion is {pooled}; standard error is zero"
        )));
    }

    let standard_error = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    let z = (group1.proportion() - group2.proportion()) / standard_error;
    let p_value = normal_sf(z);
    debug!(z, pooled, standard_error, p_value, "Two-proportion z-test");

    TestResult::new(
        TestKind::TwoProportionZ,
        z,
        None,
        p_value,
        alpha,
        Tail::OneTailed(Alternative::Greater),
        TestSummary::Proportions {
            group_a: group1,
            group_b: group2,
            pooled_proportion: pooled,
            standard_error,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_versus_forty() {
        let r = two_proportion_z_test(
            ProportionGroup::new(60, 100),
            ProportionGroup::new(40, 100),
            0.05,
        )
        .unwrap();

        match r.summary {
            TestSummary::Proportions {
                pooled_proportion,
                standard_error,
                ..
            } => {
                assert!((pooled_proportion - 0.5).abs() < 1e-12);
                assert!((standard_error - 0.005_f64.sqrt()).abs() < 1e-12);
            }
            ref other => panic!("unexpected summary {other:?}"),
        }
        assert!(r.statistic > 0.0);
        assert!((r.statistic - 2.828_427_12).abs() < 1e-6);
        assert!((r.p_value - 0.002_339).abs() < 1e-5, "p was {}", r.p_value);
        assert!(r.rejects_null());
    }

    #[test]
    fn lower_first_proportion_does_not_reject() {
        let r = two_proportion_z_test(
            ProportionGroup::new(40, 100),
            ProportionGroup::new(60, 100),
            0.05,
        )
        .unwrap();
        assert!(r.statistic < 0.0);
        assert!(r.p_value > 0.99);
        assert!(!r.rejects_null());
    }

    #[test]
    fn empty_group_is_insufficient() {
        let result =
            two_proportion_z_test(ProportionGroup::new(0, 0), ProportionGroup::new(4, 10), 0.05);
        assert!(matches!(result, Err(StatsError::InsufficientSample(_))));
    }

    #[test]
    fn successes_above_size_are_invalid() {
        let result =
            two_proportion_z_test(ProportionGroup::new(11, 10), ProportionGroup::new(4, 10), 0.05);
        assert!(matches!(result, Err(StatsError::InvalidParameter(_))));
    }

    #[test]
    fn all_successes_are_degenerate() {
        let result = two_proportion_z_test(
            ProportionGroup::new(10, 10),
            ProportionGroup::new(20, 20),
            0.05,
        );
        assert!(matches!(result, Err(StatsError::DegenerateInput(_))));
    }
}
