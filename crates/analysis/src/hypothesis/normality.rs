//! D'Agostino-Pearson omnibus normality test.
//!
//! Skewness and kurtosis are each transformed to an approximately standard
//! normal z-score; `K² = z_s² + z_k²` is chi-squared with 2 degrees of
//! freedom under H0.

use course_stats_core::descriptive::{excess_kurtosis, skewness};
use course_stats_core::distributions::chi_squared_sf;
use course_stats_core::{validate_alpha, SampleSummary, StatsError, StatsResult};
use tracing::debug;

use super::types::{AssumptionWarning, Tail, TestKind, TestResult, TestSummary};

/// Smallest sample the skewness transform is defined for.
pub const MIN_NORMALITY_SAMPLE: usize = 8;
/// Below this size the kurtosis transform is a rough approximation.
const KURTOSIS_RELIABLE_SAMPLE: usize = 20;

/// Biased skewness g1 and Pearson kurtosis b2, recovered from the adjusted
/// estimators.
fn biased_moments(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len() as f64;
    let adjusted_skew = skewness(values)?;
    let adjusted_kurt = excess_kurtosis(values)?;
    let g1 = adjusted_skew * (n - 2.0) / (n * (n - 1.0)).sqrt();
    let g2 = (adjusted_kurt * (n - 2.0) * (n - 3.0) / (n - 1.0) - 6.0) / (n + 1.0);
    Some((g1, g2 + 3.0))
}

/// z-score of the sample skewness.
fn skewness_z(g1: f64, n: f64) -> f64 {
    let mut y = g1 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    let ratio = y / alpha;
    delta * (ratio + (ratio * ratio + 1.0).sqrt()).ln()
}

/// z-score of the sample kurtosis (Anscombe-Glynn transform).
fn kurtosis_z(b2: f64, n: f64) -> f64 {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = ((1.0 - 2.0 / a) / denom.abs()).cbrt().copysign(denom);
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// D'Agostino-Pearson K² test of H0: `values` are drawn from a normal
/// distribution. H1: they are not.
///
/// Samples below 20 values get a [`AssumptionWarning::SmallSample`].
///
/// # Errors
/// - [`StatsError::InsufficientSample`] for fewer than 8 values
/// - [`StatsError::DegenerateInput`] for a constant sample
pub fn normality_test(label: &str, values: &[f64], alpha: f64) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    if values.len() < MIN_NORMALITY_SAMPLE {
        return Err(StatsError::InsufficientSample(format!(
            "normality test needs at least {MIN_NORMALITY_SAMPLE} values, got {}",
            values.len()
        )));
    }
    let (g1, b2) = biased_moments(values).ok_or_else(|| {
        StatsError::DegenerateInput(format!("group {label} has zero variance"))
    })?;

    let n = values.len() as f64;
    let z_skewness = skewness_z(g1, n);
    let z_kurtosis = kurtosis_z(b2, n);
    let k2 = z_skewness.powi(2) + z_kurtosis.powi(2);
    if !k2.is_finite() {
        return Err(StatsError::DegenerateInput(format!(
            "normality statistic for group {label} is not finite"
        )));
    }
    let p_value = chi_squared_sf(k2, 2.0)?;
    debug!(label, k2, z_skewness, z_kurtosis, p_value, "Normality test");

    let mut warnings = Vec::new();
    if values.len() < KURTOSIS_RELIABLE_SAMPLE {
        warnings.push(AssumptionWarning::SmallSample {
            group: label.to_string(),
            n: values.len(),
        });
    }

    Ok(TestResult::new(
        TestKind::Normality,
        k2,
        Some(2.0),
        p_value,
        alpha,
        Tail::TwoTailed,
        TestSummary::Normality {
            sample: SampleSummary::of(values),
            skewness: g1,
            kurtosis: b2,
            z_skewness,
            z_kurtosis,
        },
    )?
    .with_warnings(warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::{ContinuousCDF, Normal};

    /// Evenly spaced quantiles of the standard normal distribution.
    fn normal_quantiles(n: usize) -> Vec<f64> {
        let normal = Normal::new(0.0, 1.0).unwrap();
        (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.5) / n as f64))
            .collect()
    }

    /// Evenly spaced quantiles of the unit exponential distribution.
    fn exponential_quantiles(n: usize) -> Vec<f64> {
        (1..=n)
            .map(|i| -(1.0 - (i as f64 - 0.5) / n as f64).ln())
            .collect()
    }

    // ============================================
    // Known samples
    // ============================================

    #[test]
    fn normal_sample_is_not_rejected() {
        let r = normality_test("normal", &normal_quantiles(50), 0.05).unwrap();
        assert_eq!(r.kind, TestKind::Normality);
        assert!(r.statistic < 0.05, "K2 was {}", r.statistic);
        assert!(r.p_value > 0.95, "p was {}", r.p_value);
        assert!(!r.rejects_null());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn skewed_sample_is_rejected() {
        let r = normality_test("exponential", &exponential_quantiles(50), 0.05).unwrap();
        assert!((r.statistic - 24.6873).abs() < 1e-3, "K2 was {}", r.statistic);
        // chi-squared(2) survival is exp(-K2 / 2)
        assert!((r.p_value - (-r.statistic / 2.0).exp()).abs() < 1e-12);
        assert!(r.rejects_null());
        match r.summary {
            TestSummary::Normality {
                skewness,
                kurtosis,
                z_skewness,
                ..
            } => {
                assert!((skewness - 1.63561).abs() < 1e-4);
                assert!((kurtosis - 5.81334).abs() < 1e-4);
                assert!(z_skewness > 4.0);
            }
            other => panic!("unexpected summary {other:?}"),
        }
    }

    #[test]
    fn small_sample_carries_a_warning() {
        let r = normality_test("small", &normal_quantiles(12), 0.05).unwrap();
        assert_eq!(
            r.warnings,
            vec![AssumptionWarning::SmallSample {
                group: "small".to_string(),
                n: 12
            }]
        );
    }

    // ============================================
    // Degenerate inputs
    // ============================================

    #[test]
    fn too_few_values_is_insufficient() {
        assert!(matches!(
            normality_test("g", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 0.05),
            Err(StatsError::InsufficientSample(_))
        ));
    }

    #[test]
    fn constant_sample_is_degenerate() {
        assert!(matches!(
            normality_test("g", &[4.0; 30], 0.05),
            Err(StatsError::DegenerateInput(_))
        ));
    }
}
