//! Re-runs one base procedure under perturbations of its data or method.

use course_stats_analysis::hypothesis::{Decision, TestResult};
use course_stats_analysis::outliers::classify_iqr;
use course_stats_core::{validate_alpha, StatsError, StatsResult};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bootstrap::{BootstrapConfig, BootstrapResampler};
use crate::comparison::{Evidence, LabelledInterval, RobustnessComparison};
use crate::design::{GroupedDesign, Procedure};

/// A change to the data or the method of the base analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Perturbation {
    /// Per-group bootstrap intervals of the mean.
    Bootstrap { config: BootstrapConfig },
    /// Re-test on a random fraction of rows drawn without replacement.
    Subsample { fraction: f64, seed: u64 },
    /// Re-test after dropping IQR outliers of the design values.
    OutlierRemoval { k: f64 },
    /// Same data, different procedure.
    AlternateTest(Procedure),
}

impl Perturbation {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Bootstrap { config } => format!(
                "Bootstrap {:.0}% mean intervals ({} resamples)",
                config.confidence_level * 100.0,
                config.iterations
            ),
            Self::Subsample { fraction, .. } => format!("Subsample {:.0}%", fraction * 100.0),
            Self::OutlierRemoval { k } => format!("IQR outlier removal (k = {k})"),
            Self::AlternateTest(procedure) => format!("Alternate test: {}", procedure.name()),
        }
    }
}

/// Decision of the procedure on one subsample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub fraction: f64,
    pub n: usize,
    pub statistic: f64,
    pub p_value: f64,
    pub decision: Decision,
}

/// Decisions across subsample fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub points: Vec<SensitivityPoint>,
    /// True when every fraction reached the same decision.
    pub consistent: bool,
}

fn validate_fraction(fraction: f64) -> StatsResult<()> {
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidParameter(format!(
            "subsample fraction must lie in (0, 1], got {fraction}"
        )))
    }
}

/// Sorted row indices of a subsample of `floor(n * fraction)` rows.
fn subsample_indices(n: usize, fraction: f64, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let k = ((n as f64 * fraction).floor() as usize).min(n);
    let mut indices = rand::seq::index::sample(rng, n, k).into_vec();
    indices.sort_unstable();
    indices
}

/// A base analysis plus the machinery to perturb it.
#[derive(Debug, Clone)]
pub struct RobustnessHarness {
    design: GroupedDesign,
    procedure: Procedure,
    alpha: f64,
    base: TestResult,
}

impl RobustnessHarness {
    /// Runs the base procedure on the full design.
    ///
    /// # Errors
    /// Invalid alpha and every error of the base procedure.
    pub fn new(design: GroupedDesign, procedure: Procedure, alpha: f64) -> StatsResult<Self> {
        validate_alpha(alpha)?;
        let base = procedure.apply(&design, alpha)?;
        debug!(
            procedure = procedure.name(),
            p_value = base.p_value,
            "Base analysis for robustness checks"
        );
        Ok(Self {
            design,
            procedure,
            alpha,
            base,
        })
    }

    #[must_use]
    pub fn base(&self) -> &TestResult {
        &self.base
    }

    #[must_use]
    pub fn design(&self) -> &GroupedDesign {
        &self.design
    }

    #[must_use]
    pub fn procedure(&self) -> Procedure {
        self.procedure
    }

    /// Re-runs the analysis under `perturbation` and compares the outcome
    /// with the base result.
    ///
    /// # Errors
    /// Invalid perturbation parameters and every error of the perturbed
    /// analysis.
    pub fn run(&self, perturbation: &Perturbation) -> StatsResult<RobustnessComparison> {
        let evidence = match perturbation {
            Perturbation::Bootstrap { config } => {
                let resampler = BootstrapResampler::new(config.clone())?;
                let intervals = self
                    .design
                    .groups()
                    .into_iter()
                    .filter(|(_, values)| !values.is_empty())
                    .map(|(label, values)| {
                        Ok(LabelledInterval {
                            label,
                            interval: resampler.bootstrap_mean(&values)?,
                        })
                    })
                    .collect::<StatsResult<Vec<_>>>()?;
                Evidence::Intervals(intervals)
            }
            Perturbation::Subsample { fraction, seed } => {
                validate_fraction(*fraction)?;
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                let indices = subsample_indices(self.design.len(), *fraction, &mut rng);
                let subset = self.design.take(&indices)?;
                Evidence::Test(self.procedure.apply(&subset, self.alpha)?)
            }
            Perturbation::OutlierRemoval { k } => {
                let outliers = classify_iqr(self.design.values(), *k)?;
                let keep: Vec<bool> = outliers.flags.iter().map(|&f| !f).collect();
                let trimmed = self.design.select(&keep)?;
                debug!(
                    removed = self.design.len() - trimmed.len(),
                    "Removed IQR outliers"
                );
                Evidence::Test(self.procedure.apply(&trimmed, self.alpha)?)
            }
            Perturbation::AlternateTest(procedure) => {
                Evidence::Test(procedure.apply(&self.design, self.alpha)?)
            }
        };

        let comparison =
            RobustnessComparison::new(perturbation.label(), self.base.clone(), evidence);
        info!(
            check = %comparison.label,
            agrees = comparison.agrees,
            "Robustness check complete"
        );
        Ok(comparison)
    }

    /// Re-tests on subsamples of each fraction, drawn from one RNG stream
    /// seeded with `seed`.
    ///
    /// # Errors
    /// A fraction outside (0, 1] and every error of the procedure on a subsample.
    pub fn sample_size_sensitivity(
        &self,
        fractions: &[f64],
        seed: u64,
    ) -> StatsResult<SensitivityReport> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut points = Vec::with_capacity(fractions.len());
        for &fraction in fractions {
            validate_fraction(fraction)?;
            let indices = subsample_indices(self.design.len(), fraction, &mut rng);
            let result = self.procedure.apply(&self.design.take(&indices)?, self.alpha)?;
            points.push(SensitivityPoint {
                fraction,
                n: indices.len(),
                statistic: result.statistic,
                p_value: result.p_value,
                decision: result.decision,
            });
        }

        let consistent = points.windows(2).all(|w| w[0].decision == w[1].decision);
        Ok(SensitivityReport { points, consistent })
    }
}
