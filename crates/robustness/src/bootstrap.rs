//! Percentile bootstrap confidence intervals.
//!
//! Resampling is driven by a [`ChaCha8Rng`] seeded from the configuration, so
//! every interval is reproducible from its `(data, config)` pair.
//!
//! ```ignore
//! use course_stats_robustness::bootstrap::{BootstrapConfig, BootstrapResampler};
//!
//! let resampler = BootstrapResampler::new(BootstrapConfig::new(10_000, 0.95, 42))?;
//! let ci = resampler.bootstrap_mean(&hours)?;
//! println!("mean {:.2} [{:.2}, {:.2}]", ci.point_estimate, ci.ci_lower, ci.ci_upper);
//! ```

use course_stats_core::descriptive::{mean, quantile_sorted};
use course_stats_core::{BootstrapSettings, StatsError, StatsResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for bootstrap resampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of resamples.
    pub iterations: usize,
    /// Confidence level of the interval, e.g. 0.95.
    pub confidence_level: f64,
    pub seed: u64,
}

impl BootstrapConfig {
    #[must_use]
    pub fn new(iterations: usize, confidence_level: f64, seed: u64) -> Self {
        Self {
            iterations,
            confidence_level,
            seed,
        }
    }

    /// Same configuration with a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> StatsResult<()> {
        if self.iterations == 0 {
            return Err(StatsError::InvalidParameter(
                "bootstrap needs at least one iteration".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(StatsError::InvalidParameter(format!(
                "confidence level must lie in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

impl From<&BootstrapSettings> for BootstrapConfig {
    fn from(settings: &BootstrapSettings) -> Self {
        Self::new(settings.iterations, settings.confidence_level, settings.seed)
    }
}

/// Point estimate with its percentile confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapInterval {
    /// Statistic of the original sample.
    pub point_estimate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Standard deviation of the bootstrap distribution.
    pub standard_error: f64,
    /// Mean of the bootstrap distribution minus the point estimate.
    pub bias: f64,
    /// `ci_upper - ci_lower`.
    pub width: f64,
    /// True when zero lies outside the interval.
    pub excludes_zero: bool,
}

impl BootstrapInterval {
    /// Builds an interval and derives its width and zero-exclusion flag.
    #[must_use]
    pub fn new(
        point_estimate: f64,
        ci_lower: f64,
        ci_upper: f64,
        standard_error: f64,
        bias: f64,
    ) -> Self {
        Self {
            point_estimate,
            ci_lower,
            ci_upper,
            standard_error,
            bias,
            width: ci_upper - ci_lower,
            excludes_zero: ci_lower > 0.0 || ci_upper < 0.0,
        }
    }

    /// True unless one interval lies entirely above the other.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.ci_upper < other.ci_lower || other.ci_upper < self.ci_lower)
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.ci_lower <= value && value <= self.ci_upper
    }
}

/// Percentile interval of a sorted bootstrap distribution, interpolating
/// linearly between order statistics.
#[must_use]
pub fn percentile_ci(sorted_distribution: &[f64], confidence_level: f64) -> (f64, f64) {
    let tail = (1.0 - confidence_level) / 2.0;
    (
        quantile_sorted(sorted_distribution, tail),
        quantile_sorted(sorted_distribution, 1.0 - tail),
    )
}

/// Bootstrap resampler over `f64` samples.
#[derive(Debug, Clone)]
pub struct BootstrapResampler {
    config: BootstrapConfig,
}

impl BootstrapResampler {
    /// # Errors
    /// [`StatsError::InvalidParameter`] for zero iterations or a confidence
    /// level outside (0, 1).
    pub fn new(config: BootstrapConfig) -> StatsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Fills `buffer` with a resample of `values` drawn with replacement.
    fn resample_into(values: &[f64], buffer: &mut Vec<f64>, rng: &mut ChaCha8Rng) {
        buffer.clear();
        buffer.extend((0..values.len()).map(|_| values[rng.gen_range(0..values.len())]));
    }

    /// Bootstraps any statistic of one sample.
    ///
    /// Resamples whose statistic is not finite are dropped from the
    /// distribution.
    ///
    /// # Errors
    /// - [`StatsError::InsufficientSample`] for an empty sample
    /// - [`StatsError::DegenerateInput`] if the point estimate or every
    ///   resampled statistic is not finite
    pub fn bootstrap_statistic<F>(
        &self,
        values: &[f64],
        statistic: F,
    ) -> StatsResult<BootstrapInterval>
    where
        F: Fn(&[f64]) -> f64,
    {
        if values.is_empty() {
            return Err(StatsError::InsufficientSample(
                "cannot bootstrap an empty sample".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut buffer = Vec::with_capacity(values.len());
        let mut distribution = Vec::with_capacity(self.config.iterations);
        for _ in 0..self.config.iterations {
            Self::resample_into(values, &mut buffer, &mut rng);
            distribution.push(statistic(&buffer));
        }
        self.summarise(statistic(values), distribution)
    }

    /// Bootstraps a statistic of two independent samples, resampling each
    /// group separately.
    ///
    /// # Errors
    /// Same as [`Self::bootstrap_statistic`], for either sample.
    pub fn bootstrap_two_sample<F>(
        &self,
        a: &[f64],
        b: &[f64],
        statistic: F,
    ) -> StatsResult<BootstrapInterval>
    where
        F: Fn(&[f64], &[f64]) -> f64,
    {
        if a.is_empty() || b.is_empty() {
            return Err(StatsError::InsufficientSample(
                "cannot bootstrap an empty group".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut buffer_a = Vec::with_capacity(a.len());
        let mut buffer_b = Vec::with_capacity(b.len());
        let mut distribution = Vec::with_capacity(self.config.iterations);
        for _ in 0..self.config.iterations {
            Self::resample_into(a, &mut buffer_a, &mut rng);
            Self::resample_into(b, &mut buffer_b, &mut rng);
            distribution.push(statistic(&buffer_a, &buffer_b));
        }
        self.summarise(statistic(a, b), distribution)
    }

    /// Bootstraps the sample mean.
    ///
    /// # Errors
    /// Same as [`Self::bootstrap_statistic`].
    pub fn bootstrap_mean(&self, values: &[f64]) -> StatsResult<BootstrapInterval> {
        self.bootstrap_statistic(values, mean)
    }

    fn summarise(
        &self,
        point_estimate: f64,
        mut distribution: Vec<f64>,
    ) -> StatsResult<BootstrapInterval> {
        let total = distribution.len();
        distribution.retain(|x| x.is_finite());
        if !point_estimate.is_finite() || distribution.is_empty() {
            return Err(StatsError::DegenerateInput(
                "bootstrap statistic is not finite".to_string(),
            ));
        }
        if distribution.len() < total {
            debug!(
                dropped = total - distribution.len(),
                "Dropped non-finite bootstrap statistics"
            );
        }

        distribution.sort_by(f64::total_cmp);
        let (ci_lower, ci_upper) = percentile_ci(&distribution, self.config.confidence_level);

        let n = distribution.len();
        let boot_mean = distribution.iter().sum::<f64>() / n as f64;
        let variance = distribution
            .iter()
            .map(|x| (x - boot_mean).powi(2))
            .sum::<f64>()
            / (n - 1).max(1) as f64;

        Ok(BootstrapInterval::new(
            point_estimate,
            ci_lower,
            ci_upper,
            variance.sqrt(),
            boot_mean - point_estimate,
        ))
    }
}
