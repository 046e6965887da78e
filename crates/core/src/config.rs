use serde::{Deserialize, Serialize};

use crate::dataset::TIME_SPENT_HOURS;
use crate::error::{validate_alpha, StatsError, StatsResult};

/// Parameters of the fixed analysis battery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Significance level shared by every test.
    pub alpha: f64,
    pub cleaning: CleaningConfig,
    pub outliers: OutlierConfig,
    pub one_sample: OneSampleConfig,
    pub bootstrap: BootstrapSettings,
    pub subsample: SubsampleSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Numeric column checked for physically impossible values.
    pub column: String,
    /// Values strictly below this bound are rejected.
    pub lower_bound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// |z| above this is flagged.
    pub z_threshold: f64,
    /// IQR fence multiplier.
    pub iqr_k: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneSampleConfig {
    /// Reference mean (hours) from the previous study.
    pub reference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSettings {
    pub iterations: usize,
    pub confidence_level: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsampleSettings {
    /// Fractions of the clean dataset to re-test on.
    pub fractions: Vec<f64>,
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            cleaning: CleaningConfig {
                column: TIME_SPENT_HOURS.to_string(),
                lower_bound: 0.0,
            },
            outliers: OutlierConfig {
                z_threshold: 3.0,
                iqr_k: 1.5,
            },
            one_sample: OneSampleConfig { reference: 15.0 },
            bootstrap: BootstrapSettings {
                iterations: 10_000,
                confidence_level: 0.95,
                seed: 42,
            },
            subsample: SubsampleSettings {
                fractions: vec![0.25, 0.50, 0.75, 1.0],
                seed: 42,
            },
        }
    }
}

impl AnalysisConfig {
    /// Checks every parameter against its domain.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> StatsResult<()> {
        validate_alpha(self.alpha)?;
        if !self.cleaning.lower_bound.is_finite() {
            return Err(StatsError::InvalidParameter(
                "cleaning.lower_bound must be finite".to_string(),
            ));
        }
        if !(self.outliers.z_threshold > 0.0) {
            return Err(StatsError::InvalidParameter(
                "outliers.z_threshold must be positive".to_string(),
            ));
        }
        if !(self.outliers.iqr_k > 0.0) {
            return Err(StatsError::InvalidParameter(
                "outliers.iqr_k must be positive".to_string(),
            ));
        }
        if self.bootstrap.iterations == 0 {
            return Err(StatsError::InvalidParameter(
                "bootstrap.iterations must be at least 1".to_string(),
            ));
        }
        if !(self.bootstrap.confidence_level > 0.0 && self.bootstrap.confidence_level < 1.0) {
            return Err(StatsError::InvalidParameter(
                "bootstrap.confidence_level must lie in (0, 1)".to_string(),
            ));
        }
        if let Some(bad) = self
            .subsample
            .fractions
            .iter()
            .find(|f| !(**f > 0.0 && **f <= 1.0))
        {
            return Err(StatsError::InvalidParameter(format!(
                "subsample fraction {bad} must lie in (0, 1]"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.alpha - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.cleaning.column, TIME_SPENT_HOURS);
        assert_eq!(config.bootstrap.iterations, 10_000);
    }

    #[test]
    fn validate_rejects_bad_alpha() {
        let config = AnalysisConfig {
            alpha: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_fraction() {
        let mut config = AnalysisConfig::default();
        config.subsample.fractions.push(0.0);
        assert!(matches!(
            config.validate(),
            Err(StatsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_iterations() {
        let mut config = AnalysisConfig::default();
        config.bootstrap.iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
