use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::config::AnalysisConfig;

/// Environment prefix for overrides, e.g. `COURSE_STATS_ALPHA=0.01` or
/// `COURSE_STATS_BOOTSTRAP__SEED=7`.
pub const ENV_PREFIX: &str = "COURSE_STATS_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the analysis configuration by layering built-in defaults, an
    /// optional TOML file and `COURSE_STATS_` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, a value has the wrong
    /// type, or the merged configuration fails validation.
    pub fn load(path: Option<&Path>) -> Result<AnalysisConfig> {
        let mut figment = Figment::from(Serialized::defaults(AnalysisConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: AnalysisConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        tracing::debug!(?config, "Loaded analysis configuration");
        Ok(config)
    }
}
