//! Core types for the course completion statistics engine: the immutable
//! dataset model, the error taxonomy, descriptive statistics, reference
//! distributions and the analysis configuration.

pub mod config;
pub mod config_loader;
pub mod dataset;
pub mod descriptive;
pub mod distributions;
pub mod error;

pub use config::{
    AnalysisConfig, BootstrapSettings, CleaningConfig, OneSampleConfig, OutlierConfig,
    SubsampleSettings,
};
pub use config_loader::ConfigLoader;
pub use dataset::{Column, ColumnKind, CourseRecord, Dataset};
pub use descriptive::{SampleSummary, Summary};
pub use error::{validate_alpha, StatsError, StatsResult};
