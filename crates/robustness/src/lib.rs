//! Robustness checks for course completion statistics: bootstrap
//! intervals, subsampling, outlier removal and alternate procedures, each
//! compared against a base test decision.

pub mod bootstrap;
pub mod comparison;
pub mod design;
pub mod harness;
pub mod suite;

pub use bootstrap::{percentile_ci, BootstrapConfig, BootstrapInterval, BootstrapResampler};
pub use comparison::{Evidence, LabelledInterval, RobustnessComparison};
pub use design::{GroupedDesign, Procedure};
pub use harness::{Perturbation, RobustnessHarness, SensitivityPoint, SensitivityReport};
pub use suite::{
    EffectSizeStability, ExpectedFrequencyCheck, GroupNormality, RobustnessReport, RobustnessSuite,
};
