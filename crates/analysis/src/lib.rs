//! Statistical analysis of course completion data: data-quality filtering,
//! outlier classification, hypothesis tests, correlation, effect size,
//! patterns and the study battery that ties them together.

pub mod cleaning;
pub mod correlation;
pub mod effect_size;
pub mod hypothesis;
pub mod outliers;
pub mod patterns;
pub mod study;

pub use cleaning::{filter, CleaningResult, RejectedRecord};
pub use correlation::{
    correlate, correlation_matrix, indicator, CorrelationMatrix, CorrelationMethod,
    CorrelationResult, Direction, Strength,
};
pub use effect_size::{cohens_d, EffectMagnitude, EffectSize};
pub use hypothesis::{
    chi_squared_independence, kruskal_wallis, levene_test, mann_whitney_u, normality_test,
    one_sample_t_test, one_way_anova, two_proportion_z_test, two_sample_t_test, Alternative,
    AssumptionWarning, ContingencyTable, Decision, Tail, TestKind, TestResult, TestSummary,
    VarianceAssumption,
};
pub use outliers::{classify_iqr, classify_zscore, outlier_report, IqrClassification, OutlierReport};
pub use study::{CourseStudy, NamedCorrelation, PatternReport, StudyReport};
