//! Hypothesis tests. Every test is a pure function of its samples and `alpha`
//! and returns a [`TestResult`] whose decision is `p_value < alpha`.

pub mod anova;
pub mod chi_squared;
pub mod normality;
pub mod one_sample;
pub mod proportion;
pub mod two_sample;
pub mod types;

pub use anova::{kruskal_wallis, levene_test, one_way_anova, Group};
pub use chi_squared::{chi_squared_independence, ContingencyTable, MIN_EXPECTED_FREQUENCY};
pub use normality::{normality_test, MIN_NORMALITY_SAMPLE};
pub use one_sample::{one_sample_t_test, one_tailed_p_value};
pub use proportion::two_proportion_z_test;
pub use two_sample::{mann_whitney_u, two_sample_t_test, VarianceAssumption};
pub use types::{
    Alternative, AnovaTable, AssumptionWarning, ContingencySummary, Decision, ProportionGroup,
    Tail, TestKind, TestResult, TestSummary, DEFAULT_ALPHA,
};
