//! The full robustness battery for the course completion study.

use course_stats_analysis::cleaning::filter;
use course_stats_analysis::effect_size::{cohens_d, EffectSize};
use course_stats_analysis::hypothesis::{
    chi_squared_independence, levene_test, normality_test, ContingencyTable, Group, TestResult,
    TestSummary, MIN_EXPECTED_FREQUENCY,
};
use course_stats_core::dataset::{
    COMPLETED, COMPLETED_NO, COMPLETED_YES, COURSE_TYPE, DEVICE_USED, TIME_SPENT_HOURS,
};
use course_stats_core::{AnalysisConfig, Dataset, StatsError, StatsResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bootstrap::{BootstrapConfig, BootstrapInterval, BootstrapResampler};
use crate::comparison::RobustnessComparison;
use crate::design::{GroupedDesign, Procedure};
use crate::harness::{Perturbation, RobustnessHarness, SensitivityReport};

/// Cohen's d of completed vs not completed with its bootstrap interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSizeStability {
    pub effect: EffectSize,
    pub interval: BootstrapInterval,
    /// True when the point estimate lies strictly inside the interval.
    pub stable: bool,
}

/// Normality test of one completion group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNormality {
    pub group: String,
    pub test: TestResult,
}

/// Adequacy of the chi-squared expected frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedFrequencyCheck {
    pub min_expected: f64,
    pub cells_below: usize,
    /// True when every expected cell is at least 5.
    pub adequate: bool,
}

/// Results of every robustness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    /// Pooled t-test vs Mann-Whitney U on time by completion.
    pub t_vs_mann_whitney: RobustnessComparison,
    /// Pooled vs Welch t-test on time by completion.
    pub student_vs_welch: RobustnessComparison,
    /// Equal-variance check backing the Student/Welch comparison.
    pub levene: TestResult,
    /// ANOVA vs Kruskal-Wallis on time by device.
    pub anova_vs_kruskal: RobustnessComparison,
    pub outlier_sensitivity: RobustnessComparison,
    pub bootstrap_means: RobustnessComparison,
    pub effect_size: EffectSizeStability,
    pub sample_size: SensitivityReport,
    /// Normality of time spent within each completion group, in group order.
    pub normality: Vec<GroupNormality>,
    pub expected_frequencies: ExpectedFrequencyCheck,
}

impl ExpectedFrequencyCheck {
    /// Reads the expected counts recorded by a chi-squared test.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if `result` is not a contingency test.
    pub fn from_test(result: &TestResult) -> StatsResult<Self> {
        let TestSummary::Contingency(table) = &result.summary else {
            return Err(StatsError::InvalidParameter(format!(
                "{} carries no expected frequencies",
                result.kind.name()
            )));
        };
        let min_expected = table
            .expected
            .iter()
            .flatten()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let cells_below = table
            .expected
            .iter()
            .flatten()
            .filter(|&&e| e < MIN_EXPECTED_FREQUENCY)
            .count();
        Ok(Self {
            min_expected,
            cells_below,
            adequate: cells_below == 0,
        })
    }
}

impl RobustnessReport {
    /// Comparisons whose perturbed decision disagrees with the base.
    #[must_use]
    pub fn conflicts(&self) -> Vec<&RobustnessComparison> {
        [
            &self.t_vs_mann_whitney,
            &self.student_vs_welch,
            &self.anova_vs_kruskal,
            &self.outlier_sensitivity,
            &self.bootstrap_means,
        ]
        .into_iter()
        .filter(|c| !c.agrees)
        .collect()
    }
}

/// Runs the robustness battery.
pub struct RobustnessSuite;

impl RobustnessSuite {
    /// Cleans the dataset as the study does and runs every check on the
    /// clean view.
    ///
    /// # Errors
    /// Fails fast on invalid configuration, missing columns or degenerate
    /// inputs to any check.
    pub fn run(dataset: &Dataset, config: &AnalysisConfig) -> StatsResult<RobustnessReport> {
        config.validate()?;
        let alpha = config.alpha;
        let cleaning = filter(dataset, &config.cleaning.column, config.cleaning.lower_bound)?;
        let clean = cleaning.clean_view(dataset)?;

        let time = clean.numeric(TIME_SPENT_HOURS)?;
        let completed = clean.categorical(COMPLETED)?.to_vec();
        let completion = GroupedDesign::with_order(
            time.clone(),
            completed.clone(),
            vec![COMPLETED_YES.to_string(), COMPLETED_NO.to_string()],
        )?;
        let devices = GroupedDesign::new(time, clean.categorical(DEVICE_USED)?.to_vec())?;

        let student = RobustnessHarness::new(completion, Procedure::StudentT, alpha)?;
        let t_vs_mann_whitney =
            student.run(&Perturbation::AlternateTest(Procedure::MannWhitneyU))?;
        let student_vs_welch = student.run(&Perturbation::AlternateTest(Procedure::WelchT))?;

        let groups = student.design().groups();
        let group_refs: Vec<Group<'_>> = groups
            .iter()
            .map(|(label, values)| (label.as_str(), values.as_slice()))
            .collect();
        let levene = levene_test(&group_refs, alpha)?;

        let anova = RobustnessHarness::new(devices, Procedure::OneWayAnova, alpha)?;
        let anova_vs_kruskal = anova.run(&Perturbation::AlternateTest(Procedure::KruskalWallis))?;

        let outlier_sensitivity = student.run(&Perturbation::OutlierRemoval {
            k: config.outliers.iqr_k,
        })?;

        let bootstrap_config = BootstrapConfig::from(&config.bootstrap);
        let bootstrap_means = student.run(&Perturbation::Bootstrap {
            config: bootstrap_config.clone(),
        })?;

        let (yes, no) = (&groups[0].1, &groups[1].1);
        let effect = cohens_d(yes, no)?;
        let interval = BootstrapResampler::new(bootstrap_config)?.bootstrap_two_sample(
            yes,
            no,
            |a, b| cohens_d(a, b).map_or(f64::NAN, |e| e.d),
        )?;
        let stable = interval.ci_lower < effect.d && effect.d < interval.ci_upper;
        let effect_size = EffectSizeStability {
            effect,
            interval,
            stable,
        };

        let sample_size =
            student.sample_size_sensitivity(&config.subsample.fractions, config.subsample.seed)?;

        let normality = groups
            .iter()
            .map(|(label, values)| -> StatsResult<GroupNormality> {
                Ok(GroupNormality {
                    group: label.clone(),
                    test: normality_test(label, values, alpha)?,
                })
            })
            .collect::<StatsResult<Vec<_>>>()?;

        let table = ContingencyTable::from_labels(clean.categorical(COURSE_TYPE)?, &completed)?;
        let chi_squared = chi_squared_independence(&table, alpha)?;
        let expected_frequencies = ExpectedFrequencyCheck::from_test(&chi_squared)?;

        let report = RobustnessReport {
            t_vs_mann_whitney,
            student_vs_welch,
            levene,
            anova_vs_kruskal,
            outlier_sensitivity,
            bootstrap_means,
            effect_size,
            sample_size,
            normality,
            expected_frequencies,
        };
        let non_normal = report.normality.iter().filter(|g| g.test.rejects_null()).count();
        if non_normal > 0 {
            info!(non_normal, "Completion groups deviate from normality");
        }
        let conflicts = report.conflicts().len();
        if conflicts > 0 {
            warn!(conflicts, "Robustness checks disagree with base decisions");
        }
        info!(
            conflicts,
            sample_size_consistent = report.sample_size.consistent,
            "Robustness suite complete"
        );
        Ok(report)
    }
}
