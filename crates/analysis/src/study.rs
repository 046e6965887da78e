//! The fixed analysis battery over a course completion dataset.

use course_stats_core::dataset::{
    AGE, COMPLETED, COMPLETED_YES, COURSE_TYPE, DEVICE_USED, TIME_SPENT_HOURS, USER_ID,
};
use course_stats_core::{AnalysisConfig, Dataset, StatsResult, Summary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cleaning::{filter, CleaningResult};
use crate::correlation::{correlate, indicator, CorrelationMethod, CorrelationResult};
use crate::hypothesis::{
    chi_squared_independence, one_sample_t_test, one_way_anova, two_proportion_z_test,
    two_sample_t_test, Alternative, ContingencyTable, Group, ProportionGroup, TestResult,
    VarianceAssumption,
};
use crate::outliers::{outlier_report, OutlierReport};
use crate::patterns::{
    binned_rate_trend, category_distribution, cut, distribution_shape, group_values,
    rate_by_group, DistributionShape, GroupRate, LevelShare, RateTrend,
};

/// Right-inclusive age band edges and their labels.
pub const AGE_BAND_EDGES: [f64; 4] = [0.0, 30.0, 45.0, 60.0];
pub const AGE_BAND_LABELS: [&str; 3] = ["18-30", "31-45", "46-59"];

/// Number of equal-width user id bins in the completion trend.
pub const TREND_BINS: usize = 10;

/// A correlation between two named variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCorrelation {
    pub x: String,
    pub y: String,
    pub result: CorrelationResult,
}

/// Completion-rate patterns and trends of the clean view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub completion_by_course: Vec<GroupRate>,
    pub completion_by_device: Vec<GroupRate>,
    pub completion_by_age_band: Vec<GroupRate>,
    pub device_distribution: Vec<LevelShare>,
    pub completion_trend: RateTrend,
    pub time_shape: DistributionShape,
}

/// Everything the study computes, in pipeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyReport {
    pub cleaning: CleaningResult,
    pub time_summary: Summary,
    pub age_summary: Summary,
    /// Time spent, completed vs not completed (pooled t-test).
    pub time_by_completion: TestResult,
    /// Time spent against the configured reference (one-sided, greater).
    pub time_vs_reference: TestResult,
    /// Course type × completion.
    pub course_type_vs_completion: TestResult,
    /// Time spent across devices.
    pub time_by_device: TestResult,
    /// Mean age of the clean view, the split point of `completion_by_age`.
    pub average_age: f64,
    /// Completion of below-average vs above-average age.
    pub completion_by_age: TestResult,
    pub time_outliers: OutlierReport,
    pub correlations: Vec<NamedCorrelation>,
    pub patterns: PatternReport,
}

impl StudyReport {
    /// All hypothesis test results, in pipeline order.
    #[must_use]
    pub fn tests(&self) -> Vec<&TestResult> {
        vec![
            &self.time_by_completion,
            &self.time_vs_reference,
            &self.course_type_vs_completion,
            &self.time_by_device,
            &self.completion_by_age,
        ]
    }
}

/// Runs the study battery.
pub struct CourseStudy;

impl CourseStudy {
    /// Cleans the dataset and runs every analysis on the clean view.
    ///
    /// # Errors
    /// Fails fast on the first failing step: invalid configuration, missing or
    /// mistyped columns, or degenerate inputs to any test.
    pub fn run(dataset: &Dataset, config: &AnalysisConfig) -> StatsResult<StudyReport> {
        config.validate()?;
        let alpha = config.alpha;

        let cleaning = filter(dataset, &config.cleaning.column, config.cleaning.lower_bound)?;
        let clean = cleaning.clean_view(dataset)?;
        info!(
            kept = cleaning.kept_count(),
            rejected = cleaning.rejected_count(),
            "Running study on clean view"
        );

        let time = clean.numeric(TIME_SPENT_HOURS)?;
        let age = clean.numeric(AGE)?;
        let completed = clean.categorical(COMPLETED)?;
        let completed_flag = indicator(completed, COMPLETED_YES);

        let time_summary = Summary::describe(&time)?;
        let age_summary = Summary::describe(&age)?;

        let (time_yes, time_no): (Vec<f64>, Vec<f64>) = {
            let mut yes = Vec::new();
            let mut no = Vec::new();
            for (&t, &flag) in time.iter().zip(&completed_flag) {
                if flag > 0.5 {
                    yes.push(t);
                } else {
                    no.push(t);
                }
            }
            (yes, no)
        };
        let time_by_completion =
            two_sample_t_test(&time_yes, &time_no, VarianceAssumption::Equal, alpha)?;

        let time_vs_reference =
            one_sample_t_test(&time, config.one_sample.reference, Alternative::Greater, alpha)?;

        let course_table = ContingencyTable::from_labels(clean.categorical(COURSE_TYPE)?, completed)?;
        let course_type_vs_completion = chi_squared_independence(&course_table, alpha)?;

        let devices = clean.categorical(DEVICE_USED)?;
        let device_groups = group_values(&time, devices)?;
        let device_refs: Vec<Group<'_>> = device_groups
            .iter()
            .map(|(label, values)| (label.as_str(), values.as_slice()))
            .collect();
        let time_by_device = one_way_anova(&device_refs, alpha)?;

        let average_age = age_summary.mean;
        let (below, above) = age.iter().zip(&completed_flag).fold(
            (ProportionGroup::new(0, 0), ProportionGroup::new(0, 0)),
            |(mut below, mut above), (&a, &flag)| {
                let group = if a < average_age { &mut below } else { &mut above };
                group.size += 1;
                if flag > 0.5 {
                    group.successes += 1;
                }
                (below, above)
            },
        );
        let completion_by_age = two_proportion_z_test(below, above, alpha)?;

        let time_outliers = outlier_report(
            &clean,
            TIME_SPENT_HOURS,
            config.outliers.z_threshold,
            config.outliers.iqr_k,
        )?;

        let mut correlations = Vec::new();
        for (x_name, x, y_name, y) in [
            (TIME_SPENT_HOURS, &time, AGE, &age),
            (TIME_SPENT_HOURS, &time, COMPLETED, &completed_flag),
            (AGE, &age, COMPLETED, &completed_flag),
        ] {
            for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
                correlations.push(NamedCorrelation {
                    x: x_name.to_string(),
                    y: y_name.to_string(),
                    result: correlate(x, y, method)?,
                });
            }
        }

        let patterns = Self::patterns(&clean, &time, &age, completed)?;
        info!(
            tests = 5,
            correlations = correlations.len(),
            "Study complete"
        );

        Ok(StudyReport {
            cleaning,
            time_summary,
            age_summary,
            time_by_completion,
            time_vs_reference,
            course_type_vs_completion,
            time_by_device,
            average_age,
            completion_by_age,
            time_outliers,
            correlations,
            patterns,
        })
    }

    fn patterns(
        clean: &Dataset,
        time: &[f64],
        age: &[f64],
        completed: &[String],
    ) -> StatsResult<PatternReport> {
        let courses = clean.categorical(COURSE_TYPE)?;
        let devices = clean.categorical(DEVICE_USED)?;

        let (band_labels, band_outcomes): (Vec<String>, Vec<String>) = cut(age, &AGE_BAND_EDGES)?
            .into_iter()
            .zip(completed)
            .filter_map(|(band, outcome)| {
                band.map(|b| (AGE_BAND_LABELS[b].to_string(), outcome.clone()))
            })
            .unzip();

        let ids = clean.numeric(USER_ID)?;
        let outcomes: Vec<bool> = completed.iter().map(|c| c == COMPLETED_YES).collect();

        Ok(PatternReport {
            completion_by_course: rate_by_group(courses, completed, COMPLETED_YES)?,
            completion_by_device: rate_by_group(devices, completed, COMPLETED_YES)?,
            completion_by_age_band: rate_by_group(&band_labels, &band_outcomes, COMPLETED_YES)?,
            device_distribution: category_distribution(devices),
            completion_trend: binned_rate_trend(&ids, &outcomes, TREND_BINS)?,
            time_shape: distribution_shape(time)?,
        })
    }
}
