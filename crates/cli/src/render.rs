#![allow(clippy::format_push_string)]

use anyhow::Result;
use course_stats_analysis::hypothesis::{AssumptionWarning, Tail, TestResult};
use course_stats_analysis::StudyReport;
use course_stats_core::Summary;
use course_stats_robustness::{Evidence, RobustnessComparison, RobustnessReport};
use serde::Serialize;

const RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const LINE: &str = "───────────────────────────────────────────────────────────────\n";

/// Everything one invocation produces.
#[derive(Debug, Clone, Serialize)]
pub struct FullReport {
    pub study: StudyReport,
    /// Absent when the robustness checks were skipped.
    pub robustness: Option<RobustnessReport>,
}

/// Pretty-printed JSON of the whole report.
///
/// # Errors
/// Returns an error if a value cannot be serialized.
pub fn render_json(report: &FullReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn section(output: &mut String, title: &str) {
    output.push('\n');
    output.push_str(title);
    output.push('\n');
    output.push_str(LINE);
}

fn summary_line(output: &mut String, name: &str, s: &Summary) {
    output.push_str(&format!(
        "{name:<22} n={} mean={:.2} sd={:.2} min={:.2} median={:.2} max={:.2}\n",
        s.count, s.mean, s.std_dev, s.min, s.median, s.max
    ));
}

fn test_block(output: &mut String, title: &str, test: &TestResult) {
    let tail = match test.tail {
        Tail::TwoTailed => "two-tailed".to_string(),
        Tail::OneTailed(alt) => format!("one-tailed, {alt:?}"),
    };
    output.push_str(&format!("{title}\n"));
    output.push_str(&format!("  {} ({tail})\n", test.kind.name()));
    match test.df {
        Some(df) => output.push_str(&format!(
            "  statistic = {:.4}, df = {df:.2}, p = {:.6}\n",
            test.statistic, test.p_value
        )),
        None => output.push_str(&format!(
            "  statistic = {:.4}, p = {:.6}\n",
            test.statistic, test.p_value
        )),
    }
    output.push_str(&format!(
        "  {} at alpha = {}\n",
        test.decision.label(),
        test.alpha
    ));
    for warning in &test.warnings {
        match warning {
            AssumptionWarning::LowExpectedFrequency {
                min_expected,
                cells_below,
            } => output.push_str(&format!(
                "  warning: {cells_below} expected cell(s) below 5 (min {min_expected:.2})\n"
            )),
            AssumptionWarning::SmallSample { group, n } => {
                output.push_str(&format!("  warning: group {group} has only {n} values\n"));
            }
        }
    }
}

fn comparison_line(output: &mut String, comparison: &RobustnessComparison) {
    let verdict = if comparison.agrees { "agrees" } else { "CONFLICT" };
    let detail = match &comparison.evidence {
        Evidence::Test(test) => format!("p {:.6} -> {:.6}", comparison.base.p_value, test.p_value),
        Evidence::Intervals(intervals) => intervals
            .iter()
            .map(|i| {
                format!(
                    "{} [{:.2}, {:.2}]",
                    i.label, i.interval.ci_lower, i.interval.ci_upper
                )
            })
            .collect::<Vec<_>>()
            .join(", "),
    };
    output.push_str(&format!("{:<44} {verdict:<8} {detail}\n", comparison.label));
}

fn robustness_section(output: &mut String, robust: &RobustnessReport) {
    section(output, "Robustness");
    for comparison in [
        &robust.t_vs_mann_whitney,
        &robust.student_vs_welch,
        &robust.anova_vs_kruskal,
        &robust.outlier_sensitivity,
        &robust.bootstrap_means,
    ] {
        comparison_line(output, comparison);
    }
    output.push_str(&format!(
        "Levene equal variance: p = {:.6} ({})\n",
        robust.levene.p_value,
        robust.levene.decision.label()
    ));
    let effect = &robust.effect_size;
    output.push_str(&format!(
        "Cohen's d:             {:.3} {} [{:.3}, {:.3}] {}\n",
        effect.effect.d,
        effect.effect.magnitude.label(),
        effect.interval.ci_lower,
        effect.interval.ci_upper,
        if effect.stable { "stable" } else { "unstable" }
    ));
    for point in &robust.sample_size.points {
        output.push_str(&format!(
            "Subsample {:>5.1}% (n={:<5}) p = {:.6}  {}\n",
            point.fraction * 100.0,
            point.n,
            point.p_value,
            point.decision.label()
        ));
    }
    for normality in &robust.normality {
        output.push_str(&format!(
            "Normality, {:<11} K2 = {:.3}, p = {:.6} ({})\n",
            format!("{}:", normality.group),
            normality.test.statistic,
            normality.test.p_value,
            normality.test.decision.label()
        ));
    }
    let freq = &robust.expected_frequencies;
    output.push_str(&format!(
        "Chi-squared cells:     min expected {:.2}, {} below 5 ({})\n",
        freq.min_expected,
        freq.cells_below,
        if freq.adequate { "adequate" } else { "inadequate" }
    ));
}

/// Plain-text summary of the study and its robustness checks.
#[must_use]
pub fn render_text(report: &FullReport) -> String {
    let study = &report.study;
    let mut output = String::new();

    output.push('\n');
    output.push_str(RULE);
    output.push_str("               COURSE COMPLETION STATISTICS                    \n");
    output.push_str(RULE);

    section(&mut output, "Data Quality");
    output.push_str(&format!(
        "Rows:                  {}\n",
        study.cleaning.original_len
    ));
    output.push_str(&format!(
        "Rejected:              {} ({:.2}%) with {} < {}\n",
        study.cleaning.rejected_count(),
        study.cleaning.rejection_percentage(),
        study.cleaning.column,
        study.cleaning.lower_bound
    ));
    output.push_str(&format!(
        "Outliers:              {} by z-score, {} by IQR ({:.2}%), {} disputed\n",
        study.time_outliers.zscore_count(),
        study.time_outliers.iqr_count(),
        study.time_outliers.iqr_percentage(),
        study.time_outliers.disagreements().len()
    ));

    section(&mut output, "Descriptive Statistics");
    summary_line(&mut output, "Time spent (hours)", &study.time_summary);
    summary_line(&mut output, "Age", &study.age_summary);

    section(&mut output, "Hypothesis Tests");
    test_block(&mut output, "Time spent by completion", &study.time_by_completion);
    test_block(&mut output, "Time spent vs reference", &study.time_vs_reference);
    test_block(
        &mut output,
        "Course type vs completion",
        &study.course_type_vs_completion,
    );
    test_block(&mut output, "Time spent by device", &study.time_by_device);
    test_block(
        &mut output,
        &format!("Completion, age below vs at or above {:.1}", study.average_age),
        &study.completion_by_age,
    );

    section(&mut output, "Correlations");
    for c in &study.correlations {
        output.push_str(&format!(
            "{:<34} {:<8} r = {:>7.4}  p = {:.6}  {}\n",
            format!("{} ~ {}", c.x, c.y),
            c.result.method.name(),
            c.result.coefficient,
            c.result.p_value,
            c.result.strength.label()
        ));
    }

    section(&mut output, "Completion Patterns");
    for rate in &study.patterns.completion_by_course {
        output.push_str(&format!(
            "Course {:<15} {:>5.1}% of {}\n",
            rate.level, rate.rate_percent, rate.total
        ));
    }
    for rate in &study.patterns.completion_by_device {
        output.push_str(&format!(
            "Device {:<15} {:>5.1}% of {}\n",
            rate.level, rate.rate_percent, rate.total
        ));
    }
    for rate in &study.patterns.completion_by_age_band {
        output.push_str(&format!(
            "Age {:<18} {:>5.1}% of {}\n",
            rate.level, rate.rate_percent, rate.total
        ));
    }
    let trend = &study.patterns.completion_trend;
    output.push_str(&format!(
        "Trend over user id:    {:?} (slope {:.3} points per bin)\n",
        trend.direction, trend.slope
    ));
    let shape = &study.patterns.time_shape;
    output.push_str(&format!(
        "Time shape:            {:?}, {:?} (skew {:.3}, kurtosis {:.3})\n",
        shape.symmetry, shape.tailedness, shape.skewness, shape.kurtosis
    ));

    if let Some(robust) = &report.robustness {
        robustness_section(&mut output, robust);
    }

    output.push('\n');
    output.push_str(RULE);
    output
}
