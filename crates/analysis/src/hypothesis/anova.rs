//! Tests across k independent groups: one-way ANOVA, Kruskal-Wallis and the
//! median-centred Levene test for equal variances.

use course_stats_core::descriptive::{mean, median, rank_average, tie_counts};
use course_stats_core::distributions::{chi_squared_sf, f_sf};
use course_stats_core::{validate_alpha, SampleSummary, StatsError, StatsResult};
use tracing::debug;

use super::types::{AnovaTable, Tail, TestKind, TestResult, TestSummary};

/// A labelled group of observations.
pub type Group<'a> = (&'a str, &'a [f64]);

/// Drops empty groups and requires at least two to remain.
fn non_empty_groups<'a>(groups: &[Group<'a>]) -> StatsResult<Vec<Group<'a>>> {
    let kept: Vec<Group<'a>> = groups
        .iter()
        .copied()
        .filter(|(_, values)| !values.is_empty())
        .collect();
    if kept.len() < 2 {
        return Err(StatsError::InsufficientGroups {
            required: 2,
            actual: kept.len(),
        });
    }
    Ok(kept)
}

fn labels_of(groups: &[Group<'_>]) -> Vec<String> {
    groups.iter().map(|(label, _)| (*label).to_string()).collect()
}

fn summaries_of(groups: &[Group<'_>]) -> Vec<SampleSummary> {
    groups.iter().map(|(_, values)| SampleSummary::of(values)).collect()
}

/// F statistic and sums of squares for already-filtered groups.
fn anova_table(groups: &[Group<'_>]) -> StatsResult<(f64, AnovaTable)> {
    let k = groups.len();
    let n: usize = groups.iter().map(|(_, v)| v.len()).sum();
    if n <= k {
        return Err(StatsError::InsufficientSample(format!(
            "ANOVA needs more observations ({n}) than groups ({k})"
        )));
    }

    let all: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let grand_mean = mean(&all);

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for (_, values) in groups {
        let group_mean = mean(values);
        ss_between += values.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += values.iter().map(|x| (x - group_mean).powi(2)).sum::<f64>();
    }
    let ss_total: f64 = all.iter().map(|x| (x - grand_mean).powi(2)).sum();

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;
    if !(ms_within > f64::EPSILON * grand_mean.abs().max(1.0)) {
        return Err(StatsError::DegenerateInput(
            "groups have zero within-group variance; F statistic is undefined".to_string(),
        ));
    }

    Ok((
        ms_between / ms_within,
        AnovaTable {
            ss_between,
            ss_within,
            ss_total,
            df_between,
            df_within,
            ms_between,
            ms_within,
        },
    ))
}

/// One-way ANOVA of H0: all group means are equal, against H1: at least one
/// differs. Empty groups are dropped before the test.
///
/// # Errors
/// - [`StatsError::InsufficientGroups`] when fewer than two non-empty groups remain
/// - [`StatsError::InsufficientSample`] when `N - k < 1`
/// - [`StatsError::DegenerateInput`] when every group is constant
pub fn one_way_anova(groups: &[Group<'_>], alpha: f64) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    let groups = non_empty_groups(groups)?;
    let (f, table) = anova_table(&groups)?;
    let p_value = f_sf(f, table.df_between, table.df_within)?;
    debug!(f, df_between = table.df_between, df_within = table.df_within, p_value, "One-way ANOVA");

    TestResult::new(
        TestKind::OneWayAnova,
        f,
        Some(table.df_between),
        p_value,
        alpha,
        Tail::TwoTailed,
        TestSummary::Groups {
            labels: labels_of(&groups),
            groups: summaries_of(&groups),
            anova: Some(table),
        },
    )
}

/// Kruskal-Wallis H test of H0: all groups come from the same distribution.
///
/// H is tie-corrected and compared with a chi-squared distribution on `k - 1`
/// degrees of freedom.
///
/// # Errors
/// - [`StatsError::InsufficientGroups`] when fewer than two non-empty groups remain
/// - [`StatsError::DegenerateInput`] when every observation is tied
pub fn kruskal_wallis(groups: &[Group<'_>], alpha: f64) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    let groups = non_empty_groups(groups)?;

    let all: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let n = all.len() as f64;
    let ranks = rank_average(&all);

    let mut h = 0.0;
    let mut offset = 0;
    for (_, values) in &groups {
        let rank_sum: f64 = ranks[offset..offset + values.len()].iter().sum();
        h += rank_sum * rank_sum / values.len() as f64;
        offset += values.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let tie_term: f64 = tie_counts(&all)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let correction = 1.0 - tie_term / (n * n * n - n);
    if !(correction > 0.0) {
        return Err(StatsError::DegenerateInput(
            "all observations are tied; rank test is undefined".to_string(),
        ));
    }
    h /= correction;

    let df = (groups.len() - 1) as f64;
    let p_value = chi_squared_sf(h, df)?;
    debug!(h, df, p_value, "Kruskal-Wallis H test");

    TestResult::new(
        TestKind::KruskalWallis,
        h,
        Some(df),
        p_value,
        alpha,
        Tail::TwoTailed,
        TestSummary::Groups {
            labels: labels_of(&groups),
            groups: summaries_of(&groups),
            anova: None,
        },
    )
}

/// Levene test of H0: all group variances are equal, median-centred
/// (Brown-Forsythe). Runs a one-way ANOVA on `|x - median(group)|`.
///
/// The summary keeps the summaries of the original values and the ANOVA table
/// of the absolute deviations.
///
/// # Errors
/// Same as [`one_way_anova`] applied to the deviations.
pub fn levene_test(groups: &[Group<'_>], alpha: f64) -> StatsResult<TestResult> {
    validate_alpha(alpha)?;
    let groups = non_empty_groups(groups)?;

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|(_, values)| {
            let center = median(values);
            values.iter().map(|x| (x - center).abs()).collect()
        })
        .collect();
    let deviation_groups: Vec<Group<'_>> = groups
        .iter()
        .zip(&deviations)
        .map(|((label, _), dev)| (*label, dev.as_slice()))
        .collect();

    let (w, table) = anova_table(&deviation_groups)?;
    let p_value = f_sf(w, table.df_between, table.df_within)?;
    debug!(w, p_value, "Levene test");

    TestResult::new(
        TestKind::Levene,
        w,
        Some(table.df_between),
        p_value,
        alpha,
        Tail::TwoTailed,
        TestSummary::Groups {
            labels: labels_of(&groups),
            groups: summaries_of(&groups),
            anova: Some(table),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const G1: &[f64] = &[1.0, 2.0, 3.0];
    const G2: &[f64] = &[4.0, 5.0, 6.0];
    const G3: &[f64] = &[7.0, 8.0, 9.0];

    fn g<'a>(label: &'a str, values: &'a [f64]) -> Group<'a> {
        (label, values)
    }

    fn anova_of(result: &TestResult) -> &AnovaTable {
        match &result.summary {
            TestSummary::Groups {
                anova: Some(table), ..
            } => table,
            other => panic!("unexpected summary {other:?}"),
        }
    }

    // ============================================
    // One-way ANOVA
    // ============================================

    #[test]
    fn anova_known_values() {
        let r = one_way_anova(&[g("a", G1), g("b", G2), g("c", G3)], 0.05).unwrap();
        let table = anova_of(&r);
        // Group means 2, 5, 8 around a grand mean of 5.
        assert!((table.ss_between - 54.0).abs() < 1e-9);
        assert!((table.ss_within - 6.0).abs() < 1e-9);
        assert!((table.ss_total - 60.0).abs() < 1e-9);
        assert!((r.statistic - 27.0).abs() < 1e-9);
        // F(2, 6) survival: (1 + 2F/6)^-3 = 10^-3
        assert!((r.p_value - 1e-3).abs() < 1e-9, "p was {}", r.p_value);
        assert!(r.rejects_null());
    }

    #[test]
    fn anova_sum_of_squares_identity() {
        let a = [12.5, 3.25, 8.0, 14.75];
        let b = [9.0, 11.5, 2.0];
        let c = [20.25, 1.0, 7.5, 6.0, 13.0];
        let r = one_way_anova(&[g("a", &a), g("b", &b), g("c", &c)], 0.05).unwrap();
        let t = anova_of(&r);
        assert!((t.ss_total - (t.ss_between + t.ss_within)).abs() < 1e-9);
        assert_eq!(t.df_within, 9.0);
    }

    #[test]
    fn anova_drops_empty_groups() {
        let r = one_way_anova(&[g("a", G1), g("empty", &[]), g("c", G3)], 0.05).unwrap();
        assert_eq!(r.df, Some(1.0));
        match &r.summary {
            TestSummary::Groups { labels, .. } => assert_eq!(labels, &["a", "c"]),
            other => panic!("unexpected summary {other:?}"),
        }
    }

    #[test]
    fn anova_single_group_is_insufficient() {
        let result = one_way_anova(&[g("a", G1), g("empty", &[])], 0.05);
        assert!(matches!(
            result,
            Err(StatsError::InsufficientGroups { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn anova_one_value_per_group_is_insufficient() {
        let result = one_way_anova(&[g("a", &[1.0]), g("b", &[2.0])], 0.05);
        assert!(matches!(result, Err(StatsError::InsufficientSample(_))));
    }

    #[test]
    fn anova_constant_groups_are_degenerate() {
        let result = one_way_anova(&[g("a", &[3.0, 3.0]), g("b", &[5.0, 5.0])], 0.05);
        assert!(matches!(result, Err(StatsError::DegenerateInput(_))));
    }

    // ============================================
    // Kruskal-Wallis
    // ============================================

    #[test]
    fn kruskal_known_values() {
        let r = kruskal_wallis(&[g("a", G1), g("b", G2), g("c", G3)], 0.05).unwrap();
        assert!((r.statistic - 7.2).abs() < 1e-9);
        assert!((r.p_value - (-3.6_f64).exp()).abs() < 1e-9);
        assert_eq!(r.df, Some(2.0));
    }

    #[test]
    fn kruskal_all_tied_is_degenerate() {
        let result = kruskal_wallis(&[g("a", &[2.0, 2.0]), g("b", &[2.0, 2.0])], 0.05);
        assert!(matches!(result, Err(StatsError::DegenerateInput(_))));
    }

    // ============================================
    // Levene
    // ============================================

    #[test]
    fn levene_equal_spread_gives_zero_statistic() {
        let r = levene_test(&[g("a", G1), g("b", G2)], 0.05).unwrap();
        assert!(r.statistic.abs() < 1e-9);
        assert!((r.p_value - 1.0).abs() < 1e-9);
        assert!(!r.rejects_null());
    }

    #[test]
    fn levene_detects_different_spread() {
        let r = levene_test(&[g("narrow", G1), g("wide", &[0.0, 10.0, 20.0])], 0.05).unwrap();
        // Deviations [1, 0, 1] vs [10, 0, 10]: SSB = 54, MSW = 606 / 9 / 4
        let expected = 54.0 / (606.0 / 9.0 / 4.0);
        assert!((r.statistic - expected).abs() < 1e-9);
        assert_eq!(r.kind, TestKind::Levene);
    }
}
