//! Grouped observations and the procedures that can test them.

use course_stats_analysis::hypothesis::{
    kruskal_wallis, mann_whitney_u, one_way_anova, two_sample_t_test, Group, TestResult,
    VarianceAssumption,
};
use course_stats_core::{StatsError, StatsResult};
use serde::{Deserialize, Serialize};

/// Values with a parallel group label and a fixed group order.
///
/// The order decides which group is "a" in two-sample procedures and is kept
/// when the design is subset, so perturbed designs stay comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedDesign {
    values: Vec<f64>,
    labels: Vec<String>,
    order: Vec<String>,
}

impl GroupedDesign {
    /// Builds a design whose group order is the sorted set of labels.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if the columns differ in length.
    pub fn new(values: Vec<f64>, labels: Vec<String>) -> StatsResult<Self> {
        let mut order = labels.clone();
        order.sort();
        order.dedup();
        Self::with_order(values, labels, order)
    }

    /// Builds a design with an explicit group order.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if the columns differ in length, the
    /// order repeats a label, or a label is missing from the order.
    pub fn with_order(
        values: Vec<f64>,
        labels: Vec<String>,
        order: Vec<String>,
    ) -> StatsResult<Self> {
        if values.len() != labels.len() {
            return Err(StatsError::InvalidParameter(format!(
                "design values and labels differ in length: {} vs {}",
                values.len(),
                labels.len()
            )));
        }
        for (i, label) in order.iter().enumerate() {
            if order[..i].contains(label) {
                return Err(StatsError::InvalidParameter(format!(
                    "group '{label}' appears twice in the order"
                )));
            }
        }
        if let Some(stray) = labels.iter().find(|l| !order.contains(*l)) {
            return Err(StatsError::InvalidParameter(format!(
                "label '{stray}' is not part of the group order"
            )));
        }
        Ok(Self {
            values,
            labels,
            order,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Values of each group, in group order. Groups may be empty.
    #[must_use]
    pub fn groups(&self) -> Vec<(String, Vec<f64>)> {
        self.order
            .iter()
            .map(|level| {
                let values = self
                    .values
                    .iter()
                    .zip(&self.labels)
                    .filter(|(_, label)| *label == level)
                    .map(|(&v, _)| v)
                    .collect();
                (level.clone(), values)
            })
            .collect()
    }

    /// Rows at `indices`, keeping the group order.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] for an out-of-range index.
    pub fn take(&self, indices: &[usize]) -> StatsResult<Self> {
        let mut values = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            if i >= self.values.len() {
                return Err(StatsError::InvalidParameter(format!(
                    "row index {i} out of range for {} rows",
                    self.values.len()
                )));
            }
            values.push(self.values[i]);
            labels.push(self.labels[i].clone());
        }
        Ok(Self {
            values,
            labels,
            order: self.order.clone(),
        })
    }

    /// Rows where `keep` is true.
    ///
    /// # Errors
    /// [`StatsError::InvalidParameter`] if the mask length differs.
    pub fn select(&self, keep: &[bool]) -> StatsResult<Self> {
        if keep.len() != self.values.len() {
            return Err(StatsError::InvalidParameter(format!(
                "mask has {} entries, design has {} rows",
                keep.len(),
                self.values.len()
            )));
        }
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.take(&indices)
    }
}

/// Test applied to a [`GroupedDesign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Procedure {
    StudentT,
    WelchT,
    MannWhitneyU,
    OneWayAnova,
    KruskalWallis,
}

impl Procedure {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StudentT => "Student t-test",
            Self::WelchT => "Welch t-test",
            Self::MannWhitneyU => "Mann-Whitney U",
            Self::OneWayAnova => "One-way ANOVA",
            Self::KruskalWallis => "Kruskal-Wallis",
        }
    }

    /// Two-sample procedures compare the first two groups of the order.
    #[must_use]
    pub const fn is_two_sample(&self) -> bool {
        matches!(self, Self::StudentT | Self::WelchT | Self::MannWhitneyU)
    }

    /// Runs the procedure on a design.
    ///
    /// # Errors
    /// [`StatsError::InsufficientGroups`] if a two-sample procedure is given a
    /// design whose order does not hold exactly two groups, plus every error
    /// of the underlying test.
    pub fn apply(&self, design: &GroupedDesign, alpha: f64) -> StatsResult<TestResult> {
        let groups = design.groups();
        if self.is_two_sample() {
            if groups.len() != 2 {
                return Err(StatsError::InsufficientGroups {
                    required: 2,
                    actual: groups.len(),
                });
            }
            let (a, b) = (&groups[0].1, &groups[1].1);
            return match self {
                Self::StudentT => two_sample_t_test(a, b, VarianceAssumption::Equal, alpha),
                Self::WelchT => two_sample_t_test(a, b, VarianceAssumption::Welch, alpha),
                _ => mann_whitney_u(a, b, alpha),
            };
        }

        let refs: Vec<Group<'_>> = groups
            .iter()
            .map(|(label, values)| (label.as_str(), values.as_slice()))
            .collect();
        match self {
            Self::OneWayAnova => one_way_anova(&refs, alpha),
            _ => kruskal_wallis(&refs, alpha),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_stats_analysis::hypothesis::TestKind;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn completion_design() -> GroupedDesign {
        GroupedDesign::with_order(
            vec![19.0, 20.0, 22.0, 11.0, 16.0, 17.0, 29.0, 12.0],
            labels(&["Yes", "No", "Yes", "No", "Yes", "No", "Yes", "No"]),
            labels(&["Yes", "No"]),
        )
        .unwrap()
    }

    // ============================================================
    // Design
    // ============================================================

    #[test]
    fn new_sorts_group_order() {
        let d = GroupedDesign::new(vec![1.0, 2.0, 3.0], labels(&["b", "a", "b"])).unwrap();
        assert_eq!(d.order(), &["a".to_string(), "b".to_string()]);
        assert_eq!(d.groups()[1].1, vec![1.0, 3.0]);
    }

    #[test]
    fn explicit_order_is_kept() {
        let groups = completion_design().groups();
        assert_eq!(groups[0].0, "Yes");
        assert_eq!(groups[0].1, vec![19.0, 22.0, 16.0, 29.0]);
    }

    #[test]
    fn stray_label_is_rejected() {
        let result =
            GroupedDesign::with_order(vec![1.0], labels(&["Maybe"]), labels(&["Yes", "No"]));
        assert!(matches!(result, Err(StatsError::InvalidParameter(_))));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(GroupedDesign::new(vec![1.0, 2.0], labels(&["a"])).is_err());
    }

    #[test]
    fn take_keeps_order_and_rejects_out_of_range() {
        let d = completion_design();
        let sub = d.take(&[1, 3]).unwrap();
        assert_eq!(sub.order(), d.order());
        assert!(sub.groups()[0].1.is_empty());
        assert!(d.take(&[8]).is_err());
    }

    #[test]
    fn select_by_mask() {
        let d = completion_design();
        let mask: Vec<bool> = (0..8).map(|i| i < 4).collect();
        assert_eq!(d.select(&mask).unwrap().len(), 4);
        assert!(d.select(&[true]).is_err());
    }

    // ============================================================
    // Procedures
    // ============================================================

    #[test]
    fn two_sample_procedures_compare_ordered_groups() {
        let d = completion_design();
        let student = Procedure::StudentT.apply(&d, 0.05).unwrap();
        assert_eq!(student.kind, TestKind::StudentT);
        assert!(student.statistic > 0.0);
        assert_eq!(Procedure::WelchT.apply(&d, 0.05).unwrap().kind, TestKind::WelchT);
        assert_eq!(
            Procedure::MannWhitneyU.apply(&d, 0.05).unwrap().kind,
            TestKind::MannWhitneyU
        );
    }

    #[test]
    fn two_sample_procedure_needs_two_groups() {
        let d = GroupedDesign::new(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            labels(&["a", "a", "b", "b", "c", "c"]),
        )
        .unwrap();
        assert!(matches!(
            Procedure::StudentT.apply(&d, 0.05),
            Err(StatsError::InsufficientGroups { required: 2, actual: 3 })
        ));
        assert_eq!(
            Procedure::OneWayAnova.apply(&d, 0.05).unwrap().kind,
            TestKind::OneWayAnova
        );
        assert_eq!(
            Procedure::KruskalWallis.apply(&d, 0.05).unwrap().kind,
            TestKind::KruskalWallis
        );
    }
}
