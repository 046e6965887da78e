//! Pearson and Spearman correlation with t-transform p-values.

use course_stats_core::descriptive::rank_average;
use course_stats_core::distributions::student_t_two_tailed;
use course_stats_core::{StatsError, StatsResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Correlation coefficient to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationMethod {
    Pearson,
    /// Pearson on average ranks.
    Spearman,
}

impl CorrelationMethod {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pearson => "Pearson",
            Self::Spearman => "Spearman",
        }
    }
}

/// Step classification of `|r|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strength {
    Negligible,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl Strength {
    /// <0.1 negligible, <0.3 weak, <0.5 moderate, <0.7 strong, else very strong.
    #[must_use]
    pub fn from_coefficient(r: f64) -> Self {
        let r = r.abs();
        if r < 0.1 {
            Self::Negligible
        } else if r < 0.3 {
            Self::Weak
        } else if r < 0.5 {
            Self::Moderate
        } else if r < 0.7 {
            Self::Strong
        } else {
            Self::VeryStrong
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
            Self::VeryStrong => "very strong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Positive,
    Negative,
    None,
}

impl Direction {
    #[must_use]
    pub fn from_coefficient(r: f64) -> Self {
        if r > 0.0 {
            Self::Positive
        } else if r < 0.0 {
            Self::Negative
        } else {
            Self::None
        }
    }
}

/// Coefficient with its two-tailed p-value and interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub method: CorrelationMethod,
    /// Coefficient in [-1, 1].
    pub coefficient: f64,
    /// Two-tailed p-value for H0: no correlation.
    pub p_value: f64,
    pub n: usize,
    pub strength: Strength,
    pub direction: Direction,
}

impl CorrelationResult {
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    (covariance / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Two-tailed p-value of `r` via `t = r * sqrt((n - 2) / (1 - r^2))`.
fn correlation_p_value(r: f64, n: usize) -> StatsResult<f64> {
    let df = n as f64 - 2.0;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Ok(0.0);
    }
    student_t_two_tailed(r * (df / denom).sqrt(), df)
}

/// Correlates two equally long samples.
///
/// # Errors
/// - [`StatsError::InvalidParameter`] if the lengths differ
/// - [`StatsError::InsufficientSample`] with fewer than 3 pairs
/// - [`StatsError::InsufficientVariance`] if either input is constant
pub fn correlate(x: &[f64], y: &[f64], method: CorrelationMethod) -> StatsResult<CorrelationResult> {
    if x.len() != y.len() {
        return Err(StatsError::InvalidParameter(format!(
            "correlation inputs differ in length: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 3 {
        return Err(StatsError::InsufficientSample(format!(
            "correlation needs at least 3 pairs, got {}",
            x.len()
        )));
    }
    if is_constant(x) || is_constant(y) {
        return Err(StatsError::InsufficientVariance(
            "correlation is undefined for a constant input".to_string(),
        ));
    }

    let coefficient = match method {
        CorrelationMethod::Pearson => pearson(x, y),
        CorrelationMethod::Spearman => pearson(&rank_average(x), &rank_average(y)),
    };
    let p_value = correlation_p_value(coefficient, x.len())?;
    debug!(method = method.name(), coefficient, p_value, n = x.len(), "Correlation");

    Ok(CorrelationResult {
        method,
        coefficient,
        p_value,
        n: x.len(),
        strength: Strength::from_coefficient(coefficient),
        direction: Direction::from_coefficient(coefficient),
    })
}

/// Pairwise coefficients of named columns. Cells involving a constant column
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub names: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient between two named columns.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        self.cells[i][j]
    }
}

/// Builds a symmetric correlation matrix.
///
/// # Errors
/// Propagates [`correlate`] errors other than [`StatsError::InsufficientVariance`].
pub fn correlation_matrix(
    columns: &[(&str, &[f64])],
    method: CorrelationMethod,
) -> StatsResult<CorrelationMatrix> {
    let k = columns.len();
    let mut cells = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let cell = match correlate(columns[i].1, columns[j].1, method) {
                Ok(result) => Some(if i == j { 1.0 } else { result.coefficient }),
                Err(StatsError::InsufficientVariance(_)) => None,
                Err(e) => return Err(e),
            };
            cells[i][j] = cell;
            cells[j][i] = cell;
        }
    }

    Ok(CorrelationMatrix {
        method,
        names: columns.iter().map(|(name, _)| (*name).to_string()).collect(),
        cells,
    })
}

/// One-hot encodes a categorical column: `1.0` where the value equals `level`.
#[must_use]
pub fn indicator(values: &[String], level: &str) -> Vec<f64> {
    values
        .iter()
        .map(|v| if v == level { 1.0 } else { 0.0 })
        .collect()
}
