//! Reference distributions used to turn test statistics into p-values.
//!
//! Thin wrappers over `statrs` so the engine crates never construct
//! distributions by hand and every construction failure maps onto
//! [`StatsError::Distribution`].

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};
use statrs::function::erf::erfc;

use crate::error::{StatsError, StatsResult};

fn distribution_error(e: impl std::fmt::Display) -> StatsError {
    StatsError::Distribution(e.to_string())
}

/// Standard normal CDF, Φ(x).
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Standard normal survival function, 1 − Φ(x).
#[must_use]
pub fn normal_sf(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Two-tailed p-value of a Student t statistic with `df` degrees of freedom.
///
/// # Errors
/// [`StatsError::Distribution`] if `df` is not positive.
pub fn student_t_two_tailed(t: f64, df: f64) -> StatsResult<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(distribution_error)?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Upper-tail probability of a chi-squared statistic.
///
/// # Errors
/// [`StatsError::Distribution`] if `df` is not positive.
pub fn chi_squared_sf(x: f64, df: f64) -> StatsResult<f64> {
    let dist = ChiSquared::new(df).map_err(distribution_error)?;
    Ok(dist.sf(x.max(0.0)).clamp(0.0, 1.0))
}

/// Upper-tail probability of an F statistic.
///
/// # Errors
/// [`StatsError::Distribution`] if either degrees-of-freedom value is not positive.
pub fn f_sf(f: f64, df_num: f64, df_den: f64) -> StatsResult<f64> {
    let dist = FisherSnedecor::new(df_num, df_den).map_err(distribution_error)?;
    Ok(dist.sf(f.max(0.0)).clamp(0.0, 1.0))
}
