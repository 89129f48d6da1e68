//! Reference-distribution helpers for tests and intervals
//!
//! Thin wrappers over `statrs` that return `NaN` instead of failing when a
//! distribution cannot be built (non-finite input, zero degrees of freedom).

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

/// Two-sided p-value of a z statistic
pub fn pvalue_z(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { f64::NAN } else { 0.0 };
    }
    standard_normal().map_or(f64::NAN, |n| 2.0 * n.sf(z.abs()))
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom
pub fn pvalue_t(t: f64, df: f64) -> f64 {
    if t.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |d| 2.0 * d.sf(t.abs()))
}

/// Upper-tail p-value of a chi-squared statistic
pub fn pvalue_chi_squared(statistic: f64, df: f64) -> f64 {
    if statistic.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    ChiSquared::new(df).map_or(f64::NAN, |d| d.sf(statistic.max(0.0)))
}

/// Upper-tail p-value of an F statistic
pub fn pvalue_f(statistic: f64, df1: f64, df2: f64) -> f64 {
    if statistic.is_nan() || df1 <= 0.0 || df2 <= 0.0 {
        return f64::NAN;
    }
    FisherSnedecor::new(df1, df2).map_or(f64::NAN, |d| d.sf(statistic.max(0.0)))
}

/// Two-sided normal critical value for a confidence level
pub fn z_critical(confidence_level: f64) -> f64 {
    let alpha = 1.0 - confidence_level;
    standard_normal().map_or(f64::NAN, |n| n.inverse_cdf(1.0 - alpha / 2.0))
}

/// Two-sided Student-t critical value for a confidence level
pub fn t_critical(confidence_level: f64, df: f64) -> f64 {
    let alpha = 1.0 - confidence_level;
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |d| d.inverse_cdf(1.0 - alpha / 2.0))
}

/// Chi-squared quantile, used as the profile-likelihood cut-off
pub fn chi_squared_quantile(p: f64, df: f64) -> f64 {
    ChiSquared::new(df).map_or(f64::NAN, |d| d.inverse_cdf(p))
}

/// Standard normal quantile
pub fn normal_quantile(p: f64) -> f64 {
    standard_normal().map_or(f64::NAN, |n| n.inverse_cdf(p))
}
