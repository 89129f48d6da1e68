//! Linear regression models
//!
//! Ordinary least squares on a [`DesignMatrix`](tr_core::formula::DesignMatrix).
//! All models support R-style formula syntax through [`Regression`](crate::Regression)
//! or the [`lm`] shortcut.

mod ols;

#[cfg(test)]
mod tests;

pub(crate) use ols::{fit_ols, gaussian_log_likelihood};

use tr_core::data::DataFrame;

use crate::base::{Family, FittedModel, Result};
use crate::Regression;

/// Convenience function for OLS regression
pub fn lm(formula: &str, data: &DataFrame) -> Result<FittedModel> {
    Regression::new(formula)?.family(Family::Linear).fit(data)
}
