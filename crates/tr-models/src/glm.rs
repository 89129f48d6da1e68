//! Generalized linear models
//!
//! Binomial (logit), Poisson (log) and Gaussian (identity) families fitted
//! by iteratively reweighted least squares. The covariance is the inverse
//! Fisher information; for the Gaussian family it is scaled by the
//! dispersion `RSS / (n - p)`.

pub(crate) mod family;
pub(crate) mod irls;

#[cfg(test)]
mod tests;

use ndarray::Array1;

use tr_core::data::DataFrame;
use tr_core::formula::DesignMatrix;

use crate::base::{Family, FitOptions, FittedModel, ModelError, Result};
use crate::linalg;
use crate::Regression;

pub(crate) use family::GlmFamily;
pub(crate) use irls::fit_irls;

/// Fit a binomial, Poisson or Gaussian GLM on a design matrix
pub(crate) fn fit_glm(
    design: &DesignMatrix,
    family: &Family,
    options: &FitOptions,
) -> Result<FittedModel> {
    let glm_family = GlmFamily::from_family(family).ok_or_else(|| {
        ModelError::config(format!("{} is not a GLM family", family.model_type()))
    })?;

    if design.event().is_some() {
        return Err(ModelError::config(
            "a Surv() response needs the Cox family",
        ));
    }
    if let Some(levels) = design.response_levels() {
        // a two-level factor is a 0/1 outcome for logistic regression
        if glm_family != GlmFamily::Binomial || levels.len() != 2 {
            return Err(ModelError::config(format!(
                "{} regression cannot use a categorical response with {} levels",
                glm_family.name(),
                levels.len()
            )));
        }
    }

    let x = design.x();
    let y = design.response();
    let n = x.nrows();
    let p = x.ncols();

    glm_family.validate_response(y)?;
    linalg::ensure_full_rank(x)?;

    let fit = fit_irls(x, y, None, glm_family, options)?;
    let mu = fit.fitted_values;

    let deviance = glm_family.deviance(y, &mu);
    let scale = match glm_family {
        GlmFamily::Gaussian if n > p => deviance / (n - p) as f64,
        GlmFamily::Gaussian => f64::NAN,
        _ => 1.0,
    };

    // intercept-only model has the closed form mu = mean(y)
    let null_mu = if design.has_intercept() {
        let mean = y.mean().unwrap_or(0.0);
        Array1::from_elem(n, glm_family.clamp(mean))
    } else {
        Array1::from_elem(n, glm_family.inverse_link(0.0))
    };

    Ok(FittedModel {
        family: family.clone(),
        options: *options,
        design: design.clone(),
        coefficient_names: design.column_names().to_vec(),
        coefficients: fit.coefficients,
        covariance_unscaled: fit.covariance_unscaled,
        scale,
        df_model: p - usize::from(design.has_intercept()),
        residuals: y - &mu,
        log_likelihood: glm_family.log_likelihood(y, &mu),
        null_log_likelihood: glm_family.log_likelihood(y, &null_mu),
        deviance: Some(deviance),
        null_deviance: Some(glm_family.deviance(y, &null_mu)),
        fitted_values: mu,
        iterations: fit.iterations,
        outcome_levels: design.response_levels().map(<[String]>::to_vec),
        probabilities: None,
    })
}

/// Convenience function for GLM regression
pub fn glm(formula: &str, data: &DataFrame, family: Family) -> Result<FittedModel> {
    Regression::new(formula)?.family(family).fit(data)
}
