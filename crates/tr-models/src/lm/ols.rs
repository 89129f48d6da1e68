//! Ordinary Least Squares (OLS) linear regression
//!
//! Closed-form fit by Householder QR. The residual variance
//! `sigma^2 = RSS / (n - p)` is stored as the model scale so that the
//! covariance is `(X'X)^-1 sigma^2`.

use std::f64::consts::PI;

use log::debug;
use ndarray::{Array1, Array2};

use tr_core::formula::DesignMatrix;

use crate::base::{Family, FitOptions, FittedModel, ModelError, Result};
use crate::linalg;

/// Fit `y = X b + e` by least squares
pub(crate) fn fit_ols(design: &DesignMatrix, options: &FitOptions) -> Result<FittedModel> {
    if design.event().is_some() {
        return Err(ModelError::config(
            "a Surv() response needs the Cox family",
        ));
    }
    if design.response_levels().is_some() {
        return Err(ModelError::config(
            "linear regression needs a numeric response, found a categorical one",
        ));
    }

    let x = design.x();
    let y = design.response();
    let n = x.nrows();
    let p = x.ncols();

    linalg::ensure_full_rank(x)?;

    let (coefficients, xtx_inv) = if p == 0 {
        (Array1::zeros(0), Array2::zeros((0, 0)))
    } else {
        linalg::qr_least_squares(x, y)?
    };

    let fitted_values = x.dot(&coefficients);
    let residuals = y - &fitted_values;
    let rss = residuals.mapv(|r| r * r).sum();

    let df_residual = n - p;
    let sigma2 = if df_residual > 0 {
        rss / df_residual as f64
    } else {
        f64::NAN
    };

    // intercept-only (or zero) model for the likelihood-ratio baseline
    let null_rss = if design.has_intercept() {
        let mean = y.mean().unwrap_or(0.0);
        y.iter().map(|v| (v - mean).powi(2)).sum()
    } else {
        y.mapv(|v| v * v).sum()
    };

    let df_model = p - usize::from(design.has_intercept());

    debug!(
        "OLS fit: n = {}, p = {}, RSS = {:.6}, sigma^2 = {:.6}",
        n, p, rss, sigma2
    );

    Ok(FittedModel {
        family: Family::Linear,
        options: *options,
        design: design.clone(),
        coefficient_names: design.column_names().to_vec(),
        coefficients,
        covariance_unscaled: xtx_inv,
        scale: sigma2,
        df_model,
        fitted_values,
        residuals,
        log_likelihood: gaussian_log_likelihood(rss, n),
        null_log_likelihood: gaussian_log_likelihood(null_rss, n),
        deviance: Some(rss),
        null_deviance: Some(null_rss),
        iterations: 0,
        outcome_levels: None,
        probabilities: None,
    })
}

/// Normal log-likelihood at the ML variance `RSS / n`
pub(crate) fn gaussian_log_likelihood(rss: f64, n: usize) -> f64 {
    let n = n as f64;
    -0.5 * n * ((2.0 * PI * rss / n).ln() + 1.0)
}
