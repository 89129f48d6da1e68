//! Linear model diagnostics
//!
//! Influence measures for OLS fits and the point pairs behind the usual
//! diagnostic plots. Row positions refer to the caller's original frame.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::base::{FittedModel, ModelError, ModelType, Result};
use crate::inference;

/// Per-observation diagnostics of a linear fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Original frame row of each observation
    pub rows: Vec<usize>,
    pub fitted_values: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Hat matrix diagonal
    pub leverage: Vec<f64>,
    /// `r / (sigma sqrt(1 - h))`
    pub standardized_residuals: Vec<f64>,
    pub cooks_distance: Vec<f64>,
}

/// Diagnostics of a linear model; other families fail with `InvalidConfig`
pub fn diagnostics(model: &FittedModel) -> Result<Diagnostics> {
    if model.model_type() != ModelType::Linear {
        return Err(ModelError::config(format!(
            "diagnostics are only defined for linear regression, not {}",
            model.model_type()
        )));
    }

    let x = model.design().x();
    let xtx_inv = &model.covariance_unscaled;
    let p = model.n_params() as f64;
    let sigma2 = model.scale();
    let sigma = sigma2.sqrt();

    // h_i = x_i' (X'X)^-1 x_i
    let leverage: Array1<f64> = x
        .rows()
        .into_iter()
        .map(|row| row.dot(&xtx_inv.dot(&row)))
        .collect();

    let residuals = model.residuals();
    let standardized_residuals = residuals
        .iter()
        .zip(&leverage)
        .map(|(&r, &h)| r / (sigma * (1.0 - h).sqrt()))
        .collect();
    let cooks_distance = residuals
        .iter()
        .zip(&leverage)
        .map(|(&r, &h)| r * r * h / (p * sigma2 * (1.0 - h).powi(2)))
        .collect();

    Ok(Diagnostics {
        rows: model.retained_rows().to_vec(),
        fitted_values: model.fitted_values().to_vec(),
        residuals: residuals.to_vec(),
        leverage: leverage.to_vec(),
        standardized_residuals,
        cooks_distance,
    })
}

impl Diagnostics {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(fitted, residual)` pairs
    pub fn residuals_vs_fitted(&self) -> Vec<(f64, f64)> {
        self.fitted_values
            .iter()
            .copied()
            .zip(self.residuals.iter().copied())
            .collect()
    }

    /// `(original row, Cook's distance)` pairs
    pub fn cooks_distance_pairs(&self) -> Vec<(usize, f64)> {
        self.rows
            .iter()
            .copied()
            .zip(self.cooks_distance.iter().copied())
            .collect()
    }

    /// `(theoretical normal quantile, sorted standardized residual)` pairs
    /// at plotting positions `(i - 0.5) / n`
    pub fn normal_qq(&self) -> Vec<(f64, f64)> {
        let mut sorted = self.standardized_residuals.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len() as f64;

        sorted
            .into_iter()
            .enumerate()
            .map(|(i, r)| (inference::normal_quantile((i as f64 + 0.5) / n), r))
            .collect()
    }

    /// Original rows whose Cook's distance exceeds `threshold` (default `4 / n`)
    pub fn influential_points(&self, threshold: Option<f64>) -> Vec<usize> {
        let threshold = threshold.unwrap_or(4.0 / self.len() as f64);
        self.cooks_distance_pairs()
            .into_iter()
            .filter(|&(_, d)| d > threshold)
            .map(|(row, _)| row)
            .collect()
    }
}
