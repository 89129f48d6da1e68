//! Statistical structures for model results

use serde::{Deserialize, Serialize};

/// Goodness-of-fit statistics of a fitted model
///
/// Fields that do not apply to a family are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    /// Number of observations used
    pub n_obs: usize,
    /// Number of estimated coefficients (the `k` in AIC/BIC)
    pub n_params: usize,
    /// R-squared (linear only)
    pub r_squared: Option<f64>,
    /// Adjusted R-squared (linear only)
    pub adj_r_squared: Option<f64>,
    /// Residual standard error (linear only)
    pub residual_std_error: Option<f64>,
    /// F-statistic against the intercept-only model (linear only)
    pub f_statistic: Option<f64>,
    /// F-statistic p-value
    pub f_p_value: Option<f64>,
    /// Log-likelihood
    pub log_likelihood: f64,
    /// Log-likelihood of the null model
    pub null_log_likelihood: f64,
    /// AIC = 2k - 2 logL
    pub aic: f64,
    /// BIC = k ln(n) - 2 logL
    pub bic: f64,
    /// Residual deviance (GLMs)
    pub deviance: Option<f64>,
    /// Null deviance (GLMs)
    pub null_deviance: Option<f64>,
    /// Likelihood-ratio chi-squared against the null model
    pub lr_chi_squared: Option<f64>,
    /// Likelihood-ratio p-value
    pub lr_p_value: Option<f64>,
    /// McFadden pseudo R-squared
    pub pseudo_r_squared: Option<f64>,
    /// Residual degrees of freedom
    pub df_residual: usize,
    /// Model degrees of freedom
    pub df_model: usize,
    /// Number of iterations (0 for closed-form fits)
    pub iterations: usize,
}

/// Five-number summary of the residuals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidualStatistics {
    /// Minimum residual
    pub min: f64,
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Maximum residual
    pub max: f64,
    /// Mean residual
    pub mean: f64,
    /// Standard deviation
    pub std_dev: f64,
}

impl ResidualStatistics {
    pub fn from_residuals(residuals: &[f64]) -> Self {
        let mut sorted: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let var = if sorted.len() > 1 {
            sorted.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };

        Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean,
            std_dev: var.sqrt(),
        }
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let index = (sorted.len() as f64 - 1.0) * q;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}
