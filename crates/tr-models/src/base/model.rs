//! Fitted model value shared by every family

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use tr_core::formula::DesignMatrix;

use super::summary::ModelType;
use crate::error::ModelError;

/// Tie handling for the Cox partial likelihood
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ties {
    #[default]
    Breslow,
    Efron,
}

/// Model family requested from [`fit`](crate::fit)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Family {
    /// Ordinary least squares
    #[default]
    Linear,
    /// Logistic regression (IRLS, logit link)
    Binomial,
    /// Poisson regression (IRLS, log link)
    Poisson,
    /// Normal GLM with identity link, fitted by IRLS
    Gaussian,
    /// Multinomial logistic; `baseline` defaults to the first outcome level
    Multinomial { baseline: Option<String> },
    /// Proportional-odds cumulative logit
    Ordinal,
    /// Cox proportional hazards
    Cox { ties: Ties },
}

impl Family {
    pub fn model_type(&self) -> ModelType {
        match self {
            Family::Linear => ModelType::Linear,
            Family::Binomial => ModelType::Binomial,
            Family::Poisson => ModelType::Poisson,
            Family::Gaussian => ModelType::Gaussian,
            Family::Multinomial { .. } => ModelType::Multinomial,
            Family::Ordinal => ModelType::Ordinal,
            Family::Cox { .. } => ModelType::Cox,
        }
    }

    pub fn cox() -> Self {
        Family::Cox {
            ties: Ties::Breslow,
        }
    }

    pub fn multinomial() -> Self {
        Family::Multinomial { baseline: None }
    }
}

/// Iteration controls for the iterative fitters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Upper bound on Newton / IRLS iterations
    pub max_iterations: usize,
    /// Convergence threshold on the norm of the coefficient update
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-8,
        }
    }
}

impl FitOptions {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.max_iterations == 0 {
            return Err(ModelError::config("max_iterations must be at least 1"));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(ModelError::config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Result of a single fit call
///
/// Built once by a fitter and never mutated; the reporting layer derives
/// every secondary statistic from it.
#[derive(Debug, Clone, Serialize)]
pub struct FittedModel {
    pub(crate) family: Family,
    pub(crate) options: FitOptions,
    pub(crate) design: DesignMatrix,
    pub(crate) coefficient_names: Vec<String>,
    pub(crate) coefficients: Array1<f64>,
    /// Covariance divided by `scale`
    pub(crate) covariance_unscaled: Array2<f64>,
    pub(crate) scale: f64,
    pub(crate) df_model: usize,
    pub(crate) fitted_values: Array1<f64>,
    pub(crate) residuals: Array1<f64>,
    pub(crate) log_likelihood: f64,
    pub(crate) null_log_likelihood: f64,
    pub(crate) deviance: Option<f64>,
    pub(crate) null_deviance: Option<f64>,
    pub(crate) iterations: usize,
    pub(crate) outcome_levels: Option<Vec<String>>,
    pub(crate) probabilities: Option<Array2<f64>>,
}

impl FittedModel {
    pub fn family(&self) -> &Family {
        &self.family
    }

    pub fn model_type(&self) -> ModelType {
        self.family.model_type()
    }

    /// Design the model was fitted on (intercept dropped for ordinal and Cox fits)
    pub fn design(&self) -> &DesignMatrix {
        &self.design
    }

    pub fn formula(&self) -> &str {
        self.design.formula()
    }

    pub fn coefficient_names(&self) -> &[String] {
        &self.coefficient_names
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Estimated covariance matrix of the coefficients
    pub fn covariance(&self) -> Array2<f64> {
        &self.covariance_unscaled * self.scale
    }

    pub fn standard_errors(&self) -> Array1<f64> {
        self.covariance().diag().mapv(|v| v.max(0.0).sqrt())
    }

    /// Residual variance for linear fits, dispersion for GLMs, 1 otherwise
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn n_obs(&self) -> usize {
        self.design.nrows()
    }

    /// Number of estimated coefficients
    pub fn n_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Degrees of freedom of the model beyond its null model
    pub fn df_model(&self) -> usize {
        self.df_model
    }

    pub fn df_residual(&self) -> usize {
        self.n_obs().saturating_sub(self.n_params())
    }

    /// Response-scale fitted values, aligned with [`retained_rows`](Self::retained_rows)
    pub fn fitted_values(&self) -> &Array1<f64> {
        &self.fitted_values
    }

    pub fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Log-likelihood of the matching intercept-only (or zero-effect) model
    pub fn null_log_likelihood(&self) -> f64 {
        self.null_log_likelihood
    }

    pub fn deviance(&self) -> Option<f64> {
        self.deviance
    }

    pub fn null_deviance(&self) -> Option<f64> {
        self.null_deviance
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn retained_rows(&self) -> &[usize] {
        self.design.retained_rows()
    }

    pub fn dropped_rows(&self) -> usize {
        self.design.dropped_rows()
    }

    pub fn has_intercept(&self) -> bool {
        self.design.has_intercept()
    }

    /// Outcome levels of multinomial and ordinal fits
    pub fn outcome_levels(&self) -> Option<&[String]> {
        self.outcome_levels.as_deref()
    }

    /// Per-row outcome probabilities (rows x levels) of multinomial and ordinal fits
    pub fn probabilities(&self) -> Option<&Array2<f64>> {
        self.probabilities.as_ref()
    }

    /// Index of a coefficient by name
    pub fn coefficient_index(&self, name: &str) -> Option<usize> {
        self.coefficient_names.iter().position(|n| n == name)
    }

    /// Estimate of a coefficient by name
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.coefficient_index(name).map(|i| self.coefficients[i])
    }
}
