//! Reporting layer
//!
//! Everything here is derived from an immutable [`FittedModel`]:
//!
//! - [`coefficient_table`]: estimates with standard errors, test statistics,
//!   p-values and confidence intervals, optionally exponentiated
//! - [`goodness_of_fit`]: R-squared, likelihood, information criteria
//! - [`diagnostics`]: leverage, standardized residuals and Cook's distance
//!   of linear fits, with the point pairs a plotting layer needs
//! - [`summary`]: all of the above as a printable [`ModelSummary`]

mod diagnostics;
mod fit;
mod profile;
mod table;


pub use diagnostics::{diagnostics, Diagnostics};
pub use fit::goodness_of_fit;
pub use table::coefficient_table;

use serde::{Deserialize, Serialize};

use crate::base::{FittedModel, ModelError, ModelSummary, ResidualStatistics, Result};

/// How confidence intervals are computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalMethod {
    /// Estimate +/- critical value x standard error
    #[default]
    Wald,
    /// Inverted likelihood-ratio test (binomial and Poisson GLMs)
    Profile,
}

/// Report configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Confidence level for intervals
    pub confidence_level: f64,
    /// Report `exp(estimate)` and `exp(bounds)`
    pub exponentiate: bool,
    /// Interval construction
    pub interval: IntervalMethod,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            exponentiate: false,
            interval: IntervalMethod::Wald,
        }
    }
}

impl ReportOptions {
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn exponentiate(mut self, exponentiate: bool) -> Self {
        self.exponentiate = exponentiate;
        self
    }

    pub fn interval(mut self, method: IntervalMethod) -> Self {
        self.interval = method;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ModelError::config(format!(
                "confidence level must lie in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

/// Printable summary of a fitted model
pub fn summary(model: &FittedModel, options: &ReportOptions) -> Result<ModelSummary> {
    let coefficients = coefficient_table(model, options)?;
    let residuals = model.residuals().to_vec();

    Ok(ModelSummary {
        model_type: model.model_type(),
        formula: model.formula().to_string(),
        n_obs: model.n_obs(),
        n_dropped: model.dropped_rows(),
        coefficients,
        exponentiated: options.exponentiate,
        confidence_level: options.confidence_level,
        fit: goodness_of_fit(model),
        residual_statistics: ResidualStatistics::from_residuals(&residuals),
    })
}
