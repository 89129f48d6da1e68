//! Model summary structures

use super::coefficient::Coefficient;
use super::statistics::{GoodnessOfFit, ResidualStatistics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Console-ready summary of a fitted model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model type
    pub model_type: ModelType,
    /// Model formula
    pub formula: String,
    /// Number of observations
    pub n_obs: usize,
    /// Rows dropped for missing values before fitting
    pub n_dropped: usize,
    /// Coefficients table
    pub coefficients: Vec<Coefficient>,
    /// Whether estimates and intervals are exponentiated
    pub exponentiated: bool,
    /// Confidence level of the intervals
    pub confidence_level: f64,
    /// Goodness-of-fit statistics
    pub fit: GoodnessOfFit,
    /// Residual statistics
    pub residual_statistics: ResidualStatistics,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.model_type)?;
        writeln!(f, "{}", "=".repeat(self.model_type.to_string().len()))?;
        writeln!(f, "Formula: {}", self.formula)?;
        write!(f, "Observations: {}", self.n_obs)?;
        if self.n_dropped > 0 {
            write!(f, " ({} dropped for missing values)", self.n_dropped)?;
        }
        writeln!(f)?;
        writeln!(f)?;

        let statistic = if self.coefficients.iter().any(|c| c.df.is_some()) {
            "t value"
        } else {
            "z value"
        };
        let estimate = if self.exponentiated {
            "exp(Est.)"
        } else {
            "Estimate"
        };
        let level = format!("{:.0}%", self.confidence_level * 100.0);

        let width = self
            .coefficients
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(4)
            .max(20);

        writeln!(f, "Coefficients:")?;
        writeln!(
            f,
            "{:<width$} {:>12} {:>12} {:>10} {:>10} {:>12} {:>12}",
            "Term",
            estimate,
            "Std Error",
            statistic,
            "p-value",
            format!("{} lower", level),
            format!("{} upper", level),
            width = width
        )?;
        writeln!(f, "{}", "-".repeat(width + 73))?;

        for coeff in &self.coefficients {
            writeln!(
                f,
                "{:<width$} {:>12.6} {:>12.6} {:>10.3} {:>10.4} {:>12.6} {:>12.6} {}",
                coeff.name,
                coeff.estimate,
                coeff.std_error.unwrap_or(f64::NAN),
                coeff.statistic.unwrap_or(f64::NAN),
                coeff.p_value.unwrap_or(f64::NAN),
                coeff.ci_lower.unwrap_or(f64::NAN),
                coeff.ci_upper.unwrap_or(f64::NAN),
                significance_stars(coeff.p_value),
                width = width
            )?;
        }
        writeln!(f, "---")?;
        writeln!(f, "Signif. codes: 0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1")?;
        writeln!(f)?;

        writeln!(f, "Model Statistics:")?;
        if let Some(r2) = self.fit.r_squared {
            writeln!(f, "  R-squared: {:.4}", r2)?;
        }
        if let Some(adj_r2) = self.fit.adj_r_squared {
            writeln!(f, "  Adjusted R-squared: {:.4}", adj_r2)?;
        }
        if let (Some(f_stat), Some(p)) = (self.fit.f_statistic, self.fit.f_p_value) {
            writeln!(f, "  F-statistic: {:.4} (p = {:.4e})", f_stat, p)?;
        }
        if let Some(resid_se) = self.fit.residual_std_error {
            writeln!(f, "  Residual Std. Error: {:.4}", resid_se)?;
        }
        if let (Some(dev), Some(null)) = (self.fit.deviance, self.fit.null_deviance) {
            writeln!(f, "  Deviance: {:.4} (null {:.4})", dev, null)?;
        }
        if let (Some(lr), Some(p)) = (self.fit.lr_chi_squared, self.fit.lr_p_value) {
            writeln!(
                f,
                "  LR chi-squared: {:.4} on {} df (p = {:.4e})",
                lr, self.fit.df_model, p
            )?;
        }
        if let Some(pseudo) = self.fit.pseudo_r_squared {
            writeln!(f, "  Pseudo R-squared: {:.4}", pseudo)?;
        }
        writeln!(f, "  Log-likelihood: {:.4}", self.fit.log_likelihood)?;
        writeln!(f, "  AIC: {:.4}", self.fit.aic)?;
        writeln!(f, "  BIC: {:.4}", self.fit.bic)?;
        writeln!(f, "  Residual DF: {}", self.fit.df_residual)?;
        if self.fit.iterations > 0 {
            writeln!(f, "  Iterations: {}", self.fit.iterations)?;
        }

        let r = &self.residual_statistics;
        writeln!(f)?;
        writeln!(f, "Residuals:")?;
        writeln!(
            f,
            "  {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Min", "1Q", "Median", "3Q", "Max"
        )?;
        writeln!(
            f,
            "  {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            r.min, r.q1, r.median, r.q3, r.max
        )?;

        Ok(())
    }
}

fn significance_stars(p: Option<f64>) -> &'static str {
    match p {
        Some(p) if p < 0.001 => "***",
        Some(p) if p < 0.01 => "**",
        Some(p) if p < 0.05 => "*",
        Some(p) if p < 0.1 => ".",
        _ => "",
    }
}

/// Model family tag carried by every fitted model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Linear regression (OLS)
    Linear,
    /// Logistic regression
    Binomial,
    /// Poisson regression
    Poisson,
    /// Gaussian GLM
    Gaussian,
    /// Multinomial logistic regression
    Multinomial,
    /// Proportional-odds ordinal regression
    Ordinal,
    /// Cox proportional hazards model
    Cox,
}

impl ModelType {
    /// Families whose coefficients read as log ratios
    pub fn supports_exponentiation(&self) -> bool {
        !matches!(self, ModelType::Linear | ModelType::Gaussian)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Linear => write!(f, "Linear Regression"),
            ModelType::Binomial => write!(f, "Logistic Regression"),
            ModelType::Poisson => write!(f, "Poisson Regression"),
            ModelType::Gaussian => write!(f, "Gaussian GLM"),
            ModelType::Multinomial => write!(f, "Multinomial Logistic Regression"),
            ModelType::Ordinal => write!(f, "Proportional Odds Regression"),
            ModelType::Cox => write!(f, "Cox PH"),
        }
    }
}
