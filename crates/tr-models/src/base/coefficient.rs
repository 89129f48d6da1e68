//! Coefficient definition

use serde::{Deserialize, Serialize};

/// Coefficient estimate with statistics
///
/// After exponentiation `estimate` and the interval bounds are on the
/// ratio scale; `std_error`, `statistic` and `p_value` stay on the link scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Coefficient name
    pub name: String,
    /// Coefficient estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: Option<f64>,
    /// t- or z-statistic
    pub statistic: Option<f64>,
    /// Two-sided p-value
    pub p_value: Option<f64>,
    /// Lower bound of confidence interval
    pub ci_lower: Option<f64>,
    /// Upper bound of confidence interval
    pub ci_upper: Option<f64>,
    /// Degrees of freedom of a t reference distribution; `None` for z
    pub df: Option<f64>,
    /// Is this the intercept?
    pub is_intercept: bool,
}

impl Coefficient {
    /// Create a new coefficient
    pub fn new(name: impl Into<String>, estimate: f64) -> Self {
        Self {
            name: name.into(),
            estimate,
            std_error: None,
            statistic: None,
            p_value: None,
            ci_lower: None,
            ci_upper: None,
            df: None,
            is_intercept: false,
        }
    }

    /// Set standard error
    pub fn with_std_error(mut self, se: f64) -> Self {
        self.std_error = Some(se);
        self
    }

    /// Set the test statistic
    pub fn with_statistic(mut self, statistic: f64) -> Self {
        self.statistic = Some(statistic);
        self
    }

    /// Set p-value
    pub fn with_p_value(mut self, p: f64) -> Self {
        self.p_value = Some(p);
        self
    }

    /// Set confidence interval
    pub fn with_ci(mut self, lower: f64, upper: f64) -> Self {
        self.ci_lower = Some(lower);
        self.ci_upper = Some(upper);
        self
    }

    pub fn with_df(mut self, df: f64) -> Self {
        self.df = Some(df);
        self
    }

    /// Mark as intercept
    pub fn as_intercept(mut self) -> Self {
        self.is_intercept = true;
        self
    }

    /// Map estimate and interval through `exp` (odds / rate / hazard ratios)
    pub fn exponentiate(mut self) -> Self {
        self.estimate = self.estimate.exp();
        self.ci_lower = self.ci_lower.map(f64::exp);
        self.ci_upper = self.ci_upper.map(f64::exp);
        self
    }
}
