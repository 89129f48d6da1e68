//! Regression and survival models for TabReg
//!
//! Every fitter takes a [`DesignMatrix`] built by `tr-core` and returns an
//! immutable [`FittedModel`]; the [`report`] module derives coefficient
//! tables, goodness-of-fit statistics and diagnostics from it.
//!
//! ```no_run
//! use tr_core::data::{DataFrameBuilder, Series};
//! use tr_models::report::{summary, ReportOptions};
//! use tr_models::{Family, Regression};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let df = DataFrameBuilder::new()
//!     .with_column("age", Series::float(vec![34.0, 51.0, 29.0, 62.0, 45.0, 38.0]))?
//!     .with_column("smoker", Series::categorical(&["no", "yes", "no", "yes", "no", "yes"]))?
//!     .with_column("event", Series::float(vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0]))?
//!     .build()?;
//!
//! let model = Regression::new("event ~ age + smoker")?
//!     .family(Family::Binomial)
//!     .fit(&df)?;
//! println!("{}", summary(&model, &ReportOptions::default().exponentiate(true))?);
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod error;
pub mod glm;
pub mod inference;
pub(crate) mod linalg;
pub mod lm;
pub mod multinomial;
pub(crate) mod newton;
pub mod ordinal;
pub mod report;
pub mod survival;

use log::debug;

use tr_core::data::DataFrame;
use tr_core::formula::{DesignMatrix, Formula};

pub use base::{
    Coefficient, Family, FitOptions, FittedModel, GoodnessOfFit, ModelSummary, ModelType,
    ResidualStatistics, Result, Ties,
};
pub use error::ModelError;
pub use glm::glm;
pub use lm::lm;
pub use multinomial::multinom;
pub use ordinal::polr;
pub use survival::coxph;

/// Fit `family` on a prepared design matrix
pub fn fit(design: &DesignMatrix, family: &Family, options: &FitOptions) -> Result<FittedModel> {
    options.validate()?;
    debug!(
        "fitting {} on {} rows x {} columns: {}",
        family.model_type(),
        design.nrows(),
        design.ncols(),
        design.formula()
    );

    match family {
        Family::Linear => lm::fit_ols(design, options),
        Family::Binomial | Family::Poisson | Family::Gaussian => {
            glm::fit_glm(design, family, options)
        }
        Family::Multinomial { baseline } => {
            multinomial::fit_multinomial(design, family, baseline.as_deref(), options)
        }
        Family::Ordinal => ordinal::fit_ordinal(design, options),
        Family::Cox { ties } => survival::fit_cox(design, *ties, options),
    }
}

/// Formula-driven model builder
///
/// ```no_run
/// # use tr_models::{Family, Regression};
/// # fn demo(df: &tr_core::DataFrame) -> tr_models::Result<()> {
/// let model = Regression::new("visits ~ age + C(region)")?
///     .family(Family::Poisson)
///     .baseline("region", "north")
///     .fit(df)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Regression {
    formula: Formula,
    family: Family,
    options: FitOptions,
}

impl Regression {
    /// Parse the model formula
    pub fn new(formula: &str) -> Result<Self> {
        Ok(Self {
            formula: Formula::parse(formula)?,
            family: Family::default(),
            options: FitOptions::default(),
        })
    }

    /// Start from an already parsed formula
    pub fn from_formula(formula: Formula) -> Self {
        Self {
            formula,
            family: Family::default(),
            options: FitOptions::default(),
        }
    }

    pub fn family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    pub fn options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    /// Reference level of a categorical predictor
    pub fn baseline(mut self, column: &str, level: &str) -> Self {
        self.formula = self.formula.with_baseline(column, level);
        self
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Build the design matrix over `data` and fit
    pub fn fit(&self, data: &DataFrame) -> Result<FittedModel> {
        let design = DesignMatrix::build(data, &self.formula)?;
        fit(&design, &self.family, &self.options)
    }
}
