//! Survival analysis
//!
//! - [`SurvivalSample`]: right-censored `(time, event, group)` observations
//! - [`KaplanMeier`]: product-limit curves with Greenwood errors, and the
//!   [`log_rank_test`] between groups
//! - Cox proportional hazards, fitted through [`fit`](crate::fit) with
//!   [`Family::Cox`](crate::Family::Cox) or the [`coxph`] shortcut

mod cox;
mod kaplan_meier;
mod sample;

#[cfg(test)]
mod tests;

pub(crate) use cox::fit_cox;
pub use kaplan_meier::{log_rank_test, KaplanMeier, LogRankTest, SurvivalCurve, SurvivalStep};
pub use sample::{SurvivalSample, ALL_SUBJECTS};

use tr_core::data::DataFrame;

use crate::base::{Family, FittedModel, Result, Ties};
use crate::Regression;

/// Convenience function for Cox regression, `Surv(time, event) ~ x + ...`
pub fn coxph(formula: &str, data: &DataFrame, ties: Ties) -> Result<FittedModel> {
    Regression::new(formula)?
        .family(Family::Cox { ties })
        .fit(data)
}
