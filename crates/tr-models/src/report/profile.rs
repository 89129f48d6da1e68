//! Profile-likelihood confidence intervals for binomial and Poisson GLMs
//!
//! For coefficient `j` the profile log-likelihood at `b` refits the model
//! with column `j` removed and `b x_j` as an offset. The interval is the set
//! of `b` whose profile stays above `logL_max - chi2_1(level) / 2`; each end
//! is bracketed by doubling steps of one standard error and then bisected.

use log::debug;
use ndarray::{Array1, Array2, Axis};

use crate::base::{FittedModel, ModelError, Result};
use crate::glm::{fit_irls, GlmFamily};
use crate::inference;

/// Doubling steps tried before an end is declared unbounded
const MAX_BRACKET_STEPS: usize = 10;
const MAX_BISECTIONS: usize = 60;

struct Profile<'a> {
    x_rest: Array2<f64>,
    column: Array1<f64>,
    y: &'a Array1<f64>,
    family: GlmFamily,
    model: &'a FittedModel,
}

impl<'a> Profile<'a> {
    fn new(model: &'a FittedModel, family: GlmFamily, j: usize) -> Self {
        let x = model.design().x();
        Self {
            x_rest: x.select(
                Axis(1),
                &(0..x.ncols()).filter(|&c| c != j).collect::<Vec<_>>(),
            ),
            column: x.column(j).to_owned(),
            y: model.design().response(),
            family,
            model,
        }
    }

    fn log_likelihood(&self, b: f64) -> Result<f64> {
        let offset = &self.column * b;
        let fit = fit_irls(
            &self.x_rest,
            self.y,
            Some(&offset),
            self.family,
            &self.model.options,
        )?;
        Ok(self.family.log_likelihood(self.y, &fit.fitted_values))
    }

    /// Point where the profile crosses `cutoff` on one side of the estimate
    fn bound(&self, estimate: f64, step: f64, direction: f64, cutoff: f64) -> Result<f64> {
        let mut inner = estimate;
        let mut outer = None;
        let mut distance = step;

        for _ in 0..MAX_BRACKET_STEPS {
            let candidate = estimate + direction * distance;
            if self.log_likelihood(candidate)? < cutoff {
                outer = Some(candidate);
                break;
            }
            inner = candidate;
            distance *= 2.0;
        }

        let Some(mut outer) = outer else {
            return Ok(direction * f64::INFINITY);
        };

        for _ in 0..MAX_BISECTIONS {
            let middle = 0.5 * (inner + outer);
            if self.log_likelihood(middle)? < cutoff {
                outer = middle;
            } else {
                inner = middle;
            }
            if (outer - inner).abs() < 1e-10 * (1.0 + middle.abs()) {
                break;
            }
        }

        Ok(0.5 * (inner + outer))
    }
}

pub(crate) fn profile_intervals(model: &FittedModel, level: f64) -> Result<Vec<(f64, f64)>> {
    let family = match GlmFamily::from_family(model.family()) {
        Some(family @ (GlmFamily::Binomial | GlmFamily::Poisson)) => family,
        _ => {
            return Err(ModelError::config(format!(
                "profile-likelihood intervals are only available for binomial and Poisson models, not {}",
                model.model_type()
            )))
        }
    };

    let cutoff = model.log_likelihood() - inference::chi_squared_quantile(level, 1.0) / 2.0;
    let std_errors = model.standard_errors();

    model
        .coefficients()
        .iter()
        .zip(&std_errors)
        .enumerate()
        .map(|(j, (&estimate, &se))| {
            let profile = Profile::new(model, family, j);
            let step = if se.is_finite() && se > 0.0 { se } else { 1.0 };
            let lower = profile.bound(estimate, step, -1.0, cutoff)?;
            let upper = profile.bound(estimate, step, 1.0, cutoff)?;
            debug!(
                "profile interval for {}: [{:.6}, {:.6}]",
                model.coefficient_names()[j],
                lower,
                upper
            );
            Ok((lower, upper))
        })
        .collect()
}
