//! Damped Newton-Raphson for the likelihood-based fitters
//!
//! Multinomial, ordinal and Cox models expose their log-likelihood with an
//! analytic gradient and observed information through [`LikelihoodModel`];
//! [`maximize`] iterates full Newton steps, halving a step until the
//! log-likelihood does not decrease and the parameters stay feasible.

use log::{debug, warn};
use ndarray::{Array1, Array2};

use crate::base::{FitOptions, ModelError, Result};
use crate::linalg;

/// Maximum number of times a step is halved before it is abandoned
const MAX_STEP_HALVING: usize = 30;

/// Log-likelihood with its first two derivatives at a parameter vector
#[derive(Debug, Clone)]
pub(crate) struct LikelihoodState {
    pub log_likelihood: f64,
    pub gradient: Array1<f64>,
    /// Negative Hessian
    pub information: Array2<f64>,
}

pub(crate) trait LikelihoodModel {
    /// Log-likelihood only, used while halving a step
    fn log_likelihood(&self, params: &Array1<f64>) -> f64;

    fn evaluate(&self, params: &Array1<f64>) -> LikelihoodState;

    /// Parameters outside the model's domain are never accepted
    fn is_feasible(&self, _params: &Array1<f64>) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NewtonFit {
    pub params: Array1<f64>,
    /// Inverse observed information at the maximum
    pub covariance: Array2<f64>,
    pub log_likelihood: f64,
    pub iterations: usize,
}

/// Maximise the model's log-likelihood from `start`
pub(crate) fn maximize<M: LikelihoodModel>(
    model: &M,
    start: Array1<f64>,
    options: &FitOptions,
    label: &str,
) -> Result<NewtonFit> {
    let mut params = start;
    let mut state = model.evaluate(&params);
    if !state.log_likelihood.is_finite() {
        return Err(ModelError::numerical(
            "log-likelihood is not finite at the starting values",
            label,
        ));
    }
    if params.is_empty() {
        return finish(params, state, 0, label);
    }

    let mut delta = f64::INFINITY;

    for iteration in 1..=options.max_iterations {
        let step = match linalg::solve_spd(&state.information, &state.gradient, label) {
            Ok(step) => step,
            // information degenerated after accepted steps: the maximum lies at infinity
            Err(ModelError::NumericalError { .. }) if iteration > 1 => {
                warn!(
                    "{} information became singular at iteration {} (last step norm {:.3e})",
                    label, iteration, delta
                );
                return Err(ModelError::NotConverged {
                    max_iter: options.max_iterations,
                    delta,
                });
            }
            Err(err) => return Err(err),
        };

        let mut scale: f64 = 1.0;
        let mut accepted = None;
        for _ in 0..=MAX_STEP_HALVING {
            let candidate = &params + &(&step * scale);
            if model.is_feasible(&candidate) {
                let ll = model.log_likelihood(&candidate);
                let floor = state.log_likelihood - 1e-10 * state.log_likelihood.abs().max(1.0);
                if ll.is_finite() && ll >= floor {
                    accepted = Some(candidate);
                    break;
                }
            }
            scale *= 0.5;
        }

        // no improving step along the Newton direction: already at the maximum
        let Some(candidate) = accepted else {
            debug!("{} iteration {}: no improving step", label, iteration);
            return finish(params, state, iteration, label);
        };

        delta = (&candidate - &params).mapv(|d| d * d).sum().sqrt();
        params = candidate;
        state = model.evaluate(&params);

        debug!(
            "{} iteration {}: log-likelihood {:.8}, step norm {:.3e}, step scale {}",
            label, iteration, state.log_likelihood, delta, scale
        );

        if delta < options.tolerance {
            return finish(params, state, iteration, label);
        }
    }

    warn!(
        "{} did not converge in {} iterations (last step norm {:.3e})",
        label, options.max_iterations, delta
    );
    Err(ModelError::NotConverged {
        max_iter: options.max_iterations,
        delta,
    })
}

fn finish(
    params: Array1<f64>,
    state: LikelihoodState,
    iterations: usize,
    label: &str,
) -> Result<NewtonFit> {
    let covariance = if params.is_empty() {
        Array2::zeros((0, 0))
    } else {
        linalg::invert_spd(&state.information, label)?
    };

    Ok(NewtonFit {
        params,
        covariance,
        log_likelihood: state.log_likelihood,
        iterations,
    })
}
