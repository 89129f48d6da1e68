//! Iteratively reweighted least squares
//!
//! Each iteration linearises the link around the current means:
//!
//! ```text
//! w = 1 / (V(mu) g'(mu)^2)
//! z = eta - offset + (y - mu) g'(mu)
//! b = (X'WX)^-1 X'Wz
//! ```
//!
//! and stops once the coefficient update norm falls below the tolerance.

use log::{debug, warn};
use ndarray::{Array1, Array2};

use super::family::GlmFamily;
use crate::base::{FitOptions, ModelError, Result};
use crate::linalg;

/// Working weights are floored here
const MIN_WEIGHT: f64 = 1e-10;

#[derive(Debug, Clone)]
pub(crate) struct IrlsFit {
    pub coefficients: Array1<f64>,
    /// `(X'WX)^-1` at the final means
    pub covariance_unscaled: Array2<f64>,
    pub fitted_values: Array1<f64>,
    pub iterations: usize,
}

/// Fit `g(mu) = X b + offset` by IRLS
pub(crate) fn fit_irls(
    x: &Array2<f64>,
    y: &Array1<f64>,
    offset: Option<&Array1<f64>>,
    family: GlmFamily,
    options: &FitOptions,
) -> Result<IrlsFit> {
    let n = x.nrows();
    let p = x.ncols();
    let offset = offset.cloned().unwrap_or_else(|| Array1::zeros(n));

    if p == 0 {
        return Ok(IrlsFit {
            coefficients: Array1::zeros(0),
            covariance_unscaled: Array2::zeros((0, 0)),
            fitted_values: offset.mapv(|o| family.inverse_link(o)),
            iterations: 0,
        });
    }

    let mut mu = y.mapv(|v| family.clamp(family.initial_mu(v)));
    let mut eta = mu.mapv(|m| family.link(m));
    let mut coefficients: Option<Array1<f64>> = None;
    let mut delta = f64::INFINITY;

    for iteration in 1..=options.max_iterations {
        let (z, w) = working_response(y, &mu, &eta, &offset, family);
        let (beta, _) = linalg::weighted_least_squares(x, &z, &w)?;

        if let Some(previous) = &coefficients {
            delta = (&beta - previous).mapv(|d| d * d).sum().sqrt();
        }

        eta = x.dot(&beta) + &offset;
        mu = eta.mapv(|e| family.inverse_link(e));
        coefficients = Some(beta);

        debug!(
            "IRLS ({}) iteration {}: step norm {:.3e}, deviance {:.6}",
            family.name(),
            iteration,
            delta,
            family.deviance(y, &mu)
        );

        if !delta.is_finite() && iteration > 1 {
            return Err(ModelError::numerical(
                "coefficient update is not finite",
                "fit_irls",
            ));
        }

        if delta < options.tolerance {
            let coefficients = coefficients.unwrap_or_else(|| Array1::zeros(p));
            let (_, w) = working_response(y, &mu, &eta, &offset, family);
            let covariance_unscaled = fisher_inverse(x, &w)?;
            return Ok(IrlsFit {
                coefficients,
                covariance_unscaled,
                fitted_values: mu,
                iterations: iteration,
            });
        }
    }

    warn!(
        "IRLS ({}) did not converge in {} iterations (last step norm {:.3e})",
        family.name(),
        options.max_iterations,
        delta
    );
    Err(ModelError::NotConverged {
        max_iter: options.max_iterations,
        delta,
    })
}

fn working_response(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    eta: &Array1<f64>,
    offset: &Array1<f64>,
    family: GlmFamily,
) -> (Array1<f64>, Array1<f64>) {
    let n = y.len();
    let mut z = Array1::zeros(n);
    let mut w = Array1::zeros(n);

    for i in 0..n {
        let d = family.link_derivative(mu[i]);
        z[i] = eta[i] - offset[i] + (y[i] - mu[i]) * d;
        w[i] = (1.0 / (family.variance(mu[i]) * d * d)).max(MIN_WEIGHT);
    }

    (z, w)
}

fn fisher_inverse(x: &Array2<f64>, w: &Array1<f64>) -> Result<Array2<f64>> {
    let mut xw = x.clone();
    for (mut row, &wi) in xw.rows_mut().into_iter().zip(w) {
        row *= wi;
    }
    linalg::invert_spd(&x.t().dot(&xw), "fisher_information")
}
