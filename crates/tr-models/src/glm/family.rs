//! Exponential-family pieces used by IRLS
//!
//! Each family carries its canonical link: logit for binomial, log for
//! Poisson, identity for Gaussian.

use ndarray::Array1;
use statrs::function::gamma::ln_gamma;

use crate::base::{Family, ModelError, Result};
use crate::lm::gaussian_log_likelihood;

/// Fitted probabilities stay strictly inside (0, 1)
const MU_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GlmFamily {
    Binomial,
    Poisson,
    Gaussian,
}

impl GlmFamily {
    pub(crate) fn from_family(family: &Family) -> Option<Self> {
        match family {
            Family::Binomial => Some(GlmFamily::Binomial),
            Family::Poisson => Some(GlmFamily::Poisson),
            Family::Gaussian => Some(GlmFamily::Gaussian),
            _ => None,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            GlmFamily::Binomial => "binomial",
            GlmFamily::Poisson => "poisson",
            GlmFamily::Gaussian => "gaussian",
        }
    }

    /// Check the response lies in the family's support
    pub(crate) fn validate_response(&self, y: &Array1<f64>) -> Result<()> {
        let bad = match self {
            GlmFamily::Binomial => y.iter().find(|&&v| !(0.0..=1.0).contains(&v)),
            GlmFamily::Poisson => y.iter().find(|&&v| !(v >= 0.0 && v.is_finite())),
            GlmFamily::Gaussian => y.iter().find(|v| !v.is_finite()),
        };

        match bad {
            Some(value) => Err(ModelError::config(format!(
                "response value {} is outside the support of the {} family",
                value,
                self.name()
            ))),
            None => Ok(()),
        }
    }

    pub(crate) fn link(&self, mu: f64) -> f64 {
        match self {
            GlmFamily::Binomial => (mu / (1.0 - mu)).ln(),
            GlmFamily::Poisson => mu.ln(),
            GlmFamily::Gaussian => mu,
        }
    }

    pub(crate) fn inverse_link(&self, eta: f64) -> f64 {
        let mu = match self {
            GlmFamily::Binomial => 1.0 / (1.0 + (-eta).exp()),
            GlmFamily::Poisson => eta.exp(),
            GlmFamily::Gaussian => eta,
        };
        self.clamp(mu)
    }

    /// d eta / d mu
    pub(crate) fn link_derivative(&self, mu: f64) -> f64 {
        match self {
            GlmFamily::Binomial => 1.0 / (mu * (1.0 - mu)),
            GlmFamily::Poisson => 1.0 / mu,
            GlmFamily::Gaussian => 1.0,
        }
    }

    pub(crate) fn variance(&self, mu: f64) -> f64 {
        match self {
            GlmFamily::Binomial => mu * (1.0 - mu),
            GlmFamily::Poisson => mu,
            GlmFamily::Gaussian => 1.0,
        }
    }

    pub(crate) fn clamp(&self, mu: f64) -> f64 {
        match self {
            GlmFamily::Binomial => mu.clamp(MU_EPSILON, 1.0 - MU_EPSILON),
            GlmFamily::Poisson => mu.max(MU_EPSILON),
            GlmFamily::Gaussian => mu,
        }
    }

    /// Starting means, pulled away from the boundary
    pub(crate) fn initial_mu(&self, y: f64) -> f64 {
        match self {
            GlmFamily::Binomial => (y + 0.5) / 2.0,
            GlmFamily::Poisson => y + 0.1,
            GlmFamily::Gaussian => y,
        }
    }

    pub(crate) fn unit_deviance(&self, y: f64, mu: f64) -> f64 {
        match self {
            GlmFamily::Binomial => 2.0 * (x_log_ratio(y, mu) + x_log_ratio(1.0 - y, 1.0 - mu)),
            GlmFamily::Poisson => 2.0 * (x_log_ratio(y, mu) - (y - mu)),
            GlmFamily::Gaussian => (y - mu).powi(2),
        }
    }

    pub(crate) fn deviance(&self, y: &Array1<f64>, mu: &Array1<f64>) -> f64 {
        y.iter()
            .zip(mu)
            .map(|(&yi, &mi)| self.unit_deviance(yi, mi))
            .sum()
    }

    /// Log-likelihood at the fitted means; Gaussian uses the ML variance
    pub(crate) fn log_likelihood(&self, y: &Array1<f64>, mu: &Array1<f64>) -> f64 {
        match self {
            GlmFamily::Binomial => y
                .iter()
                .zip(mu)
                .map(|(&yi, &mi)| yi * mi.ln() + (1.0 - yi) * (1.0 - mi).ln())
                .sum(),
            GlmFamily::Poisson => y
                .iter()
                .zip(mu)
                .map(|(&yi, &mi)| yi * mi.ln() - mi - ln_gamma(yi + 1.0))
                .sum(),
            GlmFamily::Gaussian => gaussian_log_likelihood(self.deviance(y, mu), y.len()),
        }
    }
}

/// `y ln(y / mu)` with `0 ln 0 = 0`
fn x_log_ratio(y: f64, mu: f64) -> f64 {
    if y <= 0.0 {
        0.0
    } else {
        y * (y / mu).ln()
    }
}
