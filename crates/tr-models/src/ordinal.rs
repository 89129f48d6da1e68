//! Proportional-odds (cumulative logit) ordinal regression
//!
//! For an outcome with ordered levels `1..K`:
//!
//! ```text
//! logit P(Y <= j) = theta_j - x b,   j = 1..K-1
//! ```
//!
//! with strictly increasing cut-points `theta` and a single slope vector
//! shared by every cut. The design's intercept column is dropped since the
//! cut-points take its place. Parameters are `[b; theta]`.


use log::warn;
use ndarray::{Array1, Array2, ArrayView1};

use tr_core::data::DataFrame;
use tr_core::formula::DesignMatrix;

use crate::base::{Family, FitOptions, FittedModel, ModelError, Result};
use crate::linalg;
use crate::multinomial::level_counts;
use crate::newton::{self, LikelihoodModel, LikelihoodState};
use crate::Regression;

fn logistic(t: f64) -> f64 {
    if t >= 0.0 {
        1.0 / (1.0 + (-t).exp())
    } else {
        let e = t.exp();
        e / (1.0 + e)
    }
}

struct OrdinalLikelihood<'a> {
    x: &'a Array2<f64>,
    outcome: Vec<usize>,
    n_levels: usize,
}

/// One bound of an outcome's interval on the latent scale
struct Bound {
    /// Index of the cut-point in the parameter vector
    index: usize,
    cdf: f64,
    density: f64,
    /// Derivative of the density
    slope: f64,
}

impl OrdinalLikelihood<'_> {
    fn n_slopes(&self) -> usize {
        self.x.ncols()
    }

    fn n_params(&self) -> usize {
        self.n_slopes() + self.n_levels - 1
    }

    fn bound(&self, params: &Array1<f64>, cut: usize, eta: f64) -> Bound {
        let index = self.n_slopes() + cut;
        let cdf = logistic(params[index] - eta);
        let density = cdf * (1.0 - cdf);
        Bound {
            index,
            cdf,
            density,
            slope: density * (1.0 - 2.0 * cdf),
        }
    }

    /// Upper and lower bounds of category `k`; `None` at +/- infinity
    fn bounds(&self, params: &Array1<f64>, k: usize, eta: f64) -> (Option<Bound>, Option<Bound>) {
        let upper = (k + 1 < self.n_levels).then(|| self.bound(params, k, eta));
        let lower = (k > 0).then(|| self.bound(params, k - 1, eta));
        (upper, lower)
    }

    fn eta(&self, row: ArrayView1<f64>, params: &Array1<f64>) -> f64 {
        row.dot(&params.slice(ndarray::s![..self.n_slopes()]))
    }

    fn category_probability(&self, params: &Array1<f64>, k: usize, eta: f64) -> f64 {
        let (upper, lower) = self.bounds(params, k, eta);
        upper.map_or(1.0, |b| b.cdf) - lower.map_or(0.0, |b| b.cdf)
    }

    fn probabilities(&self, params: &Array1<f64>) -> Array2<f64> {
        let mut probs = Array2::zeros((self.x.nrows(), self.n_levels));
        for (i, row) in self.x.rows().into_iter().enumerate() {
            let eta = self.eta(row, params);
            for k in 0..self.n_levels {
                probs[[i, k]] = self.category_probability(params, k, eta);
            }
        }
        probs
    }

    /// d(theta_cut - eta) / d params
    fn direction(&self, row: ArrayView1<f64>, bound: &Bound) -> Array1<f64> {
        let mut d = Array1::zeros(self.n_params());
        for j in 0..self.n_slopes() {
            d[j] = -row[j];
        }
        d[bound.index] = 1.0;
        d
    }
}

impl LikelihoodModel for OrdinalLikelihood<'_> {
    fn log_likelihood(&self, params: &Array1<f64>) -> f64 {
        self.x
            .rows()
            .into_iter()
            .zip(&self.outcome)
            .map(|(row, &k)| {
                let eta = self.eta(row, params);
                self.category_probability(params, k, eta).ln()
            })
            .sum()
    }

    fn evaluate(&self, params: &Array1<f64>) -> LikelihoodState {
        let q = self.n_params();
        let mut gradient = Array1::zeros(q);
        let mut information = Array2::zeros((q, q));
        let mut log_likelihood = 0.0;

        for (row, &k) in self.x.rows().into_iter().zip(&self.outcome) {
            let eta = self.eta(row, params);
            let (upper, lower) = self.bounds(params, k, eta);
            let prob =
                upper.as_ref().map_or(1.0, |b| b.cdf) - lower.as_ref().map_or(0.0, |b| b.cdf);
            log_likelihood += prob.ln();

            // score of ln P and the curvature of P itself
            let mut score = Array1::zeros(q);
            let mut curvature = Array2::zeros((q, q));
            if let Some(b) = &upper {
                let d = self.direction(row, b);
                score.scaled_add(b.density / prob, &d);
                curvature.scaled_add(b.slope / prob, &outer(&d));
            }
            if let Some(b) = &lower {
                let d = self.direction(row, b);
                score.scaled_add(-b.density / prob, &d);
                curvature.scaled_add(-b.slope / prob, &outer(&d));
            }

            gradient += &score;
            information += &(outer(&score) - curvature);
        }

        LikelihoodState {
            log_likelihood,
            gradient,
            information,
        }
    }

    fn is_feasible(&self, params: &Array1<f64>) -> bool {
        let cuts = params.slice(ndarray::s![self.n_slopes()..]).to_vec();
        cuts.iter().all(|c| c.is_finite()) && cuts.windows(2).all(|w| w[0] < w[1])
    }
}

fn outer(v: &Array1<f64>) -> Array2<f64> {
    let n = v.len();
    Array2::from_shape_fn((n, n), |(i, j)| v[i] * v[j])
}

/// Fit a proportional-odds model on an ordered categorical response
pub(crate) fn fit_ordinal(design: &DesignMatrix, options: &FitOptions) -> Result<FittedModel> {
    let levels = design.response_levels().ok_or_else(|| {
        ModelError::config("ordinal regression needs a categorical response")
    })?;
    if design.event().is_some() {
        return Err(ModelError::config(
            "a Surv() response needs the Cox family",
        ));
    }
    if levels.len() < 3 {
        return Err(ModelError::Ordering {
            levels: levels.len(),
        });
    }
    if !design.is_ordered_response() {
        warn!(
            "{}: response is not an ordered factor, using level order {}",
            design.formula(),
            levels.join(" < ")
        );
    }

    let design = design.without_intercept();
    let x = design.x();
    linalg::ensure_full_rank(x)?;

    let outcome: Vec<usize> = design.response().iter().map(|&c| c as usize).collect();
    let counts = level_counts(&outcome, levels)?;
    let n = outcome.len() as f64;

    let likelihood = OrdinalLikelihood {
        x,
        outcome,
        n_levels: levels.len(),
    };

    // slopes at zero, cut-points at the marginal cumulative logits
    let mut start = Array1::zeros(likelihood.n_params());
    let mut cumulative = 0.0;
    for (j, &count) in counts.iter().take(levels.len() - 1).enumerate() {
        cumulative += count as f64;
        let p = cumulative / n;
        start[x.ncols() + j] = (p / (1.0 - p)).ln();
    }

    let fit = newton::maximize(&likelihood, start, options, "ordinal")?;

    let probabilities = likelihood.probabilities(&fit.params);
    let fitted_values: Array1<f64> = likelihood
        .outcome
        .iter()
        .enumerate()
        .map(|(i, &k)| probabilities[[i, k]])
        .collect();

    let mut coefficient_names = design.column_names().to_vec();
    coefficient_names.extend(levels.windows(2).map(|w| format!("{}|{}", w[0], w[1])));

    let df_model = x.ncols();
    let null_log_likelihood: f64 = counts
        .iter()
        .map(|&c| c as f64 * (c as f64 / n).ln())
        .sum();

    Ok(FittedModel {
        family: Family::Ordinal,
        options: *options,
        coefficient_names,
        coefficients: fit.params,
        covariance_unscaled: fit.covariance,
        scale: 1.0,
        df_model,
        residuals: fitted_values.mapv(|f| 1.0 - f),
        fitted_values,
        log_likelihood: fit.log_likelihood,
        null_log_likelihood,
        deviance: None,
        null_deviance: None,
        iterations: fit.iterations,
        outcome_levels: Some(levels.to_vec()),
        probabilities: Some(probabilities),
        design,
    })
}

/// Convenience function for proportional-odds regression
pub fn polr(formula: &str, data: &DataFrame) -> Result<FittedModel> {
    Regression::new(formula)?.family(Family::Ordinal).fit(data)
}
