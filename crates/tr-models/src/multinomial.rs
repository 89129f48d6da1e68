//! Multinomial logistic regression
//!
//! One coefficient vector per non-baseline outcome level:
//!
//! ```text
//! log(P(Y = k) / P(Y = baseline)) = x b_k
//! ```
//!
//! All blocks are estimated jointly by Newton-Raphson on the multinomial
//! log-likelihood. Parameters are stored block by block in level order,
//! and named `term[level]`.


use ndarray::{Array1, Array2, ArrayView1};

use tr_core::data::DataFrame;
use tr_core::formula::DesignMatrix;

use crate::base::{Family, FitOptions, FittedModel, ModelError, Result};
use crate::linalg;
use crate::newton::{self, LikelihoodModel, LikelihoodState};
use crate::Regression;

struct MultinomialLikelihood<'a> {
    x: &'a Array2<f64>,
    /// Observed level index per row
    outcome: Vec<usize>,
    /// Level index of each parameter block
    others: Vec<usize>,
    n_levels: usize,
}

impl MultinomialLikelihood<'_> {
    fn n_cols(&self) -> usize {
        self.x.ncols()
    }

    /// Linear predictors for every level of one row, baseline pinned at zero
    fn linear_predictors(&self, row: ArrayView1<f64>, theta: &Array1<f64>) -> Vec<f64> {
        let p = self.n_cols();
        let mut eta = vec![0.0; self.n_levels];
        for (block, &level) in self.others.iter().enumerate() {
            let coefficients = theta.slice(ndarray::s![block * p..(block + 1) * p]);
            eta[level] = row.dot(&coefficients);
        }
        eta
    }

    /// Row probabilities by a shifted softmax
    fn row_probabilities(&self, row: ArrayView1<f64>, theta: &Array1<f64>) -> Vec<f64> {
        let eta = self.linear_predictors(row, theta);
        let max = eta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = eta.iter().map(|e| (e - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / total).collect()
    }

    fn probabilities(&self, theta: &Array1<f64>) -> Array2<f64> {
        let mut probs = Array2::zeros((self.x.nrows(), self.n_levels));
        for (i, row) in self.x.rows().into_iter().enumerate() {
            for (k, pi) in self.row_probabilities(row, theta).into_iter().enumerate() {
                probs[[i, k]] = pi;
            }
        }
        probs
    }
}

impl LikelihoodModel for MultinomialLikelihood<'_> {
    fn log_likelihood(&self, theta: &Array1<f64>) -> f64 {
        self.x
            .rows()
            .into_iter()
            .zip(&self.outcome)
            .map(|(row, &y)| {
                let eta = self.linear_predictors(row, theta);
                let max = eta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let lse = max + eta.iter().map(|e| (e - max).exp()).sum::<f64>().ln();
                eta[y] - lse
            })
            .sum()
    }

    fn evaluate(&self, theta: &Array1<f64>) -> LikelihoodState {
        let p = self.n_cols();
        let m = self.others.len();
        let mut gradient = Array1::zeros(m * p);
        let mut information = Array2::zeros((m * p, m * p));
        let mut log_likelihood = 0.0;

        for (row, &y) in self.x.rows().into_iter().zip(&self.outcome) {
            let pi = self.row_probabilities(row, theta);
            log_likelihood += pi[y].ln();

            for (a, &level_a) in self.others.iter().enumerate() {
                let residual = f64::from(u8::from(y == level_a)) - pi[level_a];
                for j in 0..p {
                    gradient[a * p + j] += residual * row[j];
                }

                for (b, &level_b) in self.others.iter().enumerate() {
                    let kronecker = if a == b { 1.0 } else { 0.0 };
                    let weight = pi[level_a] * (kronecker - pi[level_b]);
                    for j in 0..p {
                        for l in 0..p {
                            information[[a * p + j, b * p + l]] += weight * row[j] * row[l];
                        }
                    }
                }
            }
        }

        LikelihoodState {
            log_likelihood,
            gradient,
            information,
        }
    }
}

/// Fit a multinomial logit with `baseline` as the reference level
pub(crate) fn fit_multinomial(
    design: &DesignMatrix,
    family: &Family,
    baseline: Option<&str>,
    options: &FitOptions,
) -> Result<FittedModel> {
    let levels = design.response_levels().ok_or_else(|| {
        ModelError::config("multinomial regression needs a categorical response")
    })?;
    if design.event().is_some() {
        return Err(ModelError::config(
            "a Surv() response needs the Cox family",
        ));
    }
    if levels.len() < 2 {
        return Err(ModelError::config(format!(
            "multinomial regression needs at least 2 outcome levels, found {}",
            levels.len()
        )));
    }

    let outcome: Vec<usize> = design.response().iter().map(|&c| c as usize).collect();
    let counts = level_counts(&outcome, levels)?;

    let baseline_index = match baseline {
        None => 0,
        Some(level) => levels.iter().position(|l| l == level).ok_or_else(|| {
            ModelError::config(format!(
                "baseline '{}' is not an outcome level (levels: {})",
                level,
                levels.join(", ")
            ))
        })?,
    };

    let x = design.x();
    linalg::ensure_full_rank(x)?;

    let others: Vec<usize> = (0..levels.len()).filter(|&k| k != baseline_index).collect();
    let likelihood = MultinomialLikelihood {
        x,
        outcome,
        others,
        n_levels: levels.len(),
    };

    let n_params = likelihood.others.len() * x.ncols();
    let fit = newton::maximize(
        &likelihood,
        Array1::zeros(n_params),
        options,
        "multinomial",
    )?;

    let probabilities = likelihood.probabilities(&fit.params);
    let fitted_values: Array1<f64> = likelihood
        .outcome
        .iter()
        .enumerate()
        .map(|(i, &y)| probabilities[[i, y]])
        .collect();

    let coefficient_names: Vec<String> = likelihood
        .others
        .iter()
        .flat_map(|&k| {
            design
                .column_names()
                .iter()
                .map(move |column| format!("{}[{}]", column, levels[k]))
        })
        .collect();

    let n = x.nrows() as f64;
    let null_log_likelihood: f64 = if design.has_intercept() {
        counts
            .iter()
            .map(|&c| c as f64 * (c as f64 / n).ln())
            .sum()
    } else {
        -n * (levels.len() as f64).ln()
    };

    Ok(FittedModel {
        family: family.clone(),
        options: *options,
        design: design.clone(),
        coefficient_names,
        coefficients: fit.params,
        covariance_unscaled: fit.covariance,
        scale: 1.0,
        df_model: (x.ncols() - usize::from(design.has_intercept())) * likelihood.others.len(),
        residuals: fitted_values.mapv(|f| 1.0 - f),
        fitted_values,
        log_likelihood: fit.log_likelihood,
        null_log_likelihood,
        deviance: None,
        null_deviance: None,
        iterations: fit.iterations,
        outcome_levels: Some(levels.to_vec()),
        probabilities: Some(probabilities),
    })
}

/// Observations per level; every level must occur
pub(crate) fn level_counts(outcome: &[usize], levels: &[String]) -> Result<Vec<usize>> {
    let mut counts = vec![0usize; levels.len()];
    for &y in outcome {
        if let Some(count) = counts.get_mut(y) {
            *count += 1;
        }
    }

    if let Some(empty) = counts.iter().position(|&c| c == 0) {
        return Err(ModelError::config(format!(
            "outcome level '{}' has no observations",
            levels[empty]
        )));
    }
    Ok(counts)
}

/// Convenience function for multinomial logistic regression
pub fn multinom(formula: &str, data: &DataFrame) -> Result<FittedModel> {
    Regression::new(formula)?
        .family(Family::multinomial())
        .fit(data)
}
