//! Cox proportional hazards regression
//!
//! Maximises the partial likelihood over the risk sets `{j : t_j >= t}` at
//! each distinct event time. Tied event times use the Breslow
//! approximation by default, or Efron's. Subjects are swept from the
//! latest time to the earliest so the risk-set sums accumulate in one pass.

use ndarray::{Array1, Array2, ArrayView1};

use tr_core::formula::DesignMatrix;

use crate::base::{Family, FitOptions, FittedModel, ModelError, Result, Ties};
use crate::linalg;
use crate::newton::{self, LikelihoodModel, LikelihoodState};

struct CoxLikelihood<'a> {
    x: &'a Array2<f64>,
    event: Vec<bool>,
    ties: Ties,
    /// Row indices grouped by distinct time, latest time first
    strata: Vec<Vec<usize>>,
}

/// Weighted sums over a set of subjects: `sum r`, `sum r x`, `sum r x x'`
struct RiskSums {
    s0: f64,
    s1: Array1<f64>,
    s2: Array2<f64>,
}

impl RiskSums {
    fn new(p: usize) -> Self {
        Self {
            s0: 0.0,
            s1: Array1::zeros(p),
            s2: Array2::zeros((p, p)),
        }
    }

    fn add(&mut self, row: ArrayView1<f64>, risk: f64) {
        self.s0 += risk;
        self.s1.scaled_add(risk, &row);
        let p = row.len();
        for j in 0..p {
            for l in 0..p {
                self.s2[[j, l]] += risk * row[j] * row[l];
            }
        }
    }
}

impl<'a> CoxLikelihood<'a> {
    fn new(x: &'a Array2<f64>, time: &Array1<f64>, event: Vec<bool>, ties: Ties) -> Self {
        let mut order: Vec<usize> = (0..time.len()).collect();
        order.sort_by(|&a, &b| time[b].total_cmp(&time[a]));

        let mut strata: Vec<Vec<usize>> = Vec::new();
        for i in order {
            match strata.last_mut() {
                Some(current) if time[current[0]] == time[i] => current.push(i),
                _ => strata.push(vec![i]),
            }
        }

        Self {
            x,
            event,
            ties,
            strata,
        }
    }

    /// Linear predictor and its maximum, used to keep `exp` in range
    fn linear_predictor(&self, beta: &Array1<f64>) -> (Array1<f64>, f64) {
        let eta = self.x.dot(beta);
        let shift = eta.iter().copied().fold(0.0_f64, f64::max);
        (eta, shift)
    }

    /// Breslow cumulative baseline hazard at each subject's own time
    fn cumulative_hazard(&self, beta: &Array1<f64>) -> Array1<f64> {
        let (eta, _) = self.linear_predictor(beta);
        let risk = eta.mapv(f64::exp);
        let n = eta.len();

        // risk-set totals per stratum, latest first
        let mut s0 = 0.0;
        let mut increments = Vec::with_capacity(self.strata.len());
        for stratum in &self.strata {
            s0 += stratum.iter().map(|&i| risk[i]).sum::<f64>();
            let deaths = stratum.iter().filter(|&&i| self.event[i]).count() as f64;
            increments.push(if deaths > 0.0 { deaths / s0 } else { 0.0 });
        }

        let mut hazard = Array1::zeros(n);
        let mut cumulative = 0.0;
        for (stratum, increment) in self.strata.iter().zip(increments).rev() {
            cumulative += increment;
            for &i in stratum {
                hazard[i] = cumulative;
            }
        }
        hazard
    }
}

impl LikelihoodModel for CoxLikelihood<'_> {
    fn log_likelihood(&self, beta: &Array1<f64>) -> f64 {
        self.evaluate(beta).log_likelihood
    }

    fn evaluate(&self, beta: &Array1<f64>) -> LikelihoodState {
        let p = self.x.ncols();
        let (eta, shift) = self.linear_predictor(beta);
        let risk = eta.mapv(|e| (e - shift).exp());

        let mut log_likelihood = 0.0;
        let mut gradient = Array1::zeros(p);
        let mut information = Array2::zeros((p, p));
        let mut at_risk = RiskSums::new(p);

        for stratum in &self.strata {
            let mut deaths = RiskSums::new(p);
            let mut d = 0usize;
            for &i in stratum {
                let row = self.x.row(i);
                at_risk.add(row, risk[i]);
                if self.event[i] {
                    deaths.add(row, risk[i]);
                    log_likelihood += eta[i];
                    gradient += &row;
                    d += 1;
                }
            }
            if d == 0 {
                continue;
            }

            let fractions: Vec<f64> = match self.ties {
                Ties::Breslow => vec![0.0; d],
                Ties::Efron => (0..d).map(|l| l as f64 / d as f64).collect(),
            };
            for f in fractions {
                let s0 = at_risk.s0 - f * deaths.s0;
                let s1 = &at_risk.s1 - &(&deaths.s1 * f);
                let s2 = &at_risk.s2 - &(&deaths.s2 * f);

                log_likelihood -= s0.ln() + shift;
                gradient.scaled_add(-1.0 / s0, &s1);
                let mean = &s1 / s0;
                for j in 0..p {
                    for l in 0..p {
                        information[[j, l]] += s2[[j, l]] / s0 - mean[j] * mean[l];
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

/// Fit a Cox model on a design with a `Surv(time, event)` response
pub(crate) fn fit_cox(design: &DesignMatrix, ties: Ties, options: &FitOptions) -> Result<FittedModel> {
    let event = design
        .event()
        .ok_or_else(|| {
            ModelError::config("Cox regression needs a Surv(time, event) response")
        })?
        .to_vec();
    if !event.iter().any(|&e| e) {
        return Err(ModelError::config(
            "Cox regression needs at least one observed event",
        ));
    }

    let design = design.without_intercept();
    let x = design.x();
    linalg::ensure_full_rank(x)?;

    let likelihood = CoxLikelihood::new(x, design.response(), event, ties);
    let p = x.ncols();

    let start = Array1::zeros(p);
    let null_log_likelihood = likelihood.log_likelihood(&start);
    let fit = newton::maximize(&likelihood, start, options, "cox")?;

    let linear_predictor = x.dot(&fit.params);
    let hazard = likelihood.cumulative_hazard(&fit.params);
    let residuals: Array1<f64> = (0..linear_predictor.len())
        .map(|i| {
            let observed = if likelihood.event[i] { 1.0 } else { 0.0 };
            observed - linear_predictor[i].exp() * hazard[i]
        })
        .collect();

    Ok(FittedModel {
        family: Family::Cox { ties },
        options: *options,
        coefficient_names: design.column_names().to_vec(),
        coefficients: fit.params,
        covariance_unscaled: fit.covariance,
        scale: 1.0,
        df_model: p,
        fitted_values: linear_predictor,
        residuals,
        log_likelihood: fit.log_likelihood,
        null_log_likelihood,
        deviance: None,
        null_deviance: None,
        iterations: fit.iterations,
        outcome_levels: None,
        probabilities: None,
        design,
    })
}
