//! Kaplan-Meier survival curves and the log-rank test
//!
//! `S(t) = S(t-) (1 - d_t / n_t)` over the distinct event times of each
//! group. Subjects censored at an event time are still at risk at that time.

use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::sample::SurvivalSample;
use crate::base::{ModelError, Result};
use crate::inference;
use crate::linalg;

/// One step of a survival curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalStep {
    /// Event time
    pub time: f64,
    /// Subjects at risk just before `time`
    pub n_risk: usize,
    /// Events at `time`
    pub n_events: usize,
    /// Subjects censored at `time`
    pub n_censored: usize,
    /// Survival estimate after the step
    pub survival: f64,
    /// Greenwood standard error
    pub std_error: f64,
    /// Lower log-log confidence bound
    pub lower: f64,
    /// Upper log-log confidence bound
    pub upper: f64,
}

/// Kaplan-Meier curve of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    pub group: String,
    pub n: usize,
    pub n_events: usize,
    pub steps: Vec<SurvivalStep>,
}

impl SurvivalCurve {
    fn estimate(group: &str, time: &[f64], event: &[bool], z: f64) -> Self {
        let mut event_times: Vec<f64> = time
            .iter()
            .zip(event)
            .filter(|(_, &e)| e)
            .map(|(&t, _)| t)
            .collect();
        event_times.sort_by(|a, b| a.total_cmp(b));
        event_times.dedup();

        let mut survival: f64 = 1.0;
        let mut greenwood: f64 = 0.0;
        let mut steps = Vec::with_capacity(event_times.len());

        for &t in &event_times {
            let n_risk = time.iter().filter(|&&ti| ti >= t).count();
            let at_t = time.iter().zip(event).filter(|(&ti, _)| ti == t);
            let n_events = at_t.clone().filter(|(_, &e)| e).count();
            let n_censored = at_t.filter(|(_, &e)| !e).count();

            let (n, d) = (n_risk as f64, n_events as f64);
            survival *= 1.0 - d / n;
            greenwood += d / (n * (n - d));

            let std_error = if survival > 0.0 {
                survival * greenwood.sqrt()
            } else {
                0.0
            };
            let (lower, upper) = log_log_band(survival, greenwood, z);

            steps.push(SurvivalStep {
                time: t,
                n_risk,
                n_events,
                n_censored,
                survival,
                std_error,
                lower,
                upper,
            });
        }

        Self {
            group: group.to_string(),
            n: time.len(),
            n_events: event.iter().filter(|&&e| e).count(),
            steps,
        }
    }

    /// Survival probability at time `t` (right-continuous)
    pub fn survival_at(&self, t: f64) -> f64 {
        self.steps
            .iter()
            .take_while(|s| s.time <= t)
            .last()
            .map_or(1.0, |s| s.survival)
    }

    /// First time at which survival drops to 0.5 or below
    pub fn median(&self) -> Option<f64> {
        self.steps.iter().find(|s| s.survival <= 0.5).map(|s| s.time)
    }

    pub fn times(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.time).collect()
    }

    pub fn survival(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.survival).collect()
    }
}

/// Pointwise interval on the complementary log-log scale
fn log_log_band(survival: f64, greenwood: f64, z: f64) -> (f64, f64) {
    if !(survival > 0.0 && survival < 1.0) || !greenwood.is_finite() {
        return (f64::NAN, f64::NAN);
    }
    let se = greenwood.sqrt() / survival.ln().abs();
    (
        survival.powf((z * se).exp()),
        survival.powf((-z * se).exp()),
    )
}

/// Kaplan-Meier estimates, one curve per group in order of first appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaplanMeier {
    pub confidence_level: f64,
    pub curves: IndexMap<String, SurvivalCurve>,
}

impl KaplanMeier {
    pub fn fit(sample: &SurvivalSample, confidence_level: f64) -> Result<Self> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(ModelError::config(format!(
                "confidence level must lie in (0, 1), got {}",
                confidence_level
            )));
        }
        if sample.is_empty() {
            return Err(ModelError::config("survival sample is empty"));
        }

        let z = inference::z_critical(confidence_level);
        let curves = sample
            .groups()
            .into_iter()
            .map(|label| {
                let (time, event) = sample.subset(label);
                (
                    label.to_string(),
                    SurvivalCurve::estimate(label, &time, &event, z),
                )
            })
            .collect();

        Ok(Self {
            confidence_level,
            curves,
        })
    }

    pub fn curve(&self, group: &str) -> Option<&SurvivalCurve> {
        self.curves.get(group)
    }
}

/// Log-rank comparison of the groups of a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRankTest {
    pub groups: Vec<String>,
    /// Observed events per group
    pub observed: Vec<f64>,
    /// Expected events per group under equal hazards
    pub expected: Vec<f64>,
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
}

/// Chi-squared log-rank test
///
/// Degrees of freedom are the rank of the variance block, `groups - 1` unless
/// some groups never share a risk set at an event time.
pub fn log_rank_test(sample: &SurvivalSample) -> Result<LogRankTest> {
    let groups = sample.groups();
    let g = groups.len();
    if g < 2 {
        return Err(ModelError::config(format!(
            "log-rank test needs at least 2 groups, found {}",
            g
        )));
    }

    let index: Vec<usize> = sample
        .group()
        .iter()
        .map(|label| groups.iter().position(|&name| name == label.as_str()).unwrap_or(0))
        .collect();
    let time = sample.time();
    let event = sample.event();

    let mut event_times: Vec<f64> = time
        .iter()
        .zip(event)
        .filter(|(_, &e)| e)
        .map(|(&t, _)| t)
        .collect();
    event_times.sort_by(|a, b| a.total_cmp(b));
    event_times.dedup();

    let mut observed = Array1::<f64>::zeros(g);
    let mut expected = Array1::<f64>::zeros(g);
    let mut variance = Array2::<f64>::zeros((g, g));

    for &t in &event_times {
        let mut at_risk = vec![0.0; g];
        let mut deaths = vec![0.0; g];
        for i in 0..time.len() {
            if time[i] >= t {
                at_risk[index[i]] += 1.0;
                if time[i] == t && event[i] {
                    deaths[index[i]] += 1.0;
                }
            }
        }

        let n: f64 = at_risk.iter().sum();
        let d: f64 = deaths.iter().sum();
        for k in 0..g {
            observed[k] += deaths[k];
            expected[k] += d * at_risk[k] / n;
        }

        if n > 1.0 {
            let factor = d * (n - d) / (n - 1.0);
            for k in 0..g {
                for l in 0..g {
                    let kronecker = if k == l { 1.0 } else { 0.0 };
                    variance[[k, l]] +=
                        factor * at_risk[k] / n * (kronecker - at_risk[l] / n);
                }
            }
        }
    }

    // the g x g covariance has rank at most g - 1; drop the last group
    let m = g - 1;
    let diff: Array1<f64> = (&observed - &expected).slice(ndarray::s![..m]).to_owned();
    let v = variance.slice(ndarray::s![..m, ..m]).to_owned();
    let (statistic, df) = linalg::generalized_quadratic_form(&v, &diff, "log_rank_test")?;

    // no group ever shared a risk set with another
    let (statistic, p_value) = if df == 0 {
        (0.0, 1.0)
    } else {
        (statistic, inference::pvalue_chi_squared(statistic, df as f64))
    };

    Ok(LogRankTest {
        groups: groups.iter().map(|name| name.to_string()).collect(),
        observed: observed.to_vec(),
        expected: expected.to_vec(),
        statistic,
        df,
        p_value,
    })
}
