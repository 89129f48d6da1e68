//! Tests for survival analysis
//!
//! Kaplan-Meier curves and the log-rank test are checked against values
//! worked by hand; Cox regression against a small risk-set example with a
//! closed-form maximum.

use approx::assert_abs_diff_eq;

use super::{coxph, log_rank_test, KaplanMeier, SurvivalSample, ALL_SUBJECTS};
use crate::base::{Family, FitOptions, ModelError, ModelType, Ties};
use crate::fit;
use ndarray::{array, Array2};
use tr_core::data::{DataFrame, DataFrameBuilder, Series};
use tr_core::formula::DesignMatrix;

// ==================== Test Fixtures ====================

fn censored_sample() -> SurvivalSample {
    SurvivalSample::ungrouped(
        &[1.0, 2.0, 3.0, 4.0, 5.0],
        &[true, false, true, true, false],
    )
    .unwrap()
}

/// Two arms, every subject an event
fn two_arms() -> SurvivalSample {
    SurvivalSample::new(
        &[1.0, 3.0, 2.0, 4.0],
        &[true, true, true, true],
        &["A", "A", "B", "B"],
    )
    .unwrap()
}

/// Times 5, 8, 8+, 12 with x = 0, 1, 0, 1
fn cox_data() -> DataFrame {
    DataFrameBuilder::new()
        .with_column("time", Series::float(vec![5.0, 8.0, 8.0, 12.0]))
        .unwrap()
        .with_column("status", Series::int(vec![1, 1, 0, 1]))
        .unwrap()
        .with_column("x", Series::float(vec![0.0, 1.0, 0.0, 1.0]))
        .unwrap()
        .build()
        .unwrap()
}

// ==================== Survival Sample ====================

#[test]
fn test_sample_validation() {
    assert!(matches!(
        SurvivalSample::ungrouped(&[1.0, 2.0], &[true]),
        Err(ModelError::Data(_))
    ));
    assert!(matches!(
        SurvivalSample::ungrouped(&[1.0, -2.0], &[true, false]),
        Err(ModelError::Data(_))
    ));
    assert!(matches!(
        SurvivalSample::ungrouped(&[1.0, f64::NAN], &[true, false]),
        Err(ModelError::Data(_))
    ));

    let sample = two_arms();
    assert_eq!(sample.len(), 4);
    assert_eq!(sample.groups(), vec!["A", "B"]);
    assert_eq!(sample.n_events(), 4);
}

#[test]
fn test_sample_from_frame() {
    let df = DataFrameBuilder::new()
        .with_column(
            "time",
            Series::float_with_missing(&[Some(2.0), Some(4.0), None, Some(6.0)]),
        )
        .unwrap()
        .with_column("status", Series::int(vec![1, 0, 1, 2]))
        .unwrap()
        .with_column("arm", Series::categorical(&["drug", "placebo", "drug", "drug"]))
        .unwrap()
        .build()
        .unwrap();

    let sample = SurvivalSample::from_frame(&df, "time", "status", Some("arm")).unwrap();
    assert_eq!(sample.time(), &[2.0, 4.0, 6.0]);
    assert_eq!(sample.event(), &[true, false, true]);
    assert_eq!(sample.groups(), vec!["drug", "placebo"]);

    let pooled = SurvivalSample::from_frame(&df, "time", "status", None).unwrap();
    assert_eq!(pooled.groups(), vec![ALL_SUBJECTS]);
}

// ==================== Kaplan-Meier ====================

#[test]
fn test_kaplan_meier_without_censoring() {
    let sample = SurvivalSample::ungrouped(
        &[1.0, 2.0, 2.0, 3.0, 5.0],
        &[true, true, true, true, true],
    )
    .unwrap();
    let km = KaplanMeier::fit(&sample, 0.95).unwrap();
    let curve = km.curve(ALL_SUBJECTS).unwrap();

    assert_eq!(curve.times(), vec![1.0, 2.0, 3.0, 5.0]);
    let survival = curve.survival();
    let expected = [0.8, 0.4, 0.2, 0.0];
    for (s, e) in survival.iter().zip(expected) {
        assert_abs_diff_eq!(*s, e, epsilon = 1e-12);
    }
    assert_eq!(curve.steps[1].n_risk, 4);
    assert_eq!(curve.steps[1].n_events, 2);

    // survival zero: no spread, no band
    let last = curve.steps.last().unwrap();
    assert_eq!(last.std_error, 0.0);
    assert!(last.lower.is_nan());
    assert_eq!(curve.median(), Some(2.0));
}

#[test]
fn test_kaplan_meier_with_censoring() {
    let km = KaplanMeier::fit(&censored_sample(), 0.95).unwrap();
    let curve = km.curve(ALL_SUBJECTS).unwrap();

    assert_eq!(curve.n, 5);
    assert_eq!(curve.n_events, 3);
    assert_eq!(curve.times(), vec![1.0, 3.0, 4.0]);

    let survival = curve.survival();
    assert_abs_diff_eq!(survival[0], 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(survival[1], 0.8 * 2.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(survival[2], 0.8 / 3.0, epsilon = 1e-12);

    // Greenwood: 0.8 * sqrt(1 / (5 * 4))
    assert_abs_diff_eq!(curve.steps[0].std_error, 0.178885, epsilon = 1e-6);
    assert_eq!(curve.steps[1].n_risk, 3);

    let first = &curve.steps[0];
    assert!(first.lower < first.survival && first.survival < first.upper);
    assert!(first.lower > 0.0 && first.upper < 1.0);

    assert_eq!(curve.median(), Some(4.0));
    assert_eq!(curve.survival_at(0.5), 1.0);
    assert_abs_diff_eq!(curve.survival_at(2.5), 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(curve.survival_at(10.0), 0.8 / 3.0, epsilon = 1e-12);
}

#[test]
fn test_kaplan_meier_censoring_at_event_time() {
    let sample = SurvivalSample::ungrouped(&[2.0, 2.0, 3.0], &[true, false, true]).unwrap();
    let km = KaplanMeier::fit(&sample, 0.9).unwrap();
    let step = &km.curve(ALL_SUBJECTS).unwrap().steps[0];

    assert_eq!(step.n_risk, 3);
    assert_eq!(step.n_events, 1);
    assert_eq!(step.n_censored, 1);
    assert!(km.curve(ALL_SUBJECTS).unwrap().median().is_some());
}

#[test]
fn test_kaplan_meier_groups_in_order() {
    let km = KaplanMeier::fit(&two_arms(), 0.95).unwrap();
    let groups: Vec<&str> = km.curves.keys().map(String::as_str).collect();
    assert_eq!(groups, vec!["A", "B"]);
    assert_eq!(km.curve("B").unwrap().times(), vec![2.0, 4.0]);
    assert!(km.curve("C").is_none());
}

#[test]
fn test_kaplan_meier_rejects_bad_input() {
    assert!(matches!(
        KaplanMeier::fit(&censored_sample(), 1.5),
        Err(ModelError::InvalidConfig { .. })
    ));
    let empty = SurvivalSample::ungrouped(&[], &[]).unwrap();
    assert!(matches!(
        KaplanMeier::fit(&empty, 0.95),
        Err(ModelError::InvalidConfig { .. })
    ));
}

// ==================== Log-rank ====================

#[test]
fn test_log_rank_two_groups() {
    let test = log_rank_test(&two_arms()).unwrap();

    assert_eq!(test.groups, vec!["A", "B"]);
    assert_eq!(test.df, 1);
    assert_abs_diff_eq!(test.observed[0], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(test.expected[0], 4.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(
        test.observed.iter().sum::<f64>(),
        test.expected.iter().sum::<f64>(),
        epsilon = 1e-12
    );
    // (2/3)^2 / (1/4 + 2/9 + 1/4)
    assert_abs_diff_eq!(test.statistic, 0.615385, epsilon = 1e-6);
    assert!(test.p_value > 0.4 && test.p_value < 0.5);
}

#[test]
fn test_log_rank_identical_groups() {
    let sample = SurvivalSample::new(
        &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0],
        &[true, true, false, true, true, false],
        &["x", "x", "x", "y", "y", "y"],
    )
    .unwrap();
    let test = log_rank_test(&sample).unwrap();

    assert_abs_diff_eq!(test.statistic, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(test.p_value, 1.0, epsilon = 1e-12);
}

#[test]
fn test_log_rank_needs_two_groups() {
    assert!(matches!(
        log_rank_test(&censored_sample()),
        Err(ModelError::InvalidConfig { .. })
    ));
}

#[test]
fn test_log_rank_groups_never_at_risk_together() {
    // every event in "b" happens after the last "a" subject has left
    let sample = SurvivalSample::new(
        &[1.0, 2.0, 3.0, 4.0],
        &[false, false, true, true],
        &["a", "a", "b", "b"],
    )
    .unwrap();
    let test = log_rank_test(&sample).unwrap();

    assert_eq!(test.df, 0);
    assert_abs_diff_eq!(test.statistic, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(test.p_value, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(test.expected[1], 2.0, epsilon = 1e-12);
}

#[test]
fn test_log_rank_without_events() {
    let sample = SurvivalSample::new(
        &[1.0, 2.0, 3.0, 4.0],
        &[false; 4],
        &["a", "b", "a", "b"],
    )
    .unwrap();
    let test = log_rank_test(&sample).unwrap();

    assert_eq!(test.df, 0);
    assert_eq!(test.statistic, 0.0);
    assert_eq!(test.p_value, 1.0);
    assert!(test.observed.iter().all(|&o| o == 0.0));
}

#[test]
fn test_log_rank_drops_only_degenerate_directions() {
    // "c" never shares a risk set with an event, "a" and "b" do
    let sample = SurvivalSample::new(
        &[1.0, 3.0, 2.0, 4.0, 0.5, 0.7],
        &[true, true, true, true, false, false],
        &["a", "a", "b", "b", "c", "c"],
    )
    .unwrap();
    let test = log_rank_test(&sample).unwrap();

    assert_eq!(test.groups, vec!["a", "b", "c"]);
    assert_eq!(test.df, 1);
    // same risk sets as the two-arm sample
    assert_abs_diff_eq!(test.statistic, 0.615385, epsilon = 1e-6);
}

#[test]
fn test_kaplan_meier_is_serializable() {
    fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
    assert_serde::<KaplanMeier>();
}

// ==================== Cox ====================

#[test]
fn test_cox_breslow_closed_form() {
    let model = coxph("Surv(time, status) ~ x", &cox_data(), Ties::Breslow).unwrap();

    assert_eq!(model.model_type(), ModelType::Cox);
    assert_eq!(model.coefficient_names(), &["x"]);
    assert!(!model.has_intercept());

    // score: 1 / (1 + r) = 2r / (1 + 2r)  =>  r^2 = 1/2
    assert_abs_diff_eq!(model.coefficients()[0], -0.5 * 2.0_f64.ln(), epsilon = 1e-6);
    assert_abs_diff_eq!(model.null_log_likelihood(), -(12.0_f64.ln()), epsilon = 1e-10);
    assert!(model.log_likelihood() >= model.null_log_likelihood());
    assert_eq!(model.df_model(), 1);

    // fitted values are the linear predictor
    assert_abs_diff_eq!(model.fitted_values()[0], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(
        model.fitted_values()[1],
        model.coefficients()[0],
        epsilon = 1e-12
    );
}

#[test]
fn test_cox_martingale_residuals() {
    let model = coxph("Surv(time, status) ~ x", &cox_data(), Ties::Breslow).unwrap();

    let residuals = model.residuals();
    assert_abs_diff_eq!(residuals.sum(), 0.0, epsilon = 1e-8);
    assert!(residuals.iter().all(|&r| r <= 1.0));
    // censored subject contributes only the negative part
    assert!(residuals[2] < 0.0);
}

#[test]
fn test_cox_efron_matches_breslow_without_ties() {
    let df = DataFrameBuilder::new()
        .with_column("time", Series::float(vec![2.0, 3.0, 5.0, 7.0, 11.0, 13.0]))
        .unwrap()
        .with_column("status", Series::int(vec![1, 1, 0, 1, 1, 0]))
        .unwrap()
        .with_column("x", Series::float(vec![1.2, 0.4, 0.9, -0.3, 0.5, -1.0]))
        .unwrap()
        .build()
        .unwrap();

    let breslow = coxph("Surv(time, status) ~ x", &df, Ties::Breslow).unwrap();
    let efron = coxph("Surv(time, status) ~ x", &df, Ties::Efron).unwrap();

    assert_abs_diff_eq!(breslow.coefficients(), efron.coefficients(), epsilon = 1e-8);
    assert_abs_diff_eq!(breslow.log_likelihood(), efron.log_likelihood(), epsilon = 1e-10);
    assert!(breslow.coefficients()[0] > 0.0);
}

#[test]
fn test_cox_tie_corrections_differ() {
    let df = DataFrameBuilder::new()
        .with_column("time", Series::float(vec![2.0, 2.0, 3.0, 4.0, 5.0, 5.0, 6.0]))
        .unwrap()
        .with_column("status", Series::int(vec![1, 1, 1, 0, 1, 1, 1]))
        .unwrap()
        .with_column("x", Series::float(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]))
        .unwrap()
        .build()
        .unwrap();

    let breslow = coxph("Surv(time, status) ~ x", &df, Ties::Breslow).unwrap();
    let efron = coxph("Surv(time, status) ~ x", &df, Ties::Efron).unwrap();

    assert!((breslow.coefficients()[0] - efron.coefficients()[0]).abs() > 1e-6);
    assert!(efron.standard_errors()[0].is_finite());
    assert_abs_diff_eq!(breslow.residuals().sum(), 0.0, epsilon = 1e-8);
}

#[test]
fn test_cox_requires_survival_response() {
    let df = DataFrameBuilder::new()
        .with_column("y", Series::float(vec![1.0, 2.0, 3.0]))
        .unwrap()
        .with_column("x", Series::float(vec![0.0, 1.0, 0.0]))
        .unwrap()
        .build()
        .unwrap();

    assert!(matches!(
        coxph("y ~ x", &df, Ties::Breslow),
        Err(ModelError::InvalidConfig { .. })
    ));
}

#[test]
fn test_cox_requires_events() {
    let x = Array2::from_shape_vec((3, 1), vec![0.0, 1.0, 0.5]).unwrap();
    let design = DesignMatrix::from_arrays(x, array![1.0, 2.0, 3.0], vec!["x".to_string()])
        .unwrap()
        .with_event(array![false, false, false])
        .unwrap();

    assert!(matches!(
        fit(&design, &Family::cox(), &FitOptions::default()),
        Err(ModelError::InvalidConfig { .. })
    ));
}

#[test]
fn test_cox_monotone_likelihood_does_not_converge() {
    // every x = 1 subject fails before every x = 0 subject
    let df = DataFrameBuilder::new()
        .with_column("time", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
        .unwrap()
        .with_column("status", Series::int(vec![1, 1, 1, 1, 1, 1]))
        .unwrap()
        .with_column("x", Series::float(vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0]))
        .unwrap()
        .build()
        .unwrap();

    assert!(matches!(
        coxph("Surv(time, status) ~ x", &df, Ties::Breslow),
        Err(ModelError::NotConverged { max_iter: 50, .. })
    ));
}
