//! Tests for generalized linear models

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use super::{fit_irls, GlmFamily};
use crate::base::{Family, FitOptions, ModelError};
use crate::glm::glm;
use crate::lm::lm;
use crate::report::goodness_of_fit;
use crate::Regression;
use tr_core::data::{DataFrame, DataFrameBuilder, Series};

// ==================== Test Fixtures ====================

/// Two groups of four with 1/4 and 3/4 successes
fn two_by_two() -> DataFrame {
    DataFrameBuilder::new()
        .with_column("x", Series::float(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]))
        .unwrap()
        .with_column("y", Series::float(vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0]))
        .unwrap()
        .build()
        .unwrap()
}

/// Counts with group means 2 and 5
fn counts() -> DataFrame {
    DataFrameBuilder::new()
        .with_column("x", Series::float(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]))
        .unwrap()
        .with_column("y", Series::float(vec![2.0, 3.0, 1.0, 2.0, 4.0, 6.0, 5.0, 5.0]))
        .unwrap()
        .build()
        .unwrap()
}

// ==================== Binomial ====================

#[test]
fn test_binomial_intercept_only() {
    let df = DataFrameBuilder::new()
        .with_column("y", Series::float(vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]))
        .unwrap()
        .build()
        .unwrap();

    let model = glm("y ~ 1", &df, Family::Binomial).unwrap();

    assert_abs_diff_eq!(model.coefficients()[0], (5.0_f64 / 3.0).ln(), epsilon = 1e-8);
    // Var = 1 / (n p (1 - p)) = 1 / (8 * 15/64)
    assert_abs_diff_eq!(model.standard_errors()[0], 0.730297, epsilon = 1e-5);
    assert_eq!(model.df_model(), 0);
    assert_abs_diff_eq!(
        model.log_likelihood(),
        model.null_log_likelihood(),
        epsilon = 1e-10
    );
}

#[test]
fn test_binomial_two_by_two_table() {
    let model = glm("y ~ x", &two_by_two(), Family::Binomial).unwrap();

    let coeffs = model.coefficients();
    assert_abs_diff_eq!(coeffs[0], (1.0_f64 / 3.0).ln(), epsilon = 1e-8);
    assert_abs_diff_eq!(coeffs[1], 9.0_f64.ln(), epsilon = 1e-8);

    // Woolf standard errors of the cell counts
    let se = model.standard_errors();
    assert_abs_diff_eq!(se[0], (4.0_f64 / 3.0).sqrt(), epsilon = 1e-6);
    assert_abs_diff_eq!(se[1], (8.0_f64 / 3.0).sqrt(), epsilon = 1e-6);

    let fitted = model.fitted_values();
    assert_abs_diff_eq!(fitted[0], 0.25, epsilon = 1e-8);
    assert_abs_diff_eq!(fitted[7], 0.75, epsilon = 1e-8);
    assert_abs_diff_eq!(model.residuals()[0], 0.75, epsilon = 1e-8);
    assert_eq!(model.scale(), 1.0);
    assert!(model.iterations() > 0);

    let gof = goodness_of_fit(&model);
    let deviance = gof.deviance.unwrap();
    assert_abs_diff_eq!(deviance, -2.0 * model.log_likelihood(), epsilon = 1e-8);
    assert!(gof.null_deviance.unwrap() > deviance);
    assert!(gof.pseudo_r_squared.unwrap() > 0.0);
}

#[test]
fn test_binomial_two_level_factor_response() {
    let labels = ["yes", "no", "no", "no", "yes", "yes", "yes", "no"];
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]))
        .unwrap()
        .with_column("y", Series::categorical(&labels))
        .unwrap()
        .build()
        .unwrap();

    // "no" < "yes", so "yes" is the modeled outcome
    let model = glm("y ~ x", &df, Family::Binomial).unwrap();
    assert_abs_diff_eq!(model.coefficients()[1], 9.0_f64.ln(), epsilon = 1e-8);
    assert_eq!(
        model.outcome_levels().unwrap(),
        &["no".to_string(), "yes".to_string()]
    );
}

#[test]
fn test_binomial_rejects_out_of_range_response() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0]))
        .unwrap()
        .with_column("y", Series::float(vec![0.0, 1.0, 2.0, 1.0]))
        .unwrap()
        .build()
        .unwrap();

    assert!(matches!(
        glm("y ~ x", &df, Family::Binomial),
        Err(ModelError::InvalidConfig { .. })
    ));
}

#[test]
fn test_binomial_rejects_three_level_factor() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
        .unwrap()
        .with_column("y", Series::categorical(&["a", "b", "c", "a", "b"]))
        .unwrap()
        .build()
        .unwrap();

    assert!(matches!(
        glm("y ~ x", &df, Family::Binomial),
        Err(ModelError::InvalidConfig { .. })
    ));
}

#[test]
fn test_complete_separation_fails() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
        .unwrap()
        .with_column("y", Series::float(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]))
        .unwrap()
        .build()
        .unwrap();

    let result = Regression::new("y ~ x")
        .unwrap()
        .family(Family::Binomial)
        .options(FitOptions {
            max_iterations: 25,
            ..FitOptions::default()
        })
        .fit(&df);

    match result {
        Err(ModelError::NotConverged { max_iter, .. }) => assert_eq!(max_iter, 25),
        Err(ModelError::NumericalError { .. }) => {}
        other => panic!("expected a convergence failure, got {:?}", other),
    }
}

// ==================== Poisson ====================

#[test]
fn test_poisson_group_means() {
    let model = glm("y ~ x", &counts(), Family::Poisson).unwrap();

    let coeffs = model.coefficients();
    assert_abs_diff_eq!(coeffs[0], 2.0_f64.ln(), epsilon = 1e-8);
    assert_abs_diff_eq!(coeffs[1], 2.5_f64.ln(), epsilon = 1e-8);

    // Var(log rate ratio) = 1 / 8 + 1 / 20
    assert_abs_diff_eq!(model.standard_errors()[1], 0.175_f64.sqrt(), epsilon = 1e-6);
    assert_abs_diff_eq!(model.fitted_values()[4], 5.0, epsilon = 1e-8);
    assert!(model.deviance().unwrap() >= 0.0);
}

#[test]
fn test_poisson_rejects_negative_counts() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0]))
        .unwrap()
        .with_column("y", Series::float(vec![1.0, -1.0, 2.0]))
        .unwrap()
        .build()
        .unwrap();

    assert!(glm("y ~ x", &df, Family::Poisson).is_err());
}

#[test]
fn test_irls_with_exposure_offset() {
    let x = Array2::ones((3, 1));
    let y = array![2.0, 3.0, 5.0];
    let exposure = array![1.0_f64, 2.0, 3.0];
    let offset = exposure.mapv(f64::ln);

    let fit = fit_irls(
        &x,
        &y,
        Some(&offset),
        GlmFamily::Poisson,
        &FitOptions::default(),
    )
    .unwrap();

    // rate = total count / total exposure
    assert_abs_diff_eq!(fit.coefficients[0].exp(), 10.0 / 6.0, epsilon = 1e-8);
    assert_abs_diff_eq!(fit.fitted_values.sum(), 10.0, epsilon = 1e-8);
}

// ==================== Gaussian ====================

#[test]
fn test_gaussian_matches_linear_regression() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
        .unwrap()
        .with_column("y", Series::float(vec![2.0, 4.0, 5.0, 4.0, 5.0]))
        .unwrap()
        .build()
        .unwrap();

    let gaussian = glm("y ~ x", &df, Family::Gaussian).unwrap();
    let linear = lm("y ~ x", &df).unwrap();

    assert_abs_diff_eq!(gaussian.coefficients(), linear.coefficients(), epsilon = 1e-8);
    assert_abs_diff_eq!(gaussian.scale(), linear.scale(), epsilon = 1e-8);
    assert_abs_diff_eq!(
        gaussian.standard_errors(),
        linear.standard_errors(),
        epsilon = 1e-8
    );
    assert_abs_diff_eq!(gaussian.log_likelihood(), linear.log_likelihood(), epsilon = 1e-8);
}

#[test]
fn test_glm_rejects_survival_response() {
    let df = DataFrameBuilder::new()
        .with_column("t", Series::float(vec![1.0, 2.0, 3.0, 4.0]))
        .unwrap()
        .with_column("e", Series::int(vec![1, 0, 1, 1]))
        .unwrap()
        .with_column("x", Series::float(vec![0.0, 1.0, 0.0, 1.0]))
        .unwrap()
        .build()
        .unwrap();

    assert!(matches!(
        glm("Surv(t, e) ~ x", &df, Family::Poisson),
        Err(ModelError::InvalidConfig { .. })
    ));
}
