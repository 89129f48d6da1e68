//! Tests for linear regression
//!
//! Exact-data recovery, a hand-computed textbook fit, noisy data with a
//! seeded generator, and the error paths of the OLS fitter.

use approx::assert_abs_diff_eq;
use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::base::{Family, FitOptions, ModelError};
use crate::lm::lm;
use crate::report::goodness_of_fit;
use crate::{fit, Regression};
use tr_core::data::{DataFrame, DataFrameBuilder, Series};
use tr_core::formula::DesignMatrix;

// ==================== Test Fixtures ====================

/// Simple linear relationship: y = 2x + 1
fn simple_linear_data() -> DataFrame {
    DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
        .unwrap()
        .with_column("y", Series::float(vec![3.0, 5.0, 7.0, 9.0, 11.0]))
        .unwrap()
        .build()
        .unwrap()
}

/// Multiple regression: y = 1 + 2x1 + 3x2
fn multiple_regression_data() -> DataFrame {
    let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let x2 = vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
    let y = x1.iter().zip(&x2).map(|(a, b)| 1.0 + 2.0 * a + 3.0 * b).collect::<Vec<_>>();

    DataFrameBuilder::new()
        .with_column("x1", Series::float(x1))
        .unwrap()
        .with_column("x2", Series::float(x2))
        .unwrap()
        .with_column("y", Series::float(y))
        .unwrap()
        .build()
        .unwrap()
}

/// Small dataset with a known least-squares solution: b = (2.2, 0.6), RSS = 2.4
fn textbook_data() -> DataFrame {
    DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
        .unwrap()
        .with_column("y", Series::float(vec![2.0, 4.0, 5.0, 4.0, 5.0]))
        .unwrap()
        .build()
        .unwrap()
}

/// Realistic dataset with noise: y = 1 + 2x1 - 0.5x2 + e
fn noisy_data() -> DataFrame {
    let n = 200;
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.5).unwrap();

    let mut x1 = Vec::with_capacity(n);
    let mut x2 = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let a = i as f64 * 0.05;
        let b = (i as f64).sin() * 3.0;
        x1.push(a);
        x2.push(b);
        y.push(1.0 + 2.0 * a - 0.5 * b + noise.sample(&mut rng));
    }

    DataFrameBuilder::new()
        .with_column("x1", Series::float(x1))
        .unwrap()
        .with_column("x2", Series::float(x2))
        .unwrap()
        .with_column("y", Series::float(y))
        .unwrap()
        .build()
        .unwrap()
}

// ==================== Basic Tests ====================

#[test]
fn test_linear_regression_basic_fit() {
    let model = lm("y ~ x", &simple_linear_data()).unwrap();

    let coeffs = model.coefficients();
    assert_eq!(coeffs.len(), 2);
    assert_abs_diff_eq!(coeffs[0], 1.0, epsilon = 1e-10);
    assert_abs_diff_eq!(coeffs[1], 2.0, epsilon = 1e-10);

    let expected = array![3.0, 5.0, 7.0, 9.0, 11.0];
    assert_abs_diff_eq!(model.fitted_values(), &expected, epsilon = 1e-10);
    assert_abs_diff_eq!(model.residuals().sum(), 0.0, epsilon = 1e-10);

    let gof = goodness_of_fit(&model);
    assert_abs_diff_eq!(gof.r_squared.unwrap(), 1.0, epsilon = 1e-10);
    assert_eq!(model.iterations(), 0);
    assert_eq!(model.coefficient_names(), &["(Intercept)", "x"]);
}

#[test]
fn test_linear_regression_no_intercept() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
        .unwrap()
        .with_column("y", Series::float(vec![2.0, 4.0, 6.0, 8.0, 10.0]))
        .unwrap()
        .build()
        .unwrap();

    let model = lm("y ~ 0 + x", &df).unwrap();

    assert_eq!(model.coefficients().len(), 1);
    assert!(!model.has_intercept());
    assert_abs_diff_eq!(model.coefficients()[0], 2.0, epsilon = 1e-10);
    assert_eq!(model.df_model(), 1);
}

#[test]
fn test_linear_regression_multiple_predictors() {
    let model = lm("y ~ x1 + x2", &multiple_regression_data()).unwrap();

    let coeffs = model.coefficients();
    assert_eq!(coeffs.len(), 3);
    assert_abs_diff_eq!(coeffs[0], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(coeffs[1], 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(coeffs[2], 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        goodness_of_fit(&model).r_squared.unwrap(),
        1.0,
        epsilon = 1e-10
    );
}

#[test]
fn test_textbook_fit() {
    let model = lm("y ~ x", &textbook_data()).unwrap();

    assert_abs_diff_eq!(model.coefficients()[0], 2.2, epsilon = 1e-10);
    assert_abs_diff_eq!(model.coefficients()[1], 0.6, epsilon = 1e-10);

    // sigma^2 = RSS / (n - p) = 2.4 / 3
    assert_abs_diff_eq!(model.scale(), 0.8, epsilon = 1e-10);
    assert_eq!(model.df_residual(), 3);
    assert_eq!(model.df_model(), 1);

    // Var(slope) = sigma^2 / Sxx
    let se = model.standard_errors();
    assert_abs_diff_eq!(se[1], (0.8_f64 / 10.0).sqrt(), epsilon = 1e-10);

    let expected = array![-0.8, 0.6, 1.0, -0.6, -0.2];
    assert_abs_diff_eq!(model.residuals(), &expected, epsilon = 1e-10);

    // ML variance RSS / n = 0.48
    let ll = -2.5 * ((2.0 * std::f64::consts::PI * 0.48).ln() + 1.0);
    assert_abs_diff_eq!(model.log_likelihood(), ll, epsilon = 1e-10);
    assert_abs_diff_eq!(model.deviance().unwrap(), 2.4, epsilon = 1e-10);
    assert_abs_diff_eq!(model.null_deviance().unwrap(), 6.0, epsilon = 1e-10);
}

#[test]
fn test_noisy_data_recovers_coefficients() {
    let model = Regression::new("y ~ x1 + x2")
        .unwrap()
        .fit(&noisy_data())
        .unwrap();

    let coeffs = model.coefficients();
    assert_abs_diff_eq!(coeffs[0], 1.0, epsilon = 0.3);
    assert_abs_diff_eq!(coeffs[1], 2.0, epsilon = 0.1);
    assert_abs_diff_eq!(coeffs[2], -0.5, epsilon = 0.1);

    assert!(model.standard_errors().iter().all(|&se| se > 0.0));
    assert_abs_diff_eq!(model.scale().sqrt(), 0.5, epsilon = 0.1);
}

#[test]
fn test_categorical_predictor() {
    let df = DataFrameBuilder::new()
        .with_column(
            "group",
            Series::categorical(&["A", "A", "B", "B", "C", "C"]),
        )
        .unwrap()
        .with_column("y", Series::float(vec![1.0, 3.0, 5.0, 7.0, 9.0, 11.0]))
        .unwrap()
        .build()
        .unwrap();

    let model = lm("y ~ group", &df).unwrap();
    assert_eq!(
        model.coefficient_names(),
        &["(Intercept)", "group[T.B]", "group[T.C]"]
    );
    // group means 2, 6, 10
    assert_abs_diff_eq!(model.coefficients(), &array![2.0, 4.0, 8.0], epsilon = 1e-10);

    let releveled = Regression::new("y ~ group")
        .unwrap()
        .baseline("group", "C")
        .fit(&df)
        .unwrap();
    assert_eq!(
        releveled.coefficient_names(),
        &["(Intercept)", "group[T.A]", "group[T.B]"]
    );
    assert_abs_diff_eq!(releveled.coefficients(), &array![10.0, -8.0, -4.0], epsilon = 1e-10);
}

#[test]
fn test_missing_rows_are_dropped() {
    let df = DataFrameBuilder::new()
        .with_column(
            "x",
            Series::float_with_missing(&[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)]),
        )
        .unwrap()
        .with_column("y", Series::float(vec![3.0, 5.0, 100.0, 9.0, 11.0]))
        .unwrap()
        .build()
        .unwrap();

    let model = lm("y ~ x", &df).unwrap();
    assert_eq!(model.n_obs(), 4);
    assert_eq!(model.dropped_rows(), 1);
    assert_eq!(model.retained_rows(), &[0, 1, 3, 4]);
    assert_abs_diff_eq!(model.coefficients()[1], 2.0, epsilon = 1e-10);
}

// ==================== Error Tests ====================

#[test]
fn test_identical_columns_are_singular() {
    // x2 = x1 + 1 is collinear with the intercept and x1
    let df = DataFrameBuilder::new()
        .with_column("x1", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
        .unwrap()
        .with_column("x2", Series::float(vec![2.0, 3.0, 4.0, 5.0, 6.0]))
        .unwrap()
        .with_column("y", Series::float(vec![9.0, 13.0, 17.0, 21.0, 25.0]))
        .unwrap()
        .build()
        .unwrap();

    let result = lm("y ~ x1 + x2", &df);
    assert!(matches!(
        result,
        Err(ModelError::SingularMatrix {
            rank: 2,
            columns: 3
        })
    ));
}

#[test]
fn test_categorical_response_rejected() {
    let df = DataFrameBuilder::new()
        .with_column("x", Series::float(vec![1.0, 2.0, 3.0, 4.0]))
        .unwrap()
        .with_column("y", Series::categorical(&["a", "b", "a", "b"]))
        .unwrap()
        .build()
        .unwrap();

    assert!(matches!(
        lm("y ~ x", &df),
        Err(ModelError::InvalidConfig { .. })
    ));
}

#[test]
fn test_unknown_variable_is_formula_error() {
    assert!(matches!(
        lm("y ~ z", &simple_linear_data()),
        Err(ModelError::Formula(_))
    ));
}

#[test]
fn test_invalid_options_rejected() {
    let design = DesignMatrix::build(
        &simple_linear_data(),
        &tr_core::formula::Formula::parse("y ~ x").unwrap(),
    )
    .unwrap();
    let options = FitOptions {
        max_iterations: 0,
        ..FitOptions::default()
    };

    assert!(matches!(
        fit(&design, &Family::Linear, &options),
        Err(ModelError::InvalidConfig { .. })
    ));
}

// ==================== Property Tests ====================

mod proptest_tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn frame(rows: &[(f64, f64, f64)]) -> DataFrame {
        DataFrameBuilder::new()
            .with_column("x", Series::float(rows.iter().map(|r| r.0).collect::<Vec<_>>()))
            .unwrap()
            .with_column("z", Series::float(rows.iter().map(|r| r.1).collect::<Vec<_>>()))
            .unwrap()
            .with_column("y", Series::float(rows.iter().map(|r| r.2).collect::<Vec<_>>()))
            .unwrap()
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn test_linear_regression_r_squared_bounds(
            rows in vec((-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0), 5..40)
        ) {
            let model = lm("y ~ x", &frame(&rows));
            prop_assume!(model.is_ok());
            let model = model.unwrap();

            let r2 = goodness_of_fit(&model).r_squared.unwrap();
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&r2));
            prop_assert!(model.residuals().sum().abs() < 1e-6);
        }

        #[test]
        fn test_adding_predictor_never_lowers_r_squared(
            rows in vec((-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0), 6..40)
        ) {
            let df = frame(&rows);
            let small = lm("y ~ x", &df);
            let large = lm("y ~ x + z", &df);
            prop_assume!(small.is_ok() && large.is_ok());

            let r2_small = goodness_of_fit(&small.unwrap()).r_squared.unwrap();
            let r2_large = goodness_of_fit(&large.unwrap()).r_squared.unwrap();
            prop_assert!(r2_large >= r2_small - 1e-9);
        }
    }
}
