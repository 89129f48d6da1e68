//! Coefficient tables

use super::profile::profile_intervals;
use super::{IntervalMethod, ReportOptions};
use crate::base::{Coefficient, FittedModel, ModelError, ModelType, Result};
use crate::inference;

/// Coefficient table with Wald or profile-likelihood intervals
///
/// Linear and Gaussian fits are tested against Student-t with the residual
/// degrees of freedom, every other family against the standard normal.
pub fn coefficient_table(model: &FittedModel, options: &ReportOptions) -> Result<Vec<Coefficient>> {
    options.validate()?;

    let model_type = model.model_type();
    if options.exponentiate && !model_type.supports_exponentiation() {
        return Err(ModelError::config(format!(
            "exponentiated coefficients are not defined for {}",
            model_type
        )));
    }

    let uses_t = matches!(model_type, ModelType::Linear | ModelType::Gaussian);
    let df = model.df_residual() as f64;
    let critical = if uses_t {
        inference::t_critical(options.confidence_level, df)
    } else {
        inference::z_critical(options.confidence_level)
    };

    let std_errors = model.standard_errors();
    let intervals: Vec<(f64, f64)> = match options.interval {
        IntervalMethod::Wald => model
            .coefficients()
            .iter()
            .zip(&std_errors)
            .map(|(&b, &se)| (b - critical * se, b + critical * se))
            .collect(),
        IntervalMethod::Profile => profile_intervals(model, options.confidence_level)?,
    };

    let table = model
        .coefficient_names()
        .iter()
        .zip(model.coefficients())
        .zip(&std_errors)
        .zip(intervals)
        .map(|(((name, &estimate), &se), (lower, upper))| {
            let statistic = estimate / se;
            let mut coefficient = Coefficient::new(name.clone(), estimate)
                .with_std_error(se)
                .with_statistic(statistic)
                .with_ci(lower, upper);

            coefficient = if uses_t {
                coefficient
                    .with_p_value(inference::pvalue_t(statistic, df))
                    .with_df(df)
            } else {
                coefficient.with_p_value(inference::pvalue_z(statistic))
            };
            if name.starts_with("(Intercept)") {
                coefficient = coefficient.as_intercept();
            }
            if options.exponentiate {
                coefficient = coefficient.exponentiate();
            }
            coefficient
        })
        .collect();

    Ok(table)
}
