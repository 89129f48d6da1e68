//! Goodness-of-fit statistics

use crate::base::{FittedModel, GoodnessOfFit, ModelType};
use crate::inference;

/// Goodness-of-fit statistics of a fitted model
///
/// `k` in AIC and BIC is the number of estimated coefficients.
pub fn goodness_of_fit(model: &FittedModel) -> GoodnessOfFit {
    let n = model.n_obs();
    let k = model.n_params();
    let ll = model.log_likelihood();
    let ll0 = model.null_log_likelihood();
    let df_model = model.df_model();
    let df_residual = model.df_residual();

    let mut gof = GoodnessOfFit {
        n_obs: n,
        n_params: k,
        log_likelihood: ll,
        null_log_likelihood: ll0,
        aic: 2.0 * k as f64 - 2.0 * ll,
        bic: k as f64 * (n as f64).ln() - 2.0 * ll,
        deviance: model.deviance(),
        null_deviance: model.null_deviance(),
        df_residual,
        df_model,
        iterations: model.iterations(),
        ..GoodnessOfFit::default()
    };

    if df_model > 0 {
        let lr = 2.0 * (ll - ll0);
        gof.lr_chi_squared = Some(lr);
        gof.lr_p_value = Some(inference::pvalue_chi_squared(lr, df_model as f64));
    }

    if model.model_type() == ModelType::Linear {
        linear_statistics(model, &mut gof);
    } else if ll0 != 0.0 {
        gof.pseudo_r_squared = Some(1.0 - ll / ll0);
    }

    gof
}

fn linear_statistics(model: &FittedModel, gof: &mut GoodnessOfFit) {
    let (Some(rss), Some(tss)) = (model.deviance(), model.null_deviance()) else {
        return;
    };

    let n = gof.n_obs as f64;
    let p = gof.df_model as f64;
    let df_residual = gof.df_residual as f64;

    let r_squared = 1.0 - rss / tss;
    gof.r_squared = Some(r_squared);
    gof.adj_r_squared = Some(if n - p - 1.0 > 0.0 {
        1.0 - (1.0 - r_squared) * (n - 1.0) / (n - p - 1.0)
    } else {
        f64::NAN
    });
    gof.residual_std_error = Some(model.scale().sqrt());

    if gof.df_model > 0 && gof.df_residual > 0 {
        let f = ((tss - rss) / p) / (rss / df_residual);
        gof.f_statistic = Some(f);
        gof.f_p_value = Some(inference::pvalue_f(f, p, df_residual));
    }
}
