//! ndarray <-> nalgebra conversions and the dense solves the fitters share
//!
//! Storage is `ndarray` throughout the crate; decompositions (QR, Cholesky,
//! SVD) go through `nalgebra`.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::base::Result;
use crate::error::ModelError;

/// Singular values at or below this fraction of the largest count as zero
const RANK_TOLERANCE: f64 = 1e-10;

pub(crate) fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

pub(crate) fn to_dvector(v: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(v.len(), v.iter().copied())
}

pub(crate) fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}

pub(crate) fn to_array1(v: &DVector<f64>) -> Array1<f64> {
    v.iter().copied().collect()
}

/// Numerical column rank from the singular values of `x`
pub(crate) fn rank(x: &Array2<f64>) -> usize {
    if x.ncols() == 0 || x.nrows() == 0 {
        return 0;
    }

    let singular = to_dmatrix(x).singular_values();
    let largest = singular.iter().copied().fold(0.0_f64, f64::max);
    if largest == 0.0 || !largest.is_finite() {
        return 0;
    }

    singular
        .iter()
        .filter(|&&s| s > largest * RANK_TOLERANCE)
        .count()
}

/// Fail with `SingularMatrix` unless `x` has full column rank
pub(crate) fn ensure_full_rank(x: &Array2<f64>) -> Result<()> {
    let columns = x.ncols();
    if columns == 0 {
        return Ok(());
    }

    let rank = rank(x);
    if rank < columns {
        return Err(ModelError::SingularMatrix { rank, columns });
    }
    Ok(())
}

/// Inverse of a symmetric positive-definite matrix
///
/// Cholesky first, falling back to a general inverse.
pub(crate) fn invert_spd(a: &Array2<f64>, operation: &str) -> Result<Array2<f64>> {
    let m = to_dmatrix(a);
    let n = m.nrows();

    if let Some(chol) = m.clone().cholesky() {
        return Ok(to_array2(&chol.solve(&DMatrix::identity(n, n))));
    }

    m.try_inverse()
        .map(|inv| to_array2(&inv))
        .ok_or_else(|| ModelError::numerical("matrix is not invertible", operation))
}

/// Solve `a x = b` for symmetric positive-definite `a`
pub(crate) fn solve_spd(a: &Array2<f64>, b: &Array1<f64>, operation: &str) -> Result<Array1<f64>> {
    let m = to_dmatrix(a);
    let rhs = to_dvector(b);

    if let Some(chol) = m.clone().cholesky() {
        return Ok(to_array1(&chol.solve(&rhs)));
    }

    m.lu()
        .solve(&rhs)
        .map(|x| to_array1(&x))
        .ok_or_else(|| ModelError::numerical("linear system is singular", operation))
}

/// Quadratic form `d' V^+ d` through the SVD pseudo-inverse of `v`
///
/// Returns the form and the numerical rank of `v`; a zero matrix gives `(0, 0)`.
pub(crate) fn generalized_quadratic_form(
    v: &Array2<f64>,
    d: &Array1<f64>,
    operation: &str,
) -> Result<(f64, usize)> {
    if v.nrows() == 0 {
        return Ok((0.0, 0));
    }

    let svd = to_dmatrix(v).svd(true, true);
    let largest = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    if !largest.is_finite() {
        return Err(ModelError::numerical("matrix has non-finite entries", operation));
    }
    if largest == 0.0 {
        return Ok((0.0, 0));
    }

    let eps = largest * RANK_TOLERANCE;
    let rank = svd.rank(eps);
    let pinv = svd
        .pseudo_inverse(eps)
        .map_err(|message| ModelError::numerical(message, operation))?;

    let d = to_dvector(d);
    Ok(((d.transpose() * pinv * &d)[(0, 0)], rank))
}

/// Weighted least squares: minimise `sum w_i (z_i - x_i'b)^2`
///
/// Returns the coefficients and `(X'WX)^-1`.
pub(crate) fn weighted_least_squares(
    x: &Array2<f64>,
    z: &Array1<f64>,
    w: &Array1<f64>,
) -> Result<(Array1<f64>, Array2<f64>)> {
    // rows scaled by sqrt(w) so that X_w'X_w = X'WX
    let sqrt_w = w.mapv(f64::sqrt);
    let x_weighted = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[[i, j]] * sqrt_w[i]);
    let z_weighted = DVector::from_iterator(z.len(), z.iter().zip(&sqrt_w).map(|(zi, s)| zi * s));

    let xtwx = x_weighted.transpose() * &x_weighted;
    let xtwz = x_weighted.transpose() * z_weighted;

    let xtwx = to_array2(&xtwx);
    let coefficients = solve_spd(&xtwx, &to_array1(&xtwz), "weighted_least_squares")?;
    let inverse = invert_spd(&xtwx, "weighted_least_squares")?;

    Ok((coefficients, inverse))
}

/// Least squares by Householder QR
///
/// Returns the coefficients and `(X'X)^-1 = R^-1 R^-T`.
pub(crate) fn qr_least_squares(
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<(Array1<f64>, Array2<f64>)> {
    let qr = to_dmatrix(x).qr();
    let q = qr.q();
    let r = qr.r();

    let qty = q.transpose() * to_dvector(y);
    let coefficients = r
        .solve_upper_triangular(&qty)
        .ok_or_else(|| ModelError::numerical("R factor is singular", "qr_least_squares"))?;

    let p = r.ncols();
    let r_inv = r
        .solve_upper_triangular(&DMatrix::identity(p, p))
        .ok_or_else(|| ModelError::numerical("R factor is singular", "qr_least_squares"))?;
    let xtx_inv = &r_inv * r_inv.transpose();

    Ok((to_array1(&coefficients), to_array2(&xtx_inv)))
}
