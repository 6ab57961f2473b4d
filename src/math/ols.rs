//! Ordinary least squares via an SVD pseudo-inverse.
//!
//! The search fits thousands of small sub-designs, many of them rank deficient
//! (duplicated or collinear candidate features are common in feature-engineered
//! datasets). We therefore never invert `XᵀX`; instead we factor `X = U Σ Vᵀ`
//! and apply
//!
//! ```text
//! β = V Σ⁺ Uᵀ y,   Σ⁺_ii = 1/σ_i if σ_i > SINGULAR_FLOOR else 0
//! ```
//!
//! which is the minimum-norm least-squares solution. Dropping tiny singular
//! values keeps rank-deficient fits finite instead of surfacing an error.

use nalgebra::{DMatrix, DVector};

/// Singular values at or below this are treated as zero.
pub const SINGULAR_FLOOR: f64 = 1e-6;

/// Solve a least squares problem using SVD.
///
/// Returns `None` only if the solution contains non-finite values (NaN/inf
/// inputs); rank deficiency is absorbed by the singular-value floor.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    // The SVD iteration is unbounded; never hand it NaN/inf.
    if !(x.iter().all(|v| v.is_finite()) && y.iter().all(|v| v.is_finite())) {
        return None;
    }
    let svd = x.clone().svd(true, true);
    let beta = svd.solve(y, SINGULAR_FLOOR).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

/// `X β`.
pub fn predict(x: &DMatrix<f64>, coeff: &DVector<f64>) -> DVector<f64> {
    x * coeff
}

/// Residual sum of squares of `coeff` on `(x, y)`.
///
/// # Panics
/// Panics if the row count of `x` differs from `y.len()`.
pub fn rss(x: &DMatrix<f64>, coeff: &DVector<f64>, y: &DVector<f64>) -> f64 {
    assert_eq!(x.nrows(), y.len(), "rss: inconsistent number of data points");
    (y - predict(x, coeff)).norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
        assert!(rss(&x, &beta, &y) < 1e-20);
    }

    #[test]
    fn rank_deficient_design_gives_minimum_norm_solution() {
        // Two identical columns: any split b0 + b1 = 2 fits exactly; the
        // pseudo-inverse picks the minimum-norm split b0 = b1 = 1.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 4.0, 6.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-10);
        assert!((beta[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn rss_of_overdetermined_fit() {
        // Intercept-only fit of [1, 2, 3, 6]: mean 3, residuals -2,-1,0,3.
        let x = DMatrix::from_element(4, 1, 1.0);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0, 6.0]);
        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-12);
        assert!((rss(&x, &beta, &y) - 14.0).abs() < 1e-10);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
