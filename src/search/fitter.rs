//! Fitting a single feature subset.
//!
//! Given a design matrix, a target and a model mask, extract the selected
//! columns, solve the least-squares problem and report the coefficients and
//! the residual sum of squares.

use nalgebra::DVector;

use crate::domain::{submatrix, DesignMatrix};
use crate::math::{rss, solve_least_squares, Criterion};
use crate::models::Model;

/// Least-squares fit of one subset.
#[derive(Debug, Clone)]
pub struct SubsetFit {
    pub coeff: Vec<f64>,
    pub rss: f64,
}

/// Fit the columns selected by `model`.
///
/// The empty model predicts zero everywhere, so its RSS is `Σ y²`. Returns
/// `None` if the data contains non-finite values.
pub fn fit_subset<X: DesignMatrix + ?Sized>(x: &X, y: &DVector<f64>, model: &Model) -> Option<SubsetFit> {
    if model.num_features() == 0 {
        return Some(SubsetFit {
            coeff: Vec::new(),
            rss: y.norm_squared(),
        });
    }

    let design = submatrix(x, model);
    let beta = solve_least_squares(&design, y)?;
    let rss = rss(&design, &beta, y);
    rss.is_finite().then(|| SubsetFit {
        coeff: beta.iter().copied().collect(),
        rss,
    })
}

/// Fit `model` and return `(coeff, -criterion)`, the score used by the search.
///
/// `None` when the fit fails or the model is empty.
pub fn score_subset<X: DesignMatrix + ?Sized>(
    x: &X,
    y: &DVector<f64>,
    model: &Model,
    criterion: Criterion,
) -> Option<(Vec<f64>, f64)> {
    let k = model.num_features();
    if k == 0 {
        return None;
    }
    let fit = fit_subset(x, y, model)?;
    Some((fit.coeff, -criterion.eval(k, y.len(), fit.rss)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn empty_model_rss_is_sum_of_squares() {
        let x = DMatrix::from_element(3, 2, 1.0);
        let y = DVector::from_row_slice(&[1.0, 2.0, 2.0]);
        let fit = fit_subset(&x, &y, &Model::empty(2)).unwrap();
        assert!(fit.coeff.is_empty());
        assert!((fit.rss - 9.0).abs() < 1e-12);
        assert!(score_subset(&x, &y, &Model::empty(2), Criterion::Aicc).is_none());
    }

    #[test]
    fn subset_fit_uses_selected_columns_only() {
        // y = 2 * x1 exactly; column 0 is noise.
        let x = DMatrix::from_row_slice(4, 2, &[5.0, 1.0, -1.0, 2.0, 3.0, 3.0, 0.5, 4.0]);
        let y = DVector::from_row_slice(&[2.0, 4.0, 6.0, 8.0]);
        let fit = fit_subset(&x, &y, &Model::from_bools(&[false, true])).unwrap();
        assert_eq!(fit.coeff.len(), 1);
        assert!((fit.coeff[0] - 2.0).abs() < 1e-10);
        assert!(fit.rss < 1e-18);

        let (coeff, score) = score_subset(&x, &y, &Model::from_bools(&[false, true]), Criterion::Aicc).unwrap();
        assert_eq!(coeff.len(), 1);
        assert!((score + crate::math::aicc(1, 4, fit.rss)).abs() < 1e-12);
    }
}
