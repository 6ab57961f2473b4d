//! Design-matrix capability consumed by the search.
//!
//! The search only ever reads columns and single entries, so anything that can
//! produce a column on demand can act as a design matrix. Two implementations
//! ship with the crate:
//!
//! - `nalgebra::DMatrix<f64>`: a dense, materialised matrix
//! - [`PowerMatrix`]: a dense base matrix plus lazily evaluated polynomial
//!   and cross-term columns

use std::borrow::Cow;

use nalgebra::DMatrix;

use crate::models::Model;

/// Read-only access to a design matrix.
///
/// Implementations must be shareable across the search worker threads.
pub trait DesignMatrix: Sync {
    /// `(rows, cols)`.
    fn dims(&self) -> (usize, usize);

    /// All rows of column `col`.
    fn column_view(&self, col: usize) -> Cow<'_, [f64]>;

    fn at(&self, row: usize, col: usize) -> f64;

    fn nrows(&self) -> usize {
        self.dims().0
    }

    fn ncols(&self) -> usize {
        self.dims().1
    }
}

impl DesignMatrix for DMatrix<f64> {
    fn dims(&self) -> (usize, usize) {
        self.shape()
    }

    fn column_view(&self, col: usize) -> Cow<'_, [f64]> {
        // Column-major storage: column `col` is one contiguous run.
        let rows = self.nrows();
        Cow::Borrowed(&self.as_slice()[col * rows..(col + 1) * rows])
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }
}

/// Dense sub-design holding only the columns selected by `model`, in column order.
///
/// # Panics
/// Panics if `model.len()` differs from the column count of `x`.
pub fn submatrix<X: DesignMatrix + ?Sized>(x: &X, model: &Model) -> DMatrix<f64> {
    let (rows, cols) = x.dims();
    assert_eq!(model.len(), cols, "model length must match design columns");

    let selected = model.selected();
    let mut out = DMatrix::<f64>::zeros(rows, selected.len());
    for (j, &col) in selected.iter().enumerate() {
        let values = x.column_view(col);
        out.column_mut(j).copy_from_slice(&values);
    }
    out
}

/// A base matrix extended with products of its columns.
///
/// Extra column `c` holds, for every row, `Π_j x[row, j]^p_j` for a fixed
/// exponent set `{j: p_j}`. [`PowerMatrix::new`] adds every exponent set whose
/// total degree lies in `2..=max_power`, so `max_power < 2` leaves the base
/// matrix unchanged. Extra columns are never materialised; they are computed
/// when the search asks for them.
#[derive(Debug, Clone)]
pub struct PowerMatrix {
    base: DMatrix<f64>,
    powers: Vec<Vec<(usize, u32)>>,
}

impl PowerMatrix {
    pub fn new(base: DMatrix<f64>, max_power: u32) -> Self {
        let cols: Vec<usize> = (0..base.ncols()).collect();
        let mut out = Self {
            base,
            powers: Vec::new(),
        };
        out.add_power_sequence(&cols, max_power);
        out
    }

    /// Add a single extra column given as `(base column, exponent)` pairs.
    pub fn add_power(&mut self, power: Vec<(usize, u32)>) {
        self.powers.push(power);
    }

    /// Add every product of `cols` with total degree in `2..=max_power`.
    ///
    /// Only exponent sets within the degree budget are visited, so the cost is
    /// proportional to the number of columns added.
    pub fn add_power_sequence(&mut self, cols: &[usize], max_power: u32) {
        if max_power < 2 || cols.is_empty() {
            return;
        }
        let mut term = Vec::with_capacity(max_power as usize);
        self.add_terms(cols, max_power, 0, &mut term);
    }

    /// Extend `term` with exponents for `cols`, spending at most `budget` more degree.
    fn add_terms(&mut self, cols: &[usize], budget: u32, degree: u32, term: &mut Vec<(usize, u32)>) {
        let Some((&col, rest)) = cols.split_first().filter(|_| budget > 0) else {
            if degree >= 2 {
                self.add_power(term.clone());
            }
            return;
        };
        self.add_terms(rest, budget, degree, term);
        for p in 1..=budget {
            term.push((col, p));
            self.add_terms(rest, budget - p, degree + p, term);
            term.pop();
        }
    }

    /// Human-readable label for column `col`, using `names` for base columns.
    pub fn column_label(&self, col: usize, names: &[String]) -> String {
        let base_name = |j: usize| names.get(j).cloned().unwrap_or_else(|| format!("x{j}"));
        if col < self.base.ncols() {
            return base_name(col);
        }
        self.powers[col - self.base.ncols()]
            .iter()
            .map(|&(j, p)| if p == 1 { base_name(j) } else { format!("{}^{p}", base_name(j)) })
            .collect::<Vec<_>>()
            .join("*")
    }

    /// Materialise every column.
    pub fn full_matrix(&self) -> DMatrix<f64> {
        let (rows, cols) = self.dims();
        let mut out = DMatrix::<f64>::zeros(rows, cols);
        for c in 0..cols {
            out.column_mut(c).copy_from_slice(&self.column_view(c));
        }
        out
    }

    fn extra_entry(&self, row: usize, extra: usize) -> f64 {
        self.powers[extra]
            .iter()
            .map(|&(j, p)| self.base[(row, j)].powi(p as i32))
            .product()
    }
}

impl DesignMatrix for PowerMatrix {
    fn dims(&self) -> (usize, usize) {
        (self.base.nrows(), self.base.ncols() + self.powers.len())
    }

    fn column_view(&self, col: usize) -> Cow<'_, [f64]> {
        let base_cols = self.base.ncols();
        if col < base_cols {
            return DesignMatrix::column_view(&self.base, col);
        }
        let extra = col - base_cols;
        Cow::Owned((0..self.base.nrows()).map(|row| self.extra_entry(row, extra)).collect())
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        let base_cols = self.base.ncols();
        if col < base_cols {
            self.base[(row, col)]
        } else {
            self.extra_entry(row, col - base_cols)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
    }

    #[test]
    fn dense_column_view_is_contiguous_column() {
        let x = base();
        assert_eq!(DesignMatrix::dims(&x), (3, 2));
        assert_eq!(&*DesignMatrix::column_view(&x, 1), &[2.0, 4.0, 6.0]);
        assert_eq!(DesignMatrix::at(&x, 2, 0), 5.0);
    }

    #[test]
    fn submatrix_keeps_selected_columns_in_order() {
        let x = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let model = Model::from_bools(&[true, false, true]);
        let sub = submatrix(&x, &model);
        assert_eq!(sub, DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 4.0, 6.0]));
    }

    #[test]
    fn power_matrix_max_power_one_is_base() {
        let pm = PowerMatrix::new(base(), 1);
        assert_eq!(pm.dims(), (3, 2));
        assert_eq!(pm.full_matrix(), base());
    }

    #[test]
    fn power_matrix_adds_squares_and_cross_terms() {
        // Degree-2 terms of two columns: x0^2, x0*x1, x1^2.
        let pm = PowerMatrix::new(base(), 2);
        assert_eq!(pm.dims(), (3, 5));

        let names = vec!["a".to_string(), "b".to_string()];
        let mut labels: Vec<String> = (2..5).map(|c| pm.column_label(c, &names)).collect();
        labels.sort();
        assert_eq!(labels, vec!["a*b", "a^2", "b^2"]);

        for c in 2..5 {
            let col = pm.column_view(c);
            for row in 0..3 {
                assert_eq!(col[row], pm.at(row, c));
            }
        }
        let ab = (2..5).find(|&c| pm.column_label(c, &names) == "a*b").unwrap();
        assert_eq!(&*pm.column_view(ab), &[2.0, 12.0, 30.0]);
    }

    #[test]
    fn power_matrix_degree_three_count() {
        // Monomials of degree 2..=3 in 3 variables: 6 + 10.
        let x = DMatrix::from_element(4, 3, 1.5);
        let pm = PowerMatrix::new(x, 3);
        assert_eq!(pm.ncols(), 3 + 16);
    }

    #[test]
    fn power_matrix_scales_with_added_columns() {
        // 30 squares + 435 pairs; visiting all 3^30 exponent vectors would not finish.
        let x = DMatrix::from_fn(2, 30, |r, c| (r + c) as f64);
        let pm = PowerMatrix::new(x, 2);
        assert_eq!(pm.ncols(), 30 + 465);
        assert!(pm.powers.iter().all(|p| p.iter().map(|&(_, e)| e).sum::<u32>() == 2));
    }
}
