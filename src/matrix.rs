//! Dense row-major matrices of `f64`.
//!
//! `Matrix` is a small owned value: every operation that produces a matrix returns a new,
//! independently owned one, and inputs are never mutated as a side effect. Indexed access is
//! bounds-checked and reports [`Error::Index`] instead of touching memory it does not own.

use std::fmt;

use crate::matmul::{gemm_f64, transpose_into};
use crate::{Error, Result};

/// A dense `rows x cols` matrix stored row-major.
///
/// Invariant: `data.len() == rows * cols`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Allocate a zero-filled `rows x cols` matrix.
    ///
    /// Fails with [`Error::Allocation`] if `rows * cols` overflows or the buffer cannot be
    /// reserved.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = rows.checked_mul(cols).ok_or_else(|| {
            Error::Allocation(format!("{rows}x{cols} matrix size overflows usize"))
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            Error::Allocation(format!("cannot allocate {rows}x{cols} matrix: {e}"))
        })?;
        data.resize(len, 0.0);

        Ok(Self { data, rows, cols })
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::zeros(n, n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    /// Build a matrix from a row-major buffer.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or_else(|| Error::Allocation(format!("{rows}x{cols} matrix size overflows usize")))?;
        if values.len() != len {
            return Err(Error::DimensionMismatch(format!(
                "{} values cannot fill a {rows}x{cols} matrix",
                values.len()
            )));
        }
        Ok(Self {
            data: values.to_vec(),
            rows,
            cols,
        })
    }

    /// Build a matrix from per-row vectors. All rows must share one length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::DimensionMismatch(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
        }

        let mut m = Self::zeros(rows.len(), cols)?;
        for (dst, src) in m.data.chunks_exact_mut(cols.max(1)).zip(rows) {
            dst[..cols].copy_from_slice(src);
        }
        Ok(m)
    }

    /// Regression design matrix `(n, 2)`: column 0 all ones, column 1 the predictor values.
    pub fn design(xs: &[f64]) -> Result<Self> {
        let mut m = Self::zeros(xs.len(), 2)?;
        m.fill_column(0, 1.0)?;
        for (row, &x) in m.data.chunks_exact_mut(2).zip(xs) {
            row[1] = x;
        }
        Ok(m)
    }

    /// Column vector `(n, 1)` holding `values`.
    pub fn column(values: &[f64]) -> Result<Self> {
        Self::from_row_slice(values.len(), 1, values)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row-major view of the whole buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the matrix, returning its row-major buffer.
    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    fn check_index(&self, row: usize, col: usize) -> Result<usize> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(Error::Index {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Bounds-checked read.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let idx = self.check_index(row, col)?;
        Ok(self.data[idx])
    }

    /// Bounds-checked write. Out-of-range indices leave the matrix untouched.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let idx = self.check_index(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Borrow row `row`.
    pub fn row(&self, row: usize) -> Result<&[f64]> {
        if row >= self.rows {
            return Err(Error::Index {
                row,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let start = row * self.cols;
        Ok(&self.data[start..start + self.cols])
    }

    /// Set every entry of row `row` to `value`.
    pub fn fill_row(&mut self, row: usize, value: f64) -> Result<()> {
        if row >= self.rows {
            return Err(Error::Index {
                row,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let start = row * self.cols;
        self.data[start..start + self.cols].fill(value);
        Ok(())
    }

    /// Set every entry of column `col` to `value`.
    pub fn fill_column(&mut self, col: usize, value: f64) -> Result<()> {
        if col >= self.cols {
            return Err(Error::Index {
                row: 0,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        for row in self.data.chunks_exact_mut(self.cols) {
            row[col] = value;
        }
        Ok(())
    }

    /// New matrix with rows and columns swapped.
    pub fn transpose(&self) -> Result<Self> {
        let mut out = Self::zeros(self.cols, self.rows)?;
        transpose_into(self.rows, self.cols, &self.data, &mut out.data);
        Ok(out)
    }

    /// Matrix product `self * rhs`.
    ///
    /// Requires `self.cols() == rhs.rows()`, otherwise returns [`Error::DimensionMismatch`].
    pub fn multiply(&self, rhs: &Matrix) -> Result<Self> {
        if self.cols != rhs.rows {
            return Err(Error::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )));
        }

        let mut out = Self::zeros(self.rows, rhs.cols)?;
        if out.data.is_empty() {
            return Ok(out);
        }
        gemm_f64(
            self.rows,
            rhs.cols,
            self.cols,
            &self.data,
            self.cols,
            1,
            &rhs.data,
            rhs.cols,
            1,
            &mut out.data,
            rhs.cols,
            1,
        );
        Ok(out)
    }

    /// Inverse of a square matrix by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Works on a private `[self | I]` augmented copy; `self` is never modified. For each pivot
    /// column the row with the largest magnitude at or below the diagonal is swapped into place,
    /// normalized to a unit pivot, and eliminated from every other row. The right half of the
    /// augmented matrix then holds the inverse.
    ///
    /// Errors:
    /// - [`Error::NotSquare`] if `rows != cols`
    /// - [`Error::SingularMatrix`] if a pivot column is exactly zero at and below the diagonal
    pub fn square_inverse(&self) -> Result<Self> {
        if !self.is_square() {
            return Err(Error::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }

        let n = self.rows;
        let width = 2 * n;
        let mut aug = Self::zeros(n, width)?;
        for r in 0..n {
            let dst = &mut aug.data[r * width..(r + 1) * width];
            dst[..n].copy_from_slice(&self.data[r * n..(r + 1) * n]);
            dst[n + r] = 1.0;
        }

        for col in 0..n {
            let mut pivot_row = col;
            let mut pivot_abs = aug.data[col * width + col].abs();
            for r in (col + 1)..n {
                let v = aug.data[r * width + col].abs();
                if v > pivot_abs {
                    pivot_abs = v;
                    pivot_row = r;
                }
            }
            if pivot_abs == 0.0 {
                return Err(Error::SingularMatrix { column: col });
            }

            if pivot_row != col {
                aug.swap_rows(pivot_row, col);
            }

            let pivot = aug.data[col * width + col];
            for v in &mut aug.data[col * width..(col + 1) * width] {
                *v /= pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = aug.data[r * width + col];
                if factor == 0.0 {
                    continue;
                }
                let (pivot_vals, target) = aug.row_pair_mut(col, r);
                for (t, &p) in target.iter_mut().zip(pivot_vals) {
                    *t = (-factor).mul_add(p, *t);
                }
            }
        }

        let mut inv = Self::zeros(n, n)?;
        for r in 0..n {
            inv.data[r * n..(r + 1) * n].copy_from_slice(&aug.data[r * width + n..(r + 1) * width]);
        }
        Ok(inv)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        debug_assert!(a != b);
        let cols = self.cols;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * cols);
        head[lo * cols..(lo + 1) * cols].swap_with_slice(&mut tail[..cols]);
    }

    /// Borrow row `src` immutably and row `dst` mutably (`src != dst`).
    fn row_pair_mut(&mut self, src: usize, dst: usize) -> (&[f64], &mut [f64]) {
        debug_assert!(src != dst);
        let cols = self.cols;
        if src < dst {
            let (head, tail) = self.data.split_at_mut(dst * cols);
            (&head[src * cols..(src + 1) * cols], &mut tail[..cols])
        } else {
            let (head, tail) = self.data.split_at_mut(src * cols);
            (&tail[..cols], &mut head[dst * cols..(dst + 1) * cols])
        }
    }

    /// Largest absolute entry-wise difference against `other` (same shape required).
    pub fn max_abs_diff(&self, other: &Matrix) -> Result<f64> {
        if self.shape() != other.shape() {
            return Err(Error::DimensionMismatch(format!(
                "cannot compare {}x{} with {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            write!(f, "[")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:8.3}", self.data[r * self.cols + c])?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn random_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> Matrix {
        let values: Vec<f64> = (0..rows * cols).map(|_| rng.gen_range(-2.0..2.0)).collect();
        Matrix::from_row_slice(rows, cols, &values).unwrap()
    }

    #[test]
    fn zeros_has_requested_shape() {
        let m = Matrix::zeros(3, 4).unwrap();
        assert_eq!(m.shape(), (3, 4));
        assert_eq!(m.as_slice().len(), 12);
        assert!(m.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zeros_rejects_overflowing_size() {
        let err = Matrix::zeros(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, Error::Allocation(_)));
    }

    #[test]
    fn get_and_set_are_bounds_checked() {
        let mut m = Matrix::zeros(2, 2).unwrap();
        m.set(1, 0, 5.0).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), 5.0);

        let before = m.clone();
        assert!(matches!(m.set(2, 0, 1.0), Err(Error::Index { row: 2, .. })));
        assert!(matches!(m.set(0, 2, 1.0), Err(Error::Index { col: 2, .. })));
        assert!(matches!(m.get(0, 9), Err(Error::Index { .. })));
        assert_eq!(m, before);
    }

    #[test]
    fn fill_row_and_column() {
        let mut m = Matrix::zeros(2, 3).unwrap();
        m.fill_row(1, 2.0).unwrap();
        m.fill_column(0, 7.0).unwrap();
        assert_eq!(m.as_slice(), &[7.0, 0.0, 0.0, 7.0, 2.0, 2.0]);
        assert!(m.fill_row(2, 1.0).is_err());
        assert!(m.fill_column(3, 1.0).is_err());
    }

    #[test]
    fn design_matrix_has_intercept_column() {
        let x = Matrix::design(&[3.0, 5.0]).unwrap();
        assert_eq!(x.shape(), (2, 2));
        assert_eq!(x.as_slice(), &[1.0, 3.0, 1.0, 5.0]);

        let y = Matrix::column(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(y.shape(), (3, 1));
    }

    #[test]
    fn from_rows_validates_row_lengths() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.row(1).unwrap(), &[3.0, 4.0]);
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn transpose_swaps_entries_and_leaves_input() {
        let m = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = m.transpose().unwrap();
        assert_eq!(t.shape(), (3, 2));
        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(t.get(c, r).unwrap(), m.get(r, c).unwrap());
            }
        }
        assert_eq!(t.transpose().unwrap(), m);
    }

    #[test]
    fn multiply_rejects_incompatible_shapes() {
        let a = Matrix::zeros(2, 3).unwrap();
        let b = Matrix::zeros(2, 3).unwrap();
        assert!(matches!(a.multiply(&b), Err(Error::DimensionMismatch(_))));
    }

    #[test]
    fn transpose_of_product_is_reversed_product_of_transposes() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_matrix(3, 4, &mut rng);
        let b = random_matrix(4, 2, &mut rng);

        let lhs = a.multiply(&b).unwrap().transpose().unwrap();
        let rhs = b
            .transpose()
            .unwrap()
            .multiply(&a.transpose().unwrap())
            .unwrap();
        assert!(lhs.max_abs_diff(&rhs).unwrap() < 1e-12);
    }

    #[test]
    fn inverse_of_known_2x2() {
        let m = Matrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]).unwrap();
        let inv = m.square_inverse().unwrap();
        let expected = [0.6, -0.7, -0.2, 0.4];
        for (got, want) in inv.as_slice().iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn inverse_needs_pivoting_when_diagonal_starts_at_zero() {
        let m = Matrix::from_row_slice(3, 3, &[0.0, 1.0, 2.0, 1.0, 0.0, 3.0, 4.0, -3.0, 8.0])
            .unwrap();
        let inv = m.square_inverse().unwrap();
        let product = m.multiply(&inv).unwrap();
        let id = Matrix::identity(3).unwrap();
        assert!(product.max_abs_diff(&id).unwrap() < 1e-9);
    }

    #[test]
    fn random_matrix_times_inverse_is_identity() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..=6 {
            // Diagonal boost keeps these well conditioned.
            let mut m = random_matrix(n, n, &mut rng);
            for i in 0..n {
                let v = m.get(i, i).unwrap();
                m.set(i, i, v + 4.0 * n as f64).unwrap();
            }
            let inv = m.square_inverse().unwrap();
            let id = Matrix::identity(n).unwrap();
            assert!(m.multiply(&inv).unwrap().max_abs_diff(&id).unwrap() < 1e-9);
            assert!(inv.multiply(&m).unwrap().max_abs_diff(&id).unwrap() < 1e-9);
        }
    }

    #[test]
    fn inverse_does_not_mutate_input() {
        let m = Matrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]).unwrap();
        let copy = m.clone();
        let _ = m.square_inverse().unwrap();
        assert_eq!(m, copy);
    }

    #[test]
    fn inverse_rejects_singular_matrix() {
        let m = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]).unwrap();
        assert!(matches!(
            m.square_inverse(),
            Err(Error::SingularMatrix { column: 1 })
        ));
    }

    #[test]
    fn inverse_rejects_non_square_matrix() {
        let m = Matrix::zeros(2, 3).unwrap();
        assert!(matches!(
            m.square_inverse(),
            Err(Error::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn empty_matrix_inverts_to_empty() {
        let m = Matrix::zeros(0, 0).unwrap();
        assert_eq!(m.square_inverse().unwrap().shape(), (0, 0));
    }
}
