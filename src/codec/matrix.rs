//! Dense matrices over GF(2^8).

use std::fmt;

use crate::{
    algorithm::gf256::Gf256,
    error::{ErasureError, Result},
};

/// Row-major matrix whose entries are field elements.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    cols: usize,
    rows: Vec<Vec<u8>>,
}

impl Matrix {
    pub fn zero(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            rows: vec![vec![0u8; cols]; rows],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut m = Self::zero(size, size);
        for i in 0..size {
            m.rows[i][i] = 1;
        }
        m
    }

    /// Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(ErasureError::DimensionMismatch(format!(
                "row {bad} has {} columns, expected {cols}",
                rows[bad].len()
            )));
        }
        Ok(Self { cols, rows })
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn col_count(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row(&self, r: usize) -> &[u8] {
        &self.rows[r]
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.rows[r][c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: u8) {
        self.rows[r][c] = value;
    }

    pub fn is_identity(&self) -> bool {
        self.row_count() == self.cols
            && self
                .rows
                .iter()
                .enumerate()
                .all(|(r, row)| row.iter().enumerate().all(|(c, &v)| v == u8::from(r == c)))
    }

    /// New matrix made of the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut rows = Vec::with_capacity(indices.len());
        for &i in indices {
            let row = self.rows.get(i).ok_or_else(|| {
                ErasureError::DimensionMismatch(format!(
                    "row {i} out of range for {} rows",
                    self.row_count()
                ))
            })?;
            rows.push(row.clone());
        }
        Ok(Self {
            cols: self.cols,
            rows,
        })
    }

    /// `self (p×q) · other (q×r)`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.row_count() {
            return Err(ErasureError::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.row_count(),
                self.cols,
                other.row_count(),
                other.cols
            )));
        }
        let gf = Gf256::global();
        let mut out = Matrix::zero(self.row_count(), other.cols);
        for (r, row) in self.rows.iter().enumerate() {
            for (inner, &coef) in row.iter().enumerate() {
                gf.mul_slice_xor(coef, &other.rows[inner], &mut out.rows[r]);
            }
        }
        Ok(out)
    }

    /// Row vector times matrix: `vec (1×q) · self (q×r)`.
    pub fn left_multiply_row(&self, vec: &[u8]) -> Result<Vec<u8>> {
        if vec.len() != self.row_count() {
            return Err(ErasureError::DimensionMismatch(format!(
                "vector of length {} against {} rows",
                vec.len(),
                self.row_count()
            )));
        }
        let gf = Gf256::global();
        let mut result = vec![0u8; self.cols];
        for (&coef, row) in vec.iter().zip(&self.rows) {
            gf.mul_slice_xor(coef, row, &mut result);
        }
        Ok(result)
    }

    /// Gauss-Jordan elimination on `[self | I]`.
    pub fn invert(&self) -> Result<Matrix> {
        let n = self.row_count();
        if n == 0 || self.cols != n {
            return Err(ErasureError::DimensionMismatch(format!(
                "only non-empty square matrices can be inverted, got {}x{}",
                n, self.cols
            )));
        }
        let gf = Gf256::global();

        let mut aug = self
            .rows
            .iter()
            .enumerate()
            .map(|(r, src)| {
                let mut row = vec![0u8; 2 * n];
                row[..n].copy_from_slice(src);
                row[n + r] = 1;
                row
            })
            .collect::<Vec<_>>();

        for col in 0..n {
            let pivot_row = (col..n)
                .find(|&r| aug[r][col] != 0)
                .ok_or(ErasureError::Singular)?;
            aug.swap(col, pivot_row);

            let inv_pivot = gf.inv(aug[col][col])?;
            for j in col..(2 * n) {
                aug[col][j] = gf.mul(inv_pivot, aug[col][j]);
            }

            let pivot = aug[col].clone();
            for (row, target) in aug.iter_mut().enumerate() {
                if row == col {
                    continue;
                }
                let factor = target[col];
                if factor != 0 {
                    gf.mul_slice_xor(factor, &pivot[col..], &mut target[col..]);
                }
            }
        }

        Ok(Matrix {
            cols: n,
            rows: aug.into_iter().map(|row| row[n..].to_vec()).collect(),
        })
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix {}x{} [", self.row_count(), self.cols)?;
        for row in &self.rows {
            writeln!(f, "  {row:02x?}")?;
        }
        write!(f, "]")
    }
}
