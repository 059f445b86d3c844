//! Cholesky factorization of Hermitian positive-definite matrices.

use crate::error::{ModelError, ModelResult};

use super::super::coefficient::Field;
use super::super::dense::Matrix;

impl<T: Field> Matrix<T> {
    /// Hermitian up to rounding in the off-diagonal entries, with a real diagonal.
    fn is_numerically_hermitian(&self) -> bool {
        let n = self.rows();
        let tolerance = 16.0 * f64::EPSILON * self.euclidean_norm();
        (0..n).all(|c| {
            (0..=c).all(|r| {
                let upper = self.element(r, c);
                let lower = self.element(c, r).conjugate();
                upper.minus(lower).magnitude() <= tolerance
            })
        })
    }

    /// Lower-triangular `L` with `A = L·Lᴴ`.
    ///
    /// Raises `MatrixIsSingular` unless `A` is Hermitian positive-definite.
    pub fn cholesky(&self) -> ModelResult<Self> {
        if !self.is_square() {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        tracing::debug!(n = self.rows(), "cholesky");
        if self.is_empty() {
            return Ok(Matrix::empty());
        }
        if !self.is_numerically_hermitian() {
            return Err(ModelError::MatrixIsSingular);
        }
        let factor = self
            .to_nalgebra()
            .cholesky()
            .ok_or(ModelError::MatrixIsSingular)?;
        let l = Self::from_nalgebra(&factor.l())?;
        // Complex square roots never fail, so an indefinite pivot shows up
        // as a non-real or non-positive diagonal entry.
        if !l.has_positive_real_diagonal() {
            return Err(ModelError::MatrixIsSingular);
        }
        Ok(l)
    }

    fn has_positive_real_diagonal(&self) -> bool {
        (0..self.rows()).all(|i| {
            let pivot = self.element(i, i).to_complex();
            pivot.real > 0.0 && pivot.imag.abs() <= 16.0 * f64::EPSILON * pivot.real
        })
    }

    /// Upper-triangular `U` with `A = Uᴴ·U`.
    pub fn upper_cholesky(&self) -> ModelResult<Self> {
        self.cholesky()?.adjoint()
    }
}
