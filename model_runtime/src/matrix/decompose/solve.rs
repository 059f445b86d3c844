//! Square linear systems and the inverse.

use crate::cancel;
use crate::error::{ModelError, ModelResult};

use super::super::coefficient::Field;
use super::super::dense::Matrix;

impl<T: Field> Matrix<T> {
    fn require_square(&self) -> ModelResult<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows(),
                cols: self.cols(),
            })
        }
    }

    /// `X` with `A·X = B` for square, non-singular `A`.
    pub fn solve(&self, rhs: &Matrix<T>) -> ModelResult<Self> {
        self.require_square()?;
        if rhs.rows() != self.rows() {
            return Err(ModelError::incompatible(self.shape(), rhs.shape()));
        }
        tracing::debug!(n = self.rows(), rhs_cols = rhs.cols(), "solve");
        let lu = self.lu_factors()?;
        if !lu.non_singular {
            return Err(ModelError::MatrixIsSingular);
        }
        let n = self.rows();
        let mut values = rhs.as_column_major_vec();
        for column in values.chunks_mut(n.max(1)) {
            cancel::check()?;
            lu.solve_in_place(column);
        }
        Self::from_column_major(n, rhs.cols(), &values)
    }

    /// `A⁻¹`; a singular matrix always raises.
    pub fn inverse(&self) -> ModelResult<Self> {
        self.require_square()?;
        self.solve(&Matrix::identity(self.rows())?)
    }
}
