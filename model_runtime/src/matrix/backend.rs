//! Bridge to nalgebra for the iterative decompositions.

use nalgebra::DMatrix;

use crate::error::ModelResult;

use super::coefficient::Field;
use super::dense::Matrix;

/// Iteration cap handed to the iterative nalgebra routines.
pub const ITERATION_LIMIT: usize = 100_000;

impl<T: Field> Matrix<T> {
    pub(crate) fn to_nalgebra(&self) -> DMatrix<T::Backend> {
        DMatrix::from_fn(self.rows(), self.cols(), |r, c| self.element(r, c).to_backend())
    }

    pub(crate) fn from_nalgebra(matrix: &DMatrix<T::Backend>) -> ModelResult<Self> {
        Self::from_fn(matrix.nrows(), matrix.ncols(), |r, c| {
            T::from_backend(matrix[(r, c)])
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::matrix::Matrix;
    use crate::scalar::Complex;

    #[test]
    fn test_nalgebra_round_trip_keeps_layout() {
        let m = Matrix::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let n = m.to_nalgebra();
        assert_eq!(n[(1, 0)], 4.0);
        assert_eq!(Matrix::<f64>::from_nalgebra(&n).unwrap(), m);

        let z = Matrix::from_row_major(1, 1, &[Complex::new(1.0, -1.0)]).unwrap();
        assert_eq!(z.to_nalgebra()[(0, 0)].im, -1.0);
    }
}
