//! Element-wise and linear-algebra products.

use crate::cancel;
use crate::error::{ModelError, ModelResult};

use super::coefficient::Numeric;
use super::dense::Matrix;

impl<T: Numeric> Matrix<T> {
    fn zip_with(&self, other: &Matrix<T>, f: impl Fn(T, T) -> T) -> ModelResult<Self> {
        if self.shape() != other.shape() {
            return Err(ModelError::incompatible(self.shape(), other.shape()));
        }
        Self::from_fn(self.rows(), self.cols(), |r, c| {
            f(self.element(r, c), other.element(r, c))
        })
    }

    pub fn add(&self, other: &Matrix<T>) -> ModelResult<Self> {
        self.zip_with(other, T::plus)
    }

    pub fn subtract(&self, other: &Matrix<T>) -> ModelResult<Self> {
        self.zip_with(other, T::minus)
    }

    /// Element-wise product.
    pub fn hadamard(&self, other: &Matrix<T>) -> ModelResult<Self> {
        self.zip_with(other, T::times)
    }

    pub fn negate(&self) -> ModelResult<Self> {
        self.apply(T::negated)
    }

    pub fn scale(&self, factor: T) -> ModelResult<Self> {
        self.apply(|value| value.times(factor))
    }

    /// Divide every entry by `divisor`.
    pub fn divide_by_scalar(&self, divisor: T) -> ModelResult<Self> {
        let mut failure = None;
        let result = self.apply(|value| match value.divided_by(divisor) {
            Ok(quotient) => quotient,
            Err(err) => {
                failure.get_or_insert(err);
                T::ZERO
            }
        })?;
        match failure {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Matrix product `self · other`.
    pub fn multiply(&self, other: &Matrix<T>) -> ModelResult<Self> {
        if self.cols() != other.rows() {
            return Err(ModelError::incompatible(self.shape(), other.shape()));
        }
        let (m, k, n) = (self.rows(), self.cols(), other.cols());
        let lhs = self.as_column_major_vec();
        let mut out = vec![T::ZERO; m * n];
        for j in 0..n {
            cancel::check()?;
            let target = &mut out[j * m..(j + 1) * m];
            for p in 0..k {
                let factor = other.element(p, j);
                let column = &lhs[p * m..(p + 1) * m];
                for (acc, &a) in target.iter_mut().zip(column) {
                    *acc = acc.plus(a.times(factor));
                }
            }
        }
        Self::from_column_major(m, n, &out)
    }

    /// Block tensor product of shape `(m₁m₂, n₁n₂)`.
    pub fn kronecker(&self, other: &Matrix<T>) -> ModelResult<Self> {
        let (p, q) = other.shape();
        let rows = self
            .rows()
            .checked_mul(p)
            .ok_or(ModelError::InsufficientMemory)?;
        let cols = self
            .cols()
            .checked_mul(q)
            .ok_or(ModelError::InsufficientMemory)?;
        Self::from_fn(rows, cols, |r, c| {
            self.element(r / p, c / q).times(other.element(r % p, c % q))
        })
    }

    /// Sum of the main diagonal.
    pub fn trace(&self) -> T {
        (0..self.rows().min(self.cols()))
            .map(|i| self.element(i, i))
            .fold(T::ZERO, T::plus)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ModelError;
    use crate::matrix::Matrix;
    use crate::scalar::Complex;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multiply() {
        let a = Matrix::from_row_major(2, 3, &[1i64, 2, 3, 4, 5, 6]).unwrap();
        let b = Matrix::from_row_major(3, 2, &[7i64, 8, 9, 10, 11, 12]).unwrap();
        let c = a.multiply(&b).unwrap();
        assert_eq!(c.as_row_major_vec(), vec![58, 64, 139, 154]);
        assert_eq!(
            b.multiply(&b).unwrap_err(),
            ModelError::incompatible((3, 2), (3, 2))
        );
    }

    #[test]
    fn test_complex_multiply() {
        let i = Complex::i();
        let a = Matrix::from_row_major(1, 1, &[i]).unwrap();
        assert_eq!(a.multiply(&a).unwrap().get(1, 1).unwrap(), Complex::from_real(-1.0));
    }

    #[test]
    fn test_kronecker_shape_and_blocks() {
        let a = Matrix::from_row_major(2, 2, &[1i64, 2, 3, 4]).unwrap();
        let b = Matrix::from_row_major(1, 2, &[0i64, 1]).unwrap();
        let k = a.kronecker(&b).unwrap();
        assert_eq!(k.shape(), (2, 4));
        assert_eq!(k.as_row_major_vec(), vec![0, 1, 0, 2, 0, 3, 0, 4]);
    }

    #[test]
    fn test_elementwise() {
        let a = Matrix::from_row_major(1, 3, &[1.0, 2.0, 3.0]).unwrap();
        let b = Matrix::from_row_major(1, 3, &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(a.hadamard(&b).unwrap().as_column_major_vec(), vec![4.0, 10.0, 18.0]);
        assert_eq!(b.subtract(&a).unwrap().as_column_major_vec(), vec![3.0; 3]);
        assert_eq!(a.divide_by_scalar(2.0).unwrap().at(3).unwrap(), 1.5);
        assert_eq!(a.trace(), 1.0);
        assert!(a.add(&Matrix::new(3, 1).unwrap()).is_err());
    }
}
