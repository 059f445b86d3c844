//! Matrix norms.
//!
//! `p_norm` and `euclidean_norm` treat the matrix as a flat vector of
//! entries; `one_norm` and `infinity_norm` are the induced operator norms
//! (largest column and row sums).

use crate::error::{raise_or, ModelError, ModelResult};

use super::coefficient::Numeric;
use super::dense::Matrix;

impl<T: Numeric> Matrix<T> {
    /// Entry-wise `p`-norm; `p` must be positive, `p = ∞` gives the largest magnitude.
    pub fn p_norm(&self, p: f64) -> ModelResult<f64> {
        if p.is_nan() || p <= 0.0 {
            return raise_or(ModelError::InvalidNumericValue, f64::NAN);
        }
        if p.is_infinite() {
            return Ok(self.iter().map(T::magnitude).fold(0.0, f64::max));
        }
        if p == 2.0 {
            return Ok(self.euclidean_norm());
        }
        let sum: f64 = self.iter().map(|value| value.magnitude().powf(p)).sum();
        Ok(sum.powf(1.0 / p))
    }

    /// Frobenius norm, scaled to avoid overflow in the squares.
    pub fn euclidean_norm(&self) -> f64 {
        let largest = self.iter().map(T::magnitude).fold(0.0, f64::max);
        if largest == 0.0 || !largest.is_finite() {
            return largest;
        }
        let sum: f64 = self
            .iter()
            .map(|value| {
                let scaled = value.magnitude() / largest;
                scaled * scaled
            })
            .sum();
        largest * sum.sqrt()
    }

    /// Largest absolute column sum.
    pub fn one_norm(&self) -> f64 {
        (0..self.cols())
            .map(|c| (0..self.rows()).map(|r| self.element(r, c).magnitude()).sum())
            .fold(0.0, f64::max)
    }

    /// Largest absolute row sum.
    pub fn infinity_norm(&self) -> f64 {
        (0..self.rows())
            .map(|r| (0..self.cols()).map(|c| self.element(r, c).magnitude()).sum())
            .fold(0.0, f64::max)
    }
}
