//! Shared helpers for integration tests
// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use model_runtime::matrix::{Field, Numeric};
use model_runtime::prelude::*;

/// Deterministic generator (SplitMix64) so failures reproduce.
#[derive(Debug, Clone)]
pub struct TestRng {
    state: u64,
}

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [-1, 1).
    pub fn next_signed(&mut self) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        2.0 * unit - 1.0
    }
}

pub fn random_real(rows: usize, cols: usize, seed: u64) -> MatrixReal {
    let mut rng = TestRng::new(seed);
    let values: Vec<f64> = (0..rows * cols).map(|_| rng.next_signed()).collect();
    Matrix::from_column_major(rows, cols, &values).unwrap()
}

pub fn random_complex(rows: usize, cols: usize, seed: u64) -> MatrixComplex {
    let mut rng = TestRng::new(seed);
    let values: Vec<Complex> = (0..rows * cols)
        .map(|_| Complex::new(rng.next_signed(), rng.next_signed()))
        .collect();
    Matrix::from_column_major(rows, cols, &values).unwrap()
}

/// `‖actual − expected‖ / ‖expected‖` in the Frobenius norm.
pub fn relative_error<T: Numeric>(actual: &Matrix<T>, expected: &Matrix<T>) -> f64 {
    let difference = actual.subtract(expected).unwrap().euclidean_norm();
    let scale = expected.euclidean_norm();
    if scale == 0.0 {
        difference
    } else {
        difference / scale
    }
}

/// Hermitian positive-definite `A·Aᴴ + n·I`.
pub fn positive_definite<T: Field>(a: &Matrix<T>) -> Matrix<T> {
    let n = a.rows();
    let shift = Matrix::<T>::identity(n)
        .unwrap()
        .scale(T::from_real(n as f64))
        .unwrap();
    a.multiply(&a.adjoint().unwrap()).unwrap().add(&shift).unwrap()
}

pub fn product<T: Numeric>(factors: &[&Matrix<T>]) -> Matrix<T> {
    let mut acc = factors[0].clone();
    for factor in &factors[1..] {
        acc = acc.multiply(factor).unwrap();
    }
    acc
}
