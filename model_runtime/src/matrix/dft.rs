//! Two-dimensional discrete Fourier transform.
//!
//! Columns are transformed first, then rows. Power-of-two lengths use an
//! iterative radix-2 FFT; every other length goes through Bluestein's chirp-z
//! convolution so the cost stays `O(n log n)`. The forward transform is
//! unnormalized and the inverse divides by `rows · cols`.

use std::f64::consts::PI;

use crate::cancel;
use crate::error::ModelResult;
use crate::scalar::Complex;

use super::dense::Matrix;

fn radix2_in_place(data: &mut [Complex]) {
    let n = data.len();
    if n < 2 {
        return;
    }
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            data.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let twiddles: Vec<Complex> = (0..half)
            .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f64 / len as f64))
            .collect();
        for block in data.chunks_mut(len) {
            for (k, &w) in twiddles.iter().enumerate() {
                let u = block[k];
                let v = block[k + half] * w;
                block[k] = u + v;
                block[k + half] = u - v;
            }
        }
        len <<= 1;
    }
}

/// Precomputed transform for one length.
#[derive(Debug)]
enum Plan {
    Trivial,
    Radix2,
    Bluestein {
        /// `exp(-iπk²/n)` for `k < n`.
        chirp: Vec<Complex>,
        /// Transformed convolution kernel of length `padded`.
        kernel: Vec<Complex>,
        padded: usize,
    },
}

impl Plan {
    fn new(n: usize) -> Self {
        if n < 2 {
            return Plan::Trivial;
        }
        if n.is_power_of_two() {
            return Plan::Radix2;
        }
        let period = 2 * n as u128;
        // k² is reduced modulo 2n first; the phase stays accurate for large k.
        let chirp: Vec<Complex> = (0..n)
            .map(|k| {
                let k = k as u128;
                let reduced = (k * k % period) as f64;
                Complex::from_polar(1.0, -PI * reduced / n as f64)
            })
            .collect();
        let padded = (2 * n - 1).next_power_of_two();
        let mut kernel = vec![Complex::default(); padded];
        kernel[0] = chirp[0].conj();
        for k in 1..n {
            let value = chirp[k].conj();
            kernel[k] = value;
            kernel[padded - k] = value;
        }
        radix2_in_place(&mut kernel);
        Plan::Bluestein {
            chirp,
            kernel,
            padded,
        }
    }

    fn forward(&self, data: &mut [Complex]) {
        match self {
            Plan::Trivial => {}
            Plan::Radix2 => radix2_in_place(data),
            Plan::Bluestein {
                chirp,
                kernel,
                padded,
            } => {
                let mut work = vec![Complex::default(); *padded];
                for ((slot, &x), &c) in work.iter_mut().zip(data.iter()).zip(chirp) {
                    *slot = x * c;
                }
                radix2_in_place(&mut work);
                for (slot, &k) in work.iter_mut().zip(kernel) {
                    *slot = (*slot * k).conj();
                }
                // Inverse FFT through conjugation.
                radix2_in_place(&mut work);
                let scale = 1.0 / *padded as f64;
                for ((out, &w), &c) in data.iter_mut().zip(&work).zip(chirp) {
                    *out = w.conj() * c * scale;
                }
            }
        }
    }
}

impl Matrix<Complex> {
    fn transform(&self, inverse: bool) -> ModelResult<Self> {
        let (m, n) = self.shape();
        tracing::debug!(rows = m, cols = n, inverse, "dft");
        if self.is_empty() {
            return Ok(self.clone());
        }
        let mut values = self.as_column_major_vec();
        if inverse {
            values.iter_mut().for_each(|x| *x = x.conj());
        }

        let column_plan = Plan::new(m);
        for column in values.chunks_mut(m) {
            cancel::check()?;
            column_plan.forward(column);
        }

        let row_plan = Plan::new(n);
        let mut row = vec![Complex::default(); n];
        for r in 0..m {
            cancel::check()?;
            for (c, slot) in row.iter_mut().enumerate() {
                *slot = values[c * m + r];
            }
            row_plan.forward(&mut row);
            for (c, &x) in row.iter().enumerate() {
                values[c * m + r] = x;
            }
        }

        if inverse {
            let scale = 1.0 / (m * n) as f64;
            values.iter_mut().for_each(|x| *x = x.conj() * scale);
        }
        Self::from_column_major(m, n, &values)
    }

    /// Forward transform `X[k,l] = Σ x[r,c]·exp(-2πi(kr/m + lc/n))`.
    pub fn dft(&self) -> ModelResult<Self> {
        self.transform(false)
    }

    /// Inverse of [`Matrix::dft`], including the `1/(m·n)` factor.
    pub fn idft(&self) -> ModelResult<Self> {
        self.transform(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(values: &[Complex]) -> Vec<Complex> {
        let n = values.len();
        (0..n)
            .map(|k| {
                values.iter().enumerate().fold(Complex::default(), |acc, (j, &x)| {
                    let phase = -2.0 * PI * ((j * k) % n) as f64 / n as f64;
                    acc + x * Complex::from_polar(1.0, phase)
                })
            })
            .collect()
    }

    fn ramp(n: usize) -> Vec<Complex> {
        (0..n)
            .map(|i| Complex::new(i as f64 + 1.0, (i as f64 * 0.7).sin()))
            .collect()
    }

    #[test]
    fn test_four_point_transform() {
        let x = Matrix::column_vector(&[1.0, 2.0, 3.0, 4.0].map(Complex::from_real)).unwrap();
        let y = x.dft().unwrap().as_column_major_vec();
        let expected = [
            Complex::from_real(10.0),
            Complex::new(-2.0, 2.0),
            Complex::from_real(-2.0),
            Complex::new(-2.0, -2.0),
        ];
        for (a, b) in y.iter().zip(expected) {
            assert!((*a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_bluestein_matches_naive() {
        for n in [3, 5, 6, 7, 12, 31] {
            let x = ramp(n);
            let mut fast = x.clone();
            Plan::new(n).forward(&mut fast);
            for (a, b) in fast.iter().zip(naive(&x)) {
                assert!((*a - b).norm() < 1e-9 * n as f64, "n = {}", n);
            }
        }
    }

    #[test]
    fn test_two_dimensional_round_trip() {
        let values = ramp(15);
        let a = Matrix::from_column_major(3, 5, &values).unwrap();
        let spectrum = a.dft().unwrap();
        let total = values.iter().fold(Complex::default(), |s, &x| s + x);
        assert!((spectrum.get(1, 1).unwrap() - total).norm() < 1e-10);
        let back = spectrum.idft().unwrap();
        assert!(back.subtract(&a).unwrap().euclidean_norm() < 1e-12);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(Matrix::<Complex>::empty().dft().unwrap().is_empty());
        let one = Matrix::filled(1, 1, Complex::new(2.0, -1.0)).unwrap();
        assert_eq!(one.dft().unwrap(), one);
    }
}
