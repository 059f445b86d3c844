//! Hessenberg reduction, Schur decomposition and eigenvectors.

use crate::cancel;
use crate::error::{raise_or, ModelError, ModelResult};
use crate::scalar::Complex;

use super::super::backend::ITERATION_LIMIT;
use super::super::coefficient::Field;
use super::super::dense::Matrix;
use super::lu;
use super::{Eigen, Hessenberg, Schur};

/// Inverse iteration steps per eigenvector.
const INVERSE_ITERATIONS: usize = 3;

/// Eigenvalues of the diagonal blocks of a quasi-triangular matrix.
fn block_eigenvalues<T: Field>(u: &Matrix<T>) -> Vec<Complex> {
    let n = u.rows();
    let mut values = Vec::with_capacity(n);
    let mut i = 0;
    while i < n {
        let a = u.element(i, i).to_complex();
        if i + 1 < n {
            let c = u.element(i + 1, i).to_complex();
            let d = u.element(i + 1, i + 1).to_complex();
            if c.norm() > f64::EPSILON * (a.norm() + d.norm()) {
                let b = u.element(i, i + 1).to_complex();
                let half_trace = (a + d) * 0.5;
                let half_gap = (a - d) * 0.5;
                let root = (half_gap * half_gap + b * c).sqrt();
                let (first, second) = (half_trace + root, half_trace - root);
                if first.imag >= second.imag {
                    values.extend([first, second]);
                } else {
                    values.extend([second, first]);
                }
                i += 2;
                continue;
            }
        }
        values.push(a);
        i += 1;
    }
    values
}

impl<T: Field> Matrix<T> {
    fn require_square_for_spectral(&self) -> ModelResult<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows(),
                cols: self.cols(),
            })
        }
    }

    /// `A = Q·H·Qᴴ` with `H` zero below the first subdiagonal.
    pub fn hessenberg(&self) -> ModelResult<Hessenberg<T>> {
        self.require_square_for_spectral()?;
        let n = self.rows();
        tracing::debug!(n, "hessenberg");
        if n == 0 {
            return Ok(Hessenberg {
                q: Matrix::empty(),
                h: Matrix::empty(),
            });
        }
        cancel::check()?;
        let (q, h) = self.to_nalgebra().hessenberg().unpack();
        Ok(Hessenberg {
            q: Matrix::from_nalgebra(&q)?,
            h: Matrix::from_nalgebra(&h)?,
        })
    }

    /// `A = Q·U·Qᴴ` with unitary `Q`; the eigenvalues are collected in `w`.
    pub fn schur(&self) -> ModelResult<Schur<T>> {
        self.require_square_for_spectral()?;
        let n = self.rows();
        tracing::debug!(n, "schur");
        if n == 0 {
            return Ok(Schur {
                q: Matrix::empty(),
                u: Matrix::empty(),
                w: Matrix::new(0, 1)?,
                ok: true,
            });
        }
        cancel::check()?;
        let Some(schur) = self.to_nalgebra().try_schur(f64::EPSILON, ITERATION_LIMIT) else {
            tracing::warn!(n, "schur did not converge");
            raise_or(ModelError::CanNotConverge, ())?;
            return Ok(Schur {
                q: Matrix::new(n, n)?,
                u: Matrix::new(n, n)?,
                w: Matrix::new(n, 1)?,
                ok: false,
            });
        };
        cancel::check()?;
        let (q, u) = schur.unpack();
        let u = Matrix::from_nalgebra(&u)?;
        let w = Matrix::column_vector(&block_eigenvalues(&u))?;
        Ok(Schur {
            q: Matrix::from_nalgebra(&q)?,
            u,
            w,
            ok: true,
        })
    }

    /// Eigenvalues from the Schur form plus one unit eigenvector each, found
    /// by inverse iteration on `A − λI`.
    pub fn eigenvectors(&self) -> ModelResult<Eigen<T>> {
        let schur = self.schur()?;
        let n = self.rows();
        if !schur.ok {
            let vectors = (0..n)
                .map(|_| Matrix::new(n, 1))
                .collect::<ModelResult<Vec<_>>>()?;
            return Ok(Eigen {
                values: schur.w,
                q: schur.q,
                u: schur.u,
                vectors,
                ok: false,
            });
        }

        let a = self.apply(|x| x.to_complex())?;
        let floor = f64::EPSILON * a.euclidean_norm().max(f64::MIN_POSITIVE);
        let start: Vec<Complex> = (0..n)
            .map(|i| Complex::from_real(1.0 / ((i + 1) as f64).sqrt()))
            .collect();

        let mut vectors = Vec::with_capacity(n);
        for lambda in schur.w.iter() {
            cancel::check()?;
            let shift = lambda + floor;
            let shifted = a.as_column_major_vec();
            let shifted: Vec<Complex> = shifted
                .into_iter()
                .enumerate()
                .map(|(i, x)| if i % (n + 1) == 0 { x - shift } else { x })
                .collect();
            let factors = lu::factor(shifted, n, n, Some(floor))?;

            let mut v = start.clone();
            for _ in 0..INVERSE_ITERATIONS {
                factors.solve_in_place(&mut v);
                let norm = v.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt();
                if !(norm > 0.0 && norm.is_finite()) {
                    break;
                }
                v.iter_mut().for_each(|x| *x = *x / norm);
            }
            normalize_phase(&mut v);
            vectors.push(Matrix::column_vector(&v)?);
        }
        tracing::debug!(n, "eigenvectors done");

        Ok(Eigen {
            values: schur.w,
            q: schur.q,
            u: schur.u,
            vectors,
            ok: true,
        })
    }
}

/// Rotate `v` so its largest entry is real and positive.
fn normalize_phase(v: &mut [Complex]) {
    let Some(pivot) = v
        .iter()
        .copied()
        .max_by(|a, b| a.norm_sqr().total_cmp(&b.norm_sqr()))
    else {
        return;
    };
    let magnitude = pivot.norm();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return;
    }
    let rotation = pivot.conj() / magnitude;
    v.iter_mut().for_each(|x| *x = *x * rotation);
}
