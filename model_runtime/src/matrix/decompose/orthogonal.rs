//! Orthogonal factorizations (SVD, QR, LQ) and what is built on them.

use nalgebra::DMatrix;

use crate::cancel;
use crate::error::{raise_or, ModelError, ModelResult};

use super::super::backend::ITERATION_LIMIT;
use super::super::coefficient::Field;
use super::super::dense::Matrix;
use super::{Equilibration, Lq, Qr, Svd};

/// Widest allowed growth of the condition number under equilibration.
pub const EQUILIBRATION_BOUND: f64 = 1.10;

/// Extend `thin` (orthonormal columns) to a square unitary matrix.
///
/// The trailing columns come from a Householder QR of `[thin | I]`, whose
/// leading columns span the same space as `thin`.
fn complete_unitary<T: Field>(thin: &DMatrix<T::Backend>) -> DMatrix<T::Backend> {
    let (m, k) = thin.shape();
    let zero = T::ZERO.to_backend();
    let one = T::ONE.to_backend();
    if k >= m {
        return DMatrix::from_fn(m, m, |r, c| thin[(r, c)]);
    }
    let augmented = DMatrix::from_fn(m, k + m, |r, c| {
        if c < k {
            thin[(r, c)]
        } else if r == c - k {
            one
        } else {
            zero
        }
    });
    let q = augmented.qr().q();
    DMatrix::from_fn(m, m, |r, c| if c < k { thin[(r, c)] } else { q[(r, c)] })
}

fn check_tolerance(tolerance: f64) -> ModelResult<bool> {
    if tolerance.is_nan() || tolerance < 0.0 {
        raise_or(ModelError::InvalidNumericValue, ())?;
        return Ok(false);
    }
    Ok(true)
}

/// `2⁻ᵉ` for the exponent `e` nearest `log₂ x`.
fn power_of_two_scaler(x: f64) -> f64 {
    let exponent = x.log2().round().clamp(-1000.0, 1000.0) as i32;
    2f64.powi(-exponent)
}

impl<T: Field> Matrix<T> {
    /// Singular values, largest first; `None` when the iteration did not converge.
    pub(crate) fn try_singular_values(&self) -> ModelResult<Option<Vec<f64>>> {
        if self.is_empty() {
            return Ok(Some(Vec::new()));
        }
        cancel::check()?;
        let svd = self
            .to_nalgebra()
            .try_svd(false, false, f64::EPSILON, ITERATION_LIMIT);
        cancel::check()?;
        Ok(svd.map(|svd| {
            let mut values: Vec<f64> = svd.singular_values.iter().copied().collect();
            values.sort_by(|a, b| b.total_cmp(a));
            values
        }))
    }

    /// Singular values as a column vector, largest first.
    pub fn singular_values(&self) -> ModelResult<Matrix<f64>> {
        match self.try_singular_values()? {
            Some(values) => Matrix::column_vector(&values),
            None => {
                tracing::warn!(rows = self.rows(), cols = self.cols(), "svd did not converge");
                raise_or(ModelError::CanNotConverge, Matrix::empty())
            }
        }
    }

    fn svd_failure(&self) -> ModelResult<Svd<T>> {
        let (m, n) = self.shape();
        tracing::warn!(rows = m, cols = n, "svd did not converge");
        raise_or(ModelError::CanNotConverge, ())?;
        Ok(Svd {
            u: Matrix::new(m, m)?,
            s: Matrix::new(m, n)?,
            v_adjoint: Matrix::new(n, n)?,
            ok: false,
        })
    }

    /// Full singular value decomposition `A = U·S·Vᴴ`.
    pub fn svd(&self) -> ModelResult<Svd<T>> {
        let (m, n) = self.shape();
        tracing::debug!(rows = m, cols = n, "svd");
        if self.is_empty() {
            return Ok(Svd {
                u: Matrix::identity(m)?,
                s: Matrix::new(m, n)?,
                v_adjoint: Matrix::identity(n)?,
                ok: true,
            });
        }
        cancel::check()?;
        let Some(svd) = self
            .to_nalgebra()
            .try_svd(true, true, f64::EPSILON, ITERATION_LIMIT)
        else {
            return self.svd_failure();
        };
        cancel::check()?;
        let (Some(u), Some(v_t)) = (svd.u.as_ref(), svd.v_t.as_ref()) else {
            return self.svd_failure();
        };

        let sigma = &svd.singular_values;
        let k = m.min(n);
        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));

        let u_thin = DMatrix::from_fn(m, k, |r, c| u[(r, order[c])]);
        let v_thin = DMatrix::from_fn(n, k, |r, c| {
            T::from_backend(v_t[(order[c], r)]).conjugate().to_backend()
        });
        let u = Matrix::from_nalgebra(&complete_unitary::<T>(&u_thin))?;
        let v = Matrix::<T>::from_nalgebra(&complete_unitary::<T>(&v_thin))?;
        let s = Matrix::from_fn(m, n, |r, c| if r == c { sigma[order[r]] } else { 0.0 })?;
        tracing::debug!(largest = sigma.iter().copied().fold(0.0, f64::max), "svd done");
        Ok(Svd {
            u,
            s,
            v_adjoint: v.adjoint()?,
            ok: true,
        })
    }

    /// Thin QR for `m ≥ n`: `Q` is `m × n` with orthonormal columns, `R` is `n × n`.
    pub fn qr(&self) -> ModelResult<Qr<T>> {
        let (m, n) = self.shape();
        if m < n {
            return Err(ModelError::InvalidMatrixDimensions { rows: m, cols: n });
        }
        tracing::debug!(rows = m, cols = n, "qr");
        if self.is_empty() {
            return Ok(Qr {
                q: Matrix::new(m, n)?,
                r: Matrix::new(n, n)?,
                ok: true,
            });
        }
        cancel::check()?;
        let qr = self.to_nalgebra().qr();
        let q = Matrix::from_nalgebra(&qr.q())?;
        let r = Matrix::from_nalgebra(&qr.r())?;
        let ok = q.iter().chain(r.iter()).all(T::is_finite_value);
        if !ok {
            tracing::warn!(rows = m, cols = n, "qr produced non-finite factors");
            raise_or(ModelError::CanNotConverge, ())?;
        }
        Ok(Qr { q, r, ok })
    }

    /// Thin LQ for `m ≤ n`: `L` is `m × m`, `Q` is `m × n` with orthonormal rows.
    pub fn lq(&self) -> ModelResult<Lq<T>> {
        let (m, n) = self.shape();
        if m > n {
            return Err(ModelError::InvalidMatrixDimensions { rows: m, cols: n });
        }
        let qr = self.adjoint()?.qr()?;
        Ok(Lq {
            l: qr.r.adjoint()?,
            q: qr.q.adjoint()?,
            ok: qr.ok,
        })
    }

    /// `X` minimizing `‖A·X − B‖₂`; singular values at or below `tolerance` are dropped.
    pub fn least_squares(&self, rhs: &Matrix<T>, tolerance: f64) -> ModelResult<Self> {
        if rhs.rows() != self.rows() {
            return Err(ModelError::incompatible(self.shape(), rhs.shape()));
        }
        let (n, p) = (self.cols(), rhs.cols());
        let unsolved = || Matrix::filled(n, p, T::from_real(f64::NAN));
        if !check_tolerance(tolerance)? {
            return unsolved();
        }
        tracing::debug!(rows = self.rows(), cols = n, rhs_cols = p, "least squares");
        if self.is_empty() {
            return Matrix::new(n, p);
        }
        cancel::check()?;
        let solution = self
            .to_nalgebra()
            .try_svd(true, true, f64::EPSILON, ITERATION_LIMIT)
            .and_then(|svd| svd.solve(&rhs.to_nalgebra(), tolerance).ok());
        match solution {
            Some(x) => Matrix::from_nalgebra(&x),
            None => {
                tracing::warn!("least squares did not converge");
                raise_or(ModelError::CanNotConverge, ())?;
                unsolved()
            }
        }
    }

    /// Number of singular values above `tolerance`.
    pub fn rank(&self, tolerance: f64) -> ModelResult<i64> {
        if !check_tolerance(tolerance)? {
            return Ok(0);
        }
        match self.try_singular_values()? {
            Some(values) => Ok(values.iter().filter(|&&s| s > tolerance).count() as i64),
            None => {
                tracing::warn!("rank: svd did not converge");
                raise_or(ModelError::CanNotConverge, 0)
            }
        }
    }

    /// `σ_max / σ_min`; infinite for a rank-deficient matrix.
    pub fn condition_number(&self) -> ModelResult<f64> {
        match self.try_singular_values()? {
            Some(values) => match (values.first(), values.last()) {
                (Some(&largest), Some(&smallest)) => {
                    if smallest == 0.0 {
                        Ok(f64::INFINITY)
                    } else {
                        Ok(largest / smallest)
                    }
                }
                _ => Ok(0.0),
            },
            None => {
                tracing::warn!("condition number: svd did not converge");
                raise_or(ModelError::CanNotConverge, f64::NAN)
            }
        }
    }

    /// Power-of-two row and column scalers `D_row`, `D_col` for `D_row·A·D_col`.
    ///
    /// Identity scalers are returned whenever scaling would raise the
    /// condition number above 1.10 times its original value.
    pub fn equilibrate(&self) -> ModelResult<Equilibration> {
        let (m, n) = self.shape();
        tracing::debug!(rows = m, cols = n, "equilibrate");
        let mut ok = true;

        let mut row = vec![1.0; m];
        for (r, scaler) in row.iter_mut().enumerate() {
            let largest = (0..n).map(|c| self.element(r, c).magnitude()).fold(0.0, f64::max);
            if largest > 0.0 && largest.is_finite() {
                *scaler = power_of_two_scaler(largest);
            } else {
                ok = false;
            }
        }
        let mut col = vec![1.0; n];
        for (c, scaler) in col.iter_mut().enumerate() {
            let largest = (0..m)
                .map(|r| row[r] * self.element(r, c).magnitude())
                .fold(0.0, f64::max);
            if largest > 0.0 && largest.is_finite() {
                *scaler = power_of_two_scaler(largest);
            } else {
                ok = false;
            }
        }

        if !self.is_empty() {
            let original = self.condition_number()?;
            let scaled = Matrix::from_fn(m, n, |r, c| {
                self.element(r, c).times(T::from_real(row[r] * col[c]))
            })?
            .condition_number()?;
            if !(scaled <= EQUILIBRATION_BOUND * original) {
                tracing::debug!(original, scaled, "equilibration rejected");
                row.fill(1.0);
                col.fill(1.0);
            }
        }

        Ok(Equilibration {
            row: Matrix::diagonal(&Matrix::column_vector(&row)?)?,
            col: Matrix::diagonal(&Matrix::column_vector(&col)?)?,
            ok,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::matrix::Matrix;
    use crate::scalar::Complex;

    fn relative_error(a: &Matrix<f64>, b: &Matrix<f64>) -> f64 {
        a.subtract(b).unwrap().euclidean_norm() / b.euclidean_norm()
    }

    fn sample() -> Matrix<f64> {
        Matrix::from_row_major(4, 3, &[
            2.0, -1.0, 0.5, 1.0, 3.0, -2.0, 0.0, 1.5, 4.0, -1.0, 2.0, 1.0,
        ])
        .unwrap()
    }

    #[test]
    fn test_svd_reconstructs_with_full_factors() {
        let a = sample();
        let svd = a.svd().unwrap();
        assert!(svd.ok);
        assert_eq!(svd.u.shape(), (4, 4));
        assert_eq!(svd.s.shape(), (4, 3));
        assert_eq!(svd.v_adjoint.shape(), (3, 3));
        let product = svd
            .u
            .multiply(&svd.s)
            .unwrap()
            .multiply(&svd.v_adjoint)
            .unwrap();
        assert!(relative_error(&product, &a) < 1e-13);
        let gram = svd.u.adjoint().unwrap().multiply(&svd.u).unwrap();
        assert!(relative_error(&gram, &Matrix::identity(4).unwrap()) < 1e-13);
        assert!(svd.s.get(1, 1).unwrap() >= svd.s.get(2, 2).unwrap());
    }

    #[test]
    fn test_svd_of_wide_complex_matrix() {
        let a = Matrix::from_row_major(
            2,
            3,
            &[
                Complex::new(1.0, 1.0),
                Complex::from_real(2.0),
                Complex::new(0.0, -1.0),
                Complex::from_real(-1.0),
                Complex::new(0.5, 0.5),
                Complex::from_real(3.0),
            ],
        )
        .unwrap();
        let svd = a.svd().unwrap();
        let s: Matrix<Complex> = svd.s.upcast().unwrap();
        let product = svd.u.multiply(&s).unwrap().multiply(&svd.v_adjoint).unwrap();
        let error = product.subtract(&a).unwrap().euclidean_norm() / a.euclidean_norm();
        assert!(error < 1e-13, "{}", error);
    }

    #[test]
    fn test_qr_and_lq() {
        let a = sample();
        let qr = a.qr().unwrap();
        assert_eq!(qr.q.shape(), (4, 3));
        assert_eq!(qr.r.shape(), (3, 3));
        assert_eq!(qr.r.get(3, 1).unwrap(), 0.0);
        assert!(relative_error(&qr.q.multiply(&qr.r).unwrap(), &a) < 1e-13);

        let wide = a.transpose().unwrap();
        let lq = wide.lq().unwrap();
        assert_eq!(lq.l.shape(), (3, 3));
        assert_eq!(lq.q.shape(), (3, 4));
        assert!(relative_error(&lq.l.multiply(&lq.q).unwrap(), &wide) < 1e-13);

        assert!(wide.qr().is_err());
        assert!(a.lq().is_err());
    }

    #[test]
    fn test_rank_and_condition_number() {
        let singular = Matrix::from_row_major(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 0.0, 1.0])
            .unwrap();
        assert_eq!(singular.rank(1e-10).unwrap(), 2);
        assert!(singular.condition_number().unwrap() > 1e14);
        let diag = Matrix::diagonal(&Matrix::column_vector(&[4.0, 2.0, 0.5]).unwrap()).unwrap();
        assert!((diag.condition_number().unwrap() - 8.0).abs() < 1e-12);
        assert!(diag.rank(-1.0).is_err());
    }

    #[test]
    fn test_least_squares_matches_normal_equations() {
        let a = sample();
        let b = Matrix::from_row_major(4, 1, &[1.0, 0.0, -1.0, 2.0]).unwrap();
        let x = a.least_squares(&b, 1e-12).unwrap();
        // Residual is orthogonal to the column space.
        let residual = a.multiply(&x).unwrap().subtract(&b).unwrap();
        let projection = a.transpose().unwrap().multiply(&residual).unwrap();
        assert!(projection.euclidean_norm() < 1e-12);
    }

    #[test]
    fn test_equilibrate_never_degrades() {
        let a = Matrix::from_row_major(2, 2, &[1e6, 2.0, 3e6, 1e-3]).unwrap();
        let eq = a.equilibrate().unwrap();
        assert!(eq.ok);
        let scaled = eq.row.multiply(&a).unwrap().multiply(&eq.col).unwrap();
        assert!(scaled.condition_number().unwrap() <= 1.10 * a.condition_number().unwrap());
        for i in 1..=2 {
            let d = eq.row.get(i, i).unwrap();
            assert_eq!(d.log2().fract(), 0.0);
        }
    }

    #[test]
    fn test_equilibrate_flags_zero_row() {
        let a = Matrix::from_row_major(2, 2, &[1.0, 2.0, 0.0, 0.0]).unwrap();
        assert!(!a.equilibrate().unwrap().ok);
    }
}
