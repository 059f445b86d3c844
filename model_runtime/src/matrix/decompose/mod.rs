//! Matrix factorizations.
//!
//! Every routine reads its input through a shared handle and builds new
//! matrices for the factors, so the caller's buffer is never touched.
//! Routines that can fail to converge report it through `ok`; with the
//! non-convergence exception class enabled they raise
//! `ModelError::CanNotConverge` instead.
//!
//! Permutation matrices follow one convention throughout: `P[perm[i], i] = 1`,
//! so that the factor product reproduces `A` itself (`A = P·L·U`).

mod bunch_kaufman;
mod cholesky;
mod lu;
mod orthogonal;
mod solve;
mod spectral;

use crate::scalar::Complex;

use super::coefficient::Field;
use super::dense::Matrix;

pub use bunch_kaufman::BUNCH_KAUFMAN_ALPHA;

/// `A = P·L·U` with unit lower-triangular `L`.
#[derive(Debug, Clone)]
pub struct Plu<T: Field> {
    pub p: Matrix<T>,
    pub l: Matrix<T>,
    pub u: Matrix<T>,
    /// False when a zero pivot was met.
    pub non_singular: bool,
}

/// `A = U·S·Vᴴ` with full unitary `U` and `V`.
#[derive(Debug, Clone)]
pub struct Svd<T: Field> {
    pub u: Matrix<T>,
    /// `m × n` with the singular values, largest first, on the diagonal.
    pub s: Matrix<f64>,
    pub v_adjoint: Matrix<T>,
    pub ok: bool,
}

/// Thin `A = Q·R` for `m ≥ n`.
#[derive(Debug, Clone)]
pub struct Qr<T: Field> {
    pub q: Matrix<T>,
    pub r: Matrix<T>,
    pub ok: bool,
}

/// Thin `A = L·Q` for `m ≤ n`.
#[derive(Debug, Clone)]
pub struct Lq<T: Field> {
    pub l: Matrix<T>,
    pub q: Matrix<T>,
    pub ok: bool,
}

/// Symmetric-indefinite `A = P·F·D·Fᵀ·Pᵀ`; `F` is unit lower (or upper)
/// triangular and `D` is block diagonal with 1×1 and 2×2 blocks.
#[derive(Debug, Clone)]
pub struct BunchKaufman<T: Field> {
    pub factor: Matrix<T>,
    pub block_diagonal: Matrix<T>,
    pub p: Matrix<T>,
    pub non_singular: bool,
}

/// `A = Q·H·Qᴴ` with `H` upper Hessenberg.
#[derive(Debug, Clone)]
pub struct Hessenberg<T: Field> {
    pub q: Matrix<T>,
    pub h: Matrix<T>,
}

/// `A = Q·U·Qᴴ`; real input gives a quasi-triangular `U` with 2×2 blocks.
#[derive(Debug, Clone)]
pub struct Schur<T: Field> {
    pub q: Matrix<T>,
    pub u: Matrix<T>,
    /// Eigenvalues as a column vector.
    pub w: Matrix<Complex>,
    pub ok: bool,
}

/// Eigenvalues with one eigenvector per eigenvalue.
#[derive(Debug, Clone)]
pub struct Eigen<T: Field> {
    pub values: Matrix<Complex>,
    pub q: Matrix<T>,
    pub u: Matrix<T>,
    /// Unit-norm column eigenvectors, in the order of `values`.
    pub vectors: Vec<Matrix<Complex>>,
    pub ok: bool,
}

/// Power-of-two row and column scalers.
#[derive(Debug, Clone)]
pub struct Equilibration {
    pub row: Matrix<f64>,
    pub col: Matrix<f64>,
    /// False when a row or column is entirely zero.
    pub ok: bool,
}

/// Permutation matrix with `P[perm[i], i] = 1`.
fn permutation_matrix<T: Field>(perm: &[usize]) -> crate::error::ModelResult<Matrix<T>> {
    let n = perm.len();
    Matrix::from_fn(n, n, |r, c| if perm[c] == r { T::ONE } else { T::ZERO })
}
