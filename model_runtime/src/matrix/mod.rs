//! Dense matrix engine.
//!
//! Storage is column-major with every column starting on a 64-byte boundary
//! (single-row matrices are packed). Booleans are stored one bit per element.
//! Buffers come from the process-wide [`MatApi`] and are shared between
//! handles until one of them writes.

mod arith;
mod backend;
mod coefficient;
mod decompose;
mod dense;
mod dft;
mod iter;
mod norms;
mod predicates;
mod selector;
mod storage;

pub use backend::ITERATION_LIMIT;
pub use coefficient::{Coefficient, Field, Numeric, UpcastTo};
pub use decompose::{
    BunchKaufman, Eigen, Equilibration, Hessenberg, Lq, Plu, Qr, Schur, Svd, BUNCH_KAUFMAN_ALPHA,
};
pub use dense::Matrix;
pub use iter::MatrixIterator;
pub use selector::{Axis, Selector};
pub use storage::{
    align_up, column_size_in_bytes, grown_capacity, matrix_api, set_matrix_api, MatApi,
    SystemMatApi, ALIGNMENT_BYTES,
};

use crate::scalar::{Boolean, Complex, Integer, Real};

pub type MatrixBoolean = Matrix<Boolean>;
pub type MatrixInteger = Matrix<Integer>;
pub type MatrixReal = Matrix<Real>;
pub type MatrixComplex = Matrix<Complex>;
