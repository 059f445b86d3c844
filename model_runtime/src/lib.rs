//! Runtime value core for compiled mathematical models
//!
//! This crate provides the values that compiled models manipulate at run
//! time. It includes:
//!
//! - `Variant`, the dynamically typed value, and its operator dispatch
//! - `ModelError` and the process-wide exception-class gate
//! - `Complex` with robust division
//! - Copy-on-write `Set`, `Tuple` and lazy `Range` containers
//! - The dense, column-major `Matrix<T>` engine and its decompositions
//! - The console sink contract and a C ABI for hosts

// Library code reports through `tracing`; hosts decide where output goes.
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

pub mod cancel;
pub mod console;
pub mod container;
pub mod error;
pub mod ffi;
pub mod matrix;
pub mod scalar;
pub mod value_type;
pub mod variant;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use model_runtime::prelude::*;
///
/// let sum = Variant::from(1).add(&Variant::from(2.5)).unwrap();
/// assert_eq!(sum, Variant::Real(3.5));
/// ```
pub mod prelude {
    pub use super::container::{Range, Set, Tuple};
    pub use super::error::{
        enable_exception_class, exception_class_enabled, AbortReason, ExceptionClass, ModelError,
        ModelResult,
    };
    pub use super::matrix::{
        Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal, Selector,
    };
    pub use super::scalar::{Boolean, Complex, Integer, Real};
    pub use super::value_type::ValueType;
    pub use super::variant::{BinaryOperator, Variant};
}

pub use prelude::*;
