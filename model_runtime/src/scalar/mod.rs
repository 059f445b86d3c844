//! Scalar kinds.
//!
//! `Boolean`, `Integer` and `Real` map directly onto Rust primitives;
//! `Complex` is defined in the `complex` submodule.

mod complex;

pub use complex::{check_complex, Complex};
pub(crate) use complex::fmt_real;

pub type Boolean = bool;
/// Signed 64-bit, two's complement. Arithmetic wraps on overflow.
pub type Integer = i64;
/// IEEE-754 binary64.
pub type Real = f64;
