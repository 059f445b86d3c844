//! Equality and ordering between variants.

use std::cmp::Ordering;

use crate::error::{raise_or, ModelError, ModelResult};
use crate::value_type::{best_upcast, ValueType};

use super::Variant;

impl Variant {
    /// Total order used by sets: kind tag first, then the payload.
    ///
    /// Unlike `==` this never equates values of different kinds, and NaN
    /// reals sort after every other real.
    pub fn relative_order(&self, other: &Variant) -> Ordering {
        self.kind().cmp(&other.kind()).then_with(|| match (self, other) {
            (Variant::Boolean(a), Variant::Boolean(b)) => a.cmp(b),
            (Variant::Integer(a), Variant::Integer(b)) => a.cmp(b),
            (Variant::Real(a), Variant::Real(b)) => a.total_cmp(b),
            (Variant::Complex(a), Variant::Complex(b)) => a.total_cmp(b),
            (Variant::Set(a), Variant::Set(b)) => a.relative_order(b),
            (Variant::Tuple(a), Variant::Tuple(b)) => a.relative_order(b),
            (Variant::MatrixBoolean(a), Variant::MatrixBoolean(b)) => a.relative_order(b),
            (Variant::MatrixInteger(a), Variant::MatrixInteger(b)) => a.relative_order(b),
            (Variant::MatrixReal(a), Variant::MatrixReal(b)) => a.relative_order(b),
            (Variant::MatrixComplex(a), Variant::MatrixComplex(b)) => a.relative_order(b),
            _ => Ordering::Equal,
        })
    }

    /// Order of two scalars that project onto the reals.
    ///
    /// `None` means unordered (a NaN operand). Anything without a real
    /// projection raises a conversion error; the suppressed form is `None`.
    pub fn compare_scalars(&self, other: &Variant) -> ModelResult<Option<Ordering>> {
        if let (Some(a), Some(b)) = (self.lattice_integer(), other.lattice_integer()) {
            return Ok(Some(a.cmp(&b)));
        }
        match (self.real_value(), other.real_value()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => raise_or(ModelError::conversion(self.kind(), other.kind()), None),
        }
    }
}

fn matrices_equal(lhs: &Variant, rhs: &Variant) -> bool {
    let common = best_upcast(lhs.kind(), rhs.kind());
    if common == ValueType::None {
        return false;
    }
    match (lhs.upcast_to(common), rhs.upcast_to(common)) {
        (Ok(a), Ok(b)) => match (&a, &b) {
            (Variant::MatrixBoolean(x), Variant::MatrixBoolean(y)) => x == y,
            (Variant::MatrixInteger(x), Variant::MatrixInteger(y)) => x == y,
            (Variant::MatrixReal(x), Variant::MatrixReal(y)) => x == y,
            (Variant::MatrixComplex(x), Variant::MatrixComplex(y)) => x == y,
            _ => false,
        },
        _ => false,
    }
}

/// Semantic equality: scalars of different kinds are equal when their
/// promoted values are, and likewise for matrices.
impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Variant::None, Variant::None) => true,
            (Variant::Set(a), Variant::Set(b)) => a == b,
            (Variant::Tuple(a), Variant::Tuple(b)) => a == b,
            (a, b) if a.kind().is_scalar() && b.kind().is_scalar() => {
                match (a.lattice_integer(), b.lattice_integer()) {
                    (Some(x), Some(y)) => x == y,
                    _ => a.lattice_complex() == b.lattice_complex(),
                }
            }
            (a, b) if a.kind().is_matrix() && b.kind().is_matrix() => matrices_equal(a, b),
            _ => false,
        }
    }
}
