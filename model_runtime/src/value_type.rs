//! Value kinds and the upcast lattice.
//!
//! The numeric values of the tags are part of the ABI: hosts pass them
//! across the C boundary and compiled models index conversion tables with
//! them.
//!
//! ```text
//! Boolean        ≺ Integer        ≺ Real        ≺ Complex
//! MatrixBoolean  ≺ MatrixInteger  ≺ MatrixReal  ≺ MatrixComplex
//! ```
//!
//! Scalars never upcast to matrices; sets and tuples only upcast to
//! themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    None = 0,
    Boolean = 1,
    Integer = 2,
    Real = 3,
    Complex = 4,
    Set = 5,
    Tuple = 6,
    MatrixBoolean = 7,
    MatrixInteger = 8,
    MatrixReal = 9,
    MatrixComplex = 10,
    /// Placeholder used by generic code; never the kind of a live value.
    Variant = 11,
}

impl ValueType {
    pub const ALL: [ValueType; 12] = [
        ValueType::None,
        ValueType::Boolean,
        ValueType::Integer,
        ValueType::Real,
        ValueType::Complex,
        ValueType::Set,
        ValueType::Tuple,
        ValueType::MatrixBoolean,
        ValueType::MatrixInteger,
        ValueType::MatrixReal,
        ValueType::MatrixComplex,
        ValueType::Variant,
    ];

    pub fn from_abi(tag: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| *kind as i32 == tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::None => "None",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Real => "Real",
            ValueType::Complex => "Complex",
            ValueType::Set => "Set",
            ValueType::Tuple => "Tuple",
            ValueType::MatrixBoolean => "MatrixBoolean",
            ValueType::MatrixInteger => "MatrixInteger",
            ValueType::MatrixReal => "MatrixReal",
            ValueType::MatrixComplex => "MatrixComplex",
            ValueType::Variant => "Variant",
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            ValueType::Boolean | ValueType::Integer | ValueType::Real | ValueType::Complex
        )
    }

    pub fn is_matrix(self) -> bool {
        matches!(
            self,
            ValueType::MatrixBoolean
                | ValueType::MatrixInteger
                | ValueType::MatrixReal
                | ValueType::MatrixComplex
        )
    }

    pub fn is_container(self) -> bool {
        matches!(self, ValueType::Set | ValueType::Tuple)
    }

    /// Element kind of a matrix kind.
    pub fn element_kind(self) -> Option<ValueType> {
        match self {
            ValueType::MatrixBoolean => Some(ValueType::Boolean),
            ValueType::MatrixInteger => Some(ValueType::Integer),
            ValueType::MatrixReal => Some(ValueType::Real),
            ValueType::MatrixComplex => Some(ValueType::Complex),
            _ => None,
        }
    }

    /// Matrix kind holding elements of a scalar kind.
    pub fn matrix_kind(self) -> Option<ValueType> {
        match self {
            ValueType::Boolean => Some(ValueType::MatrixBoolean),
            ValueType::Integer => Some(ValueType::MatrixInteger),
            ValueType::Real => Some(ValueType::MatrixReal),
            ValueType::Complex => Some(ValueType::MatrixComplex),
            _ => None,
        }
    }

    /// Position on the scalar or matrix chain (0 = Boolean end).
    fn chain_rank(self) -> Option<(Chain, u8)> {
        match self {
            ValueType::Boolean => Some((Chain::Scalar, 0)),
            ValueType::Integer => Some((Chain::Scalar, 1)),
            ValueType::Real => Some((Chain::Scalar, 2)),
            ValueType::Complex => Some((Chain::Scalar, 3)),
            ValueType::MatrixBoolean => Some((Chain::Matrix, 0)),
            ValueType::MatrixInteger => Some((Chain::Matrix, 1)),
            ValueType::MatrixReal => Some((Chain::Matrix, 2)),
            ValueType::MatrixComplex => Some((Chain::Matrix, 3)),
            _ => None,
        }
    }

    /// True if a value of this kind may always be promoted to `target`.
    pub fn can_upcast_to(self, target: ValueType) -> bool {
        if self == target {
            return !matches!(self, ValueType::Variant);
        }
        match (self.chain_rank(), target.chain_rank()) {
            (Some((a, ra)), Some((b, rb))) => a == b && ra <= rb,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    Scalar,
    Matrix,
}

/// Common kind to promote both operands to, or `ValueType::None` when the
/// kinds are incompatible.
pub fn best_upcast(a: ValueType, b: ValueType) -> ValueType {
    if a == b {
        return match a {
            ValueType::Variant => ValueType::None,
            other => other,
        };
    }
    match (a.chain_rank(), b.chain_rank()) {
        (Some((ca, ra)), Some((cb, rb))) if ca == cb => {
            if ra >= rb {
                a
            } else {
                b
            }
        }
        _ => ValueType::None,
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
