use std::fmt;

use crate::scalar::fmt_real;

use super::Variant;

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::None => write!(f, "None"),
            Variant::Boolean(b) => write!(f, "{}", b),
            Variant::Integer(i) => write!(f, "{}", i),
            Variant::Real(r) => fmt_real(f, *r),
            Variant::Complex(z) => write!(f, "{}", z),
            Variant::Set(set) => write!(f, "{}", set),
            Variant::Tuple(tuple) => write!(f, "{}", tuple),
            Variant::MatrixBoolean(m) => write!(f, "{}", m),
            Variant::MatrixInteger(m) => write!(f, "{}", m),
            Variant::MatrixReal(m) => write!(f, "{}", m),
            Variant::MatrixComplex(m) => write!(f, "{}", m),
        }
    }
}
