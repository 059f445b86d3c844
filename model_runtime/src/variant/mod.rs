//! Variant - the dynamically typed value compiled models manipulate.
//!
//! A variant holds exactly one kind of payload. Scalars are stored inline;
//! sets, tuples and matrices are shared handles, so cloning a variant never
//! copies element data.

mod compare;
mod convert;
mod dispatch;
mod display;
mod linalg;

pub use dispatch::{dynamic_binop, BinaryOperator};

use crate::container::{Set, Tuple};
use crate::matrix::{Coefficient, Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal};
use crate::scalar::{Boolean, Complex, Integer, Real};
use crate::value_type::ValueType;

#[derive(Debug, Clone, Default)]
pub enum Variant {
    #[default]
    None,
    Boolean(Boolean),
    Integer(Integer),
    Real(Real),
    Complex(Complex),
    Set(Set),
    Tuple(Tuple),
    MatrixBoolean(MatrixBoolean),
    MatrixInteger(MatrixInteger),
    MatrixReal(MatrixReal),
    MatrixComplex(MatrixComplex),
}

impl Variant {
    pub fn kind(&self) -> ValueType {
        match self {
            Variant::None => ValueType::None,
            Variant::Boolean(_) => ValueType::Boolean,
            Variant::Integer(_) => ValueType::Integer,
            Variant::Real(_) => ValueType::Real,
            Variant::Complex(_) => ValueType::Complex,
            Variant::Set(_) => ValueType::Set,
            Variant::Tuple(_) => ValueType::Tuple,
            Variant::MatrixBoolean(_) => ValueType::MatrixBoolean,
            Variant::MatrixInteger(_) => ValueType::MatrixInteger,
            Variant::MatrixReal(_) => ValueType::MatrixReal,
            Variant::MatrixComplex(_) => ValueType::MatrixComplex,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Variant::None)
    }

    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Variant::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Tuple> {
        match self {
            Variant::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    /// The matrix payload if this variant holds a matrix of `T`.
    pub fn as_matrix<T: Coefficient>(&self) -> Option<&Matrix<T>> {
        T::matrix_of(self)
    }
}

impl From<Boolean> for Variant {
    fn from(value: Boolean) -> Self {
        Variant::Boolean(value)
    }
}

impl From<Integer> for Variant {
    fn from(value: Integer) -> Self {
        Variant::Integer(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Integer(Integer::from(value))
    }
}

impl From<Real> for Variant {
    fn from(value: Real) -> Self {
        Variant::Real(value)
    }
}

impl From<Complex> for Variant {
    fn from(value: Complex) -> Self {
        Variant::Complex(value)
    }
}

impl From<Set> for Variant {
    fn from(value: Set) -> Self {
        Variant::Set(value)
    }
}

impl From<Tuple> for Variant {
    fn from(value: Tuple) -> Self {
        Variant::Tuple(value)
    }
}

impl<T: Coefficient> From<Matrix<T>> for Variant {
    fn from(value: Matrix<T>) -> Self {
        T::wrap(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_payload() {
        assert_eq!(Variant::default().kind(), ValueType::None);
        assert_eq!(Variant::from(true).kind(), ValueType::Boolean);
        assert_eq!(Variant::from(3).kind(), ValueType::Integer);
        assert_eq!(Variant::from(3.0).kind(), ValueType::Real);
        assert_eq!(Variant::from(Complex::i()).kind(), ValueType::Complex);
        assert_eq!(Variant::from(Set::new()).kind(), ValueType::Set);
        assert_eq!(Variant::from(Tuple::new()).kind(), ValueType::Tuple);
        let m = Matrix::<f64>::identity(2).unwrap();
        assert_eq!(Variant::from(m.clone()).kind(), ValueType::MatrixReal);
        assert!(Variant::from(m).as_matrix::<f64>().is_some());
    }

    #[test]
    fn test_clone_shares_matrix_buffer() {
        let m = Matrix::<i64>::ones(3, 3).unwrap();
        let v = Variant::from(m.clone());
        let w = v.clone();
        let (Some(a), Some(b)) = (v.as_matrix::<i64>(), w.as_matrix::<i64>()) else {
            panic!("expected integer matrices");
        };
        assert!(a.shares_buffer_with(b));
        assert!(a.shares_buffer_with(&m));
    }
}
