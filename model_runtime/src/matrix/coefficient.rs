//! Element types a matrix can hold.
//!
//! `Coefficient` covers storage and conversion for all four element kinds;
//! `Numeric` adds arithmetic (everything but booleans) and `Field` adds the
//! division and square roots the decompositions need (reals and complex).

use std::cmp::Ordering;
use std::fmt;

use crate::error::{raise_or, ModelError, ModelResult};
use crate::scalar::Complex;
use crate::value_type::ValueType;
use crate::variant::Variant;

use super::dense::Matrix;

fn read_word(column: &[u8], offset: usize) -> [u8; 8] {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&column[offset..offset + 8]);
    raw
}

pub trait Coefficient:
    Copy + PartialEq + Default + fmt::Debug + Send + Sync + 'static
{
    /// Scalar kind of one element.
    const KIND: ValueType;
    /// Kind of a matrix of these elements.
    const MATRIX_KIND: ValueType;
    /// Storage width; booleans are bit-packed.
    const BITS: usize;
    const ZERO: Self;
    const ONE: Self;

    fn load(column: &[u8], row: usize) -> Self;
    fn store(column: &mut [u8], row: usize, value: Self);

    fn conjugate(self) -> Self {
        self
    }

    fn to_complex(self) -> Complex;

    /// Exact conversion from a complex value, `None` if information would be lost.
    fn from_complex_exact(value: Complex) -> Option<Self>;

    fn into_variant(self) -> Variant;
    fn wrap(matrix: Matrix<Self>) -> Variant;
    fn matrix_of(variant: &Variant) -> Option<&Matrix<Self>>;
    /// The payload of a scalar variant of exactly this kind.
    fn scalar_of(variant: &Variant) -> Option<Self>;

    /// Total order used when matrices are set members.
    fn total_order(&self, other: &Self) -> Ordering;
}

impl Coefficient for bool {
    const KIND: ValueType = ValueType::Boolean;
    const MATRIX_KIND: ValueType = ValueType::MatrixBoolean;
    const BITS: usize = 1;
    const ZERO: Self = false;
    const ONE: Self = true;

    fn load(column: &[u8], row: usize) -> Self {
        column[row / 8] & (1 << (row % 8)) != 0
    }

    fn store(column: &mut [u8], row: usize, value: Self) {
        let mask = 1u8 << (row % 8);
        if value {
            column[row / 8] |= mask;
        } else {
            column[row / 8] &= !mask;
        }
    }

    fn to_complex(self) -> Complex {
        Complex::from_real(if self { 1.0 } else { 0.0 })
    }

    fn from_complex_exact(value: Complex) -> Option<Self> {
        match (value.real, value.imag) {
            (r, i) if r == 0.0 && i == 0.0 => Some(false),
            (r, i) if r == 1.0 && i == 0.0 => Some(true),
            _ => None,
        }
    }

    fn into_variant(self) -> Variant {
        Variant::Boolean(self)
    }

    fn wrap(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixBoolean(matrix)
    }

    fn matrix_of(variant: &Variant) -> Option<&Matrix<Self>> {
        match variant {
            Variant::MatrixBoolean(m) => Some(m),
            _ => None,
        }
    }

    fn scalar_of(variant: &Variant) -> Option<Self> {
        match variant {
            Variant::Boolean(x) => Some(*x),
            _ => None,
        }
    }

    fn total_order(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Coefficient for i64 {
    const KIND: ValueType = ValueType::Integer;
    const MATRIX_KIND: ValueType = ValueType::MatrixInteger;
    const BITS: usize = 64;
    const ZERO: Self = 0;
    const ONE: Self = 1;

    fn load(column: &[u8], row: usize) -> Self {
        i64::from_ne_bytes(read_word(column, row * 8))
    }

    fn store(column: &mut [u8], row: usize, value: Self) {
        column[row * 8..row * 8 + 8].copy_from_slice(&value.to_ne_bytes());
    }

    fn to_complex(self) -> Complex {
        Complex::from_real(self as f64)
    }

    fn from_complex_exact(value: Complex) -> Option<Self> {
        // 2^63 is the first real that does not fit.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        let real = value.real;
        if value.imag != 0.0 || real.fract() != 0.0 || !(-LIMIT..LIMIT).contains(&real) {
            return None;
        }
        Some(real as i64)
    }

    fn into_variant(self) -> Variant {
        Variant::Integer(self)
    }

    fn wrap(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixInteger(matrix)
    }

    fn matrix_of(variant: &Variant) -> Option<&Matrix<Self>> {
        match variant {
            Variant::MatrixInteger(m) => Some(m),
            _ => None,
        }
    }

    fn scalar_of(variant: &Variant) -> Option<Self> {
        match variant {
            Variant::Integer(x) => Some(*x),
            _ => None,
        }
    }

    fn total_order(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Coefficient for f64 {
    const KIND: ValueType = ValueType::Real;
    const MATRIX_KIND: ValueType = ValueType::MatrixReal;
    const BITS: usize = 64;
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn load(column: &[u8], row: usize) -> Self {
        f64::from_ne_bytes(read_word(column, row * 8))
    }

    fn store(column: &mut [u8], row: usize, value: Self) {
        column[row * 8..row * 8 + 8].copy_from_slice(&value.to_ne_bytes());
    }

    fn to_complex(self) -> Complex {
        Complex::from_real(self)
    }

    fn from_complex_exact(value: Complex) -> Option<Self> {
        (value.imag == 0.0).then_some(value.real)
    }

    fn into_variant(self) -> Variant {
        Variant::Real(self)
    }

    fn wrap(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixReal(matrix)
    }

    fn matrix_of(variant: &Variant) -> Option<&Matrix<Self>> {
        match variant {
            Variant::MatrixReal(m) => Some(m),
            _ => None,
        }
    }

    fn scalar_of(variant: &Variant) -> Option<Self> {
        match variant {
            Variant::Real(x) => Some(*x),
            _ => None,
        }
    }

    fn total_order(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl Coefficient for Complex {
    const KIND: ValueType = ValueType::Complex;
    const MATRIX_KIND: ValueType = ValueType::MatrixComplex;
    const BITS: usize = 128;
    const ZERO: Self = Complex::new(0.0, 0.0);
    const ONE: Self = Complex::new(1.0, 0.0);

    fn load(column: &[u8], row: usize) -> Self {
        let offset = row * 16;
        Complex::new(
            f64::from_ne_bytes(read_word(column, offset)),
            f64::from_ne_bytes(read_word(column, offset + 8)),
        )
    }

    fn store(column: &mut [u8], row: usize, value: Self) {
        let offset = row * 16;
        column[offset..offset + 8].copy_from_slice(&value.real.to_ne_bytes());
        column[offset + 8..offset + 16].copy_from_slice(&value.imag.to_ne_bytes());
    }

    fn conjugate(self) -> Self {
        self.conj()
    }

    fn to_complex(self) -> Complex {
        self
    }

    fn from_complex_exact(value: Complex) -> Option<Self> {
        Some(value)
    }

    fn into_variant(self) -> Variant {
        Variant::Complex(self)
    }

    fn wrap(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixComplex(matrix)
    }

    fn matrix_of(variant: &Variant) -> Option<&Matrix<Self>> {
        match variant {
            Variant::MatrixComplex(m) => Some(m),
            _ => None,
        }
    }

    fn scalar_of(variant: &Variant) -> Option<Self> {
        match variant {
            Variant::Complex(x) => Some(*x),
            _ => None,
        }
    }

    fn total_order(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

/// Element types with ring arithmetic. Integer arithmetic wraps.
pub trait Numeric: Coefficient {
    fn plus(self, rhs: Self) -> Self;
    fn minus(self, rhs: Self) -> Self;
    fn times(self, rhs: Self) -> Self;
    fn negated(self) -> Self;
    fn divided_by(self, rhs: Self) -> ModelResult<Self>;
    /// Absolute value (modulus for complex).
    fn magnitude(self) -> f64;
}

impl Numeric for i64 {
    fn plus(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn minus(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    fn times(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }

    fn negated(self) -> Self {
        self.wrapping_neg()
    }

    fn divided_by(self, rhs: Self) -> ModelResult<Self> {
        if rhs == 0 {
            return raise_or(ModelError::InvalidNumericValue, 0);
        }
        Ok(self.wrapping_div(rhs))
    }

    fn magnitude(self) -> f64 {
        (self as f64).abs()
    }
}

impl Numeric for f64 {
    fn plus(self, rhs: Self) -> Self {
        self + rhs
    }

    fn minus(self, rhs: Self) -> Self {
        self - rhs
    }

    fn times(self, rhs: Self) -> Self {
        self * rhs
    }

    fn negated(self) -> Self {
        -self
    }

    fn divided_by(self, rhs: Self) -> ModelResult<Self> {
        Ok(self / rhs)
    }

    fn magnitude(self) -> f64 {
        self.abs()
    }
}

impl Numeric for Complex {
    fn plus(self, rhs: Self) -> Self {
        self + rhs
    }

    fn minus(self, rhs: Self) -> Self {
        self - rhs
    }

    fn times(self, rhs: Self) -> Self {
        self * rhs
    }

    fn negated(self) -> Self {
        -self
    }

    fn divided_by(self, rhs: Self) -> ModelResult<Self> {
        Ok(self / rhs)
    }

    fn magnitude(self) -> f64 {
        self.norm()
    }
}

/// Element types the decompositions run on.
pub trait Field: Numeric {
    /// Equivalent nalgebra scalar.
    type Backend: nalgebra::ComplexField<RealField = f64> + Copy;

    fn to_backend(self) -> Self::Backend;
    fn from_backend(value: Self::Backend) -> Self;
    fn from_real(value: f64) -> Self;
    fn real_part(self) -> f64;
    fn square_root(self) -> Self;
    fn is_finite_value(self) -> bool;

    fn reciprocal(self) -> Self {
        // Division in a field never raises.
        match Self::ONE.divided_by(self) {
            Ok(value) => value,
            Err(_) => Self::ZERO,
        }
    }
}

impl Field for f64 {
    type Backend = f64;

    fn to_backend(self) -> f64 {
        self
    }

    fn from_backend(value: f64) -> Self {
        value
    }

    fn from_real(value: f64) -> Self {
        value
    }

    fn real_part(self) -> f64 {
        self
    }

    fn square_root(self) -> Self {
        self.sqrt()
    }

    fn is_finite_value(self) -> bool {
        self.is_finite()
    }
}

impl Field for Complex {
    type Backend = nalgebra::Complex<f64>;

    fn to_backend(self) -> nalgebra::Complex<f64> {
        self.into()
    }

    fn from_backend(value: nalgebra::Complex<f64>) -> Self {
        value.into()
    }

    fn from_real(value: f64) -> Self {
        Complex::from_real(value)
    }

    fn real_part(self) -> f64 {
        self.real
    }

    fn square_root(self) -> Self {
        self.sqrt()
    }

    fn is_finite_value(self) -> bool {
        self.is_finite()
    }
}

/// Lattice-permitted element promotion.
pub trait UpcastTo<U: Coefficient>: Coefficient {
    fn upcast(self) -> U;
}

macro_rules! impl_upcast {
    ($($from:ty => $to:ty, |$x:ident| $body:expr;)*) => {
        $(
            impl UpcastTo<$to> for $from {
                fn upcast(self) -> $to {
                    let $x = self;
                    $body
                }
            }
        )*
    };
}

impl_upcast! {
    bool => bool, |x| x;
    bool => i64, |x| i64::from(x);
    bool => f64, |x| if x { 1.0 } else { 0.0 };
    bool => Complex, |x| Complex::from_real(if x { 1.0 } else { 0.0 });
    i64 => i64, |x| x;
    i64 => f64, |x| x as f64;
    i64 => Complex, |x| Complex::from_real(x as f64);
    f64 => f64, |x| x;
    f64 => Complex, |x| Complex::from_real(x);
    Complex => Complex, |x| x;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_packed_booleans() {
        let mut column = [0u8; 2];
        bool::store(&mut column, 0, true);
        bool::store(&mut column, 9, true);
        assert_eq!(column, [0b0000_0001, 0b0000_0010]);
        assert!(bool::load(&column, 9));
        assert!(!bool::load(&column, 8));
        bool::store(&mut column, 0, false);
        assert_eq!(column[0], 0);
    }

    #[test]
    fn test_complex_layout_is_real_then_imaginary() {
        let mut column = [0u8; 32];
        Complex::store(&mut column, 1, Complex::new(1.5, -2.0));
        assert_eq!(f64::load(&column, 2), 1.5);
        assert_eq!(f64::load(&column, 3), -2.0);
        assert_eq!(Complex::load(&column, 1), Complex::new(1.5, -2.0));
    }

    #[test]
    fn test_exact_conversions() {
        assert_eq!(i64::from_complex_exact(Complex::from_real(3.0)), Some(3));
        assert_eq!(i64::from_complex_exact(Complex::from_real(3.5)), None);
        assert_eq!(i64::from_complex_exact(Complex::from_real(9.3e18)), None);
        assert_eq!(bool::from_complex_exact(Complex::from_real(2.0)), None);
        assert_eq!(f64::from_complex_exact(Complex::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_integer_arithmetic_wraps() {
        assert_eq!(i64::MAX.plus(1), i64::MIN);
        assert_eq!(7i64.divided_by(-2).unwrap(), -3);
    }
}
