//! Kind conversions: lossless translation, lattice upcasts and projections.

use crate::container::{Set, Tuple};
use crate::error::{raise_or, ModelError, ModelResult};
use crate::matrix::{Coefficient, Matrix};
use crate::scalar::Complex;
use crate::value_type::ValueType;

use super::Variant;

/// 2⁶³ as a float; the first value past `i64::MAX`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// `x` as an integer when it is integral and in range.
pub(crate) fn integral(x: f64) -> Option<i64> {
    (x.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&x)).then_some(x as i64)
}

/// True when `i` survives a round trip through `f64`.
fn fits_real(i: i64) -> bool {
    let r = i as f64;
    r < TWO_POW_63 && r as i64 == i
}

/// Value-dependent lossless translation between two scalar kinds.
fn scalar_translates(value: &Variant, target: ValueType) -> bool {
    use ValueType as K;
    match (value, target) {
        (v, t) if v.kind() == t => true,
        (Variant::Boolean(_), K::Integer | K::Real | K::Complex) => true,
        (Variant::Integer(i), K::Boolean) => *i == 0 || *i == 1,
        (Variant::Integer(i), K::Real | K::Complex) => fits_real(*i),
        (Variant::Real(r), K::Boolean) => *r == 0.0 || *r == 1.0,
        (Variant::Real(r), K::Integer) => integral(*r).is_some(),
        (Variant::Real(_), K::Complex) => true,
        (Variant::Complex(z), K::Boolean) => z.imag == 0.0 && (z.real == 0.0 || z.real == 1.0),
        (Variant::Complex(z), K::Integer) => z.imag == 0.0 && integral(z.real).is_some(),
        (Variant::Complex(z), K::Real) => z.imag == 0.0,
        _ => false,
    }
}

/// Convert a scalar to another scalar kind, rounding where the target cannot
/// hold the value exactly.
fn convert_scalar(value: &Variant, target: ValueType) -> Variant {
    let z = value.lattice_complex().unwrap_or_default();
    match target {
        ValueType::Boolean => Variant::Boolean(z.real != 0.0 || z.imag != 0.0),
        ValueType::Integer => match value {
            Variant::Integer(i) => Variant::Integer(*i),
            Variant::Boolean(b) => Variant::Integer(i64::from(*b)),
            _ => Variant::Integer(integral(z.real).unwrap_or(0)),
        },
        ValueType::Real => match value {
            Variant::Integer(i) => Variant::Real(*i as f64),
            _ => Variant::Real(z.real),
        },
        _ => Variant::Complex(match value {
            Variant::Integer(i) => Complex::from_real(*i as f64),
            _ => z,
        }),
    }
}

fn convert_elements<T: Coefficient, U: Coefficient>(matrix: &Matrix<T>) -> ModelResult<Matrix<U>> {
    matrix.apply(|x| U::scalar_of(&convert_scalar(&x.into_variant(), U::KIND)).unwrap_or(U::ZERO))
}

fn elements_translate<T: Coefficient>(matrix: &Matrix<T>, target: ValueType) -> bool {
    matrix
        .iter()
        .all(|x| scalar_translates(&x.into_variant(), target))
}

impl Variant {
    /// The failure value a suppressed conversion to `kind` yields.
    pub fn sentinel(kind: ValueType) -> Variant {
        match kind {
            ValueType::Boolean => Variant::Boolean(false),
            ValueType::Integer => Variant::Integer(0),
            ValueType::Real => Variant::Real(f64::NAN),
            ValueType::Complex => Variant::Complex(Complex::new(f64::NAN, f64::NAN)),
            ValueType::Set => Variant::Set(Set::new()),
            ValueType::Tuple => Variant::Tuple(Tuple::new()),
            ValueType::MatrixBoolean => Variant::MatrixBoolean(Matrix::empty()),
            ValueType::MatrixInteger => Variant::MatrixInteger(Matrix::empty()),
            ValueType::MatrixReal => Variant::MatrixReal(Matrix::empty()),
            ValueType::MatrixComplex => Variant::MatrixComplex(Matrix::empty()),
            ValueType::None | ValueType::Variant => Variant::None,
        }
    }

    // ========== Lattice projections ==========

    pub(crate) fn lattice_integer(&self) -> Option<i64> {
        match self {
            Variant::Boolean(b) => Some(i64::from(*b)),
            Variant::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub(crate) fn lattice_real(&self) -> Option<f64> {
        match self {
            Variant::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Variant::Integer(i) => Some(*i as f64),
            Variant::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub(crate) fn lattice_complex(&self) -> Option<Complex> {
        match self {
            Variant::Complex(z) => Some(*z),
            other => other.lattice_real().map(Complex::from_real),
        }
    }

    /// Real value of a scalar with no imaginary part.
    pub fn real_value(&self) -> Option<f64> {
        match self {
            Variant::Complex(z) if z.imag == 0.0 => Some(z.real),
            other => other.lattice_real(),
        }
    }

    /// Integer value of a scalar that holds one exactly.
    pub fn exact_integer(&self) -> Option<i64> {
        match self {
            Variant::Boolean(_) | Variant::Integer(_) => self.lattice_integer(),
            other => other.real_value().and_then(integral),
        }
    }

    // ========== Projections used by operators ==========

    /// Truthiness of a scalar: anything but zero is true.
    pub fn to_boolean(&self) -> ModelResult<bool> {
        match self.lattice_complex() {
            Some(z) => Ok(z.real != 0.0 || z.imag != 0.0),
            None => raise_or(ModelError::conversion(self.kind(), ValueType::Boolean), false),
        }
    }

    pub fn to_integer(&self) -> ModelResult<i64> {
        match self.exact_integer() {
            Some(i) => Ok(i),
            None => raise_or(ModelError::conversion(self.kind(), ValueType::Integer), 0),
        }
    }

    pub fn to_real(&self) -> ModelResult<f64> {
        match self.real_value() {
            Some(r) => Ok(r),
            None => raise_or(ModelError::conversion(self.kind(), ValueType::Real), f64::NAN),
        }
    }

    pub fn to_complex(&self) -> ModelResult<Complex> {
        match self.lattice_complex() {
            Some(z) => Ok(z),
            None => raise_or(
                ModelError::conversion(self.kind(), ValueType::Complex),
                Complex::new(f64::NAN, f64::NAN),
            ),
        }
    }

    // ========== Kind conversion ==========

    /// True if converting to `kind` and back reproduces this exact value.
    pub fn can_translate_to(&self, kind: ValueType) -> bool {
        if self.kind() == kind {
            return kind != ValueType::Variant;
        }
        match self {
            scalar if scalar.kind().is_scalar() && kind.is_scalar() => {
                scalar_translates(scalar, kind)
            }
            Variant::MatrixBoolean(m) => matrix_translates(m, kind),
            Variant::MatrixInteger(m) => matrix_translates(m, kind),
            Variant::MatrixReal(m) => matrix_translates(m, kind),
            Variant::MatrixComplex(m) => matrix_translates(m, kind),
            _ => false,
        }
    }

    /// Lossless conversion; raises `InvalidRuntimeConversion` when information
    /// would be lost.
    pub fn convert_to(&self, kind: ValueType) -> ModelResult<Variant> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        if !self.can_translate_to(kind) {
            return raise_or(
                ModelError::conversion(self.kind(), kind),
                Variant::sentinel(kind),
            );
        }
        self.translate(kind)
    }

    /// Promotion along the lattice; rounding (integer to real) is allowed.
    pub fn upcast_to(&self, kind: ValueType) -> ModelResult<Variant> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        if !self.kind().can_upcast_to(kind) {
            return raise_or(
                ModelError::conversion(self.kind(), kind),
                Variant::sentinel(kind),
            );
        }
        self.translate(kind)
    }

    fn translate(&self, kind: ValueType) -> ModelResult<Variant> {
        Ok(match kind {
            k if k.is_scalar() => convert_scalar(self, k),
            ValueType::MatrixBoolean => Variant::from(self.matrix_elements::<bool>()?),
            ValueType::MatrixInteger => Variant::from(self.matrix_elements::<i64>()?),
            ValueType::MatrixReal => Variant::from(self.matrix_elements::<f64>()?),
            ValueType::MatrixComplex => Variant::from(self.matrix_elements::<Complex>()?),
            _ => self.clone(),
        })
    }

    fn matrix_elements<U: Coefficient>(&self) -> ModelResult<Matrix<U>> {
        match self {
            Variant::MatrixBoolean(m) => convert_elements(m),
            Variant::MatrixInteger(m) => convert_elements(m),
            Variant::MatrixReal(m) => convert_elements(m),
            Variant::MatrixComplex(m) => convert_elements(m),
            _ => Ok(Matrix::empty()),
        }
    }

    /// Matrix of `T`, promoting along the lattice.
    pub(crate) fn matrix_operand<T: Coefficient>(&self) -> ModelResult<Matrix<T>> {
        let promoted = self.upcast_to(T::MATRIX_KIND)?;
        Ok(T::matrix_of(&promoted).cloned().unwrap_or_default())
    }

    /// Scalar of `T`, promoting along the lattice.
    pub(crate) fn scalar_operand<T: Coefficient>(&self) -> ModelResult<T> {
        let promoted = self.upcast_to(T::KIND)?;
        Ok(T::scalar_of(&promoted).unwrap_or(T::ZERO))
    }
}

fn matrix_translates<T: Coefficient>(matrix: &Matrix<T>, kind: ValueType) -> bool {
    match kind.element_kind() {
        Some(element) => elements_translate(matrix, element),
        None => false,
    }
}
