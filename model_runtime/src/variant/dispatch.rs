//! Binary and unary operator dispatch on `(lhs.kind, rhs.kind)`.
//!
//! Scalars promote to their best common kind before the operator runs.
//! Matrices promote their elements the same way. Booleans take part in
//! arithmetic as integers. Any pairing without a rule raises
//! `InvalidRuntimeConversion` for the two kinds; the suppressed result is
//! a NaN real (arithmetic) or `false` (comparisons and logic).

use std::cmp::Ordering;

use crate::container::Tuple;
use crate::error::{check_real, raise_or, ModelError, ModelResult};
use crate::matrix::{Field, Numeric};
use crate::scalar::{check_complex, Complex};
use crate::value_type::{best_upcast, ValueType};

use super::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }
}

/// Apply `op` to two variants of any kinds.
pub fn dynamic_binop(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ModelResult<Variant> {
    match op {
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide => arithmetic(op, lhs, rhs),
        BinaryOperator::Equal => Ok(Variant::Boolean(lhs == rhs)),
        BinaryOperator::NotEqual => Ok(Variant::Boolean(lhs != rhs)),
        BinaryOperator::Less => ordered(lhs, rhs, |o| o == Ordering::Less),
        BinaryOperator::LessEqual => ordered(lhs, rhs, |o| o != Ordering::Greater),
        BinaryOperator::Greater => ordered(lhs, rhs, |o| o == Ordering::Greater),
        BinaryOperator::GreaterEqual => ordered(lhs, rhs, |o| o != Ordering::Less),
        BinaryOperator::And | BinaryOperator::Or => logical(op, lhs, rhs),
    }
}

fn illegal(lhs: &Variant, rhs: &Variant) -> ModelResult<Variant> {
    raise_or(
        ModelError::conversion(lhs.kind(), rhs.kind()),
        Variant::Real(f64::NAN),
    )
}

fn ordered(lhs: &Variant, rhs: &Variant, test: fn(Ordering) -> bool) -> ModelResult<Variant> {
    if !lhs.kind().is_scalar() || !rhs.kind().is_scalar() {
        return raise_or(
            ModelError::conversion(lhs.kind(), rhs.kind()),
            Variant::Boolean(false),
        );
    }
    let ordering = lhs.compare_scalars(rhs)?;
    Ok(Variant::Boolean(ordering.is_some_and(test)))
}

fn logical(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ModelResult<Variant> {
    for side in [lhs, rhs] {
        if !side.kind().is_scalar() {
            return raise_or(
                ModelError::conversion(side.kind(), ValueType::Boolean),
                Variant::Boolean(false),
            );
        }
    }
    let (a, b) = (lhs.to_boolean()?, rhs.to_boolean()?);
    Ok(Variant::Boolean(match op {
        BinaryOperator::And => a && b,
        _ => a || b,
    }))
}

// ========== Arithmetic ==========

/// Element type both operands are promoted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arena {
    Integer,
    Real,
    Complex,
}

impl Arena {
    fn of(lhs: ValueType, rhs: ValueType) -> Arena {
        let element = |kind: ValueType| kind.element_kind().unwrap_or(kind);
        match best_upcast(element(lhs), element(rhs)) {
            ValueType::Complex => Arena::Complex,
            ValueType::Real => Arena::Real,
            _ => Arena::Integer,
        }
    }

    /// Narrowest arena with division.
    fn field(self) -> Arena {
        match self {
            Arena::Integer => Arena::Real,
            other => other,
        }
    }
}

fn is_numeric(kind: ValueType) -> bool {
    kind.is_scalar() || kind.is_matrix()
}

fn arithmetic(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ModelResult<Variant> {
    let (l, r) = (lhs.kind(), rhs.kind());
    match (lhs, rhs) {
        (Variant::Tuple(a), Variant::Tuple(b)) => match op {
            BinaryOperator::Multiply => Ok(Variant::Tuple(a.catenate(b))),
            BinaryOperator::Divide => a.divided_by(b).map(Variant::Tuple),
            _ => illegal(lhs, rhs),
        },
        (Variant::Tuple(a), scalar) if r.is_scalar() => match op {
            BinaryOperator::Multiply => a.scaled_by(scalar).map(Variant::Tuple),
            BinaryOperator::Divide => a.divided_by_scalar(scalar).map(Variant::Tuple),
            _ => illegal(lhs, rhs),
        },
        (scalar, Variant::Tuple(b)) if l.is_scalar() && op == BinaryOperator::Multiply => {
            Tuple::scaling(scalar, b).map(Variant::Tuple)
        }
        _ if l.is_scalar() && r.is_scalar() => scalar_arithmetic(op, lhs, rhs),
        _ if is_numeric(l) && is_numeric(r) => {
            let mixed = l.is_scalar() || r.is_scalar();
            if mixed && matches!(op, BinaryOperator::Add | BinaryOperator::Subtract) {
                return illegal(lhs, rhs);
            }
            let arena = Arena::of(l, r);
            if op == BinaryOperator::Divide && r.is_matrix() {
                return match arena.field() {
                    Arena::Complex => matrix_quotient::<Complex>(lhs, rhs),
                    _ => matrix_quotient::<f64>(lhs, rhs),
                };
            }
            match arena {
                Arena::Integer => matrix_arithmetic::<i64>(op, lhs, rhs),
                Arena::Real => matrix_arithmetic::<f64>(op, lhs, rhs),
                Arena::Complex => matrix_arithmetic::<Complex>(op, lhs, rhs),
            }
        }
        _ => illegal(lhs, rhs),
    }
}

fn combine<T: Numeric>(op: BinaryOperator, a: T, b: T) -> ModelResult<T> {
    Ok(match op {
        BinaryOperator::Add => a.plus(b),
        BinaryOperator::Subtract => a.minus(b),
        BinaryOperator::Multiply => a.times(b),
        _ => a.divided_by(b)?,
    })
}

fn scalar_arithmetic(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ModelResult<Variant> {
    Ok(match Arena::of(lhs.kind(), rhs.kind()) {
        Arena::Integer => Variant::Integer(combine(
            op,
            lhs.scalar_operand::<i64>()?,
            rhs.scalar_operand::<i64>()?,
        )?),
        Arena::Real => {
            let value = combine(op, lhs.scalar_operand::<f64>()?, rhs.scalar_operand::<f64>()?)?;
            Variant::Real(check_real(value)?)
        }
        Arena::Complex => {
            let value = combine(
                op,
                lhs.scalar_operand::<Complex>()?,
                rhs.scalar_operand::<Complex>()?,
            )?;
            Variant::Complex(check_complex(value)?)
        }
    })
}

/// `± ×` with at least one matrix operand, and `matrix / scalar`.
fn matrix_arithmetic<T: Numeric>(
    op: BinaryOperator,
    lhs: &Variant,
    rhs: &Variant,
) -> ModelResult<Variant> {
    let result = match (lhs.kind().is_matrix(), rhs.kind().is_matrix()) {
        (true, true) => {
            let a = lhs.matrix_operand::<T>()?;
            let b = rhs.matrix_operand::<T>()?;
            match op {
                BinaryOperator::Add => a.add(&b)?,
                BinaryOperator::Subtract => a.subtract(&b)?,
                _ => a.multiply(&b)?,
            }
        }
        (true, false) => {
            let a = lhs.matrix_operand::<T>()?;
            let s = rhs.scalar_operand::<T>()?;
            match op {
                BinaryOperator::Divide => a.divide_by_scalar(s)?,
                _ => a.scale(s)?,
            }
        }
        _ => {
            let s = lhs.scalar_operand::<T>()?;
            rhs.matrix_operand::<T>()?.apply(|x| s.times(x))?
        }
    };
    Ok(Variant::from(result))
}

/// `A / B = A·B⁻¹` and `s / B = s·B⁻¹`.
fn matrix_quotient<T: Field>(lhs: &Variant, rhs: &Variant) -> ModelResult<Variant> {
    let b = rhs.matrix_operand::<T>()?;
    let result = if lhs.kind().is_matrix() {
        let a = lhs.matrix_operand::<T>()?;
        if a.cols() != b.rows() {
            return Err(ModelError::incompatible(a.shape(), b.shape()));
        }
        // X·B = A  ⇔  Bᵀ·Xᵀ = Aᵀ
        b.transpose()?.solve(&a.transpose()?)?.transpose()?
    } else {
        let s = lhs.scalar_operand::<T>()?;
        b.inverse()?.scale(s)?
    };
    Ok(Variant::from(result))
}

// ========== Operator methods ==========

#[allow(clippy::should_implement_trait)]
impl Variant {
    pub fn add(&self, rhs: &Variant) -> ModelResult<Variant> {
        arithmetic(BinaryOperator::Add, self, rhs)
    }

    pub fn sub(&self, rhs: &Variant) -> ModelResult<Variant> {
        arithmetic(BinaryOperator::Subtract, self, rhs)
    }

    pub fn mul(&self, rhs: &Variant) -> ModelResult<Variant> {
        arithmetic(BinaryOperator::Multiply, self, rhs)
    }

    pub fn div(&self, rhs: &Variant) -> ModelResult<Variant> {
        arithmetic(BinaryOperator::Divide, self, rhs)
    }

    pub fn apply_binary(&self, op: BinaryOperator, rhs: &Variant) -> ModelResult<Variant> {
        dynamic_binop(op, self, rhs)
    }

    /// Unary `+`: booleans become integers, other numeric kinds are unchanged.
    pub fn unary_plus(&self) -> ModelResult<Variant> {
        match self {
            Variant::Boolean(b) => Ok(Variant::Integer(i64::from(*b))),
            Variant::MatrixBoolean(_) => self.upcast_to(ValueType::MatrixInteger),
            other if is_numeric(other.kind()) => Ok(other.clone()),
            other => raise_or(
                ModelError::conversion(other.kind(), ValueType::Integer),
                Variant::Real(f64::NAN),
            ),
        }
    }

    pub fn negate(&self) -> ModelResult<Variant> {
        match self {
            Variant::Boolean(b) => Ok(Variant::Integer(-i64::from(*b))),
            Variant::Integer(i) => Ok(Variant::Integer(i.wrapping_neg())),
            Variant::Real(r) => Ok(Variant::Real(-r)),
            Variant::Complex(z) => Ok(Variant::Complex(-*z)),
            Variant::MatrixBoolean(_) | Variant::MatrixInteger(_) => {
                Ok(Variant::from(self.matrix_operand::<i64>()?.negate()?))
            }
            Variant::MatrixReal(m) => Ok(Variant::from(m.negate()?)),
            Variant::MatrixComplex(m) => Ok(Variant::from(m.negate()?)),
            other => raise_or(
                ModelError::conversion(other.kind(), ValueType::Integer),
                Variant::Real(f64::NAN),
            ),
        }
    }

    /// Logical negation of a scalar's truthiness.
    pub fn logical_not(&self) -> ModelResult<Variant> {
        if !self.kind().is_scalar() {
            return raise_or(
                ModelError::conversion(self.kind(), ValueType::Boolean),
                Variant::Boolean(false),
            );
        }
        Ok(Variant::Boolean(!self.to_boolean()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Tuple;
    use crate::matrix::Matrix;
    use pretty_assertions::assert_eq;

    fn real_matrix(rows: usize, cols: usize, values: &[f64]) -> Variant {
        Variant::from(Matrix::from_row_major(rows, cols, values).unwrap())
    }

    #[test]
    fn test_scalar_promotion() {
        let sum = Variant::from(1).add(&Variant::from(2.5)).unwrap();
        assert_eq!(sum.kind(), ValueType::Real);
        let z = Variant::from(Complex::new(1.0, 1.0))
            .mul(&Variant::from(2))
            .unwrap();
        assert_eq!(z.kind(), ValueType::Complex);
        assert_eq!(z, Variant::from(Complex::new(2.0, 2.0)));
    }

    #[test]
    fn test_boolean_arithmetic_is_integer() {
        let two = Variant::from(true).add(&Variant::from(true)).unwrap();
        assert_eq!(two.kind(), ValueType::Integer);
        assert_eq!(two.exact_integer(), Some(2));
    }

    #[test]
    fn test_integer_division() {
        assert_eq!(
            Variant::from(-7).div(&Variant::from(2)).unwrap().exact_integer(),
            Some(-3)
        );
        assert_eq!(
            Variant::from(1).div(&Variant::from(0)).unwrap_err(),
            ModelError::InvalidNumericValue
        );
        assert_eq!(
            Variant::from(i64::MAX).add(&Variant::from(1)).unwrap().exact_integer(),
            Some(i64::MIN)
        );
    }

    #[test]
    fn test_real_division_guards() {
        assert_eq!(
            Variant::from(1.0).div(&Variant::from(0.0)).unwrap_err(),
            ModelError::ResultIsInfinite
        );
        assert_eq!(
            Variant::from(0.0).div(&Variant::from(0.0)).unwrap_err(),
            ModelError::ResultIsNaN
        );
    }

    #[test]
    fn test_scalar_plus_matrix_is_illegal() {
        let m = real_matrix(1, 1, &[1.0]);
        assert_eq!(
            Variant::from(1).add(&m).unwrap_err(),
            ModelError::conversion(ValueType::Integer, ValueType::MatrixReal)
        );
    }

    #[test]
    fn test_matrix_scaling_and_product() {
        let m = real_matrix(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let doubled = Variant::from(2).mul(&m).unwrap();
        assert_eq!(doubled, real_matrix(2, 2, &[2.0, 4.0, 6.0, 8.0]));
        let squared = m.mul(&m).unwrap();
        assert_eq!(squared, real_matrix(2, 2, &[7.0, 10.0, 15.0, 22.0]));
        let halved = m.div(&Variant::from(2.0)).unwrap();
        assert_eq!(halved, real_matrix(2, 2, &[0.5, 1.0, 1.5, 2.0]));
    }

    #[test]
    fn test_boolean_matrices_add_as_integers() {
        let b = Variant::from(Matrix::from_row_major(1, 2, &[true, false]).unwrap());
        let sum = b.add(&b).unwrap();
        assert_eq!(sum.kind(), ValueType::MatrixInteger);
        assert_eq!(sum.to_string(), "[2, 0]");
    }

    #[test]
    fn test_matrix_division_uses_inverse() {
        let a = real_matrix(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let q = a.div(&a).unwrap();
        let Some(q) = q.as_matrix::<f64>() else {
            panic!("expected a real matrix");
        };
        let residual = q
            .subtract(&Matrix::identity(2).unwrap())
            .unwrap()
            .euclidean_norm();
        assert!(residual < 1e-12);

        let inv = Variant::from(1).div(&a).unwrap();
        let product = a.mul(&inv).unwrap();
        let Some(product) = product.as_matrix::<f64>() else {
            panic!("expected a real matrix");
        };
        assert!(
            product
                .subtract(&Matrix::identity(2).unwrap())
                .unwrap()
                .euclidean_norm()
                < 1e-12
        );

        let wide = real_matrix(1, 3, &[1.0, 2.0, 3.0]);
        assert!(matches!(
            wide.div(&a),
            Err(ModelError::IncompatibleMatrixDimensions { .. })
        ));
    }

    #[test]
    fn test_tuple_rules() {
        let t = Tuple::from_vec(vec![Variant::from(2), Variant::from(4)]);
        let v = Variant::from(t.clone());
        let joined = v.mul(&v).unwrap();
        assert_eq!(joined.as_tuple().map(Tuple::len), Some(4));
        let scaled = Variant::from(3).mul(&v).unwrap();
        assert_eq!(scaled.to_string(), "(6, 12)");
        let halved = v.div(&Variant::from(2)).unwrap();
        assert_eq!(halved.to_string(), "(1, 2)");
        assert!(v.add(&v).is_err());
        assert!(Variant::from(1).div(&v).is_err());
    }

    #[test]
    fn test_comparisons() {
        let lt = dynamic_binop(BinaryOperator::Less, &Variant::from(1), &Variant::from(1.5));
        assert_eq!(lt.unwrap(), Variant::Boolean(true));
        let ge = Variant::from(f64::NAN).apply_binary(BinaryOperator::GreaterEqual, &Variant::from(0));
        assert_eq!(ge.unwrap(), Variant::Boolean(false));
        let eq = dynamic_binop(BinaryOperator::Equal, &Variant::from(2), &Variant::from(2.0));
        assert_eq!(eq.unwrap(), Variant::Boolean(true));
        let m = real_matrix(1, 1, &[1.0]);
        assert!(dynamic_binop(BinaryOperator::Less, &m, &m).is_err());
    }

    #[test]
    fn test_logic_uses_truthiness() {
        let and = dynamic_binop(BinaryOperator::And, &Variant::from(2.0), &Variant::from(0));
        assert_eq!(and.unwrap(), Variant::Boolean(false));
        let or = dynamic_binop(BinaryOperator::Or, &Variant::from(0), &Variant::from(Complex::i()));
        assert_eq!(or.unwrap(), Variant::Boolean(true));
        assert_eq!(
            Variant::from(Tuple::new()).logical_not().unwrap_err(),
            ModelError::conversion(ValueType::Tuple, ValueType::Boolean)
        );
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(Variant::from(true).unary_plus().unwrap().kind(), ValueType::Integer);
        assert_eq!(Variant::from(true).negate().unwrap().exact_integer(), Some(-1));
        let b = Variant::from(Matrix::from_row_major(1, 2, &[true, false]).unwrap());
        assert_eq!(b.unary_plus().unwrap().kind(), ValueType::MatrixInteger);
        assert_eq!(b.negate().unwrap().to_string(), "[-1, 0]");
        assert!(Variant::None.negate().is_err());
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(BinaryOperator::LessEqual.as_str(), "<=");
        assert!(BinaryOperator::Divide.is_arithmetic());
        assert!(!BinaryOperator::Or.is_arithmetic());
    }
}
