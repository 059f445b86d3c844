//! Model-facing matrix operations.
//!
//! These wrap the typed `Matrix<T>` routines for variants: operands are
//! promoted to the element type the routine needs (integers and booleans
//! become reals for factorizations), and multi-part results are returned
//! as tuples in the order models expect, success flag last.

use crate::container::Tuple;
use crate::error::{raise_or, ModelError, ModelResult};
use crate::matrix::{Axis, Coefficient, Matrix, Selector};
use crate::scalar::Complex;
use crate::value_type::{best_upcast, ValueType};

use super::Variant;

fn tuple(items: impl IntoIterator<Item = Variant>) -> Variant {
    Variant::Tuple(items.into_iter().collect::<Tuple>())
}

fn not_a_matrix(value: &Variant) -> ModelResult<Variant> {
    raise_or(
        ModelError::conversion(value.kind(), ValueType::MatrixReal),
        Variant::Real(f64::NAN),
    )
}

fn not_a_matrix_pair(lhs: &Variant, rhs: &Variant) -> ModelResult<Variant> {
    raise_or(
        ModelError::conversion(lhs.kind(), rhs.kind()),
        Variant::Real(f64::NAN),
    )
}

fn no_subscripts<T>(value: &Variant, sentinel: T) -> ModelResult<T> {
    raise_or(
        ModelError::TypeDoesNotSupportSubscripts { kind: value.kind() },
        sentinel,
    )
}

/// Element kind two matrix operands are promoted to.
fn common_element(lhs: &Variant, rhs: &Variant) -> Option<ValueType> {
    if !lhs.kind().is_matrix() || !rhs.kind().is_matrix() {
        return None;
    }
    best_upcast(lhs.kind(), rhs.kind()).element_kind()
}

/// Run `$body` on the matrix promoted to reals (complex stays complex).
macro_rules! field_matrix {
    ($value:expr, |$m:ident| $body:expr) => {
        match $value {
            Variant::MatrixComplex($m) => $body,
            Variant::MatrixBoolean(_) | Variant::MatrixInteger(_) | Variant::MatrixReal(_) => {
                let $m = &$value.matrix_operand::<f64>()?;
                $body
            }
            other => not_a_matrix(other),
        }
    };
}

/// Run `$body` on the matrix with booleans promoted to integers.
macro_rules! numeric_matrix {
    ($value:expr, |$m:ident| $body:expr) => {
        match $value {
            Variant::MatrixComplex($m) => $body,
            Variant::MatrixReal($m) => $body,
            Variant::MatrixInteger($m) => $body,
            Variant::MatrixBoolean(_) => {
                let $m = &$value.matrix_operand::<i64>()?;
                $body
            }
            other => not_a_matrix(other),
        }
    };
}

macro_rules! any_matrix {
    ($value:expr, |$m:ident| $body:expr, $fallback:expr) => {
        match $value {
            Variant::MatrixBoolean($m) => $body,
            Variant::MatrixInteger($m) => $body,
            Variant::MatrixReal($m) => $body,
            Variant::MatrixComplex($m) => $body,
            _ => $fallback,
        }
    };
}

macro_rules! field_pair {
    ($lhs:expr, $rhs:expr, |$a:ident, $b:ident| $body:expr) => {
        match common_element($lhs, $rhs) {
            Some(ValueType::Complex) => {
                let $a = &$lhs.matrix_operand::<Complex>()?;
                let $b = &$rhs.matrix_operand::<Complex>()?;
                $body
            }
            Some(_) => {
                let $a = &$lhs.matrix_operand::<f64>()?;
                let $b = &$rhs.matrix_operand::<f64>()?;
                $body
            }
            None => not_a_matrix_pair($lhs, $rhs),
        }
    };
}

macro_rules! numeric_pair {
    ($lhs:expr, $rhs:expr, |$a:ident, $b:ident| $body:expr) => {
        match common_element($lhs, $rhs) {
            Some(ValueType::Complex) => {
                let $a = &$lhs.matrix_operand::<Complex>()?;
                let $b = &$rhs.matrix_operand::<Complex>()?;
                $body
            }
            Some(ValueType::Real) => {
                let $a = &$lhs.matrix_operand::<f64>()?;
                let $b = &$rhs.matrix_operand::<f64>()?;
                $body
            }
            Some(_) => {
                let $a = &$lhs.matrix_operand::<i64>()?;
                let $b = &$rhs.matrix_operand::<i64>()?;
                $body
            }
            None => not_a_matrix_pair($lhs, $rhs),
        }
    };
}

macro_rules! any_pair {
    ($lhs:expr, $rhs:expr, |$a:ident, $b:ident| $body:expr) => {
        match common_element($lhs, $rhs) {
            Some(ValueType::Boolean) => {
                let $a = &$lhs.matrix_operand::<bool>()?;
                let $b = &$rhs.matrix_operand::<bool>()?;
                $body
            }
            Some(ValueType::Integer) => {
                let $a = &$lhs.matrix_operand::<i64>()?;
                let $b = &$rhs.matrix_operand::<i64>()?;
                $body
            }
            Some(ValueType::Real) => {
                let $a = &$lhs.matrix_operand::<f64>()?;
                let $b = &$rhs.matrix_operand::<f64>()?;
                $body
            }
            Some(_) => {
                let $a = &$lhs.matrix_operand::<Complex>()?;
                let $b = &$rhs.matrix_operand::<Complex>()?;
                $body
            }
            None => not_a_matrix_pair($lhs, $rhs),
        }
    };
}

fn assign_block<T: Coefficient>(
    matrix: &mut Matrix<T>,
    rows: &Selector,
    cols: &Selector,
    value: &Variant,
) -> ModelResult<()> {
    let block = if value.kind().is_scalar() {
        let element = value.convert_to(T::KIND)?;
        let height = rows.resolve(matrix.rows(), Axis::Row)?.len();
        let width = cols.resolve(matrix.cols(), Axis::Column)?.len();
        Matrix::filled(height, width, T::scalar_of(&element).unwrap_or(T::ZERO))?
    } else {
        let converted = value.convert_to(T::MATRIX_KIND)?;
        T::matrix_of(&converted).cloned().unwrap_or_default()
    };
    matrix.update(rows, cols, &block)
}

fn assign_linear<T: Coefficient>(matrix: &mut Matrix<T>, index: i64, value: &Variant) -> ModelResult<()> {
    let element = value.convert_to(T::KIND)?;
    matrix.set_at(index, T::scalar_of(&element).unwrap_or(T::ZERO))
}

impl Variant {
    // ========== Factorizations ==========

    /// `(P, L, U, nonSingular)`
    pub fn plu(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.plu()?;
            Ok(tuple([
                Variant::from(f.p),
                Variant::from(f.l),
                Variant::from(f.u),
                Variant::Boolean(f.non_singular),
            ]))
        })
    }

    /// `(U, S, Vᴴ, ok)`
    pub fn svd(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.svd()?;
            Ok(tuple([
                Variant::from(f.u),
                Variant::from(f.s),
                Variant::from(f.v_adjoint),
                Variant::Boolean(f.ok),
            ]))
        })
    }

    /// `(Q, R, ok)`
    pub fn qr(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.qr()?;
            Ok(tuple([Variant::from(f.q), Variant::from(f.r), Variant::Boolean(f.ok)]))
        })
    }

    /// `(L, Q, ok)`
    pub fn lq(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.lq()?;
            Ok(tuple([Variant::from(f.l), Variant::from(f.q), Variant::Boolean(f.ok)]))
        })
    }

    pub fn cholesky(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| Ok(Variant::from(m.cholesky()?)))
    }

    pub fn upper_cholesky(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| Ok(Variant::from(m.upper_cholesky()?)))
    }

    /// `(L, D, P, nonSingular)`
    pub fn bunch_kaufman(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.bunch_kaufman()?;
            Ok(tuple([
                Variant::from(f.factor),
                Variant::from(f.block_diagonal),
                Variant::from(f.p),
                Variant::Boolean(f.non_singular),
            ]))
        })
    }

    /// `(U, D, P, nonSingular)`
    pub fn upper_bunch_kaufman(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.upper_bunch_kaufman()?;
            Ok(tuple([
                Variant::from(f.factor),
                Variant::from(f.block_diagonal),
                Variant::from(f.p),
                Variant::Boolean(f.non_singular),
            ]))
        })
    }

    /// `(Q, H)`
    pub fn hessenberg(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.hessenberg()?;
            Ok(tuple([Variant::from(f.q), Variant::from(f.h)]))
        })
    }

    /// `(Q, U, W, ok)`
    pub fn schur(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.schur()?;
            Ok(tuple([
                Variant::from(f.q),
                Variant::from(f.u),
                Variant::from(f.w),
                Variant::Boolean(f.ok),
            ]))
        })
    }

    /// `(λ, Q, U, v₁, …, vₙ)`
    pub fn eigenvectors(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.eigenvectors()?;
            let head = [Variant::from(f.values), Variant::from(f.q), Variant::from(f.u)];
            Ok(tuple(head.into_iter().chain(f.vectors.into_iter().map(Variant::from))))
        })
    }

    /// `(D_row, D_col, ok)`
    pub fn equilibrate(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| {
            let f = m.equilibrate()?;
            Ok(tuple([Variant::from(f.row), Variant::from(f.col), Variant::Boolean(f.ok)]))
        })
    }

    // ========== Solvers ==========

    pub fn determinant(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| Ok(m.determinant()?.into_variant()))
    }

    pub fn inverse(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| Ok(Variant::from(m.inverse()?)))
    }

    /// `X` with `A·X = B`.
    pub fn solve(&self, rhs: &Variant) -> ModelResult<Variant> {
        field_pair!(self, rhs, |a, b| Ok(Variant::from(a.solve(b)?)))
    }

    /// `X` minimizing `‖A·X − B‖₂`; singular values at or below `tolerance` are dropped.
    pub fn least_squares(&self, rhs: &Variant, tolerance: f64) -> ModelResult<Variant> {
        field_pair!(self, rhs, |a, b| Ok(Variant::from(a.least_squares(b, tolerance)?)))
    }

    pub fn condition_number(&self) -> ModelResult<Variant> {
        field_matrix!(self, |m| Ok(Variant::Real(m.condition_number()?)))
    }

    pub fn rank(&self, tolerance: f64) -> ModelResult<Variant> {
        field_matrix!(self, |m| Ok(Variant::Integer(m.rank(tolerance)?)))
    }

    pub fn dft(&self) -> ModelResult<Variant> {
        if !self.kind().is_matrix() {
            return not_a_matrix(self);
        }
        Ok(Variant::from(self.matrix_operand::<Complex>()?.dft()?))
    }

    pub fn idft(&self) -> ModelResult<Variant> {
        if !self.kind().is_matrix() {
            return not_a_matrix(self);
        }
        Ok(Variant::from(self.matrix_operand::<Complex>()?.idft()?))
    }

    // ========== Norms ==========

    pub fn p_norm(&self, p: f64) -> ModelResult<Variant> {
        numeric_matrix!(self, |m| Ok(Variant::Real(m.p_norm(p)?)))
    }

    pub fn one_norm(&self) -> ModelResult<Variant> {
        numeric_matrix!(self, |m| Ok(Variant::Real(m.one_norm())))
    }

    pub fn infinity_norm(&self) -> ModelResult<Variant> {
        numeric_matrix!(self, |m| Ok(Variant::Real(m.infinity_norm())))
    }

    pub fn euclidean_norm(&self) -> ModelResult<Variant> {
        numeric_matrix!(self, |m| Ok(Variant::Real(m.euclidean_norm())))
    }

    pub fn trace(&self) -> ModelResult<Variant> {
        numeric_matrix!(self, |m| Ok(m.trace().into_variant()))
    }

    // ========== Element-wise and structural ==========

    pub fn hadamard(&self, other: &Variant) -> ModelResult<Variant> {
        numeric_pair!(self, other, |a, b| Ok(Variant::from(a.hadamard(b)?)))
    }

    pub fn kronecker(&self, other: &Variant) -> ModelResult<Variant> {
        numeric_pair!(self, other, |a, b| Ok(Variant::from(a.kronecker(b)?)))
    }

    pub fn combine_left_to_right(&self, other: &Variant) -> ModelResult<Variant> {
        any_pair!(self, other, |a, b| Ok(Variant::from(a.combine_left_to_right(b)?)))
    }

    pub fn combine_top_to_bottom(&self, other: &Variant) -> ModelResult<Variant> {
        any_pair!(self, other, |a, b| Ok(Variant::from(a.combine_top_to_bottom(b)?)))
    }

    pub fn transpose(&self) -> ModelResult<Variant> {
        any_matrix!(self, |m| Ok(Variant::from(m.transpose()?)), not_a_matrix(self))
    }

    pub fn adjoint(&self) -> ModelResult<Variant> {
        any_matrix!(self, |m| Ok(Variant::from(m.adjoint()?)), not_a_matrix(self))
    }

    /// Complex conjugate; scalars are accepted.
    pub fn conj(&self) -> ModelResult<Variant> {
        match self {
            Variant::Complex(z) => Ok(Variant::Complex(z.conj())),
            scalar if scalar.kind().is_scalar() => Ok(scalar.clone()),
            _ => any_matrix!(self, |m| Ok(Variant::from(m.conj()?)), not_a_matrix(self)),
        }
    }

    pub fn row_reverse(&self) -> ModelResult<Variant> {
        any_matrix!(self, |m| Ok(Variant::from(m.row_reverse()?)), not_a_matrix(self))
    }

    pub fn column_reverse(&self) -> ModelResult<Variant> {
        any_matrix!(self, |m| Ok(Variant::from(m.column_reverse()?)), not_a_matrix(self))
    }

    pub fn diagonal_entries(&self) -> ModelResult<Variant> {
        any_matrix!(self, |m| Ok(Variant::from(m.diagonal_entries()?)), not_a_matrix(self))
    }

    // ========== Predicates ==========
    // Non-matrix values satisfy none of these.

    pub fn is_square(&self) -> bool {
        any_matrix!(self, |m| m.is_square(), false)
    }

    pub fn is_symmetric(&self) -> bool {
        any_matrix!(self, |m| m.is_symmetric(), false)
    }

    pub fn is_hermitian(&self) -> bool {
        any_matrix!(self, |m| m.is_hermitian(), false)
    }

    pub fn is_skew_symmetric(&self) -> bool {
        self.numeric_predicate(|m| m.is_skew_symmetric(), |m| m.is_skew_symmetric(), |m| {
            m.is_skew_symmetric()
        })
    }

    pub fn is_skew_hermitian(&self) -> bool {
        self.numeric_predicate(|m| m.is_skew_hermitian(), |m| m.is_skew_hermitian(), |m| {
            m.is_skew_hermitian()
        })
    }

    pub fn is_normal(&self) -> bool {
        self.numeric_predicate(|m| m.is_normal(), |m| m.is_normal(), |m| m.is_normal())
    }

    fn numeric_predicate(
        &self,
        integer: impl Fn(&Matrix<i64>) -> bool,
        real: impl Fn(&Matrix<f64>) -> bool,
        complex: impl Fn(&Matrix<Complex>) -> bool,
    ) -> bool {
        match self {
            Variant::MatrixBoolean(_) => self.matrix_operand::<i64>().is_ok_and(|m| integer(&m)),
            Variant::MatrixInteger(m) => integer(m),
            Variant::MatrixReal(m) => real(m),
            Variant::MatrixComplex(m) => complex(m),
            _ => false,
        }
    }

    // ========== Subscripts ==========

    /// `value[rows, cols]`; two scalar subscripts pick a single element.
    pub fn subscript(&self, rows: &Variant, cols: &Variant) -> ModelResult<Variant> {
        if !self.kind().is_matrix() {
            return no_subscripts(self, Variant::Real(f64::NAN));
        }
        if rows.kind().is_scalar() && cols.kind().is_scalar() {
            let (r, c) = (rows.to_integer()?, cols.to_integer()?);
            return any_matrix!(self, |m| Ok(m.get(r, c)?.into_variant()), not_a_matrix(self));
        }
        let rows = Selector::from_variant(rows)?;
        let cols = Selector::from_variant(cols)?;
        any_matrix!(self, |m| Ok(Variant::from(m.slice(&rows, &cols)?)), not_a_matrix(self))
    }

    /// `value[index]`: tuple element, matrix element or column of matrix elements.
    pub fn subscript_linear(&self, index: &Variant) -> ModelResult<Variant> {
        match self {
            Variant::Tuple(t) => Ok(t.get(index.to_integer()?)?.clone()),
            matrix if matrix.kind().is_matrix() => {
                if index.kind().is_scalar() {
                    let i = index.to_integer()?;
                    return any_matrix!(self, |m| Ok(m.at(i)?.into_variant()), not_a_matrix(self));
                }
                let indices = Selector::from_variant(index)?;
                any_matrix!(self, |m| Ok(Variant::from(m.slice_linear(&indices)?)), not_a_matrix(self))
            }
            other => no_subscripts(other, Variant::Real(f64::NAN)),
        }
    }

    /// `value[rows, cols] = block`. A scalar block fills the selection; the
    /// block is converted losslessly to the matrix's element kind.
    pub fn assign_subscript(&mut self, rows: &Variant, cols: &Variant, block: &Variant) -> ModelResult<()> {
        let kind = self.kind();
        if !kind.is_matrix() {
            return raise_or(ModelError::TypeDoesNotSupportSubscripts { kind }, ());
        }
        let rows = Selector::from_variant(rows)?;
        let cols = Selector::from_variant(cols)?;
        match self {
            Variant::MatrixBoolean(m) => assign_block(m, &rows, &cols, block),
            Variant::MatrixInteger(m) => assign_block(m, &rows, &cols, block),
            Variant::MatrixReal(m) => assign_block(m, &rows, &cols, block),
            Variant::MatrixComplex(m) => assign_block(m, &rows, &cols, block),
            _ => Ok(()),
        }
    }

    /// `value[index] = element` for tuples and matrices.
    pub fn assign_linear(&mut self, index: &Variant, element: &Variant) -> ModelResult<()> {
        let kind = self.kind();
        if !matches!(self, Variant::Tuple(_)) && !kind.is_matrix() {
            return raise_or(ModelError::TypeDoesNotSupportSubscripts { kind }, ());
        }
        let index = index.to_integer()?;
        match self {
            Variant::Tuple(t) => t.set(index, element.clone()),
            Variant::MatrixBoolean(m) => assign_linear(m, index, element),
            Variant::MatrixInteger(m) => assign_linear(m, index, element),
            Variant::MatrixReal(m) => assign_linear(m, index, element),
            Variant::MatrixComplex(m) => assign_linear(m, index, element),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn real(rows: usize, cols: usize, values: &[f64]) -> Variant {
        Variant::from(Matrix::from_row_major(rows, cols, values).unwrap())
    }

    fn parts(value: &Variant) -> Vec<Variant> {
        value.as_tuple().map(|t| t.as_slice().to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_factorization_tuples() {
        let a = real(3, 3, &[4.0, 1.0, 2.0, 1.0, 5.0, 3.0, 2.0, 3.0, 6.0]);
        let plu = parts(&a.plu().unwrap());
        assert_eq!(plu.len(), 4);
        assert_eq!(plu[3], Variant::Boolean(true));
        let svd = parts(&a.svd().unwrap());
        assert_eq!(svd.iter().map(Variant::kind).collect::<Vec<_>>(), vec![
            ValueType::MatrixReal,
            ValueType::MatrixReal,
            ValueType::MatrixReal,
            ValueType::Boolean,
        ]);
        assert_eq!(parts(&a.qr().unwrap()).len(), 3);
        assert_eq!(parts(&a.hessenberg().unwrap()).len(), 2);
        let schur = parts(&a.schur().unwrap());
        assert_eq!(schur[2].kind(), ValueType::MatrixComplex);
        let eigen = parts(&a.eigenvectors().unwrap());
        assert_eq!(eigen.len(), 3 + 3);
        assert_eq!(parts(&a.bunch_kaufman().unwrap())[3], Variant::Boolean(true));
    }

    #[test]
    fn test_integer_matrices_promote_to_real() {
        let a = Variant::from(Matrix::from_row_major(2, 2, &[2i64, 1, 1, 3]).unwrap());
        let det = a.determinant().unwrap();
        assert_eq!(det.kind(), ValueType::Real);
        assert!((det.to_real().unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(a.inverse().unwrap().kind(), ValueType::MatrixReal);
        assert_eq!(a.trace().unwrap(), Variant::Integer(5));
        assert_eq!(a.rank(1e-12).unwrap(), Variant::Integer(2));
    }

    #[test]
    fn test_solve_promotes_to_complex() {
        let a = real(2, 2, &[2.0, 0.0, 0.0, 4.0]);
        let b = Variant::from(
            Matrix::column_vector(&[Complex::new(2.0, 2.0), Complex::new(4.0, 0.0)]).unwrap(),
        );
        let x = a.solve(&b).unwrap();
        assert_eq!(x.kind(), ValueType::MatrixComplex);
        assert_eq!(x.subscript_linear(&Variant::from(1)).unwrap(), Variant::from(Complex::new(1.0, 1.0)));
    }

    #[test]
    fn test_combiners_promote_elements() {
        let b = Variant::from(Matrix::from_row_major(1, 1, &[true]).unwrap());
        let i = Variant::from(Matrix::from_row_major(1, 1, &[7i64]).unwrap());
        let joined = b.combine_left_to_right(&i).unwrap();
        assert_eq!(joined.to_string(), "[1, 7]");
        assert_eq!(b.combine_top_to_bottom(&b).unwrap().to_string(), "[true; true]");
    }

    #[test]
    fn test_predicates() {
        let s = real(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(s.is_square() && s.is_symmetric() && s.is_normal());
        assert!(!s.is_skew_symmetric());
        let k = real(2, 2, &[0.0, 1.0, -1.0, 0.0]);
        assert!(k.is_skew_symmetric() && k.is_skew_hermitian());
        assert!(!Variant::from(1).is_square());
    }

    #[test]
    fn test_subscripts() {
        let m = Variant::from(
            Matrix::from_fn(3, 3, |r, c| (10 * (r + 1) + c + 1) as i64).unwrap(),
        );
        assert_eq!(m.subscript(&Variant::from(2), &Variant::from(3)).unwrap(), Variant::Integer(23));
        let rows = Variant::from(Tuple::from_vec(vec![Variant::from(1), Variant::from(3)]));
        let block = m.subscript(&rows, &Variant::from(2)).unwrap();
        assert_eq!(block.to_string(), "[12; 32]");
        assert_eq!(m.subscript_linear(&Variant::from(4)).unwrap(), Variant::Integer(12));
        assert_eq!(
            Variant::from(1.5).subscript_linear(&Variant::from(1)).unwrap_err(),
            ModelError::TypeDoesNotSupportSubscripts { kind: ValueType::Real }
        );
    }

    #[test]
    fn test_assignment_converts_losslessly() {
        let mut m = Variant::from(Matrix::<i64>::zero(2, 2).unwrap());
        m.assign_subscript(&Variant::from(1), &Variant::from(2), &Variant::from(5.0))
            .unwrap();
        m.assign_linear(&Variant::from(4), &Variant::from(true)).unwrap();
        assert_eq!(m.to_string(), "[0, 5; 0, 1]");
        let err = m
            .assign_linear(&Variant::from(1), &Variant::from(0.5))
            .unwrap_err();
        assert_eq!(err, ModelError::conversion(ValueType::Real, ValueType::Integer));

        let mut t = Variant::from(Tuple::from_vec(vec![Variant::from(1)]));
        t.assign_linear(&Variant::from(1), &Variant::from(2.5)).unwrap();
        assert_eq!(t.to_string(), "(2.5)");
    }

    #[test]
    fn test_dft_of_real_matrix() {
        let v = real(4, 1, &[1.0, 1.0, 1.0, 1.0]);
        let f = v.dft().unwrap();
        assert_eq!(f.kind(), ValueType::MatrixComplex);
        assert_eq!(f.subscript_linear(&Variant::from(1)).unwrap(), Variant::from(4.0));
        assert!(Variant::from(1).dft().is_err());
    }
}
