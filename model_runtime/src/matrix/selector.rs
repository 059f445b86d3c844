//! Row, column and linear subscripts.

use crate::container::{Range, Set, Tuple};
use crate::error::{raise_or, ModelError, ModelResult};
use crate::scalar::Integer;
use crate::value_type::ValueType;
use crate::variant::Variant;

use super::MatrixInteger;

/// Which dimension a subscript addresses; decides the error raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
    Linear,
}

impl Axis {
    pub(crate) fn out_of_bounds(self, requested: i64, bound: usize) -> ModelError {
        match self {
            Axis::Row => ModelError::InvalidRow { requested, bound },
            Axis::Column => ModelError::InvalidColumn { requested, bound },
            Axis::Linear => ModelError::InvalidIndex { requested, bound },
        }
    }
}

/// Convert a 1-based subscript into a 0-based position.
pub(crate) fn checked_position(requested: i64, bound: usize, axis: Axis) -> ModelResult<usize> {
    match usize::try_from(requested) {
        Ok(position) if position >= 1 && position <= bound => Ok(position - 1),
        _ => Err(axis.out_of_bounds(requested, bound)),
    }
}

/// A set of 1-based positions along one axis.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Every position, in order.
    All,
    Index(Integer),
    Range(Range),
    /// Positions in set order.
    Set(Set),
    Tuple(Tuple),
    /// Entries of an integer matrix, in column-major order.
    Indices(MatrixInteger),
}

impl Selector {
    /// Interpret a variant used as a subscript.
    pub fn from_variant(value: &Variant) -> ModelResult<Self> {
        match value {
            Variant::Set(set) => Ok(Selector::Set(set.clone())),
            Variant::Tuple(tuple) => Ok(Selector::Tuple(tuple.clone())),
            Variant::MatrixInteger(matrix) => Ok(Selector::Indices(matrix.clone())),
            Variant::MatrixBoolean(_) | Variant::MatrixReal(_) | Variant::MatrixComplex(_) => {
                match value.convert_to(ValueType::MatrixInteger)? {
                    Variant::MatrixInteger(matrix) => Ok(Selector::Indices(matrix)),
                    _ => Ok(Selector::Indices(MatrixInteger::empty())),
                }
            }
            scalar if scalar.kind().is_scalar() => Ok(Selector::Index(scalar.to_integer()?)),
            other => raise_or(
                ModelError::conversion(other.kind(), ValueType::Integer),
                Selector::Indices(MatrixInteger::empty()),
            ),
        }
    }

    /// Resolve to 0-based positions, checking each against `bound`.
    pub fn resolve(&self, bound: usize, axis: Axis) -> ModelResult<Vec<usize>> {
        match self {
            Selector::All => Ok((0..bound).collect()),
            Selector::Index(index) => Ok(vec![checked_position(*index, bound, axis)?]),
            Selector::Range(range) => resolve_elements(range.iter(), bound, axis),
            Selector::Set(set) => resolve_elements(set.iter(), bound, axis),
            Selector::Tuple(tuple) => resolve_elements(tuple.iter().cloned(), bound, axis),
            Selector::Indices(matrix) => matrix
                .iter()
                .map(|index| checked_position(index, bound, axis))
                .collect(),
        }
    }
}

fn resolve_elements(
    elements: impl Iterator<Item = Variant>,
    bound: usize,
    axis: Axis,
) -> ModelResult<Vec<usize>> {
    let mut positions = Vec::new();
    for element in elements {
        match element.exact_integer() {
            Some(index) => positions.push(checked_position(index, bound, axis)?),
            None => {
                let err = ModelError::InvalidContainerContents {
                    kind: element.kind(),
                };
                // A suppressed error drops the element from the selection.
                raise_or(err, ())?;
            }
        }
    }
    Ok(positions)
}

impl From<Integer> for Selector {
    fn from(index: Integer) -> Self {
        Selector::Index(index)
    }
}

impl From<Range> for Selector {
    fn from(range: Range) -> Self {
        Selector::Range(range)
    }
}

impl From<Set> for Selector {
    fn from(set: Set) -> Self {
        Selector::Set(set)
    }
}

impl From<Tuple> for Selector {
    fn from(tuple: Tuple) -> Self {
        Selector::Tuple(tuple)
    }
}
