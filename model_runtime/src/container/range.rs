//! Range - lazy arithmetic progression `first, first + step, …, last`.
//!
//! Ranges are value types: copying one is cheap and every call to `iter`
//! restarts from `first`.

// SAFETY: f64→usize casts in the element count use `.floor()` on a ratio that
// was checked to be non-negative and finite; i128→usize goes through try_from.
#![allow(clippy::cast_sign_loss)]

use std::fmt;

use crate::error::{raise_or, ModelError, ModelResult, RangePosition};
use crate::value_type::ValueType;
use crate::variant::Variant;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Progression {
    Integer { first: i64, step: i64 },
    Real { first: f64, step: f64 },
}

/// A finite arithmetic progression of integers or reals.
///
/// `last` is part of the sequence when it lies on the grid; otherwise the
/// sequence stops at the final grid point before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    progression: Progression,
    len: usize,
}

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Integer(i64),
    Real(f64),
}

impl Endpoint {
    fn read(value: &Variant, position: RangePosition) -> ModelResult<Option<Self>> {
        match value {
            Variant::Integer(i) => Ok(Some(Endpoint::Integer(*i))),
            Variant::Real(r) if r.is_finite() => Ok(Some(Endpoint::Real(*r))),
            other => raise_or(
                ModelError::InvalidRangeParameter {
                    position,
                    kind: other.kind(),
                },
                None,
            ),
        }
    }

    fn real(self) -> f64 {
        match self {
            Endpoint::Integer(i) => i as f64,
            Endpoint::Real(r) => r,
        }
    }
}

fn invalid(position: RangePosition, kind: ValueType) -> ModelResult<Range> {
    raise_or(ModelError::InvalidRangeParameter { position, kind }, Range::empty())
}

impl Range {
    /// Range with no elements.
    pub fn empty() -> Self {
        Range {
            progression: Progression::Integer { first: 0, step: 1 },
            len: 0,
        }
    }

    /// `first, first + 1, …, last`.
    pub fn new(first: &Variant, last: &Variant) -> ModelResult<Self> {
        Self::build(first, None, last)
    }

    /// `first, second, …, last` with `step = second − first`.
    pub fn with_second(first: &Variant, second: &Variant, last: &Variant) -> ModelResult<Self> {
        Self::build(first, Some(second), last)
    }

    /// Integer range with unit step.
    pub fn integers(first: i64, last: i64) -> ModelResult<Self> {
        Self::new(&Variant::Integer(first), &Variant::Integer(last))
    }

    fn build(first: &Variant, second: Option<&Variant>, last: &Variant) -> ModelResult<Self> {
        let Some(start) = Endpoint::read(first, RangePosition::First)? else {
            return Ok(Range::empty());
        };
        let next = match second {
            Some(value) => match Endpoint::read(value, RangePosition::Second)? {
                Some(endpoint) => Some(endpoint),
                None => return Ok(Range::empty()),
            },
            None => None,
        };
        let Some(end) = Endpoint::read(last, RangePosition::Last)? else {
            return Ok(Range::empty());
        };
        let second_kind = second.map_or(ValueType::Integer, Variant::kind);

        match (start, next, end) {
            (Endpoint::Integer(f), None | Some(Endpoint::Integer(_)), Endpoint::Integer(l)) => {
                let step = match next {
                    Some(Endpoint::Integer(s)) => i128::from(s) - i128::from(f),
                    _ => 1,
                };
                Self::integer_progression(f, step, l, second_kind, last.kind())
            }
            _ => {
                let f = start.real();
                let step = next.map_or(1.0, |s| s.real() - f);
                Self::real_progression(f, step, end.real(), second_kind, last.kind())
            }
        }
    }

    fn integer_progression(
        first: i64,
        step: i128,
        last: i64,
        second_kind: ValueType,
        last_kind: ValueType,
    ) -> ModelResult<Self> {
        let Ok(step64) = i64::try_from(step) else {
            return invalid(RangePosition::Second, second_kind);
        };
        if step64 == 0 {
            return invalid(RangePosition::Second, second_kind);
        }
        let span = i128::from(last) - i128::from(first);
        if span != 0 && (span < 0) != (step < 0) {
            return invalid(RangePosition::Last, last_kind);
        }
        let Ok(len) = usize::try_from(span / step + 1) else {
            return invalid(RangePosition::Last, last_kind);
        };
        Ok(Range {
            progression: Progression::Integer {
                first,
                step: step64,
            },
            len,
        })
    }

    fn real_progression(
        first: f64,
        step: f64,
        last: f64,
        second_kind: ValueType,
        last_kind: ValueType,
    ) -> ModelResult<Self> {
        if step == 0.0 || !step.is_finite() {
            return invalid(RangePosition::Second, second_kind);
        }
        let ratio = (last - first) / step;
        if ratio < 0.0 || !ratio.is_finite() {
            return invalid(RangePosition::Last, last_kind);
        }
        // Absorb rounding in the ratio so that `0, 0.1 … 0.3` keeps 0.3.
        let count = (ratio * (1.0 + 8.0 * f64::EPSILON)).floor();
        if count >= usize::MAX as f64 {
            return invalid(RangePosition::Last, last_kind);
        }
        Ok(Range {
            progression: Progression::Real { first, step },
            len: count as usize + 1,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Kind of the produced values.
    pub fn kind(&self) -> ValueType {
        match self.progression {
            Progression::Integer { .. } => ValueType::Integer,
            Progression::Real { .. } => ValueType::Real,
        }
    }

    pub fn step(&self) -> Variant {
        match self.progression {
            Progression::Integer { step, .. } => Variant::Integer(step),
            Progression::Real { step, .. } => Variant::Real(step),
        }
    }

    fn value_at(&self, index: usize) -> Variant {
        match self.progression {
            Progression::Integer { first, step } => {
                Variant::Integer(first.wrapping_add((index as i64).wrapping_mul(step)))
            }
            Progression::Real { first, step } => Variant::Real(first + index as f64 * step),
        }
    }

    /// Element at a 1-based position.
    pub fn nth(&self, index: i64) -> ModelResult<Variant> {
        match usize::try_from(index) {
            Ok(position) if position >= 1 && position <= self.len => {
                Ok(self.value_at(position - 1))
            }
            _ => Err(ModelError::InvalidIndex {
                requested: index,
                bound: self.len,
            }),
        }
    }

    pub fn first(&self) -> Option<Variant> {
        (self.len > 0).then(|| self.value_at(0))
    }

    pub fn last(&self) -> Option<Variant> {
        self.len.checked_sub(1).map(|i| self.value_at(i))
    }

    /// True if `value` is one of the produced values.
    pub fn contains(&self, value: &Variant) -> bool {
        match self.progression {
            Progression::Integer { first, step } => {
                let Some(v) = value.exact_integer() else {
                    return false;
                };
                let offset = i128::from(v) - i128::from(first);
                let step = i128::from(step);
                offset % step == 0
                    && offset / step >= 0
                    && ((offset / step) as u128) < self.len as u128
            }
            Progression::Real { first, step } => {
                let Some(v) = value.real_value() else {
                    return false;
                };
                let k = ((v - first) / step).round();
                k >= 0.0 && k < self.len as f64 && first + k * step == v
            }
        }
    }

    /// Restartable iterator over the values.
    pub fn iter(&self) -> RangeIterator {
        RangeIterator {
            range: *self,
            front: 0,
            back: self.len,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => write!(f, "{}:{}:{}", first, self.step(), last),
            _ => write!(f, "{{}}"),
        }
    }
}

impl IntoIterator for &Range {
    type Item = Variant;
    type IntoIter = RangeIterator;

    fn into_iter(self) -> RangeIterator {
        self.iter()
    }
}

/// Iterator over a [`Range`], yielding variants.
#[derive(Debug, Clone)]
pub struct RangeIterator {
    range: Range,
    front: usize,
    back: usize,
}

impl Iterator for RangeIterator {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        if self.front >= self.back {
            return None;
        }
        let value = self.range.value_at(self.front);
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Variant> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for RangeIterator {
    fn next_back(&mut self) -> Option<Variant> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.range.value_at(self.back))
    }
}

impl ExactSizeIterator for RangeIterator {}
