//! Tuple - ordered, copy-on-write sequence of variants indexed from 1.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::variant::Variant;

/// Heterogeneous sequence of variants.
#[derive(Clone, Default)]
pub struct Tuple {
    elements: Arc<Vec<Variant>>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(elements: Vec<Variant>) -> Self {
        Tuple {
            elements: Arc::new(elements),
        }
    }

    fn elements_mut(&mut self) -> &mut Vec<Variant> {
        if Arc::get_mut(&mut self.elements).is_none() {
            tracing::trace!(len = self.elements.len(), "tuple copy on write");
        }
        Arc::make_mut(&mut self.elements)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.elements
    }

    fn position(&self, index: i64) -> ModelResult<usize> {
        match usize::try_from(index) {
            Ok(position) if position >= 1 && position <= self.len() => Ok(position - 1),
            _ => Err(ModelError::InvalidIndex {
                requested: index,
                bound: self.len(),
            }),
        }
    }

    /// Element at a 1-based index.
    pub fn get(&self, index: i64) -> ModelResult<&Variant> {
        let position = self.position(index)?;
        Ok(&self.elements[position])
    }

    /// Replace the element at a 1-based index.
    pub fn set(&mut self, index: i64, value: Variant) -> ModelResult<()> {
        let position = self.position(index)?;
        self.elements_mut()[position] = value;
        Ok(())
    }

    pub fn first(&self) -> Option<&Variant> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&Variant> {
        self.elements.last()
    }

    pub fn push(&mut self, value: Variant) {
        self.elements_mut().push(value);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.elements.iter()
    }

    /// `self` followed by `other`.
    pub fn catenate(&self, other: &Tuple) -> Tuple {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut elements = Vec::with_capacity(self.len() + other.len());
        elements.extend_from_slice(self.as_slice());
        elements.extend_from_slice(other.as_slice());
        Tuple::from_vec(elements)
    }

    /// Element-wise quotient of two tuples of equal length.
    pub fn divided_by(&self, other: &Tuple) -> ModelResult<Tuple> {
        if self.len() != other.len() {
            return Err(ModelError::incompatible((self.len(), 1), (other.len(), 1)));
        }
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a.div(b))
            .collect::<ModelResult<Vec<_>>>()
            .map(Tuple::from_vec)
    }

    /// Every element multiplied by `factor` (`factor` on the right).
    pub fn scaled_by(&self, factor: &Variant) -> ModelResult<Tuple> {
        self.iter()
            .map(|a| a.mul(factor))
            .collect::<ModelResult<Vec<_>>>()
            .map(Tuple::from_vec)
    }

    /// Every element divided by `divisor`.
    pub fn divided_by_scalar(&self, divisor: &Variant) -> ModelResult<Tuple> {
        self.iter()
            .map(|a| a.div(divisor))
            .collect::<ModelResult<Vec<_>>>()
            .map(Tuple::from_vec)
    }

    /// `factor` multiplied by every element (`factor` on the left).
    pub fn scaling(factor: &Variant, tuple: &Tuple) -> ModelResult<Tuple> {
        tuple
            .iter()
            .map(|a| factor.mul(a))
            .collect::<ModelResult<Vec<_>>>()
            .map(Tuple::from_vec)
    }

    /// Shorter tuples first, then element by element.
    pub fn relative_order(&self, other: &Tuple) -> Ordering {
        self.len().cmp(&other.len()).then_with(|| {
            self.iter()
                .zip(other.iter())
                .map(|(a, b)| a.relative_order(b))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tuple").field(&self.as_slice()).finish()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

impl FromIterator<Variant> for Tuple {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Tuple::from_vec(iter.into_iter().collect())
    }
}

impl From<Vec<Variant>> for Tuple {
    fn from(elements: Vec<Variant>) -> Self {
        Tuple::from_vec(elements)
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(values: &[i64]) -> Tuple {
        values.iter().map(|&v| Variant::from(v)).collect()
    }

    #[test]
    fn test_get_is_one_based() {
        let t = tuple(&[10, 20, 30]);
        assert_eq!(t.get(1).unwrap(), &Variant::from(10));
        assert_eq!(t.get(3).unwrap(), &Variant::from(30));
        assert_eq!(
            t.get(0).unwrap_err(),
            ModelError::InvalidIndex {
                requested: 0,
                bound: 3
            }
        );
        assert!(t.get(4).is_err());
        assert_eq!(
            t.get(-1).unwrap_err(),
            ModelError::InvalidIndex {
                requested: -1,
                bound: 3
            }
        );
    }

    #[test]
    fn test_set_copies_shared_buffer() {
        let original = tuple(&[1, 2]);
        let mut copy = original.clone();
        copy.set(2, Variant::from(5.5)).unwrap();
        assert_eq!(original, tuple(&[1, 2]));
        assert_eq!(copy.to_string(), "(1, 5.5)");
    }

    #[test]
    fn test_catenate_and_push() {
        let mut t = tuple(&[1]).catenate(&tuple(&[2, 3]));
        t.push(Variant::from(true));
        assert_eq!(t.len(), 4);
        assert_eq!(t.last(), Some(&Variant::Boolean(true)));
    }

    #[test]
    fn test_element_wise_division() {
        let q = tuple(&[6, 9]).divided_by(&tuple(&[3, 2])).unwrap();
        assert_eq!(q, tuple(&[2, 4]));
        assert!(matches!(
            tuple(&[1]).divided_by(&tuple(&[1, 2])),
            Err(ModelError::IncompatibleMatrixDimensions { .. })
        ));
    }

    #[test]
    fn test_broadcast_scale() {
        let t = tuple(&[1, 2]).scaled_by(&Variant::from(0.5)).unwrap();
        assert_eq!(t.as_slice(), &[Variant::Real(0.5), Variant::Real(1.0)]);
    }

    #[test]
    fn test_relative_order() {
        assert_eq!(tuple(&[5]).relative_order(&tuple(&[1, 1])), Ordering::Less);
        assert_eq!(tuple(&[1, 2]).relative_order(&tuple(&[1, 3])), Ordering::Less);
    }
}
