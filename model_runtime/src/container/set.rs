//! Ordered, copy-on-write sets of variants.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{raise_or, ModelError, ModelResult};
use crate::value_type::ValueType;
use crate::variant::Variant;

use super::range::Range;
use super::tuple::Tuple;

/// A sorted, duplicate-free collection of variants.
///
/// Members are kept in [`Variant::relative_order`]: by kind first, then by
/// value, so `Integer(1)` and `Real(1.0)` are distinct members. Cloning a set
/// shares its buffer; the first mutation of a shared set copies it.
#[derive(Clone, Default)]
pub struct Set {
    elements: Arc<Vec<Variant>>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a sequence of values.
    pub fn build(values: impl IntoIterator<Item = Variant>) -> ModelResult<Self> {
        let mut set = Set::new();
        for value in values {
            set.insert(value)?;
        }
        Ok(set)
    }

    fn from_sorted(elements: Vec<Variant>) -> Self {
        Set {
            elements: Arc::new(elements),
        }
    }

    fn elements_mut(&mut self) -> &mut Vec<Variant> {
        if Arc::get_mut(&mut self.elements).is_none() {
            tracing::trace!(len = self.elements.len(), "set copy on write");
        }
        Arc::make_mut(&mut self.elements)
    }

    fn search(&self, value: &Variant) -> Result<usize, usize> {
        self.elements
            .binary_search_by(|probe| probe.relative_order(value))
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

    pub fn contains(&self, value: &Variant) -> bool {
        self.search(value).is_ok()
    }

    /// Insert one value; true if it was not yet a member.
    ///
    /// `None` variants cannot be members.
    pub fn insert(&mut self, value: Variant) -> ModelResult<bool> {
        if matches!(value, Variant::None) {
            return raise_or(
                ModelError::InvalidContainerContents {
                    kind: ValueType::None,
                },
                false,
            );
        }
        match self.search(&value) {
            Ok(_) => Ok(false),
            Err(position) => {
                self.elements_mut().insert(position, value);
                Ok(true)
            }
        }
    }

    /// Insert several values; true if every one of them was new.
    pub fn insert_all(&mut self, values: impl IntoIterator<Item = Variant>) -> ModelResult<bool> {
        let mut all_new = true;
        for value in values {
            all_new &= self.insert(value)?;
        }
        Ok(all_new)
    }

    /// Insert every value a range produces.
    pub fn insert_range(&mut self, range: &Range) -> ModelResult<bool> {
        self.insert_all(range.iter())
    }

    /// Remove a value; true if it was a member.
    pub fn remove(&mut self, value: &Variant) -> bool {
        match self.search(value) {
            Ok(position) => {
                self.elements_mut().remove(position);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.elements = Arc::default();
    }

    pub fn first(&self) -> Option<&Variant> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&Variant> {
        self.elements.last()
    }

    /// Iterator positioned on `value`, or an exhausted iterator if absent.
    pub fn find(&self, value: &Variant) -> SetIterator {
        let position = self.search(value).unwrap_or(self.len());
        SetIterator {
            elements: Arc::clone(&self.elements),
            position,
        }
    }

    pub fn iter(&self) -> SetIterator {
        SetIterator {
            elements: Arc::clone(&self.elements),
            position: 0,
        }
    }

    /// Re-attach a captured iterator position to this set's current buffer.
    ///
    /// The iterator resumes at the captured member, or at the first member
    /// ordered after it if that member has since been removed.
    pub fn restore(&self, state: &IteratorState) -> SetIterator {
        let position = match &state.current {
            Some(value) => match self.search(value) {
                Ok(position) | Err(position) => position,
            },
            None => self.len(),
        };
        SetIterator {
            elements: Arc::clone(&self.elements),
            position,
        }
    }

    // ========== Set algebra ==========

    /// Sorted merge of two member lists; `keep` decides, per membership
    /// pattern (in self, in other), whether the value is part of the result.
    fn merge(&self, other: &Set, keep: impl Fn(bool, bool) -> bool) -> Set {
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut merged = Vec::with_capacity(a.len().max(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            let ordering = match (a.get(i), b.get(j)) {
                (Some(x), Some(y)) => x.relative_order(y),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            match ordering {
                Ordering::Less => {
                    if keep(true, false) {
                        merged.push(a[i].clone());
                    }
                    i += 1;
                }
                Ordering::Greater => {
                    if keep(false, true) {
                        merged.push(b[j].clone());
                    }
                    j += 1;
                }
                Ordering::Equal => {
                    if keep(true, true) {
                        merged.push(a[i].clone());
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        Set::from_sorted(merged)
    }

    pub fn united_with(&self, other: &Set) -> Set {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        self.merge(other, |_, _| true)
    }

    pub fn unite_with(&mut self, other: &Set) {
        *self = self.united_with(other);
    }

    pub fn intersected_with(&self, other: &Set) -> Set {
        self.merge(other, |a, b| a && b)
    }

    pub fn intersect_with(&mut self, other: &Set) {
        *self = self.intersected_with(other);
    }

    /// Members of `self` that are not in `other`.
    pub fn difference(&self, other: &Set) -> Set {
        self.merge(other, |a, b| a && !b)
    }

    pub fn subtract(&mut self, other: &Set) {
        *self = self.difference(other);
    }

    pub fn symmetric_difference(&self, other: &Set) -> Set {
        self.merge(other, |a, b| a != b)
    }

    pub fn is_subset_of(&self, other: &Set) -> bool {
        self.len() <= other.len() && self.iter().all(|value| other.contains(&value))
    }

    /// All pairs `(a, b)` as 2-tuples.
    pub fn cartesian_product(&self, other: &Set) -> Set {
        let mut pairs = Vec::with_capacity(self.len() * other.len());
        for a in self.as_slice() {
            for b in other.as_slice() {
                pairs.push(Variant::Tuple(Tuple::from_vec(vec![a.clone(), b.clone()])));
            }
        }
        // Lexicographic tuple order matches the nested loop order.
        Set::from_sorted(pairs)
    }

    /// Shorter sets first, then member by member.
    pub fn relative_order(&self, other: &Set) -> Ordering {
        self.len().cmp(&other.len()).then_with(|| {
            self.as_slice()
                .iter()
                .zip(other.as_slice())
                .map(|(a, b)| a.relative_order(b))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.elements, &other.elements)
            || self.relative_order(other) == Ordering::Equal
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.as_slice()).finish()
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, value) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "}}")
    }
}

/// Collects into a set; `None` values are skipped.
impl FromIterator<Variant> for Set {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut elements: Vec<Variant> = iter
            .into_iter()
            .filter(|value| !matches!(value, Variant::None))
            .collect();
        elements.sort_by(Variant::relative_order);
        elements.dedup_by(|a, b| a.relative_order(b) == Ordering::Equal);
        Set::from_sorted(elements)
    }
}

impl IntoIterator for &Set {
    type Item = Variant;
    type IntoIter = SetIterator;

    fn into_iter(self) -> SetIterator {
        self.iter()
    }
}

/// Iterator over a set in member order.
///
/// The iterator owns a reference to the buffer it was created from, so
/// mutating (and thereby copying) the set does not disturb it.
#[derive(Debug, Clone)]
pub struct SetIterator {
    elements: Arc<Vec<Variant>>,
    position: usize,
}

/// Position of a [`SetIterator`], detached from any buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct IteratorState {
    current: Option<Variant>,
}

impl SetIterator {
    pub fn is_valid(&self) -> bool {
        self.position < self.elements.len()
    }

    /// Member under the iterator.
    pub fn current(&self) -> Option<&Variant> {
        self.elements.get(self.position)
    }

    pub fn capture(&self) -> IteratorState {
        IteratorState {
            current: self.current().cloned(),
        }
    }
}

impl Iterator for SetIterator {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        let value = self.elements.get(self.position).cloned();
        if value.is_some() {
            self.position += 1;
        }
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.elements.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SetIterator {}
