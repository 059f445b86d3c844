//! Column-major element iterator.

use std::marker::PhantomData;
use std::sync::Arc;

use super::coefficient::Coefficient;
use super::storage::MatrixData;

/// Random-access iterator over a matrix in column-major order.
///
/// The iterator holds its own reference to the buffer, so it keeps yielding
/// the values that existed when it was created even if the matrix is
/// modified (and therefore copied) afterwards.
#[derive(Debug, Clone)]
pub struct MatrixIterator<T: Coefficient> {
    data: Arc<MatrixData>,
    position: usize,
    end: usize,
    marker: PhantomData<T>,
}

impl<T: Coefficient> MatrixIterator<T> {
    pub(crate) fn new(data: Arc<MatrixData>) -> Self {
        let end = data.rows * data.cols;
        Self {
            data,
            position: 0,
            end,
            marker: PhantomData,
        }
    }

    fn load(&self, position: usize) -> T {
        let rows = self.data.rows;
        T::load(self.data.column(position / rows), position % rows)
    }

    /// 0-based column-major position of the current element.
    pub fn position(&self) -> usize {
        self.position
    }

    /// True while the iterator points at an element.
    pub fn is_valid(&self) -> bool {
        self.position < self.end
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// Current element without advancing.
    pub fn current(&self) -> Option<T> {
        self.is_valid().then(|| self.load(self.position))
    }

    /// Move by `offset` elements; positions outside the matrix make the iterator invalid.
    pub fn advance(&mut self, offset: isize) {
        self.position = self
            .position
            .checked_add_signed(offset)
            .unwrap_or(self.end)
            .min(self.end);
    }

    /// Address of the byte holding the current element.
    pub fn as_ptr(&self) -> Option<*const u8> {
        if self.is_invalid() {
            return None;
        }
        let rows = self.data.rows;
        let (row, col) = (self.position % rows, self.position / rows);
        let offset = col * self.data.column_stride + row * self.data.bits / 8;
        Some(self.data.buffer.as_slice()[offset..].as_ptr())
    }
}

impl<T: Coefficient> Iterator for MatrixIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let value = self.current()?;
        self.position += 1;
        Some(value)
    }

    fn nth(&mut self, n: usize) -> Option<T> {
        self.position = self.position.saturating_add(n).min(self.end);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.position;
        (remaining, Some(remaining))
    }
}

impl<T: Coefficient> DoubleEndedIterator for MatrixIterator<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.position >= self.end {
            return None;
        }
        self.end -= 1;
        Some(self.load(self.end))
    }
}

impl<T: Coefficient> ExactSizeIterator for MatrixIterator<T> {}

#[cfg(test)]
mod tests {
    use crate::matrix::Matrix;

    #[test]
    fn test_random_access() {
        let m = Matrix::from_row_major(2, 2, &[1i64, 3, 2, 4]).unwrap();
        let mut it = m.iter();
        assert_eq!(it.len(), 4);
        assert_eq!(it.current(), Some(1));
        it.advance(2);
        assert_eq!(it.current(), Some(3));
        it.advance(-1);
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next_back(), Some(4));
        assert_eq!(it.next(), Some(3));
        assert!(it.is_invalid());
        assert_eq!(it.as_ptr(), None);
    }

    #[test]
    fn test_iterator_survives_copy_on_write() {
        let mut m = Matrix::from_row_major(1, 3, &[1.0, 2.0, 3.0]).unwrap();
        let it = m.iter();
        m.set(1, 1, 9.0).unwrap();
        assert_eq!(it.collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert_eq!(m.get(1, 1).unwrap(), 9.0);
    }

    #[test]
    fn test_pointer_tracks_column_stride() {
        let m = Matrix::<f64>::new(3, 2).unwrap();
        let mut it = m.iter();
        let base = it.as_ptr().unwrap() as usize;
        it.advance(3);
        assert_eq!(it.as_ptr().unwrap() as usize - base, 64);
    }
}
