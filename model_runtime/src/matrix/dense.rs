//! Dense, column-major, copy-on-write matrices.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{raise_or, ModelError, ModelResult};

use super::coefficient::{Coefficient, UpcastTo};
use super::iter::MatrixIterator;
use super::selector::{checked_position, Axis, Selector};
use super::storage::MatrixData;

/// A dense matrix of `T`.
///
/// Cloning shares the buffer. The first mutation through a handle whose
/// buffer is shared copies it, so other handles and live iterators keep
/// seeing the old contents.
pub struct Matrix<T: Coefficient> {
    data: Arc<MatrixData>,
    marker: PhantomData<T>,
}

impl<T: Coefficient> Clone for Matrix<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            marker: PhantomData,
        }
    }
}

impl<T: Coefficient> Default for Matrix<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Coefficient> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("kind", &T::MATRIX_KIND)
            .field("rows", &self.rows())
            .field("cols", &self.cols())
            .field("values", &self.as_column_major_vec())
            .finish()
    }
}

impl<T: Coefficient> Matrix<T> {
    pub(crate) fn from_data(data: MatrixData) -> Self {
        Self {
            data: Arc::new(data),
            marker: PhantomData,
        }
    }

    pub(crate) fn storage(&self) -> &Arc<MatrixData> {
        &self.data
    }

    /// Exclusive access to the buffer, copying it first if it is shared.
    fn data_mut(&mut self) -> ModelResult<&mut MatrixData> {
        if Arc::get_mut(&mut self.data).is_none() {
            tracing::trace!(
                kind = %T::MATRIX_KIND,
                rows = self.data.rows,
                cols = self.data.cols,
                "copy-on-write clone of shared matrix"
            );
            self.data = Arc::new(self.data.duplicate()?);
        }
        Arc::get_mut(&mut self.data).ok_or(ModelError::InsufficientMemory)
    }

    // ========== Construction ==========

    /// The 0×0 matrix; never allocates.
    pub fn empty() -> Self {
        Self::from_data(MatrixData::empty(T::BITS))
    }

    /// Zero-filled `rows × cols` matrix.
    pub fn new(rows: usize, cols: usize) -> ModelResult<Self> {
        Ok(Self::from_data(MatrixData::new(rows, cols, T::BITS)?))
    }

    pub fn zero(rows: usize, cols: usize) -> ModelResult<Self> {
        Self::new(rows, cols)
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> ModelResult<Self> {
        Self::from_fn(rows, cols, |_, _| value)
    }

    pub fn ones(rows: usize, cols: usize) -> ModelResult<Self> {
        Self::filled(rows, cols, T::ONE)
    }

    pub fn identity(n: usize) -> ModelResult<Self> {
        Self::identity_rect(n, n)
    }

    /// Zero matrix with ones on the main diagonal.
    pub fn identity_rect(rows: usize, cols: usize) -> ModelResult<Self> {
        Self::from_fn(rows, cols, |r, c| if r == c { T::ONE } else { T::ZERO })
    }

    /// Build from a 0-based element function.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> ModelResult<Self> {
        let mut data = MatrixData::new(rows, cols, T::BITS)?;
        for col in 0..cols {
            let column = data.column_mut(col);
            for row in 0..rows {
                T::store(column, row, f(row, col));
            }
        }
        Ok(Self::from_data(data))
    }

    /// Build from values listed row by row.
    pub fn from_row_major(rows: usize, cols: usize, values: &[T]) -> ModelResult<Self> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(ModelError::InvalidMatrixDimensions { rows, cols });
        }
        Self::from_fn(rows, cols, |r, c| values[r * cols + c])
    }

    /// Build from values listed column by column.
    pub fn from_column_major(rows: usize, cols: usize, values: &[T]) -> ModelResult<Self> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(ModelError::InvalidMatrixDimensions { rows, cols });
        }
        Self::from_fn(rows, cols, |r, c| values[c * rows + r])
    }

    pub fn column_vector(values: &[T]) -> ModelResult<Self> {
        Self::from_column_major(values.len(), 1, values)
    }

    pub fn row_vector(values: &[T]) -> ModelResult<Self> {
        Self::from_column_major(1, values.len(), values)
    }

    /// Square matrix with `vector` (a row or column vector) on its diagonal.
    pub fn diagonal(vector: &Matrix<T>) -> ModelResult<Self> {
        if vector.rows() != 1 && vector.cols() != 1 && !vector.is_empty() {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: vector.rows(),
                cols: vector.cols(),
            });
        }
        let values = vector.as_column_major_vec();
        let n = values.len();
        Self::from_fn(n, n, |r, c| if r == c { values[r] } else { T::ZERO })
    }

    // ========== Shape and layout ==========

    pub fn rows(&self) -> usize {
        self.data.rows
    }

    pub fn cols(&self) -> usize {
        self.data.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.data.rows, self.data.cols)
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.data.rows * self.data.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_square(&self) -> bool {
        self.data.rows == self.data.cols
    }

    pub fn is_vector(&self) -> bool {
        self.data.rows == 1 || self.data.cols == 1
    }

    pub fn column_stride_bytes(&self) -> usize {
        self.data.column_stride
    }

    pub fn allocated_bytes(&self) -> usize {
        self.data.buffer.capacity()
    }

    pub fn coefficient_bits(&self) -> usize {
        T::BITS
    }

    /// Base address of the column-major buffer.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.buffer.as_ptr()
    }

    /// Number of handles sharing this buffer.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// True if both handles share one buffer.
    pub fn shares_buffer_with(&self, other: &Matrix<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    // ========== Element access ==========

    /// 0-based read; callers guarantee the position is in range.
    pub(crate) fn element(&self, row: usize, col: usize) -> T {
        T::load(self.data.column(col), row)
    }

    /// 1-based `(row, col)` read.
    pub fn get(&self, row: i64, col: i64) -> ModelResult<T> {
        let r = checked_position(row, self.rows(), Axis::Row)?;
        let c = checked_position(col, self.cols(), Axis::Column)?;
        Ok(self.element(r, c))
    }

    /// 1-based column-major linear read.
    pub fn at(&self, index: i64) -> ModelResult<T> {
        let position = checked_position(index, self.len(), Axis::Linear)?;
        Ok(self.element(position % self.rows(), position / self.rows()))
    }

    /// 1-based `(row, col)` write.
    pub fn set(&mut self, row: i64, col: i64, value: T) -> ModelResult<()> {
        let r = checked_position(row, self.rows(), Axis::Row)?;
        let c = checked_position(col, self.cols(), Axis::Column)?;
        T::store(self.data_mut()?.column_mut(c), r, value);
        Ok(())
    }

    /// 1-based column-major linear write.
    pub fn set_at(&mut self, index: i64, value: T) -> ModelResult<()> {
        let position = checked_position(index, self.len(), Axis::Linear)?;
        let rows = self.rows();
        T::store(
            self.data_mut()?.column_mut(position / rows),
            position % rows,
            value,
        );
        Ok(())
    }

    pub fn fill(&mut self, value: T) -> ModelResult<()> {
        let (rows, cols) = self.shape();
        let data = self.data_mut()?;
        for col in 0..cols {
            let column = data.column_mut(col);
            for row in 0..rows {
                T::store(column, row, value);
            }
        }
        Ok(())
    }

    /// Submatrix picked by a row and a column selector.
    pub fn slice(&self, rows: &Selector, cols: &Selector) -> ModelResult<Self> {
        let row_positions = rows.resolve(self.rows(), Axis::Row)?;
        let col_positions = cols.resolve(self.cols(), Axis::Column)?;
        Self::from_fn(row_positions.len(), col_positions.len(), |r, c| {
            self.element(row_positions[r], col_positions[c])
        })
    }

    /// Column vector of the entries picked by a linear selector.
    pub fn slice_linear(&self, indices: &Selector) -> ModelResult<Self> {
        let positions = indices.resolve(self.len(), Axis::Linear)?;
        let rows = self.rows().max(1);
        Self::from_fn(positions.len(), 1, |r, _| {
            self.element(positions[r] % rows, positions[r] / rows)
        })
    }

    /// Overwrite the selected block with `values`.
    pub fn update(&mut self, rows: &Selector, cols: &Selector, values: &Matrix<T>) -> ModelResult<()> {
        let row_positions = rows.resolve(self.rows(), Axis::Row)?;
        let col_positions = cols.resolve(self.cols(), Axis::Column)?;
        if values.shape() != (row_positions.len(), col_positions.len()) {
            return Err(ModelError::incompatible(
                (row_positions.len(), col_positions.len()),
                values.shape(),
            ));
        }
        let values = values.clone();
        let data = self.data_mut()?;
        for (c, &col) in col_positions.iter().enumerate() {
            let column = data.column_mut(col);
            for (r, &row) in row_positions.iter().enumerate() {
                T::store(column, row, values.element(r, c));
            }
        }
        Ok(())
    }

    /// Change the shape in place; new entries are zero.
    pub fn resize(&mut self, rows: usize, cols: usize) -> ModelResult<()> {
        if self.shape() == (rows, cols) {
            return Ok(());
        }
        self.data_mut()?.resize(rows, cols)
    }

    // ========== Reshaping combiners ==========

    /// `[self, other]`, padding the shorter operand with zero rows.
    pub fn combine_left_to_right(&self, other: &Matrix<T>) -> ModelResult<Self> {
        let rows = self.rows().max(other.rows());
        let split = self.cols();
        Self::from_fn(rows, split + other.cols(), |r, c| {
            if c < split {
                if r < self.rows() {
                    self.element(r, c)
                } else {
                    T::ZERO
                }
            } else if r < other.rows() {
                other.element(r, c - split)
            } else {
                T::ZERO
            }
        })
    }

    /// `[self; other]`, padding the narrower operand with zero columns.
    pub fn combine_top_to_bottom(&self, other: &Matrix<T>) -> ModelResult<Self> {
        let cols = self.cols().max(other.cols());
        let split = self.rows();
        Self::from_fn(split + other.rows(), cols, |r, c| {
            if r < split {
                if c < self.cols() {
                    self.element(r, c)
                } else {
                    T::ZERO
                }
            } else if c < other.cols() {
                other.element(r - split, c)
            } else {
                T::ZERO
            }
        })
    }

    pub fn row_reverse(&self) -> ModelResult<Self> {
        let last = self.rows().saturating_sub(1);
        Self::from_fn(self.rows(), self.cols(), |r, c| self.element(last - r, c))
    }

    pub fn column_reverse(&self) -> ModelResult<Self> {
        let last = self.cols().saturating_sub(1);
        Self::from_fn(self.rows(), self.cols(), |r, c| self.element(r, last - c))
    }

    pub fn transpose(&self) -> ModelResult<Self> {
        Self::from_fn(self.cols(), self.rows(), |r, c| self.element(c, r))
    }

    pub fn conj(&self) -> ModelResult<Self> {
        Self::from_fn(self.rows(), self.cols(), |r, c| self.element(r, c).conjugate())
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> ModelResult<Self> {
        Self::from_fn(self.cols(), self.rows(), |r, c| self.element(c, r).conjugate())
    }

    /// Main diagonal as a column vector.
    pub fn diagonal_entries(&self) -> ModelResult<Self> {
        let n = self.rows().min(self.cols());
        Self::from_fn(n, 1, |r, _| self.element(r, r))
    }

    // ========== Bulk access and conversion ==========

    pub fn iter(&self) -> MatrixIterator<T> {
        MatrixIterator::new(Arc::clone(&self.data))
    }

    pub fn as_column_major_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn as_row_major_vec(&self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len());
        for r in 0..self.rows() {
            for c in 0..self.cols() {
                values.push(self.element(r, c));
            }
        }
        values
    }

    /// Element-wise map into another element type.
    pub fn apply<U: Coefficient>(&self, mut f: impl FnMut(T) -> U) -> ModelResult<Matrix<U>> {
        Matrix::from_fn(self.rows(), self.cols(), |r, c| f(self.element(r, c)))
    }

    /// Promote along the lattice.
    pub fn upcast<U: Coefficient>(&self) -> ModelResult<Matrix<U>>
    where
        T: UpcastTo<U>,
    {
        self.apply(|value| value.upcast())
    }

    /// Convert to any element type, failing if an entry would lose information.
    pub fn convert<U: Coefficient>(&self) -> ModelResult<Matrix<U>> {
        let mut exact = true;
        let converted = self.apply(|value| match U::from_complex_exact(value.to_complex()) {
            Some(v) => v,
            None => {
                exact = false;
                U::ZERO
            }
        })?;
        if exact {
            Ok(converted)
        } else {
            raise_or(
                ModelError::conversion(T::MATRIX_KIND, U::MATRIX_KIND),
                Matrix::empty(),
            )
        }
    }

    /// Order used when matrices are set members: shape, then entries column by column.
    pub fn relative_order(&self, other: &Matrix<T>) -> Ordering {
        self.rows()
            .cmp(&other.rows())
            .then_with(|| self.cols().cmp(&other.cols()))
            .then_with(|| {
                self.iter()
                    .zip(other.iter())
                    .map(|(a, b)| a.total_order(&b))
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl<T: Coefficient> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.shares_buffer_with(other) {
            // Still false for NaN entries.
            return self.iter().all(|v| v == v);
        }
        self.shape() == other.shape() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Coefficient> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows() {
            if r > 0 {
                write!(f, "; ")?;
            }
            for c in 0..self.cols() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.element(r, c).into_variant())?;
            }
        }
        write!(f, "]")
    }
}
