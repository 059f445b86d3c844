//! Aligned column-major storage shared by every matrix element type.
//!
//! A matrix buffer is a run of columns, each `column_stride` bytes long. When
//! a matrix has more than one row every column starts on a 64-byte boundary;
//! single-row matrices are packed. Boolean coefficients take one bit, with
//! row `r` stored in bit `r % 8` of byte `r / 8` of its column.
//!
//! Every byte past the last logical coefficient of a column, and every byte
//! past the last logical column, is zero. Resizing and copying rely on this.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use once_cell::sync::OnceCell;

use crate::error::{ModelError, ModelResult};

/// Alignment of the buffer base and of every column when `rows > 1`.
pub const ALIGNMENT_BYTES: usize = 64;

const MIB: usize = 1 << 20;

/// Memory backend used for all matrix storage.
///
/// Installed once per process with [`set_matrix_api`]; [`SystemMatApi`] is
/// used until then.
pub trait MatApi: Send + Sync + fmt::Debug {
    fn memory_alignment_requirement_bytes(&self) -> usize {
        ALIGNMENT_BYTES
    }

    /// Allocate `size` bytes aligned to `alignment`, or `None` on failure.
    fn allocate_memory(&self, size: usize, alignment: usize) -> Option<NonNull<u8>>;

    /// Release memory obtained from `allocate_memory`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate_memory` on this backend with
    /// the same `size` and `alignment`, and must not be used afterwards.
    unsafe fn release_memory(&self, ptr: NonNull<u8>, size: usize, alignment: usize);
}

/// Backend over the global Rust allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMatApi;

impl MatApi for SystemMatApi {
    fn allocate_memory(&self, size: usize, alignment: usize) -> Option<NonNull<u8>> {
        let layout = Layout::from_size_align(size, alignment).ok()?;
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: the layout has a non-zero size.
        NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
    }

    unsafe fn release_memory(&self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        if let Ok(layout) = Layout::from_size_align(size, alignment) {
            // SAFETY: the caller guarantees `ptr` came from `allocate_memory`
            // with this exact layout.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }
}

static SYSTEM_API: SystemMatApi = SystemMatApi;
static MATRIX_API: OnceCell<&'static dyn MatApi> = OnceCell::new();

/// Install the process-wide memory backend.
///
/// Returns `false` if a backend was already installed; the first one stays.
pub fn set_matrix_api(api: &'static dyn MatApi) -> bool {
    let installed = MATRIX_API.set(api).is_ok();
    if installed {
        tracing::debug!(backend = ?api, "matrix memory backend installed");
    }
    installed
}

/// The backend new buffers are allocated from.
pub fn matrix_api() -> &'static dyn MatApi {
    match MATRIX_API.get() {
        Some(api) => *api,
        None => &SYSTEM_API,
    }
}

pub const fn align_up(size: usize, align: usize) -> usize {
    (size + align - 1) & !(align - 1)
}

/// Byte length of one column of `rows` coefficients of `bits` bits each.
pub const fn column_size_in_bytes(rows: usize, bits: usize) -> usize {
    let packed = (rows * bits).div_ceil(8);
    if rows > 1 {
        align_up(packed, ALIGNMENT_BYTES)
    } else {
        packed
    }
}

/// Capacity to allocate when a resize needs `required` bytes.
pub fn grown_capacity(required: usize) -> usize {
    let grown = if required <= 8 * MIB {
        required.saturating_mul(2)
    } else if required <= 64 * MIB {
        required.saturating_add(required / 2)
    } else if required <= 512 * MIB {
        required.saturating_add(required / 4)
    } else {
        required.saturating_add(required / 8)
    };
    align_up(grown.max(ALIGNMENT_BYTES), ALIGNMENT_BYTES)
}

/// Owned aligned allocation. Zero capacity owns no memory.
#[derive(Debug)]
pub(crate) struct RawBuffer {
    ptr: Option<NonNull<u8>>,
    capacity: usize,
    alignment: usize,
    api: &'static dyn MatApi,
}

// SAFETY: the buffer owns its allocation exclusively; shared access only
// hands out `&[u8]`, and mutation requires `&mut self`.
unsafe impl Send for RawBuffer {}
// SAFETY: see above; there is no interior mutability.
unsafe impl Sync for RawBuffer {}

impl RawBuffer {
    pub(crate) fn empty() -> Self {
        Self {
            ptr: None,
            capacity: 0,
            alignment: ALIGNMENT_BYTES,
            api: matrix_api(),
        }
    }

    pub(crate) fn zeroed(capacity: usize) -> ModelResult<Self> {
        let api = matrix_api();
        let alignment = api
            .memory_alignment_requirement_bytes()
            .max(ALIGNMENT_BYTES)
            .next_power_of_two();
        if capacity == 0 {
            return Ok(Self {
                ptr: None,
                capacity,
                alignment,
                api,
            });
        }
        let ptr = api
            .allocate_memory(capacity, alignment)
            .ok_or(ModelError::InsufficientMemory)?;
        if (ptr.as_ptr() as usize) % alignment != 0 {
            // SAFETY: `ptr` was just allocated with this size and alignment.
            unsafe { api.release_memory(ptr, capacity, alignment) };
            return Err(ModelError::InsufficientMemory);
        }
        // SAFETY: `ptr` is valid for `capacity` writable bytes.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, capacity) };
        Ok(Self {
            ptr: Some(ptr),
            capacity,
            alignment,
            api,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => NonNull::<u8>::dangling().as_ptr(),
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self.ptr {
            // SAFETY: the allocation is `capacity` bytes, initialised by `zeroed`.
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.capacity) },
            None => &[],
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        match self.ptr {
            // SAFETY: as above, and `&mut self` guarantees exclusive access.
            Some(ptr) => unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.capacity) },
            None => &mut [],
        }
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: allocated by `self.api` with exactly this size and alignment.
            unsafe { self.api.release_memory(ptr, self.capacity, self.alignment) };
        }
    }
}

/// Shape plus buffer; shared between matrix handles through an `Arc`.
#[derive(Debug)]
pub(crate) struct MatrixData {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) column_stride: usize,
    pub(crate) bits: usize,
    pub(crate) buffer: RawBuffer,
}

impl MatrixData {
    pub(crate) fn new(rows: usize, cols: usize, bits: usize) -> ModelResult<Self> {
        let column_stride = column_size_in_bytes(rows, bits);
        let capacity = column_stride
            .checked_mul(cols)
            .ok_or(ModelError::InsufficientMemory)?;
        Ok(Self {
            rows,
            cols,
            column_stride,
            bits,
            buffer: RawBuffer::zeroed(capacity)?,
        })
    }

    pub(crate) fn empty(bits: usize) -> Self {
        Self {
            rows: 0,
            cols: 0,
            column_stride: 0,
            bits,
            buffer: RawBuffer::empty(),
        }
    }

    /// Deep copy of the logical contents into a fresh, tightly sized buffer.
    pub(crate) fn duplicate(&self) -> ModelResult<Self> {
        let mut copy = Self::new(self.rows, self.cols, self.bits)?;
        let used = self.logical_bytes();
        copy.buffer.as_mut_slice()[..used].copy_from_slice(&self.buffer.as_slice()[..used]);
        Ok(copy)
    }

    pub(crate) fn logical_bytes(&self) -> usize {
        self.column_stride * self.cols
    }

    pub(crate) fn column(&self, col: usize) -> &[u8] {
        let start = col * self.column_stride;
        &self.buffer.as_slice()[start..start + self.column_stride]
    }

    pub(crate) fn column_mut(&mut self, col: usize) -> &mut [u8] {
        let start = col * self.column_stride;
        let stride = self.column_stride;
        &mut self.buffer.as_mut_slice()[start..start + stride]
    }

    /// Change the shape, keeping the overlapping top-left block and zeroing the rest.
    pub(crate) fn resize(&mut self, new_rows: usize, new_cols: usize) -> ModelResult<()> {
        let new_stride = column_size_in_bytes(new_rows, self.bits);
        let required = new_stride
            .checked_mul(new_cols)
            .ok_or(ModelError::InsufficientMemory)?;

        if required <= self.buffer.capacity() {
            self.resize_in_place(new_rows, new_cols, new_stride);
        } else {
            let capacity = grown_capacity(required);
            tracing::debug!(
                old_capacity = self.buffer.capacity(),
                new_capacity = capacity,
                "reallocating matrix storage"
            );
            let mut buffer = RawBuffer::zeroed(capacity)?;
            let kept_rows = self.rows.min(new_rows);
            let kept_bytes = (kept_rows * self.bits).div_ceil(8);
            for col in 0..self.cols.min(new_cols) {
                let src = &self.column(col)[..kept_bytes];
                let dst_start = col * new_stride;
                let dst = &mut buffer.as_mut_slice()[dst_start..dst_start + new_stride];
                dst[..kept_bytes].copy_from_slice(src);
                clear_tail(dst, kept_rows, self.bits);
            }
            self.buffer = buffer;
        }

        self.rows = new_rows;
        self.cols = new_cols;
        self.column_stride = new_stride;
        Ok(())
    }

    fn resize_in_place(&mut self, new_rows: usize, new_cols: usize, new_stride: usize) {
        let old_stride = self.column_stride;
        let old_end = old_stride * self.cols;
        let kept_rows = self.rows.min(new_rows);
        let kept_cols = self.cols.min(new_cols);
        let kept_bytes = (kept_rows * self.bits).div_ceil(8);
        let bits = self.bits;
        let bytes = self.buffer.as_mut_slice();

        let mut move_column = |col: usize| {
            let src = col * old_stride;
            let dst = col * new_stride;
            if src != dst {
                bytes.copy_within(src..src + kept_bytes, dst);
            }
            clear_tail(&mut bytes[dst..dst + new_stride], kept_rows, bits);
        };

        if new_stride > old_stride {
            for col in (0..kept_cols).rev() {
                move_column(col);
            }
        } else {
            for col in 0..kept_cols {
                move_column(col);
            }
        }

        let end = old_end.max(new_stride * new_cols);
        bytes[kept_cols * new_stride..end].fill(0);
    }
}

/// Zero everything in `column` after the first `rows` coefficients.
fn clear_tail(column: &mut [u8], rows: usize, bits: usize) {
    let used_bits = rows * bits;
    let mut start = used_bits / 8;
    let partial = used_bits % 8;
    if partial != 0 {
        column[start] &= (1u8 << partial) - 1;
        start += 1;
    }
    if start < column.len() {
        column[start..].fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_size_in_bytes() {
        assert_eq!(column_size_in_bytes(0, 64), 0);
        assert_eq!(column_size_in_bytes(1, 64), 8);
        assert_eq!(column_size_in_bytes(1, 1), 1);
        assert_eq!(column_size_in_bytes(2, 64), 64);
        assert_eq!(column_size_in_bytes(9, 64), 128);
        assert_eq!(column_size_in_bytes(4, 128), 64);
        assert_eq!(column_size_in_bytes(513, 1), 128);
    }

    #[test]
    fn test_growth_policy() {
        assert_eq!(grown_capacity(1), ALIGNMENT_BYTES);
        assert_eq!(grown_capacity(640), 1280);
        assert_eq!(grown_capacity(16 * MIB), 24 * MIB);
        assert_eq!(grown_capacity(128 * MIB), 160 * MIB);
        assert_eq!(grown_capacity(1024 * MIB), 1152 * MIB);
    }

    #[test]
    fn test_buffer_is_aligned_and_zeroed() {
        let buffer = RawBuffer::zeroed(1000).unwrap();
        assert_eq!(buffer.as_ptr() as usize % ALIGNMENT_BYTES, 0);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
        let empty = RawBuffer::zeroed(0).unwrap();
        assert!(empty.as_slice().is_empty());
    }

    #[test]
    fn test_clear_tail_masks_partial_byte() {
        let mut column = [0xffu8; 4];
        clear_tail(&mut column, 11, 1);
        assert_eq!(column, [0xff, 0x07, 0, 0]);
    }

    #[test]
    fn test_resize_keeps_zero_padding_invariant() {
        let mut data = MatrixData::new(3, 3, 64).unwrap();
        for col in 0..3 {
            for row in 0..3 {
                let value = (10 * row + col) as f64;
                data.column_mut(col)[row * 8..row * 8 + 8].copy_from_slice(&value.to_ne_bytes());
            }
        }
        data.resize(2, 2).unwrap();
        assert_eq!(data.column_stride, 64);
        for col in 0..2 {
            assert!(data.column(col)[16..].iter().all(|&b| b == 0));
            let kept = f64::from_ne_bytes(data.column(col)[8..16].try_into().unwrap());
            assert_eq!(kept, (10 + col) as f64);
        }
        assert!(data.buffer.as_slice()[data.logical_bytes()..]
            .iter()
            .all(|&b| b == 0));
    }
}
