//! C ABI for hosts and compiled models.
//!
//! Values cross the boundary untyped: a pointer plus a `ValueType` tag. The
//! pointee layout for each kind is
//!
//! | Kind | Layout |
//! |---|---|
//! | `None` | nothing is read or written |
//! | `Boolean` | one byte, `0` or `1` |
//! | `Integer` | `i64` |
//! | `Real` | `f64` |
//! | `Complex` | `[f64; 2]`, real part first |
//! | `Set`, `Tuple`, matrices | the handle type (`Set`, `Tuple`, `Matrix<T>`) |
//! | `Variant` | a `Variant` |
//!
//! Handles are shared: reading one bumps its reference count, it never
//! copies element data.

// FFI functions take raw pointers from C callers, who are responsible for
// their validity.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::cancel;
use crate::container::{Set, Tuple};
use crate::error::{enable_exception_class, exception_class_enabled, ExceptionClass};
use crate::matrix::{set_matrix_api, MatApi, Matrix, ALIGNMENT_BYTES};
use crate::scalar::Complex;
use crate::value_type::ValueType;
use crate::variant::Variant;

impl Variant {
    /// Read a value of `kind` from untyped memory.
    ///
    /// # Safety
    ///
    /// Unless `kind` is `None`, `ptr` must be non-null, aligned for and point
    /// to an initialised value with the layout listed for `kind`.
    pub unsafe fn from_raw(ptr: *const c_void, kind: ValueType) -> Variant {
        // SAFETY: the caller guarantees the pointee layout for `kind`.
        unsafe {
            match kind {
                ValueType::None => Variant::None,
                ValueType::Boolean => Variant::Boolean(ptr.cast::<u8>().read() != 0),
                ValueType::Integer => Variant::Integer(ptr.cast::<i64>().read()),
                ValueType::Real => Variant::Real(ptr.cast::<f64>().read()),
                ValueType::Complex => {
                    let [real, imag] = ptr.cast::<[f64; 2]>().read();
                    Variant::Complex(Complex::new(real, imag))
                }
                ValueType::Set => Variant::Set((*ptr.cast::<Set>()).clone()),
                ValueType::Tuple => Variant::Tuple((*ptr.cast::<Tuple>()).clone()),
                ValueType::MatrixBoolean => {
                    Variant::MatrixBoolean((*ptr.cast::<Matrix<bool>>()).clone())
                }
                ValueType::MatrixInteger => {
                    Variant::MatrixInteger((*ptr.cast::<Matrix<i64>>()).clone())
                }
                ValueType::MatrixReal => Variant::MatrixReal((*ptr.cast::<Matrix<f64>>()).clone()),
                ValueType::MatrixComplex => {
                    Variant::MatrixComplex((*ptr.cast::<Matrix<Complex>>()).clone())
                }
                ValueType::Variant => (*ptr.cast::<Variant>()).clone(),
            }
        }
    }

    /// Write the payload in the layout listed for `self.kind()`.
    ///
    /// # Safety
    ///
    /// Unless the value is `None`, `ptr` must be non-null, aligned for and
    /// valid for writes of that layout. Whatever was stored there before is
    /// overwritten without being dropped.
    pub unsafe fn write_raw(&self, ptr: *mut c_void) {
        // SAFETY: the caller guarantees the destination layout.
        unsafe {
            match self {
                Variant::None => {}
                Variant::Boolean(b) => ptr.cast::<u8>().write(u8::from(*b)),
                Variant::Integer(i) => ptr.cast::<i64>().write(*i),
                Variant::Real(r) => ptr.cast::<f64>().write(*r),
                Variant::Complex(z) => ptr.cast::<[f64; 2]>().write([z.real, z.imag]),
                Variant::Set(set) => ptr.cast::<Set>().write(set.clone()),
                Variant::Tuple(tuple) => ptr.cast::<Tuple>().write(tuple.clone()),
                Variant::MatrixBoolean(m) => ptr.cast::<Matrix<bool>>().write(m.clone()),
                Variant::MatrixInteger(m) => ptr.cast::<Matrix<i64>>().write(m.clone()),
                Variant::MatrixReal(m) => ptr.cast::<Matrix<f64>>().write(m.clone()),
                Variant::MatrixComplex(m) => ptr.cast::<Matrix<Complex>>().write(m.clone()),
            }
        }
    }
}

// ========== Exception gate and abort flag ==========

/// Enable or disable exception class `class` (0 through 6).
/// Returns false for an unknown class number.
#[no_mangle]
pub extern "C" fn model_enable_exception_class(class: u32, enabled: bool) -> bool {
    match ExceptionClass::from_index(class) {
        Some(class) => {
            enable_exception_class(class, enabled);
            true
        }
        None => false,
    }
}

#[no_mangle]
pub extern "C" fn model_exception_class_enabled(class: u32) -> bool {
    ExceptionClass::from_index(class).is_some_and(exception_class_enabled)
}

/// Ask running models to stop at their next iteration boundary.
#[no_mangle]
pub extern "C" fn model_request_abort() {
    cancel::request();
}

#[no_mangle]
pub extern "C" fn model_reset_abort() {
    cancel::reset();
}

#[no_mangle]
pub extern "C" fn model_abort_requested() -> bool {
    cancel::is_requested()
}

// ========== Matrix memory backend ==========

/// Memory vtable supplied by a C host.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MatApiTable {
    pub memory_alignment_requirement_bytes: extern "C" fn() -> usize,
    /// Returns null on failure.
    pub allocate_memory: extern "C" fn(size: usize, alignment: usize) -> *mut c_void,
    pub release_memory: unsafe extern "C" fn(ptr: *mut c_void),
}

#[derive(Debug)]
struct ForeignMatApi(MatApiTable);

impl MatApi for ForeignMatApi {
    fn memory_alignment_requirement_bytes(&self) -> usize {
        (self.0.memory_alignment_requirement_bytes)()
    }

    fn allocate_memory(&self, size: usize, alignment: usize) -> Option<NonNull<u8>> {
        NonNull::new((self.0.allocate_memory)(size, alignment).cast::<u8>())
    }

    unsafe fn release_memory(&self, ptr: NonNull<u8>, _size: usize, _alignment: usize) {
        // SAFETY: `ptr` came from this table's allocator.
        unsafe { (self.0.release_memory)(ptr.as_ptr().cast::<c_void>()) }
    }
}

/// Install a host memory backend. Only the first call takes effect; later
/// calls and a null `table` return false.
#[no_mangle]
pub extern "C" fn model_set_matrix_api(table: *const MatApiTable) -> bool {
    if table.is_null() {
        return false;
    }
    // SAFETY: non-null, and the caller passes a valid table.
    let table = unsafe { *table };
    let api: &'static ForeignMatApi = Box::leak(Box::new(ForeignMatApi(table)));
    set_matrix_api(api)
}

/// Alignment of matrix buffers and columns, in bytes.
#[no_mangle]
pub extern "C" fn model_matrix_alignment_bytes() -> usize {
    ALIGNMENT_BYTES
}
