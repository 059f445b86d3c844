//! Error taxonomy for the model runtime
//!
//! Every failure the runtime reports is a `ModelError`. Each variant carries
//! exactly the payload its abort reason documents, and `ModelError::reason`
//! recovers the discriminator so hosts can branch without matching payloads.
//!
//! Seven exception classes can be switched off process-wide. While a class is
//! disabled, the operations that would raise one of its errors return a
//! sentinel (quiet NaN, `false`, an empty container) instead. Shape, index,
//! memory, singularity and user-abort errors do not belong to any class and
//! are always raised.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_type::ValueType;

/// Discriminator shared by every `ModelError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    FileOpenError,
    FileReadError,
    FileWriteError,
    FileSeekError,
    FileCloseError,
    InvalidFileNumber,
    UnknownFileType,
    MalformedString,
    CanNotConvertToString,
    UserAbortRequested,
    InsufficientMemory,
    InvalidRuntimeConversion,
    InvalidRangeParameter,
    InvalidContainerContents,
    InvalidRow,
    InvalidColumn,
    InvalidIndex,
    IncompatibleMatrixDimensions,
    InvalidMatrixDimensions,
    MatrixIsSingular,
    TypeDoesNotSupportSubscripts,
    InvalidNumericValue,
    ResultIsNaN,
    ResultIsInfinite,
    CanNotConverge,
}

impl AbortReason {
    /// Short human-readable text for the reason.
    pub fn description(self) -> &'static str {
        match self {
            AbortReason::FileOpenError => "file open error",
            AbortReason::FileReadError => "file read error",
            AbortReason::FileWriteError => "file write error",
            AbortReason::FileSeekError => "file seek error",
            AbortReason::FileCloseError => "file close error",
            AbortReason::InvalidFileNumber => "invalid file number",
            AbortReason::UnknownFileType => "unknown file type",
            AbortReason::MalformedString => "malformed string",
            AbortReason::CanNotConvertToString => "can not convert to string",
            AbortReason::UserAbortRequested => "user abort requested",
            AbortReason::InsufficientMemory => "insufficient memory",
            AbortReason::InvalidRuntimeConversion => "invalid runtime conversion",
            AbortReason::InvalidRangeParameter => "invalid range parameter",
            AbortReason::InvalidContainerContents => "invalid container contents",
            AbortReason::InvalidRow => "invalid row",
            AbortReason::InvalidColumn => "invalid column",
            AbortReason::InvalidIndex => "invalid index",
            AbortReason::IncompatibleMatrixDimensions => "incompatible matrix dimensions",
            AbortReason::InvalidMatrixDimensions => "invalid matrix dimensions",
            AbortReason::MatrixIsSingular => "matrix is singular",
            AbortReason::TypeDoesNotSupportSubscripts => "type does not support subscripts",
            AbortReason::InvalidNumericValue => "invalid numeric value",
            AbortReason::ResultIsNaN => "result is NaN",
            AbortReason::ResultIsInfinite => "result is infinite",
            AbortReason::CanNotConverge => "can not converge",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Which endpoint of a range carried the wrong kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangePosition {
    First,
    Second,
    Last,
}

impl fmt::Display for RangePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangePosition::First => write!(f, "first"),
            RangePosition::Second => write!(f, "second"),
            RangePosition::Last => write!(f, "last"),
        }
    }
}

/// Longest string snippet kept by `ModelError::MalformedString`.
pub const MALFORMED_SNIPPET_BYTES: usize = 128;

/// Runtime error type
///
/// A tagged sum over every abort reason; the payload of each variant is the
/// data the host needs to report the failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("file open error: {filename} (errno {errno})")]
    FileOpen { filename: String, errno: i32 },

    #[error("file read error: {filename} (errno {errno})")]
    FileRead { filename: String, errno: i32 },

    #[error("file write error: {filename} (errno {errno})")]
    FileWrite { filename: String, errno: i32 },

    #[error("file seek error: {filename} at offset {offset} (errno {errno})")]
    FileSeek {
        filename: String,
        errno: i32,
        offset: u64,
    },

    #[error("file close error: {filename} (errno {errno})")]
    FileClose { filename: String, errno: i32 },

    #[error("invalid file number {handle}")]
    InvalidFileNumber { handle: i64 },

    #[error("unknown file type: {filename}")]
    UnknownFileType { filename: String },

    #[error("malformed string at byte {offset}: {snippet:?}")]
    MalformedString { snippet: Vec<u8>, offset: usize },

    #[error("can not convert to string")]
    CanNotConvertToString,

    #[error("user abort requested")]
    UserAbortRequested,

    #[error("insufficient memory")]
    InsufficientMemory,

    #[error("invalid runtime conversion from {from} to {to}")]
    InvalidRuntimeConversion { from: ValueType, to: ValueType },

    #[error("invalid range parameter: {position} endpoint has kind {kind}")]
    InvalidRangeParameter {
        position: RangePosition,
        kind: ValueType,
    },

    #[error("invalid container contents: {kind}")]
    InvalidContainerContents { kind: ValueType },

    #[error("invalid row {requested}, expected 1..={bound}")]
    InvalidRow { requested: i64, bound: usize },

    #[error("invalid column {requested}, expected 1..={bound}")]
    InvalidColumn { requested: i64, bound: usize },

    #[error("invalid index {requested}, expected 1..={bound}")]
    InvalidIndex { requested: i64, bound: usize },

    #[error(
        "incompatible matrix dimensions: {lhs_rows}x{lhs_cols} and {rhs_rows}x{rhs_cols}"
    )]
    IncompatibleMatrixDimensions {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("invalid matrix dimensions: {rows}x{cols}")]
    InvalidMatrixDimensions { rows: usize, cols: usize },

    #[error("matrix is singular")]
    MatrixIsSingular,

    #[error("type {kind} does not support subscripts")]
    TypeDoesNotSupportSubscripts { kind: ValueType },

    #[error("invalid numeric value")]
    InvalidNumericValue,

    #[error("result is NaN")]
    ResultIsNaN,

    #[error("result is infinite")]
    ResultIsInfinite,

    #[error("can not converge")]
    CanNotConverge,
}

impl ModelError {
    /// Create a conversion error between two kinds
    pub fn conversion(from: ValueType, to: ValueType) -> Self {
        ModelError::InvalidRuntimeConversion { from, to }
    }

    /// Create a dimension mismatch error from two shapes
    pub fn incompatible(lhs: (usize, usize), rhs: (usize, usize)) -> Self {
        ModelError::IncompatibleMatrixDimensions {
            lhs_rows: lhs.0,
            lhs_cols: lhs.1,
            rhs_rows: rhs.0,
            rhs_cols: rhs.1,
        }
    }

    /// Create a malformed string error, keeping at most 128 bytes of context
    pub fn malformed_string(bytes: &[u8], offset: usize) -> Self {
        let end = bytes.len().min(MALFORMED_SNIPPET_BYTES);
        ModelError::MalformedString {
            snippet: bytes[..end].to_vec(),
            offset,
        }
    }

    pub fn reason(&self) -> AbortReason {
        match self {
            ModelError::FileOpen { .. } => AbortReason::FileOpenError,
            ModelError::FileRead { .. } => AbortReason::FileReadError,
            ModelError::FileWrite { .. } => AbortReason::FileWriteError,
            ModelError::FileSeek { .. } => AbortReason::FileSeekError,
            ModelError::FileClose { .. } => AbortReason::FileCloseError,
            ModelError::InvalidFileNumber { .. } => AbortReason::InvalidFileNumber,
            ModelError::UnknownFileType { .. } => AbortReason::UnknownFileType,
            ModelError::MalformedString { .. } => AbortReason::MalformedString,
            ModelError::CanNotConvertToString => AbortReason::CanNotConvertToString,
            ModelError::UserAbortRequested => AbortReason::UserAbortRequested,
            ModelError::InsufficientMemory => AbortReason::InsufficientMemory,
            ModelError::InvalidRuntimeConversion { .. } => AbortReason::InvalidRuntimeConversion,
            ModelError::InvalidRangeParameter { .. } => AbortReason::InvalidRangeParameter,
            ModelError::InvalidContainerContents { .. } => AbortReason::InvalidContainerContents,
            ModelError::InvalidRow { .. } => AbortReason::InvalidRow,
            ModelError::InvalidColumn { .. } => AbortReason::InvalidColumn,
            ModelError::InvalidIndex { .. } => AbortReason::InvalidIndex,
            ModelError::IncompatibleMatrixDimensions { .. } => {
                AbortReason::IncompatibleMatrixDimensions
            }
            ModelError::InvalidMatrixDimensions { .. } => AbortReason::InvalidMatrixDimensions,
            ModelError::MatrixIsSingular => AbortReason::MatrixIsSingular,
            ModelError::TypeDoesNotSupportSubscripts { .. } => {
                AbortReason::TypeDoesNotSupportSubscripts
            }
            ModelError::InvalidNumericValue => AbortReason::InvalidNumericValue,
            ModelError::ResultIsNaN => AbortReason::ResultIsNaN,
            ModelError::ResultIsInfinite => AbortReason::ResultIsInfinite,
            ModelError::CanNotConverge => AbortReason::CanNotConverge,
        }
    }

    /// The gate class controlling this error, or `None` when it is always raised.
    pub fn class(&self) -> Option<ExceptionClass> {
        match self {
            ModelError::FileOpen { .. }
            | ModelError::FileRead { .. }
            | ModelError::FileWrite { .. }
            | ModelError::FileSeek { .. }
            | ModelError::FileClose { .. }
            | ModelError::InvalidFileNumber { .. }
            | ModelError::UnknownFileType { .. } => Some(ExceptionClass::FileErrors),
            ModelError::MalformedString { .. } | ModelError::CanNotConvertToString => {
                Some(ExceptionClass::MalformedString)
            }
            ModelError::InvalidRuntimeConversion { .. }
            | ModelError::InvalidRangeParameter { .. }
            | ModelError::InvalidContainerContents { .. }
            | ModelError::TypeDoesNotSupportSubscripts { .. } => {
                Some(ExceptionClass::TypeConversion)
            }
            ModelError::InvalidNumericValue => Some(ExceptionClass::InvalidParameter),
            ModelError::ResultIsNaN => Some(ExceptionClass::NaN),
            ModelError::ResultIsInfinite => Some(ExceptionClass::Infinity),
            ModelError::CanNotConverge => Some(ExceptionClass::NonConvergence),
            ModelError::UserAbortRequested
            | ModelError::InsufficientMemory
            | ModelError::InvalidRow { .. }
            | ModelError::InvalidColumn { .. }
            | ModelError::InvalidIndex { .. }
            | ModelError::IncompatibleMatrixDimensions { .. }
            | ModelError::InvalidMatrixDimensions { .. }
            | ModelError::MatrixIsSingular => None,
        }
    }

    /// True when the error must be raised whatever the gate says.
    pub fn is_fatal(&self) -> bool {
        self.class().is_none()
    }
}

/// Result type alias for runtime operations
pub type ModelResult<T> = Result<T, ModelError>;

// ========== Exception-class gate ==========

/// Categories of errors that can be suppressed process-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExceptionClass {
    FileErrors,
    MalformedString,
    TypeConversion,
    InvalidParameter,
    NaN,
    Infinity,
    NonConvergence,
}

impl ExceptionClass {
    pub const ALL: [ExceptionClass; 7] = [
        ExceptionClass::FileErrors,
        ExceptionClass::MalformedString,
        ExceptionClass::TypeConversion,
        ExceptionClass::InvalidParameter,
        ExceptionClass::NaN,
        ExceptionClass::Infinity,
        ExceptionClass::NonConvergence,
    ];

    fn bit(self) -> u32 {
        match self {
            ExceptionClass::FileErrors => 1 << 0,
            ExceptionClass::MalformedString => 1 << 1,
            ExceptionClass::TypeConversion => 1 << 2,
            ExceptionClass::InvalidParameter => 1 << 3,
            ExceptionClass::NaN => 1 << 4,
            ExceptionClass::Infinity => 1 << 5,
            ExceptionClass::NonConvergence => 1 << 6,
        }
    }

    /// Map the C ABI class number to a class.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

const ALL_CLASSES: u32 = (1 << 7) - 1;

static ENABLED_CLASSES: AtomicU32 = AtomicU32::new(ALL_CLASSES);

/// Enable or disable raising of one exception class.
pub fn enable_exception_class(class: ExceptionClass, enabled: bool) {
    if enabled {
        ENABLED_CLASSES.fetch_or(class.bit(), Ordering::SeqCst);
    } else {
        ENABLED_CLASSES.fetch_and(!class.bit(), Ordering::SeqCst);
    }
}

pub fn exception_class_enabled(class: ExceptionClass) -> bool {
    ENABLED_CLASSES.load(Ordering::SeqCst) & class.bit() != 0
}

/// Raise `err` if its class is enabled (or it is fatal), otherwise yield `sentinel`.
pub fn raise_or<T>(err: ModelError, sentinel: T) -> ModelResult<T> {
    match err.class() {
        Some(class) if !exception_class_enabled(class) => {
            tracing::debug!(reason = %err.reason(), "suppressed by exception gate");
            Ok(sentinel)
        }
        _ => Err(err),
    }
}

// ========== Numeric guards ==========

/// Reject NaN and infinite results when their classes are enabled.
pub fn check_real(value: f64) -> ModelResult<f64> {
    if value.is_nan() {
        raise_or(ModelError::ResultIsNaN, value)
    } else if value.is_infinite() {
        raise_or(ModelError::ResultIsInfinite, value)
    } else {
        Ok(value)
    }
}
