//! Advisory user-abort flag.
//!
//! The host raises the flag; iterative routines poll it at their iteration
//! boundary and unwind with `ModelError::UserAbortRequested`.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ModelError, ModelResult};

static ABORT_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn request() {
    ABORT_REQUESTED.store(true, Ordering::SeqCst);
}

pub fn reset() {
    ABORT_REQUESTED.store(false, Ordering::SeqCst);
}

pub fn is_requested() -> bool {
    ABORT_REQUESTED.load(Ordering::SeqCst)
}

/// Poll point for long-running loops.
pub fn check() -> ModelResult<()> {
    if is_requested() {
        tracing::warn!("user abort observed at iteration boundary");
        Err(ModelError::UserAbortRequested)
    } else {
        Ok(())
    }
}
