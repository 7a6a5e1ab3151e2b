//! Identity types for the tempo scheduler
//!
//! Scheduling identity is an explicit 64-bit id held by the caller, not the
//! closure reference. Registering several delayed calls under one id groups
//! them for bulk cancellation; callers that need independent cancellation
//! mint distinct ids.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// Callback identity - keys ticker items and delayed-call groups
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CallbackId(pub u64);

impl CallbackId {
    pub const ZERO: CallbackId = CallbackId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        CallbackId(id)
    }

    /// Mint a process-unique id
    pub fn next() -> Self {
        CallbackId(NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:#x})", self.0)
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
