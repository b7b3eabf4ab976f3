//! Cooperative cancellation for long-running queries (spec §5): checked
//! between tree-node visits and between batches, never preemptive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)) }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Wraps a result that may have been cut short by cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialResult<T> {
    pub value: T,
    pub cancelled: bool,
}

impl<T> PartialResult<T> {
    pub fn complete(value: T) -> Self {
        Self { value, cancelled: false }
    }

    pub fn partial(value: T) -> Self {
        Self { value, cancelled: true }
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod cancel_tests;
