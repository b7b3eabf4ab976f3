//! Unified error model for the store core.
//!
//! Mirrors the error kinds of the coordinate-indexed node store: callers
//! match on variant, not on string content. `StorageIO` and `Serialization`
//! wrap the underlying library error for diagnostics.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MeridianError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("irreversible delta: {0}")]
    IrreversibleDelta(String),

    #[error("storage I/O error: {0}")]
    StorageIO(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("resource pressure: {0}")]
    ResourcePressure(String),
}

impl MeridianError {
    pub fn not_found_node(id: Uuid) -> Self {
        MeridianError::NotFound(format!("node {id}"))
    }

    pub fn not_found_delta(id: Uuid) -> Self {
        MeridianError::NotFound(format!("delta {id}"))
    }

    /// Internal retries are permitted only for this kind (spec: transient backend I/O).
    pub fn is_retryable(&self) -> bool {
        matches!(self, MeridianError::StorageIO(_))
    }
}

pub type MeridianResult<T> = Result<T, MeridianError>;

impl From<serde_json::Error> for MeridianError {
    fn from(err: serde_json::Error) -> Self {
        MeridianError::Serialization(err.to_string())
    }
}

impl From<rocksdb::Error> for MeridianError {
    fn from(err: rocksdb::Error) -> Self {
        MeridianError::StorageIO(err.to_string())
    }
}

impl From<std::io::Error> for MeridianError {
    fn from(err: std::io::Error) -> Self {
        MeridianError::StorageIO(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for MeridianError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        MeridianError::Serialization(err.to_string())
    }
}

/// Exponential backoff for transient `StorageIO` retries only.
///
/// Grounded on the original implementation's `ExponentialBackoffStrategy`:
/// never applied to non-retryable error kinds, and bounded by `max_attempts`.
pub(crate) fn retry_storage_io<T, F>(max_attempts: u32, mut op: F) -> MeridianResult<T>
where
    F: FnMut() -> MeridianResult<T>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                let delay_ms = 2u64.pow(attempt) * 10;
                tracing::warn!(target: "meridian::error", attempt, delay_ms, "retrying transient storage error: {e}");
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
