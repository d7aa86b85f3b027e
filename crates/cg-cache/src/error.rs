//! Error types for cg-cache.

use cg_core::CoreError;
use thiserror::Error;

/// Failure to encode or decode a cached value.
///
/// These never escape a typed cache read: the decorator logs them and
/// drops the offending entry.  They do surface from explicit persistence
/// calls such as [`MemoryCache::from_json`](crate::MemoryCache::from_json).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt cache value: {0}")]
    Corrupt(String),
}

/// Alias for `Result<T, CacheError>`.
pub type CacheResult<T> = Result<T, CacheError>;
