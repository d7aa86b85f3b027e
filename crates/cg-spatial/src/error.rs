//! Spatial-subsystem error type.
//!
//! Unreachable destinations are not errors here: routing and path searches
//! report them as `None`.

use cg_cache::CacheError;
use cg_core::CoreError;
use thiserror::Error;

/// Errors produced by `cg-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("corrupt portal set: {0}")]
    CorruptPortalSet(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
