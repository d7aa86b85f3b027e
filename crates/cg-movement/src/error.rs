use cg_cache::CacheError;
use cg_core::CoreError;
use thiserror::Error;

/// Failures of the movement layer's configuration and persistence surface.
///
/// Routine outcomes (no route, no path, agent off its path) are reported
/// as [`MoveStatus`](cg_core::MoveStatus) codes, never through this type.
#[derive(Debug, Error)]
pub enum MovementError {
    #[error("invalid move options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type MovementResult<T> = Result<T, MovementError>;
