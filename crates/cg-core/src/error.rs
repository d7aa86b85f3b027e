//! Core error type.
//!
//! Everything in here is a configuration or programmer error: a malformed
//! room name, a codec built with an impossible depth, an object id that is
//! not hexadecimal.  Routine outcomes (no path, agent off its path) are never
//! reported through this type; they travel as `Option` or
//! [`MoveStatus`](crate::MoveStatus).

use thiserror::Error;

/// The error type for `cg-core` and a common base for sub-crates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid room name {0:?}")]
    InvalidRoomName(String),

    #[error("room coordinate ({x}, {y}) lies outside the world")]
    RoomOutOfWorld { x: i32, y: i32 },

    #[error("coordinate ({x}, {y}) lies outside the 50x50 room grid")]
    PositionOutOfRoom { x: i32, y: i32 },

    #[error("invalid codec configuration: {0}")]
    CodecConfig(String),

    #[error("value {value} does not fit in {depth} bits")]
    CodecRange { value: u64, depth: u32 },

    #[error("malformed encoded string: {0}")]
    Malformed(String),

    #[error("invalid object id {0:?}")]
    InvalidId(String),
}

/// Shorthand result type for all `cg-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
