use cg_core::{CoreError, Position};
use cg_movement::MovementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("cannot place agent at {pos}: {reason}")]
    Placement { pos: Position, reason: &'static str },

    #[error("world row {line}: {reason}")]
    Row { line: u64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Movement(#[from] MovementError),
}

pub type SimResult<T> = Result<T, SimError>;
