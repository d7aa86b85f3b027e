//! Status codes returned by every movement entry point.
//!
//! The numeric values follow the host's convention so that callers already
//! branching on host return codes can treat both uniformly.  Contention
//! ("did not move this tick") is *not* a status: an agent whose intent lost
//! reconciliation still saw `Ok` from its movement call.

use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveStatus {
    /// Intent registered, move issued, or already at the destination.
    Ok,
    /// No route or no host path to any target.
    NoPath,
    /// Agent could not be located on the cached path.
    NotFound,
    /// Agent has no resolvable position.
    InvalidArgs,
    /// Host refused a direct move because of fatigue.
    Tired,
    /// Host refused a direct move because the agent cannot move at all.
    NoBodypart,
}

impl MoveStatus {
    /// Host integer code.
    pub const fn code(self) -> i32 {
        match self {
            MoveStatus::Ok => 0,
            MoveStatus::NoPath => -2,
            MoveStatus::NotFound => -5,
            MoveStatus::InvalidArgs => -10,
            MoveStatus::Tired => -11,
            MoveStatus::NoBodypart => -12,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, MoveStatus::Ok)
    }
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
