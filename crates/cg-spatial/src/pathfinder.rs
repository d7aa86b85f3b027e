//! The host pathfinding primitive.
//!
//! The library never searches tiles itself.  It narrows the search space
//! (route rooms, cost matrices) and hands the actual search to a host
//! implementation of [`PathFinder`].
//!
//! # Cost matrix values
//!
//! | Value    | Meaning                                               |
//! |----------|-------------------------------------------------------|
//! | `0`      | use the terrain cost from [`SearchOpts`]              |
//! | `1..254` | explicit tile cost                                    |
//! | `254`    | soft block: passable only as a last resort            |
//! | `255`    | impassable                                            |

use cg_core::{Coord, MoveTarget, Position, RoomName, ROOM_SIZE};

/// Highest cost that is still a tile cost rather than a block marker.
pub const SOFT_BLOCK: u8 = 254;
pub const IMPASSABLE: u8 = 255;

const TILES: usize = ROOM_SIZE as usize * ROOM_SIZE as usize;

/// Per-room tile cost overrides.
#[derive(Clone, PartialEq, Eq)]
pub struct CostMatrix {
    bits: Box<[u8; TILES]>,
}

impl Default for CostMatrix {
    fn default() -> Self {
        Self { bits: Box::new([0; TILES]) }
    }
}

impl CostMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, c: Coord) -> u8 {
        self.bits[c.index()]
    }

    #[inline]
    pub fn set(&mut self, c: Coord, cost: u8) {
        self.bits[c.index()] = cost;
    }

    /// Number of tiles carrying a non-zero override.
    pub fn overrides(&self) -> usize {
        self.bits.iter().filter(|&&b| b != 0).count()
    }
}

impl std::fmt::Debug for CostMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostMatrix").field("overrides", &self.overrides()).finish()
    }
}

/// Options passed through to the host search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOpts {
    pub plain_cost:       u8,
    pub swamp_cost:       u8,
    /// Node expansion budget across all rooms.
    pub max_ops:          u32,
    pub max_rooms:        u32,
    /// Search away from the goals instead of toward them.
    pub flee:             bool,
    pub heuristic_weight: f32,
}

impl Default for SearchOpts {
    fn default() -> Self {
        Self {
            plain_cost:       1,
            swamp_cost:       5,
            max_ops:          2000,
            max_rooms:        16,
            flee:             false,
            heuristic_weight: 1.2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathResult {
    /// Steps from the origin (exclusive) to the goal (inclusive).
    pub path:       Vec<Position>,
    pub ops:        u32,
    pub cost:       u32,
    /// No goal was reached; `path` ends at the closest tile found.
    pub incomplete: bool,
}

/// Grid search supplied by the host.
///
/// `room_callback` is asked once per room the search wants to enter.
/// `None` removes the room from the search; otherwise the returned matrix
/// overrides terrain costs for that room.
pub trait PathFinder {
    fn search(
        &mut self,
        origin: Position,
        goals: &[MoveTarget],
        opts: &SearchOpts,
        room_callback: &mut dyn FnMut(RoomName) -> Option<CostMatrix>,
    ) -> PathResult;
}
