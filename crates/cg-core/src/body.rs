//! Movement capacity of an agent's body.
//!
//! Each non-move part and each *loaded* carry part weighs one unit; each
//! move part offsets two units of fatigue per tick.  When a caller gives no
//! explicit terrain costs, pathing costs are derived from that ratio so that
//! a lightly loaded agent barely distinguishes plains from swamps.

/// Capacity of one carry part.
pub const CARRY_CAPACITY: u32 = 50;

/// Terrain cost ceiling; costs at or above this would collide with the
/// soft-block and impassable markers.
const COST_CEILING: u32 = 254;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyInfo {
    pub move_parts:    u32,
    pub carry_parts:   u32,
    pub other_parts:   u32,
    pub used_capacity: u32,
}

/// Road, plain and swamp traversal costs.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TerrainCosts {
    pub road:  u8,
    pub plain: u8,
    pub swamp: u8,
}

impl BodyInfo {
    /// Parts that generate fatigue.
    pub fn weight(&self) -> u32 {
        self.other_parts + self.carry_parts.min(self.used_capacity.div_ceil(CARRY_CAPACITY))
    }

    /// Fatigue generated per tile: road 1, plain 2, swamp 10 per weight part.
    pub fn fatigue_for(&self, terrain_factor: u32) -> u32 {
        self.weight() * terrain_factor
    }

    /// Per-tile costs proportional to the ticks a step takes, reduced by
    /// their common divisor.  `None` for a body that cannot move.
    pub fn terrain_costs(&self) -> Option<TerrainCosts> {
        if self.move_parts == 0 {
            return None;
        }
        let w = self.weight();
        let per_move = 2 * self.move_parts;
        let ticks = |factor: u32| (factor * w).div_ceil(per_move).max(1);

        let (mut road, mut plain, mut swamp) = (ticks(1), ticks(2), ticks(10));
        let g = gcd(gcd(road, plain), swamp);
        road /= g;
        plain /= g;
        swamp /= g;
        Some(TerrainCosts {
            road:  road.min(COST_CEILING) as u8,
            plain: plain.min(COST_CEILING) as u8,
            swamp: swamp.min(COST_CEILING) as u8,
        })
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a.max(1) } else { gcd(b, a % b) }
}
