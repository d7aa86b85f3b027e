//! Cost matrix composition for dynamic obstacles.
//!
//! [`apply_cost_matrix_options`] starts from a borrowed base matrix and
//! only clones it on the first write, so rooms with nothing to mark cost no
//! allocation.  Mutations run in a fixed order:
//!
//! 1. agents → impassable
//! 2. tiles within 5 of a keeper-guarded resource node → impassable
//! 3. blocking structures, our own obstacle construction sites and closed
//!    foreign ramparts → impassable
//! 4. roads → `road_cost`, unless already impassable
//! 5. avoid targets → soft-block gradient out to `range + 1`, never lowering
//!    a tile and never touching walls
//! 6. portal entrances → impassable, except those being traversed

use std::borrow::Cow;

use cg_core::{MoveTarget, Position, RoomName};

use crate::pathfinder::{CostMatrix, IMPASSABLE, SOFT_BLOCK};
use crate::world::{StructureKind, Terrain, WorldView};

/// Danger radius around keeper-guarded resource nodes.
pub const SOURCE_KEEPER_RADIUS: u8 = 5;

#[derive(Clone, Debug)]
pub struct CostMatrixOpts<'a> {
    pub avoid_creeps:              bool,
    pub avoid_source_keepers:      bool,
    pub avoid_obstacle_structures: bool,
    pub road_cost:                 Option<u8>,
    /// Targets to steer around, any room; only those in the matrix's room
    /// are painted.
    pub avoid_targets:             &'a [MoveTarget],
    /// Weight lost per tile of distance from an avoid target.
    pub avoid_target_gradient:     f64,
    pub block_portals:             bool,
    /// Portal entrances left open because the path deliberately uses them.
    pub open_portals:              &'a [Position],
}

impl Default for CostMatrixOpts<'_> {
    fn default() -> Self {
        Self {
            avoid_creeps:              false,
            avoid_source_keepers:      true,
            avoid_obstacle_structures: true,
            road_cost:                 Some(1),
            avoid_targets:             &[],
            avoid_target_gradient:     0.0,
            block_portals:             true,
            open_portals:              &[],
        }
    }
}

/// Apply every enabled mutation for `room` to `base`.
///
/// `keeper_nodes` are the remembered resource nodes of a keeper room (see
/// [`intel`](crate::intel)); pass an empty slice elsewhere.
pub fn apply_cost_matrix_options<'m, W: WorldView + ?Sized>(
    base: &'m CostMatrix,
    room: RoomName,
    opts: &CostMatrixOpts<'_>,
    world: &W,
    keeper_nodes: &[Position],
) -> Cow<'m, CostMatrix> {
    let mut cm = Cow::Borrowed(base);
    let block = |cm: &mut Cow<'m, CostMatrix>, pos: Position| {
        if pos.room() == room && cm.get(pos.coord()) != IMPASSABLE {
            cm.to_mut().set(pos.coord(), IMPASSABLE);
        }
    };

    if opts.avoid_creeps {
        for pos in world.agents_in(room) {
            block(&mut cm, pos);
        }
    }

    if opts.avoid_source_keepers {
        for node in keeper_nodes.iter().filter(|n| n.room() == room) {
            for pos in node.nearby(SOURCE_KEEPER_RADIUS, true) {
                block(&mut cm, pos);
            }
        }
    }

    if opts.avoid_obstacle_structures || opts.road_cost.is_some() {
        let structures = world.structures_in(room);
        if opts.avoid_obstacle_structures {
            for s in structures.iter().filter(|s| s.blocks()) {
                block(&mut cm, s.pos);
            }
            for c in world.construction_sites_in(room).iter().filter(|c| c.blocks()) {
                block(&mut cm, c.pos);
            }
        }
        if let Some(road_cost) = opts.road_cost {
            for s in structures.iter().filter(|s| s.kind == StructureKind::Road) {
                let c = s.pos.coord();
                let current = cm.get(c);
                if current != IMPASSABLE && current != road_cost {
                    cm.to_mut().set(c, road_cost);
                }
            }
        }
    }

    for target in opts.avoid_targets.iter().filter(|t| t.pos.room() == room) {
        let reach = u8::try_from(target.range + 1).unwrap_or(u8::MAX);
        for pos in target.pos.nearby(reach, true) {
            if world.terrain_at(pos) == Some(Terrain::Wall) {
                continue;
            }
            let dist = target.pos.range_to(pos) as f64;
            let weight = (SOFT_BLOCK as f64 - opts.avoid_target_gradient * dist)
                .round()
                .clamp(1.0, SOFT_BLOCK as f64) as u8;
            if cm.get(pos.coord()) < weight {
                cm.to_mut().set(pos.coord(), weight);
            }
        }
    }

    if opts.block_portals {
        for portal in world.portals_in(room) {
            if !opts.open_portals.contains(&portal.pos) {
                block(&mut cm, portal.pos);
            }
        }
    }

    cm
}
