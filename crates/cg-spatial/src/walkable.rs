//! Walkability of single tiles.

use cg_core::Position;

use crate::world::{Terrain, WorldView};

/// `false` for walls, unknown rooms, agents (unless ignored) and blocking
/// structures or construction sites (unless ignored).
pub fn is_walkable<W: WorldView + ?Sized>(
    world: &W,
    pos: Position,
    ignore_agents: bool,
    ignore_structures: bool,
) -> bool {
    match world.terrain_at(pos) {
        None | Some(Terrain::Wall) => return false,
        Some(_) => {}
    }
    if !world.is_visible(pos.room()) {
        return true;
    }
    let room = pos.room();
    if !ignore_agents && world.agents_in(room).contains(&pos) {
        return false;
    }
    if !ignore_structures {
        if world.structures_in(room).iter().any(|s| s.pos == pos && s.blocks()) {
            return false;
        }
        if world.construction_sites_in(room).iter().any(|c| c.pos == pos && c.blocks()) {
            return false;
        }
    }
    true
}

/// Same-room neighbours that are walkable, structures considered.
pub fn adjacent_walkable<W: WorldView + ?Sized>(world: &W, pos: Position, ignore_agents: bool) -> Vec<Position> {
    pos.adjacent()
        .into_iter()
        .filter(|&p| is_walkable(world, p, ignore_agents, false))
        .collect()
}
