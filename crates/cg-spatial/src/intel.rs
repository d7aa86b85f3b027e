//! Per-tick intel refresh over visible rooms.
//!
//! Keeper-room resource nodes are remembered permanently in the durable
//! cache (they never move).  Portal sets are rescanned every tick and the
//! whole index is flushed back to the durable store.

use cg_cache::{CacheExt, CachingStrategy, MemoryCache, PositionListSerializer};
use cg_core::{room_key, Position, RoomName};
use tracing::debug;

use crate::portals::PortalIndex;
use crate::world::WorldView;

pub const SOURCE_KEEPER_SUFFIX: &str = "_ck";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IntelReport {
    pub rooms_scanned:       usize,
    pub keeper_rooms_added:  usize,
    pub portal_sets_dropped: usize,
    pub portal_sets:         usize,
}

/// Remember the resource nodes of a visible keeper room, once.
/// Returns whether anything new was recorded.
pub fn scan_source_keepers<W: WorldView + ?Sized>(world: &W, memory: &mut MemoryCache, room: RoomName) -> bool {
    if !room.is_source_keeper() || room.is_center() {
        return false;
    }
    let key = room_key(room, SOURCE_KEEPER_SUFFIX);
    if memory.get(&key).is_some() {
        return false;
    }
    let nodes = world.resource_nodes_in(room);
    if nodes.is_empty() {
        return false;
    }
    debug!(%room, nodes = nodes.len(), "recorded keeper resource nodes");
    memory.with(PositionListSerializer).set(&key, nodes, None);
    true
}

/// Remembered keeper nodes for `room`; empty when none are known.
pub fn source_keeper_nodes(memory: &mut MemoryCache, room: RoomName) -> Vec<Position> {
    memory
        .with(PositionListSerializer)
        .get(&room_key(room, SOURCE_KEEPER_SUFFIX))
        .unwrap_or_default()
}

/// Scan every visible room, expire stale portal sets, and flush the portal
/// index into the durable store.
pub fn update_intel<W: WorldView + ?Sized>(
    world: &W,
    memory: &mut MemoryCache,
    portals: &mut PortalIndex,
) -> IntelReport {
    let mut report = IntelReport::default();
    for room in world.visible_rooms() {
        report.rooms_scanned += 1;
        if scan_source_keepers(world, memory, room) {
            report.keeper_rooms_added += 1;
        }
        report.portal_sets_dropped += portals.scan_room(world, room);
    }
    report.portal_sets_dropped += portals.prune_expired(world.time());
    report.portal_sets = portals.len();
    memory.store_mut().portals = portals.to_store();
    report
}
