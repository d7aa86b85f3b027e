//! Path generation: region route first, then one host search per leg.
//!
//! A route is only computed when no target lies in the origin room or a
//! room next to it; short trips search directly.  A route with a portal
//! hop is searched in two legs, origin to a portal entrance and portal
//! exit to the targets, joined as `leg1 ++ [exit] ++ leg2`.

use cg_cache::MemoryCache;
use cg_core::{MoveTarget, Position, RoomName};
use cg_spatial::{
    apply_cost_matrix_options, find_route, source_keeper_nodes, CostMatrix, PathFinder,
    PortalIndex, RegionRoute, WorldView,
};
use tracing::debug;

use crate::opts::MoveOpts;

/// Everything a search needs from the world besides the pathfinder.
pub struct PathContext<'a, W: ?Sized> {
    pub world:   &'a W,
    pub portals: &'a PortalIndex,
    /// Source of remembered keeper nodes.
    pub memory:  &'a mut MemoryCache,
}

/// The cost matrix a search would see for `room`.
pub fn room_cost_matrix<W: WorldView + ?Sized>(
    world: &W,
    memory: &mut MemoryCache,
    room: RoomName,
    opts: &MoveOpts,
    open_portals: &[Position],
) -> CostMatrix {
    let base = opts.base_matrix(room);
    let avoid = opts.avoid_targets_in(room);
    let keepers = if opts.avoid_source_keepers() { source_keeper_nodes(memory, room) } else { Vec::new() };
    apply_cost_matrix_options(&base, room, &opts.cost_matrix_opts(&avoid, open_portals), world, &keepers)
        .into_owned()
}

/// A path from `origin` (exclusive) to the nearest of `targets`, or `None`
/// when no route or no host path exists.
///
/// An incomplete host search still yields its partial path, ending at the
/// closest tile found.
pub fn generate_path<W, P>(
    cx: &mut PathContext<'_, W>,
    pathfinder: &mut P,
    origin: Position,
    targets: &[MoveTarget],
    opts: &MoveOpts,
) -> Option<Vec<Position>>
where
    W: WorldView + ?Sized,
    P: PathFinder + ?Sized,
{
    if targets.is_empty() {
        return None;
    }

    let route = if needs_route(cx.world, origin.room(), targets) {
        let mut destinations: Vec<RoomName> = targets.iter().map(|t| t.pos.room()).collect();
        destinations.sort();
        destinations.dedup();
        let Some(route) = find_route(cx.world, cx.portals, origin.room(), &destinations, &opts.route_opts())
        else {
            debug!(%origin, rooms = ?destinations, "no route");
            return None;
        };
        debug!(%origin, rooms = route.rooms.len(), portal = route.portal.is_some(), "route generated");
        Some(route)
    } else {
        None
    };

    match route {
        Some(route) if route.portal.is_some() => portal_path(cx, pathfinder, origin, targets, opts, &route),
        Some(route) => search(cx, pathfinder, origin, targets, opts, Some(&route.rooms), &[]),
        None => search(cx, pathfinder, origin, targets, opts, None, &[]),
    }
}

/// Every target is more than one room away.
fn needs_route<W: WorldView + ?Sized>(world: &W, origin: RoomName, targets: &[MoveTarget]) -> bool {
    let exits = world.exits(origin);
    !targets.iter().any(|t| {
        let room = t.pos.room();
        room == origin || exits.contains(&Some(room))
    })
}

fn portal_path<W, P>(
    cx: &mut PathContext<'_, W>,
    pathfinder: &mut P,
    origin: Position,
    targets: &[MoveTarget],
    opts: &MoveOpts,
    route: &RegionRoute,
) -> Option<Vec<Position>>
where
    W: WorldView + ?Sized,
    P: PathFinder + ?Sized,
{
    let hop = route.portal?;
    let set = cx.portals.get(hop.from, hop.to)?.clone();
    let split = route.steps.iter().position(|s| s.room == hop.to)?;
    let before: Vec<RoomName> = route.steps[..split].iter().map(|s| s.room).collect();
    let after: Vec<RoomName> = route.steps[split..].iter().map(|s| s.room).collect();

    let entrances = set.entrances_in(hop.from);
    let entrance_targets: Vec<MoveTarget> = entrances.iter().copied().map(MoveTarget::exact).collect();
    let mut path = search(cx, pathfinder, origin, &entrance_targets, opts, Some(&before), &entrances)?;
    let entrance = *path.last()?;
    let Some(exit) = set.destination_of(entrance) else {
        debug!(%origin, %entrance, "path stopped short of a portal");
        return None;
    };
    path.push(exit);

    if !targets.iter().any(|t| t.contains(exit)) {
        let rest = search(cx, pathfinder, exit, targets, opts, Some(&after), &[])?;
        path.extend(rest);
    }
    debug!(%origin, %entrance, %exit, len = path.len(), "path stitched through portal");
    Some(path)
}

/// One host search, restricted to `rooms` when given.
fn search<W, P>(
    cx: &mut PathContext<'_, W>,
    pathfinder: &mut P,
    origin: Position,
    targets: &[MoveTarget],
    opts: &MoveOpts,
    rooms: Option<&[RoomName]>,
    open_portals: &[Position],
) -> Option<Vec<Position>>
where
    W: WorldView + ?Sized,
    P: PathFinder + ?Sized,
{
    let search_rooms = rooms.map_or(2, <[RoomName]>::len);
    let mut search_opts = opts.search_opts(search_rooms);
    if rooms.is_none() {
        search_opts.max_rooms = opts.max_rooms() as u32;
    }

    let world = cx.world;
    let memory = &mut *cx.memory;
    let mut room_callback = |room: RoomName| -> Option<CostMatrix> {
        if rooms.is_some_and(|allowed| !allowed.contains(&room)) {
            return None;
        }
        Some(room_cost_matrix(world, memory, room, opts, open_portals))
    };
    let result = pathfinder.search(origin, targets, &search_opts, &mut room_callback);

    if result.path.is_empty() {
        debug!(%origin, ops = result.ops, incomplete = result.incomplete, "host search found no path");
        return None;
    }
    if result.incomplete {
        debug!(%origin, ops = result.ops, len = result.path.len(), "host search incomplete");
    }
    Some(result.path)
}
