//! Region routing: a coarse room sequence that bounds the host search.
//!
//! # Algorithm
//!
//! 1. Best-first search over the room graph.  Entering a room costs
//!    `route_callback(room, from)` when the callback has an opinion,
//!    otherwise the highway / keeper / default cost from [`RouteOpts`].
//!    An infinite cost removes the room.  Ties pop in insertion order.
//! 2. Portal sets add extra edges (at most one portal hop per route) unless
//!    `avoid_portals` is set.
//! 3. The heuristic is the smaller of the Manhattan room distance to the
//!    nearest destination and the distance through the nearest known
//!    portal.
//! 4. The raw route is enhanced: corner rooms are added so the host search
//!    can cut corners, straight runs whose border exit tiles sit on one
//!    side gain a parallel detour, and a breadth-first flood fill tops the
//!    room set up to `max_rooms`.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use cg_core::{ExitDir, Position, RoomName, ROOM_SIZE};
use tracing::debug;

use crate::portals::PortalIndex;
use crate::world::{Terrain, WorldView};

/// Hard ceiling on the enhanced room set.
pub const MAX_ROUTE_ROOMS: usize = 64;

/// Candidate portal endpoints considered by the heuristic.
const HEURISTIC_PORTALS: usize = 4;

/// Caller override for the cost of entering `room` from `from`.
/// `Some(f64::INFINITY)` blocks the room; `None` falls back to defaults.
#[derive(Clone)]
pub struct RouteCallback(pub Rc<dyn Fn(RoomName, RoomName) -> Option<f64>>);

impl RouteCallback {
    pub fn new(f: impl Fn(RoomName, RoomName) -> Option<f64> + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl fmt::Debug for RouteCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteCallback(..)")
    }
}

#[derive(Clone, Debug)]
pub struct RouteOpts {
    pub max_rooms:               usize,
    pub default_room_cost:       f64,
    pub highway_room_cost:       f64,
    pub source_keeper_room_cost: f64,
    pub route_callback:          Option<RouteCallback>,
    pub avoid_portals:           bool,
}

impl Default for RouteOpts {
    fn default() -> Self {
        Self {
            max_rooms:               16,
            default_room_cost:       1.0,
            highway_room_cost:       2.0,
            source_keeper_room_cost: 5.0,
            route_callback:          None,
            avoid_portals:           true,
        }
    }
}

impl RouteOpts {
    fn room_cost(&self, room: RoomName, from: RoomName) -> f64 {
        if let Some(cost) = self.route_callback.as_ref().and_then(|cb| (cb.0)(room, from)) {
            return cost;
        }
        if room.is_highway() {
            self.highway_room_cost
        } else if room.is_source_keeper() {
            self.source_keeper_room_cost
        } else {
            self.default_room_cost
        }
    }
}

/// How a route leaves a room.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RouteEdge {
    Exit(ExitDir),
    Portal,
}

/// "In `room`, leave by `edge`"; the last step has no edge.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RouteStep {
    pub room: RoomName,
    pub edge: Option<RouteEdge>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PortalHop {
    pub from: RoomName,
    pub to:   RoomName,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegionRoute {
    /// The raw route, origin first.
    pub steps:  Vec<RouteStep>,
    /// Enhanced search space: route rooms first, additions after.
    pub rooms:  Vec<RoomName>,
    pub portal: Option<PortalHop>,
    pub cost:   f64,
}

impl RegionRoute {
    /// Number of rooms on the raw route.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, room: RoomName) -> bool {
        self.rooms.contains(&room)
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

/// `f64` ordered by `total_cmp`, for the heap.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Priority(f64);

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Search state: a room, and whether the portal hop is spent.
type State = (RoomName, bool);

/// Find a route from `origin` to the cheapest of `destinations`.
///
/// Returns `None` when no destination is reachable; unreachability is a
/// routine outcome.
pub fn find_route<W: WorldView + ?Sized>(
    world: &W,
    portals: &PortalIndex,
    origin: RoomName,
    destinations: &[RoomName],
    opts: &RouteOpts,
) -> Option<RegionRoute> {
    if destinations.is_empty() {
        return None;
    }
    let use_portals = !opts.avoid_portals && !portals.is_empty();
    let heuristic = |room: RoomName, hop_spent: bool| -> f64 {
        let direct = nearest_destination(room, destinations) as f64;
        if !use_portals || hop_spent {
            return direct;
        }
        portals
            .nearest(room, HEURISTIC_PORTALS)
            .into_iter()
            .map(|(near, far)| (room.distance(near) + nearest_destination(far, destinations)) as f64)
            .fold(direct, f64::min)
    };

    let mut heap: BinaryHeap<Reverse<(Priority, u64, State)>> = BinaryHeap::new();
    let mut best: HashMap<State, f64> = HashMap::new();
    let mut prev: HashMap<State, (State, RouteEdge)> = HashMap::new();
    let mut seq = 0u64;

    let start = (origin, false);
    best.insert(start, 0.0);
    heap.push(Reverse((Priority(heuristic(origin, false)), seq, start)));

    let mut found = None;
    while let Some(Reverse((Priority(f), _, state))) = heap.pop() {
        let (room, hop_spent) = state;
        let g = best.get(&state).copied().unwrap_or(f64::INFINITY);
        if f > g + heuristic(room, hop_spent) {
            continue; // stale
        }
        if destinations.contains(&room) {
            found = Some((state, g));
            break;
        }

        let exits = world.exits(room);
        let mut edges: Vec<(State, RouteEdge)> = ExitDir::ALL
            .into_iter()
            .filter_map(|dir| exits[dir.index()].map(|next| ((next, hop_spent), RouteEdge::Exit(dir))))
            .collect();
        if use_portals && !hop_spent {
            edges.extend(portals.linked_rooms(room).into_iter().map(|next| ((next, true), RouteEdge::Portal)));
        }

        for (next, edge) in edges {
            if !world.has_room(next.0) {
                continue;
            }
            let step = opts.room_cost(next.0, room);
            if !step.is_finite() || step < 0.0 {
                continue;
            }
            let cost = g + step;
            if cost < best.get(&next).copied().unwrap_or(f64::INFINITY) {
                best.insert(next, cost);
                prev.insert(next, (state, edge));
                seq += 1;
                heap.push(Reverse((Priority(cost + heuristic(next.0, next.1)), seq, next)));
            }
        }
    }

    let Some((goal, cost)) = found else {
        debug!(%origin, ?destinations, "no route");
        return None;
    };

    // Walk back: each predecessor leaves its room by the recorded edge.
    let mut steps = vec![RouteStep { room: goal.0, edge: None }];
    let mut portal = None;
    let mut cur = goal;
    while let Some(&(from, edge)) = prev.get(&cur) {
        if edge == RouteEdge::Portal {
            portal = Some(PortalHop { from: from.0, to: cur.0 });
        }
        steps.push(RouteStep { room: from.0, edge: Some(edge) });
        cur = from;
    }
    steps.reverse();

    let max_rooms = opts.max_rooms.clamp(1, MAX_ROUTE_ROOMS);
    let rooms = enhance_route(world, &steps, max_rooms, opts);
    debug!(%origin, to = %goal.0, route = steps.len(), rooms = rooms.len(), cost, "route found");
    Some(RegionRoute { steps, rooms, portal, cost })
}

fn nearest_destination(room: RoomName, destinations: &[RoomName]) -> u32 {
    destinations.iter().map(|&d| room.distance(d)).min().unwrap_or(0)
}

// ── Enhancement ───────────────────────────────────────────────────────────────

fn enhance_route<W: WorldView + ?Sized>(
    world: &W,
    steps: &[RouteStep],
    max_rooms: usize,
    opts: &RouteOpts,
) -> Vec<RoomName> {
    let mut rooms: Vec<RoomName> = Vec::with_capacity(max_rooms);
    let push = |rooms: &mut Vec<RoomName>, room: RoomName| {
        if !rooms.contains(&room) {
            rooms.push(room);
        }
    };
    for s in steps {
        push(&mut rooms, s.room);
    }

    let exit_of = |i: usize| match steps.get(i).and_then(|s| s.edge) {
        Some(RouteEdge::Exit(dir)) => Some(dir),
        _ => None,
    };
    let connected = |a: RoomName, b: RoomName| world.has_room(a) && world.exits(a).contains(&Some(b));

    for i in 0..steps.len().saturating_sub(1) {
        if rooms.len() >= max_rooms {
            break;
        }
        let Some(exit) = exit_of(i) else {
            continue; // portal hop
        };
        let here = steps[i].room;
        let next = steps[i + 1].room;

        // Corner: the room inside the turn.
        if let Some(turn) = exit_of(i + 1).filter(|&t| t != exit) {
            if let Some(corner) = world.exits(here)[turn.index()] {
                if connected(corner, next) {
                    push(&mut rooms, corner);
                }
            }
        }

        // Straight run whose border is only open on one half.
        let straight_next = exit_of(i + 1).is_none_or(|e| e == exit);
        let straight_after = exit_of(i + 2).is_none_or(|e| e == exit);
        if straight_next && straight_after {
            if rooms.len() + 1 >= max_rooms {
                continue;
            }
            let halves = exit_tile_regions(world, here, exit);
            let side = match (halves, exit) {
                ([true, true], _) => continue,
                ([false, _], ExitDir::Top | ExitDir::Bottom) => ExitDir::Left,
                ([_, false], ExitDir::Top | ExitDir::Bottom) => ExitDir::Right,
                ([false, _], _) => ExitDir::Top,
                ([_, false], _) => ExitDir::Bottom,
            };
            let d1 = world.exits(here)[side.index()];
            let d2 = world.exits(next)[side.index()];
            if let (Some(d1), Some(d2)) = (d1, d2) {
                if connected(d1, d2) {
                    push(&mut rooms, d1);
                    push(&mut rooms, d2);
                }
            }
        }
    }

    // Flood fill outward until the budget is spent.
    let mut queue: VecDeque<RoomName> = rooms.iter().copied().collect();
    let mut seen: BTreeSet<RoomName> = rooms.iter().copied().collect();
    while rooms.len() < max_rooms {
        let Some(room) = queue.pop_front() else { break };
        for next in world.exits(room).into_iter().flatten() {
            if rooms.len() >= max_rooms {
                break;
            }
            if !seen.insert(next) || !world.has_room(next) {
                continue;
            }
            if opts.room_cost(next, room).is_finite() {
                rooms.push(next);
                queue.push_back(next);
            }
        }
    }
    rooms.truncate(max_rooms);
    rooms
}

/// Whether the border on `exit` has open tiles in its first and second half.
fn exit_tile_regions<W: WorldView + ?Sized>(world: &W, room: RoomName, exit: ExitDir) -> [bool; 2] {
    let edge = ROOM_SIZE - 1;
    let open = |i: u8| {
        let (x, y) = match exit {
            ExitDir::Top => (i, 0),
            ExitDir::Bottom => (i, edge),
            ExitDir::Left => (0, i),
            ExitDir::Right => (edge, i),
        };
        Position::new(room, x, y)
            .ok()
            .and_then(|p| world.terrain_at(p))
            .is_some_and(|t| t != Terrain::Wall)
    };
    [(0..25).any(open), (25..edge).any(open)]
}
