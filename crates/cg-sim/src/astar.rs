//! `GridPathFinder`: the host search primitive for [`GridWorld`].
//!
//! A weighted A* over the global tile grid.  It works from a terrain
//! snapshot taken at construction, so it can run while the world is
//! borrowed elsewhere; rebuild it with [`GridPathFinder::sync`] after
//! terrain edits.
//!
//! # Contract
//!
//! - Tile cost: a non-zero cost matrix entry wins; `0` falls back to the
//!   terrain cost from [`SearchOpts`], walls are impassable.  `255` is
//!   always impassable.
//! - Goals are satisfied within their range, or, when fleeing, at or beyond
//!   it from every goal.
//! - Each room's matrix is requested once.  `None` removes the room, and no
//!   more than `max_rooms` rooms are entered.
//! - Every expanded node counts against `max_ops`.
//! - Without a reachable goal the path leads to the tile closest to one and
//!   the result is `incomplete`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use cg_core::{Direction, MoveTarget, Position, RoomName};
use cg_spatial::{CostMatrix, PathFinder, PathResult, SearchOpts, Terrain, IMPASSABLE};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::world::{GridWorld, RoomTerrain};

/// Fixed-point scale for weighted heuristics in the open set.
const SCALE: f32 = 1024.0;

#[derive(Clone, Debug, Default)]
pub struct GridPathFinder {
    terrain:        FxHashMap<RoomName, RoomTerrain>,
    /// Searches run so far.
    pub calls:      usize,
    /// Rooms entered by the most recent search, in entry order.
    pub last_rooms: Vec<RoomName>,
}

impl GridPathFinder {
    pub fn new(world: &GridWorld) -> Self {
        let mut finder = Self::default();
        finder.sync(world);
        finder
    }

    /// Refresh the terrain snapshot.
    pub fn sync(&mut self, world: &GridWorld) {
        self.terrain = world
            .rooms()
            .filter_map(|room| world.room_terrain(room).map(|t| (room, t.clone())))
            .collect();
    }
}

/// Rooms the search has asked about, with their matrices.
struct RoomCosts<'a> {
    matrices:  FxHashMap<RoomName, Option<CostMatrix>>,
    order:     Vec<RoomName>,
    max_rooms: usize,
    callback:  &'a mut dyn FnMut(RoomName) -> Option<CostMatrix>,
}

impl RoomCosts<'_> {
    /// The matrix for `room`, asking the callback on first entry.  `None`
    /// when the room is excluded or over budget; only rooms with a matrix
    /// count toward the budget.
    fn get(&mut self, room: RoomName) -> Option<&CostMatrix> {
        if !self.matrices.contains_key(&room) {
            if self.order.len() >= self.max_rooms {
                return None;
            }
            let matrix = (self.callback)(room);
            if matrix.is_some() {
                self.order.push(room);
            }
            self.matrices.insert(room, matrix);
        }
        self.matrices.get(&room).and_then(Option::as_ref)
    }
}

impl PathFinder for GridPathFinder {
    fn search(
        &mut self,
        origin: Position,
        goals: &[MoveTarget],
        opts: &SearchOpts,
        room_callback: &mut dyn FnMut(RoomName) -> Option<CostMatrix>,
    ) -> PathResult {
        self.calls += 1;
        let mut rooms = RoomCosts {
            matrices:  FxHashMap::default(),
            order:     Vec::new(),
            max_rooms: opts.max_rooms.max(1) as usize,
            callback:  room_callback,
        };
        let result = self.astar(origin, goals, opts, &mut rooms);
        trace!(
            %origin,
            goals = goals.len(),
            ops = result.ops,
            len = result.path.len(),
            incomplete = result.incomplete,
            "grid search"
        );
        self.last_rooms = rooms.order;
        result
    }
}

impl GridPathFinder {
    fn astar(&self, origin: Position, goals: &[MoveTarget], opts: &SearchOpts, rooms: &mut RoomCosts<'_>) -> PathResult {
        let unreached = PathResult { incomplete: true, ..PathResult::default() };
        if goals.is_empty() || rooms.get(origin.room()).is_none() {
            return unreached;
        }
        let min_cost = u32::from(opts.plain_cost.min(opts.swamp_cost).max(1));
        let weight = opts.heuristic_weight.max(0.0);

        // Distance still to cover, in tiles.
        let remaining = |p: Position| -> u32 {
            if opts.flee {
                goals.iter().map(|g| g.range.saturating_sub(p.range_to(g.pos))).max().unwrap_or(0)
            } else {
                goals.iter().map(|g| p.range_to(g.pos).saturating_sub(g.range)).min().unwrap_or(0)
            }
        };
        let priority = |g: u32, h: u32| -> u64 { u64::from(g) * SCALE as u64 + (h as f32 * weight * SCALE) as u64 };

        let mut dist: FxHashMap<Position, u32> = FxHashMap::default();
        let mut prev: FxHashMap<Position, Position> = FxHashMap::default();
        let mut heap: BinaryHeap<Reverse<(u64, u32, u32, Position)>> = BinaryHeap::new();

        let h0 = remaining(origin) * min_cost;
        dist.insert(origin, 0);
        heap.push(Reverse((priority(0, h0), h0, 0, origin)));
        let mut closest = (h0, 0, origin);
        let mut ops = 0u32;
        let mut reached = None;

        while let Some(Reverse((_, h, g, node))) = heap.pop() {
            if g > dist.get(&node).copied().unwrap_or(u32::MAX) {
                continue; // stale
            }
            if h == 0 {
                reached = Some(node);
                break;
            }
            if ops >= opts.max_ops {
                break;
            }
            ops += 1;
            if (h, g) < (closest.0, closest.1) {
                closest = (h, g, node);
            }

            for dir in Direction::ALL {
                let Some(next) = node.step(dir) else { continue };
                let Some(cost) = self.tile_cost(next, opts, rooms) else { continue };
                let new_cost = g.saturating_add(cost);
                if new_cost < dist.get(&next).copied().unwrap_or(u32::MAX) {
                    dist.insert(next, new_cost);
                    prev.insert(next, node);
                    let h = remaining(next) * min_cost;
                    heap.push(Reverse((priority(new_cost, h), h, new_cost, next)));
                }
            }
        }

        let (end, incomplete) = match reached {
            Some(goal) => (goal, false),
            None => (closest.2, true),
        };
        let mut path = Vec::new();
        let mut cur = end;
        while cur != origin {
            path.push(cur);
            match prev.get(&cur) {
                Some(&p) => cur = p,
                None => break,
            }
        }
        path.reverse();
        PathResult { cost: dist.get(&end).copied().unwrap_or(0), ops, path, incomplete }
    }

    fn tile_cost(&self, pos: Position, opts: &SearchOpts, rooms: &mut RoomCosts<'_>) -> Option<u32> {
        let terrain = self.terrain.get(&pos.room())?.get(pos.coord());
        let matrix = rooms.get(pos.room())?;
        match matrix.get(pos.coord()) {
            IMPASSABLE => None,
            0 => match terrain {
                Terrain::Wall => None,
                Terrain::Swamp => Some(u32::from(opts.swamp_cost)),
                Terrain::Plain => Some(u32::from(opts.plain_cost)),
            },
            c => Some(u32::from(c)),
        }
    }
}
