//! Movement options.
//!
//! Every field is optional; unset fields fall back to the defaults below
//! when read through the typed accessors.  Layers are combined with
//! [`MoveOpts::merge`], where any field the overriding layer sets wins.
//!
//! | Field                       | Default |
//! |-----------------------------|---------|
//! | `reuse_path`                | 5       |
//! | `repath_if_stuck`           | off     |
//! | `avoid_creeps`              | false   |
//! | `avoid_obstacle_structures` | true    |
//! | `avoid_source_keepers`      | true    |
//! | `avoid_portals`             | true    |
//! | `road_cost`                 | 1       |
//! | `plain_cost`                | 2       |
//! | `swamp_cost`                | 10      |
//! | `priority`                  | 1       |
//! | `keep_target_in_room`       | true    |
//! | `flee`                      | false   |
//! | `cache`                     | heap for `move_to`, memory for named paths |
//! | `max_rooms`                 | 16 (capped at 64) |
//! | `max_ops_per_room`          | 2000    |
//!
//! Terrain costs follow the agent's body when none of the three is set
//! explicitly (see [`BodyInfo::terrain_costs`]).

use std::fmt;
use std::rc::Rc;

use cg_cache::CacheKind;
use cg_core::{BodyInfo, MoveTarget, Position, RoomName, TerrainCosts, Tick};
use cg_spatial::{CostMatrix, CostMatrixOpts, RouteCallback, RouteOpts, SearchOpts};
use cg_spatial::route::MAX_ROUTE_ROOMS;
use serde::{Deserialize, Serialize};

use crate::MovementResult;

const DEFAULT_REUSE_PATH: u64 = 5;
const DEFAULT_PRIORITY: i32 = 1;
const DEFAULT_MAX_ROOMS: usize = 16;
const DEFAULT_MAX_OPS_PER_ROOM: u32 = 2000;
const DEFAULT_TERRAIN: TerrainCosts = TerrainCosts { road: 1, plain: 2, swamp: 10 };

// ── Callbacks ─────────────────────────────────────────────────────────────────

/// Base cost matrix for a room.  `None` starts from a blank matrix.
#[derive(Clone)]
pub struct RoomCallback(pub Rc<dyn Fn(RoomName) -> Option<CostMatrix>>);

impl RoomCallback {
    pub fn new(f: impl Fn(RoomName) -> Option<CostMatrix> + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl fmt::Debug for RoomCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomCallback(..)")
    }
}

/// Danger zones to steer around, asked per room.
#[derive(Clone)]
pub struct AvoidTargets(pub Rc<dyn Fn(RoomName) -> Vec<MoveTarget>>);

impl AvoidTargets {
    pub fn new(f: impl Fn(RoomName) -> Vec<MoveTarget> + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl fmt::Debug for AvoidTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AvoidTargets(..)")
    }
}

// ── MoveOpts ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoveOpts {
    /// Ticks a generated path stays cached; `0` keeps it until invalidated.
    pub reuse_path:                Option<u64>,
    /// Repath with fallback options after this many ticks without moving.
    pub repath_if_stuck:           Option<u64>,
    pub avoid_creeps:              Option<bool>,
    pub avoid_obstacle_structures: Option<bool>,
    pub avoid_source_keepers:      Option<bool>,
    pub avoid_portals:             Option<bool>,
    pub road_cost:                 Option<u8>,
    pub plain_cost:                Option<u8>,
    pub swamp_cost:                Option<u8>,
    pub priority:                  Option<i32>,
    pub keep_target_in_room:       Option<bool>,
    pub flee:                      Option<bool>,
    pub cache:                     Option<CacheKind>,
    pub max_rooms:                 Option<usize>,
    pub max_ops_per_room:          Option<u32>,
    /// Overall search budget; replaces the per-room scaling when set.
    pub max_ops:                   Option<u32>,
    pub heuristic_weight:          Option<f32>,
    pub default_room_cost:         Option<f64>,
    pub highway_room_cost:         Option<f64>,
    pub source_keeper_room_cost:   Option<f64>,
    pub avoid_target_gradient:     Option<f64>,
    /// Body used for terrain costs when none are set explicitly.
    pub body:                      Option<BodyInfo>,

    #[serde(skip)]
    pub route_callback:            Option<RouteCallback>,
    #[serde(skip)]
    pub room_callback:             Option<RoomCallback>,
    #[serde(skip)]
    pub avoid_targets:             Option<AvoidTargets>,
}

macro_rules! merge_fields {
    ($base:expr, $over:expr; $($field:ident),* $(,)?) => {
        MoveOpts {
            $($field: $over.$field.clone().or_else(|| $base.$field.clone()),)*
        }
    };
}

impl MoveOpts {
    /// Every documented default, spelled out.  Terrain costs and the cache
    /// stay unset: the first depends on the body, the second on the caller.
    pub fn defaults() -> Self {
        Self {
            reuse_path: Some(DEFAULT_REUSE_PATH),
            avoid_creeps: Some(false),
            avoid_obstacle_structures: Some(true),
            avoid_source_keepers: Some(true),
            avoid_portals: Some(true),
            priority: Some(DEFAULT_PRIORITY),
            keep_target_in_room: Some(true),
            flee: Some(false),
            max_rooms: Some(DEFAULT_MAX_ROOMS),
            max_ops_per_room: Some(DEFAULT_MAX_OPS_PER_ROOM),
            ..Self::default()
        }
    }

    /// Options applied for a single regeneration when an agent is stuck.
    pub fn stuck_fallback() -> Self {
        Self { avoid_creeps: Some(true), ..Self::default() }
    }

    /// `self` with every field `overrides` sets replaced.
    pub fn merge(&self, overrides: &MoveOpts) -> MoveOpts {
        merge_fields!(self, overrides;
            reuse_path, repath_if_stuck, avoid_creeps, avoid_obstacle_structures,
            avoid_source_keepers, avoid_portals, road_cost, plain_cost, swamp_cost,
            priority, keep_target_in_room, flee, cache, max_rooms, max_ops_per_room,
            max_ops, heuristic_weight, default_room_cost, highway_room_cost,
            source_keeper_room_cost, avoid_target_gradient, body, route_callback,
            room_callback, avoid_targets,
        )
    }

    pub fn from_json(json: &str) -> MovementResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> MovementResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn reuse_path(&self) -> u64 {
        self.reuse_path.unwrap_or(DEFAULT_REUSE_PATH)
    }

    pub fn repath_if_stuck(&self) -> Option<u64> {
        self.repath_if_stuck.filter(|&n| n > 0)
    }

    pub fn avoid_creeps(&self) -> bool {
        self.avoid_creeps.unwrap_or(false)
    }

    pub fn avoid_obstacle_structures(&self) -> bool {
        self.avoid_obstacle_structures.unwrap_or(true)
    }

    pub fn avoid_source_keepers(&self) -> bool {
        self.avoid_source_keepers.unwrap_or(true)
    }

    pub fn avoid_portals(&self) -> bool {
        self.avoid_portals.unwrap_or(true)
    }

    pub fn priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    pub fn keep_target_in_room(&self) -> bool {
        self.keep_target_in_room.unwrap_or(true)
    }

    pub fn flee(&self) -> bool {
        self.flee.unwrap_or(false)
    }

    pub fn cache(&self) -> CacheKind {
        self.cache.unwrap_or_default()
    }

    /// Backend for named paths, which outlive a restart unless told otherwise.
    pub fn named_cache(&self) -> CacheKind {
        self.cache.unwrap_or(CacheKind::Memory)
    }

    pub fn max_rooms(&self) -> usize {
        self.max_rooms.unwrap_or(DEFAULT_MAX_ROOMS).clamp(1, MAX_ROUTE_ROOMS)
    }

    pub fn max_ops_per_room(&self) -> u32 {
        self.max_ops_per_room.unwrap_or(DEFAULT_MAX_OPS_PER_ROOM)
    }

    /// Expiration for a path or snapshot cached at `now`.
    pub fn expiration(&self, now: Tick) -> Option<Tick> {
        match self.reuse_path() {
            0 => None,
            n => Some(now + n + 1),
        }
    }

    /// Any terrain cost set by the caller.
    pub fn has_manual_costs(&self) -> bool {
        self.road_cost.is_some() || self.plain_cost.is_some() || self.swamp_cost.is_some()
    }

    /// Explicit costs over the defaults, else body-derived, else defaults.
    pub fn terrain_costs(&self) -> TerrainCosts {
        if !self.has_manual_costs() {
            if let Some(costs) = self.body.as_ref().and_then(BodyInfo::terrain_costs) {
                return costs;
            }
        }
        TerrainCosts {
            road:  self.road_cost.unwrap_or(DEFAULT_TERRAIN.road),
            plain: self.plain_cost.unwrap_or(DEFAULT_TERRAIN.plain),
            swamp: self.swamp_cost.unwrap_or(DEFAULT_TERRAIN.swamp),
        }
    }

    pub fn avoid_targets_in(&self, room: RoomName) -> Vec<MoveTarget> {
        self.avoid_targets.as_ref().map(|cb| (cb.0)(room)).unwrap_or_default()
    }

    pub fn base_matrix(&self, room: RoomName) -> CostMatrix {
        self.room_callback.as_ref().and_then(|cb| (cb.0)(room)).unwrap_or_default()
    }

    // ── Derived option sets ───────────────────────────────────────────────────

    pub fn route_opts(&self) -> RouteOpts {
        let base = RouteOpts::default();
        RouteOpts {
            max_rooms:               self.max_rooms(),
            default_room_cost:       self.default_room_cost.unwrap_or(base.default_room_cost),
            highway_room_cost:       self.highway_room_cost.unwrap_or(base.highway_room_cost),
            source_keeper_room_cost: self.source_keeper_room_cost.unwrap_or(base.source_keeper_room_cost),
            route_callback:          self.route_callback.clone(),
            avoid_portals:           self.avoid_portals(),
        }
    }

    /// Cost matrix mutations for one room.
    pub fn cost_matrix_opts<'a>(
        &self,
        avoid_targets: &'a [MoveTarget],
        open_portals: &'a [Position],
    ) -> CostMatrixOpts<'a> {
        CostMatrixOpts {
            avoid_creeps: self.avoid_creeps(),
            avoid_source_keepers: self.avoid_source_keepers(),
            avoid_obstacle_structures: self.avoid_obstacle_structures(),
            road_cost: Some(self.terrain_costs().road),
            avoid_targets,
            avoid_target_gradient: self.avoid_target_gradient.unwrap_or(0.0),
            block_portals: true,
            open_portals,
        }
    }

    /// Host search options for a search spanning `rooms` rooms.
    pub fn search_opts(&self, rooms: usize) -> SearchOpts {
        let costs = self.terrain_costs();
        let rooms = rooms.max(1);
        SearchOpts {
            plain_cost:       costs.plain,
            swamp_cost:       costs.swamp,
            max_ops:          self
                .max_ops
                .unwrap_or_else(|| self.max_ops_per_room().saturating_mul(rooms as u32)),
            max_rooms:        rooms as u32,
            flee:             false,
            heuristic_weight: self.heuristic_weight.unwrap_or(SearchOpts::default().heuristic_weight),
        }
    }

    /// The options a cached path depends on.
    pub fn snapshot(&self) -> OptsSnapshot {
        OptsSnapshot {
            avoid_creeps:              self.avoid_creeps,
            avoid_obstacle_structures: self.avoid_obstacle_structures,
            flee:                      self.flee,
            plain_cost:                self.plain_cost,
            swamp_cost:                self.swamp_cost,
            road_cost:                 self.road_cost,
        }
    }
}

/// Cached next to a path; a different snapshot invalidates the path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid_creeps:              Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid_obstacle_structures: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flee:                      Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_cost:                Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swamp_cost:                Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_cost:                 Option<u8>,
}
