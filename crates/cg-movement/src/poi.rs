//! Alternate routes to one point of interest.
//!
//! [`cache_paths`](Cartographer::cache_paths) stores a main route plus up to
//! `extra_routes` alternates under one key.  Each alternate is searched with
//! every tile of the routes before it made impassable, so no two routes
//! share a tile.  Agents pick a route by index and walk it with
//! [`move_by_cached_path`](Cartographer::move_by_cached_path).
//!
//! Routes are stored without expiration, in the durable store unless
//! `opts.cache` says otherwise.

use cg_cache::{CacheExt, CachingStrategy, PositionListSerializer};
use cg_core::{AgentId, MoveStatus, MoveTarget, Position};
use cg_spatial::{PathFinder, WorldView, IMPASSABLE};
use cg_traffic::AgentHost;
use tracing::{debug, warn};

use crate::cached_paths::path_key;
use crate::engine::Cartographer;
use crate::opts::{MoveOpts, RoomCallback};
use crate::targets::normalize_targets;

/// Alternates generated when the caller has no preference.
pub const DEFAULT_EXTRA_ROUTES: usize = 1;

/// Name of route `index` under `key`.
pub fn route_key(key: &str, index: usize) -> String {
    format!("{key}#{index}")
}

/// `base` with every tile in `blocked` made impassable.
fn blocking_callback(base: Option<RoomCallback>, blocked: Vec<Position>) -> RoomCallback {
    RoomCallback::new(move |room| {
        let mut cm = base.as_ref().and_then(|cb| (cb.0)(room)).unwrap_or_default();
        for p in blocked.iter().filter(|p| p.room() == room) {
            cm.set(p.coord(), IMPASSABLE);
        }
        Some(cm)
    })
}

impl<P: PathFinder> Cartographer<P> {
    /// Generate and store up to `1 + extra_routes` disjoint routes from
    /// `origin` to `targets` under `key`.  Returns how many routes are
    /// cached; routes already cached under `key` are kept as they are.
    ///
    /// Generation stops at the first route that cannot reach a target.
    pub fn cache_paths<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        key: &str,
        origin: Position,
        targets: &[MoveTarget],
        opts: &MoveOpts,
        extra_routes: usize,
    ) -> usize {
        let opts = self.defaults.merge(opts);
        let kind = opts.named_cache();
        if self.caches.select(kind).get(&path_key(&route_key(key, 0))).is_some() {
            return self.get_cached_paths(key, &opts).len();
        }

        let targets = normalize_targets(targets, &opts);
        let wanted = 1 + extra_routes;
        let mut blocked: Vec<Position> = Vec::new();
        let mut cached = 0;
        for index in 0..wanted {
            let blocking = MoveOpts {
                room_callback: Some(blocking_callback(opts.room_callback.clone(), blocked.clone())),
                ..MoveOpts::default()
            };
            let Some(path) = self.generate_merged(world, origin, &targets, &opts.merge(&blocking)) else {
                break;
            };
            let arrives = path.last().is_some_and(|&end| targets.iter().any(|t| t.contains(end)));
            if !arrives {
                break;
            }
            blocked.extend(path.iter().copied());
            self.caches
                .select(kind)
                .with(PositionListSerializer)
                .set(&path_key(&route_key(key, index)), path, None);
            cached += 1;
        }

        if cached < wanted {
            warn!(key, cached, wanted, "could not generate every alternate route");
        } else {
            debug!(key, cached, "alternate routes cached");
        }
        cached
    }

    /// Every route cached under `key`, main route first.
    pub fn get_cached_paths(&mut self, key: &str, opts: &MoveOpts) -> Vec<Vec<Position>> {
        let kind = self.defaults.merge(opts).named_cache();
        let mut cache = self.caches.select(kind).with(PositionListSerializer);
        let mut paths = Vec::new();
        while let Some(path) = cache.get(&path_key(&route_key(key, paths.len()))) {
            paths.push(path);
        }
        paths
    }

    pub fn reset_cached_paths(&mut self, key: &str, opts: &MoveOpts) {
        let kind = self.defaults.merge(opts).named_cache();
        let cache = self.caches.select(kind);
        let mut index = 0;
        while cache.get(&path_key(&route_key(key, index))).is_some() {
            cache.delete(&path_key(&route_key(key, index)));
            index += 1;
        }
    }

    /// Walk route `index` under `key` (backwards when `reverse`), rejoining
    /// it first when the agent is off it.  `NotFound` when no such route
    /// is cached.
    pub fn move_by_cached_path<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentId,
        key: &str,
        index: usize,
        opts: &MoveOpts,
        reverse: bool,
    ) -> MoveStatus {
        let name = route_key(key, index);
        if self.get_cached_path(&name, opts).is_none() {
            return MoveStatus::NotFound;
        }
        self.move_by_path(host, agent, &name, opts, reverse)
    }
}
