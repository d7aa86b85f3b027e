//! Named paths: generate once, store under a key, follow step by step.
//!
//! Named paths live in the durable store unless `opts.cache` says
//! otherwise; `move_to` pins its own per-agent paths to its backend.

use cg_cache::{CacheExt, CachingStrategy, PositionListSerializer};
use cg_core::{AgentId, MoveStatus, MoveTarget, Position};
use cg_spatial::{PathFinder, WorldView};
use cg_traffic::AgentHost;
use tracing::trace;

use crate::engine::Cartographer;
use crate::opts::MoveOpts;
use crate::targets::normalize_targets;
use crate::tracker::AgentTrack;

/// Namespace for cached paths.
pub const PATH_PREFIX: &str = "_poi_";

pub fn path_key(key: &str) -> String {
    format!("{PATH_PREFIX}{key}")
}

impl<P: PathFinder> Cartographer<P> {
    /// The path cached under `key`, generating and storing it first if
    /// needed.  `None` when no path exists.
    pub fn cache_path<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        key: &str,
        origin: Position,
        targets: &[MoveTarget],
        opts: &MoveOpts,
    ) -> Option<Vec<Position>> {
        let opts = self.defaults.merge(opts);
        let targets = normalize_targets(targets, &opts);
        self.cache_path_merged(world, key, origin, &targets, &opts)
    }

    pub(crate) fn cache_path_merged<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        key: &str,
        origin: Position,
        targets: &[MoveTarget],
        opts: &MoveOpts,
    ) -> Option<Vec<Position>> {
        let key = path_key(key);
        let kind = opts.named_cache();
        if let Some(path) = self.caches.select(kind).with(PositionListSerializer).get(&key) {
            return Some(path);
        }
        let path = self.generate_merged(world, origin, targets, opts)?;
        let expiration = opts.expiration(world.time());
        self.caches.select(kind).with(PositionListSerializer).set(&key, path.clone(), expiration);
        trace!(key, len = path.len(), ?expiration, "path cached");
        Some(path)
    }

    pub fn get_cached_path(&mut self, key: &str, opts: &MoveOpts) -> Option<Vec<Position>> {
        let kind = self.defaults.merge(opts).named_cache();
        self.caches.select(kind).with(PositionListSerializer).get(&path_key(key))
    }

    pub fn reset_cached_path(&mut self, key: &str, opts: &MoveOpts) {
        let kind = self.defaults.merge(opts).named_cache();
        self.caches.select(kind).with(PositionListSerializer).delete(&path_key(key));
    }

    /// Advance `agent` one step along the path cached under `key`, or one
    /// step back toward its start when `reverse`.
    ///
    /// | Outcome                                   | Status       |
    /// |-------------------------------------------|--------------|
    /// | agent has no position                     | `InvalidArgs`|
    /// | nothing cached under `key`                | `NoPath`     |
    /// | agent on the terminus                     | `Ok`         |
    /// | agent neither on nor next to the path     | `NotFound`   |
    /// | otherwise, a step intent is registered    | `Ok`         |
    pub fn follow_path<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentId,
        key: &str,
        opts: &MoveOpts,
        reverse: bool,
    ) -> MoveStatus {
        let Some(pos) = host.agent_pos(agent) else {
            return MoveStatus::InvalidArgs;
        };
        let opts = self.defaults.merge(opts);
        let Some(path) = self.caches.select(opts.named_cache()).with(PositionListSerializer).get(&path_key(key))
        else {
            return MoveStatus::NoPath;
        };
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return MoveStatus::NoPath;
        };
        if pos == if reverse { first } else { last } {
            return MoveStatus::Ok;
        }

        let len = path.len() as i64;
        let mut track = AgentTrack::new(&mut self.caches.heap, agent);
        let at = |i: i64| usize::try_from(i).ok().and_then(|i| path.get(i)).copied();

        let mut index = track.move_index().and_then(|hint| {
            let next = if reverse { hint - 1 } else { hint + 1 };
            if at(next) == Some(pos) {
                Some(next)
            } else if at(hint) == Some(pos) {
                Some(hint)
            } else {
                None
            }
        });
        if index.is_none() {
            index = path.iter().position(|&p| p == pos).map(|i| i as i64);
        }
        if index.is_none() {
            if !reverse && first.is_near_to(pos) {
                index = Some(-1);
            } else if reverse && last.is_near_to(pos) {
                index = Some(len);
            }
        }
        let Some(index) = index else {
            return MoveStatus::NotFound;
        };
        track.set_move_index(index);

        let next = if reverse { index - 1 } else { index + 1 }.clamp(0, len - 1);
        let Some(target) = at(next) else {
            return MoveStatus::NotFound;
        };
        self.step(host, agent, vec![target], opts.priority())
    }
}
