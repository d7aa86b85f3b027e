//! `move_to`: the per-agent movement state machine.
//!
//! Cached per agent, in the backend chosen by `opts.cache`:
//!
//! | Suffix | Value                                          |
//! |--------|------------------------------------------------|
//! | `_cp`  | the path (under [`PATH_PREFIX`](crate::PATH_PREFIX)) |
//! | `_ct`  | targets the path was generated for             |
//! | `_co`  | the option snapshot the path was generated with |
//!
//! A path is reused until it expires, the targets or snapshot change, the
//! agent is stuck on it, or the agent falls off it.

use cg_cache::{
    CacheExt, CacheKind, CachingStrategy, Json, MoveTargetListSerializer, PositionListSerializer,
};
use cg_core::{agent_key, AgentId, MoveStatus, MoveTarget, Position};
use cg_spatial::{adjacent_walkable, PathFinder, IMPASSABLE, SOFT_BLOCK};
use cg_traffic::AgentHost;
use tracing::{debug, info};

use crate::cached_paths::path_key;
use crate::engine::Cartographer;
use crate::generate::room_cost_matrix;
use crate::opts::{MoveOpts, OptsSnapshot};
use crate::targets::{flee_destinations, is_safe, normalize_targets};
use crate::tracker::AgentTrack;

pub const PATH_SUFFIX: &str = "_cp";
pub const TARGETS_SUFFIX: &str = "_ct";
pub const OPTS_SUFFIX: &str = "_co";

impl<P: PathFinder> Cartographer<P> {
    /// Move `agent` toward any of `targets` (or away from all of them when
    /// `opts.flee`), using this cartographer's stuck fallback options.
    pub fn move_to<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentId,
        targets: &[MoveTarget],
        opts: &MoveOpts,
    ) -> MoveStatus {
        let fallback = self.fallback.clone();
        self.move_to_with_fallback(host, agent, targets, opts, &fallback)
    }

    pub fn move_to_with_fallback<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentId,
        targets: &[MoveTarget],
        call_opts: &MoveOpts,
        fallback: &MoveOpts,
    ) -> MoveStatus {
        let Some(pos) = host.agent_pos(agent) else {
            return MoveStatus::InvalidArgs;
        };
        let now = host.time();

        let mut opts = self.defaults.merge(call_opts);
        if opts.body.is_none() {
            opts.body = host.agent_body(agent);
        }
        opts.cache = Some(opts.cache());

        let targets = normalize_targets(targets, &opts);
        if targets.is_empty() {
            return MoveStatus::InvalidArgs;
        }
        let kind = opts.cache();
        let priority = opts.priority();
        let flee = opts.flee();

        // Done already: stay, or make room on another tile that also works.
        let done = if flee {
            is_safe(pos, &targets)
        } else {
            targets.iter().any(|t| t.contains(pos) && t.pos.room() == pos.room())
        };
        if done {
            self.clear_cached_path(agent, kind);
            let cm = room_cost_matrix(&*host, &mut self.caches.memory, pos.room(), &opts, &[]);
            let mut stay = vec![pos];
            stay.extend(adjacent_walkable(&*host, pos, true).into_iter().filter(|&p| {
                let in_range = if flee { is_safe(p, &targets) } else { targets.iter().any(|t| t.contains(p)) };
                in_range && cm.get(p.coord()) != IMPASSABLE
            }));
            return self.step(host, agent, stay, priority);
        }

        // Invalidate on changed targets or options.
        let (targets_key, opts_key) = (agent_key(agent, TARGETS_SUFFIX), agent_key(agent, OPTS_SUFFIX));
        let snapshot = opts.snapshot();
        {
            let cache = self.caches.select(kind);
            let same_targets = cache.with(MoveTargetListSerializer).get(&targets_key).as_deref() == Some(&targets[..]);
            let same_opts = cache.with(Json::<OptsSnapshot>::new()).get(&opts_key).as_ref() == Some(&snapshot);
            if !same_targets || !same_opts {
                self.clear_cached_path(agent, kind);
            }
        }
        let expiration = opts.expiration(now);
        {
            let cache = self.caches.select(kind);
            cache.with(MoveTargetListSerializer).set(&targets_key, targets.clone(), expiration);
            cache.with(Json::<OptsSnapshot>::new()).set(&opts_key, snapshot, expiration);
        }

        let name = agent_key(agent, PATH_SUFFIX);
        let cached = self.caches.select(kind).with(PositionListSerializer).get(&path_key(&name));
        let fatigue = host.agent_fatigue(agent);
        let stuck = match (opts.repath_if_stuck(), &cached) {
            (Some(limit), Some(_)) => AgentTrack::new(&mut self.caches.heap, agent).is_stuck(pos, fatigue, now, limit),
            _ => false,
        };
        if stuck {
            info!(%agent, %pos, "stuck, repathing with fallback options");
            self.reset_cached_path(&name, &opts);
            opts = opts.merge(fallback);
        } else if let Some(cached) = cached {
            self.reroute_around_avoid_targets(host, agent, pos, &name, cached, &opts);
        }

        let goals = if flee { flee_destinations(&targets) } else { targets.clone() };
        if goals.is_empty() {
            return MoveStatus::NoPath;
        }
        let Some(path) = self.cache_path_merged(&*host, &name, pos, &goals, &opts) else {
            return MoveStatus::NoPath;
        };

        // One step from the end: any free tile that satisfies the targets.
        if path.len() >= 2 && path[path.len() - 2] == pos {
            let cm = room_cost_matrix(&*host, &mut self.caches.memory, pos.room(), &opts, &[]);
            let finishing: Vec<Position> = adjacent_walkable(&*host, pos, true)
                .into_iter()
                .filter(|&p| {
                    let in_range = if flee { is_safe(p, &targets) } else { targets.iter().any(|t| t.contains(p)) };
                    in_range && cm.get(p.coord()) < SOFT_BLOCK
                })
                .collect();
            if !finishing.is_empty() {
                return self.step(host, agent, finishing, priority);
            }
        }

        let result = self.follow_path(host, agent, &name, &opts, false);
        if result != MoveStatus::NotFound {
            return result;
        }
        debug!(%agent, %pos, "fell off cached path, regenerating");
        self.clear_cached_path(agent, kind);
        if self.cache_path_merged(&*host, &name, pos, &goals, &opts).is_none() {
            return MoveStatus::NoPath;
        }
        self.follow_path(host, agent, &name, &opts, false)
    }

    /// Drop the agent's `move_to` path, targets and option snapshot.
    pub fn clear_cached_path(&mut self, agent: AgentId, kind: CacheKind) {
        let cache = self.caches.select(kind);
        cache.with(PositionListSerializer).delete(&path_key(&agent_key(agent, PATH_SUFFIX)));
        cache.with(MoveTargetListSerializer).delete(&agent_key(agent, TARGETS_SUFFIX));
        cache.with(Json::<OptsSnapshot>::new()).delete(&agent_key(agent, OPTS_SUFFIX));
    }

    /// When the unwalked part of the cached path crosses an avoid target,
    /// path to the tiles past the last crossing and splice the detour in.
    /// Without a usable detour the path is dropped.
    fn reroute_around_avoid_targets<H: AgentHost + ?Sized>(
        &mut self,
        host: &H,
        agent: AgentId,
        pos: Position,
        name: &str,
        cached: Vec<Position>,
        opts: &MoveOpts,
    ) {
        let avoid = opts.avoid_targets_in(pos.room());
        if avoid.is_empty() {
            return;
        }
        let start = AgentTrack::new(&mut self.caches.heap, agent)
            .move_index()
            .map_or(0, |i| usize::try_from(i + 1).unwrap_or(0))
            .min(cached.len());
        let unwalked = &cached[start..];
        let Some(last_avoid) = unwalked.iter().rposition(|&p| avoid.iter().any(|t| t.contains(p))) else {
            return;
        };
        let remaining = &unwalked[last_avoid..];

        let detour_opts = opts.merge(&MoveOpts { flee: Some(false), ..MoveOpts::default() });
        let goals: Vec<MoveTarget> = remaining.iter().copied().map(MoveTarget::exact).collect();
        let detour = self.generate_merged(host, pos, &goals, &detour_opts);

        let spliced = detour.and_then(|mut detour| {
            let end = *detour.last()?;
            let first_near = remaining.iter().position(|p| p.is_near_to(end))?;
            let run = remaining[first_near..].iter().take_while(|p| p.is_near_to(end)).count();
            let join = first_near + run - 1;
            detour.extend(remaining[join..].iter().copied().skip_while(|&p| p == end));
            Some(detour)
        });
        match spliced {
            Some(path) => {
                debug!(%agent, len = path.len(), "rerouted around avoid targets");
                let expiration = opts.expiration(host.time());
                self.caches.select(opts.cache()).with(PositionListSerializer).set(&path_key(name), path, expiration);
            }
            None => {
                debug!(%agent, "no detour around avoid targets");
                self.reset_cached_path(name, opts);
            }
        }
    }
}
