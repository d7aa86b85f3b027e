//! `move_by_path`: walk a named cached path, rejoining it with `move_to`
//! when off it or stuck on it.

use cg_core::{AgentId, MoveStatus, MoveTarget};
use cg_spatial::PathFinder;
use cg_traffic::AgentHost;
use tracing::debug;

use crate::engine::Cartographer;
use crate::opts::MoveOpts;
use crate::tracker::AgentTrack;

impl<P: PathFinder> Cartographer<P> {
    /// Follow the path cached under `key` (backwards when `reverse`).
    ///
    /// With `repath_if_stuck` set, an agent stuck on the path skips ahead:
    /// it heads for the path two tiles past its own and rejoins there,
    /// resuming normal following once it has passed that point.
    pub fn move_by_path<H: AgentHost + ?Sized>(
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
        let repath = self.defaults.merge(opts).repath_if_stuck();

        let mut stuck_index = AgentTrack::new(&mut self.caches.heap, agent).stuck_index();
        if let (Some(_), Some(stuck_at)) = (repath, stuck_index) {
            let current = self
                .get_cached_path(key, opts)
                .and_then(|path| path.iter().position(|&p| p == pos))
                .map(|i| i as i64);
            let passed = current.is_some_and(|i| if reverse { i <= stuck_at } else { i >= stuck_at });
            if passed {
                AgentTrack::new(&mut self.caches.heap, agent).clear_stuck_index();
                stuck_index = None;
            }
        }

        let result = match stuck_index {
            None => self.follow_path(host, agent, key, opts, reverse),
            Some(_) => MoveStatus::NotFound,
        };
        if result != MoveStatus::NotFound {
            let (now, fatigue) = (host.time(), host.agent_fatigue(agent));
            let mut track = AgentTrack::new(&mut self.caches.heap, agent);
            let stuck = repath.is_some_and(|limit| track.is_stuck(pos, fatigue, now, limit));
            if !stuck {
                return result;
            }
            if let Some(index) = track.move_index() {
                let rejoin = if reverse { index - 1 } else { index + 2 };
                track.set_stuck_index(rejoin);
                stuck_index = Some(rejoin);
                debug!(%agent, %pos, rejoin, "stuck on path, skipping ahead");
            }
        }

        let Some(mut path) = self.get_cached_path(key, opts) else {
            return MoveStatus::NoPath;
        };
        if let Some(stuck_at) = stuck_index {
            let cut = usize::try_from(stuck_at).unwrap_or(0).min(path.len());
            if reverse {
                path.truncate(cut);
            } else {
                path.drain(..cut);
            }
        }
        if path.is_empty() {
            return MoveStatus::NoPath;
        }
        let targets: Vec<MoveTarget> = path.into_iter().map(MoveTarget::exact).collect();
        self.move_to(host, agent, &targets, opts)
    }
}
