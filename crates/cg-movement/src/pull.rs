//! Pulling: one agent drags another into its own tile.

use cg_core::{AgentId, MoveStatus};
use cg_spatial::PathFinder;
use cg_traffic::AgentHost;

use crate::engine::Cartographer;

impl<P: PathFinder> Cartographer<P> {
    /// `pulled` steps onto `puller`'s tile as `puller` moves on.
    ///
    /// The puller keeps its own tile during reconciliation and the pulled
    /// agent is left out of it, so the pair stays linked.
    pub fn follow<H: AgentHost + ?Sized>(&mut self, host: &mut H, pulled: AgentId, puller: AgentId) -> MoveStatus {
        let (Some(pulled_pos), Some(puller_pos)) = (host.agent_pos(pulled), host.agent_pos(puller)) else {
            return MoveStatus::InvalidArgs;
        };
        let Some(dir) = pulled_pos.direction_to(puller_pos) else {
            return MoveStatus::InvalidArgs;
        };
        self.ctx.begin_tick(host.time());
        // Pull first: hosts let a pulled agent move without fatigue checks.
        let status = host.pull_agent(puller, pulled);
        if status != MoveStatus::Ok {
            return status;
        }
        let status = host.move_agent(pulled, dir);
        if status == MoveStatus::Ok {
            self.ctx.register_pull(puller, puller_pos, pulled);
        }
        status
    }
}
