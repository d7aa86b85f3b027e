//! Agent-level host access.

use cg_core::{AgentId, BodyInfo, Direction, MoveStatus, Position, RoomName};
use cg_spatial::WorldView;

/// Everything the movement core needs to know about, and do to, the
/// agents we control.
///
/// Commands are queued by the host and take effect when it commits the
/// tick; queries always reflect the start of the tick.
pub trait AgentHost: WorldView {
    /// `None` while the agent has not materialized (e.g. still spawning).
    fn agent_pos(&self, agent: AgentId) -> Option<Position>;

    fn agent_fatigue(&self, agent: AgentId) -> u32;

    fn agent_body(&self, agent: AgentId) -> Option<BodyInfo>;

    /// Our own agents standing in `room`.
    fn my_agents_in(&self, room: RoomName) -> Vec<AgentId>;

    /// Queue a single step.  A later call for the same agent replaces it.
    fn move_agent(&mut self, agent: AgentId, dir: Direction) -> MoveStatus;

    /// Queue `puller` dragging `pulled` into its current tile.
    fn pull_agent(&mut self, puller: AgentId, pulled: AgentId) -> MoveStatus;
}
