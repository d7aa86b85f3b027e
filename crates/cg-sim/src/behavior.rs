//! Agent behaviour: what each of our agents does with its tick.

use std::collections::BTreeMap;

use cg_core::{AgentId, MoveStatus, MoveTarget, Position};
use cg_movement::{Cartographer, MoveOpts};
use cg_traffic::AgentHost;

use crate::astar::GridPathFinder;
use crate::rng::AgentRng;
use crate::world::GridWorld;

/// Everything a behaviour may touch during its turn.
pub struct AgentCtx<'a> {
    pub cartographer: &'a mut Cartographer<GridPathFinder>,
    pub world:        &'a mut GridWorld,
    pub rng:          &'a mut AgentRng,
}

impl AgentCtx<'_> {
    pub fn pos(&self, agent: AgentId) -> Option<Position> {
        self.world.agent_pos(agent)
    }

    pub fn move_to(&mut self, agent: AgentId, targets: &[MoveTarget], opts: &MoveOpts) -> MoveStatus {
        self.cartographer.move_to(&mut *self.world, agent, targets, opts)
    }
}

/// Decision making for our agents.
///
/// Called once per agent per tick, in ascending id order, after
/// `pre_tick` and before traffic reconciliation.  The returned status is
/// only counted; anything other than `Ok` shows up as
/// [`TickSummary::failed`](crate::TickSummary::failed).
pub trait AgentBehavior {
    fn act(&mut self, agent: AgentId, cx: &mut AgentCtx<'_>) -> MoveStatus;
}

// ── Stock behaviours ──────────────────────────────────────────────────────────

/// Does nothing; the scheduler still shoves idle agents out of the way.
pub struct Idle;

impl AgentBehavior for Idle {
    fn act(&mut self, _agent: AgentId, _cx: &mut AgentCtx<'_>) -> MoveStatus {
        MoveStatus::Ok
    }
}

/// A behaviour backed by a closure.  See [`from_fn`].
pub struct FnBehavior<F>(F);

/// Wrap a closure as an [`AgentBehavior`].
///
/// ```rust,ignore
/// let behavior = from_fn(|agent, cx| cx.move_to(agent, &[target], &MoveOpts::default()));
/// ```
pub fn from_fn<F>(f: F) -> FnBehavior<F>
where
    F: FnMut(AgentId, &mut AgentCtx<'_>) -> MoveStatus,
{
    FnBehavior(f)
}

impl<F> AgentBehavior for FnBehavior<F>
where
    F: FnMut(AgentId, &mut AgentCtx<'_>) -> MoveStatus,
{
    fn act(&mut self, agent: AgentId, cx: &mut AgentCtx<'_>) -> MoveStatus {
        (self.0)(agent, cx)
    }
}

/// Walk each listed agent to its targets; everyone else idles.
#[derive(Default)]
pub struct GoTo {
    orders: BTreeMap<AgentId, (Vec<MoveTarget>, MoveOpts)>,
}

impl GoTo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, agent: AgentId, targets: Vec<MoveTarget>, opts: MoveOpts) -> Self {
        self.orders.insert(agent, (targets, opts));
        self
    }
}

impl AgentBehavior for GoTo {
    fn act(&mut self, agent: AgentId, cx: &mut AgentCtx<'_>) -> MoveStatus {
        match self.orders.get(&agent) {
            Some((targets, opts)) => cx.move_to(agent, targets, opts),
            None => MoveStatus::Ok,
        }
    }
}

/// Walk to random passable tiles within `radius`, picking a new one on
/// arrival or when the current one cannot be reached.
pub struct Wander {
    pub radius: u8,
    pub opts:   MoveOpts,
    goals:      BTreeMap<AgentId, Position>,
}

impl Wander {
    pub fn new(radius: u8, opts: MoveOpts) -> Self {
        Self { radius, opts, goals: BTreeMap::new() }
    }
}

impl AgentBehavior for Wander {
    fn act(&mut self, agent: AgentId, cx: &mut AgentCtx<'_>) -> MoveStatus {
        let Some(pos) = cx.pos(agent) else {
            return MoveStatus::InvalidArgs;
        };
        let goal = match self.goals.get(&agent) {
            Some(&goal) if goal != pos => goal,
            _ => {
                let candidates: Vec<Position> = pos
                    .nearby(self.radius, false)
                    .into_iter()
                    .filter(|&p| cx.world.is_passable(p))
                    .collect();
                let Some(&goal) = cx.rng.choose(&candidates) else {
                    return MoveStatus::Ok;
                };
                self.goals.insert(agent, goal);
                goal
            }
        };
        let status = cx.move_to(agent, &[MoveTarget::exact(goal)], &self.opts);
        if status == MoveStatus::NoPath {
            self.goals.remove(&agent);
        }
        status
    }
}
