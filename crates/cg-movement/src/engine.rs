//! The `Cartographer`: one owner for every piece of cross-tick movement
//! state, and the per-tick entry points around it.

use cg_cache::{Caches, HeapCache, MemoryCache};
use cg_core::{AgentId, MoveStatus, MoveTarget, Position, Tick};
use cg_spatial::{update_intel, IntelReport, PathFinder, PortalIndex, WorldView};
use cg_traffic::{
    reconcile_traffic, reconciled_recently, AgentHost, MoveIntent, ReconcileOpts, ReconcileReport,
    TickContext,
};
use tracing::debug;

use crate::generate::{generate_path, PathContext};
use crate::opts::MoveOpts;
use crate::MovementResult;

/// Movement core bound to a host pathfinder.
///
/// # Type parameter
///
/// `P` is the host's search primitive.  Everything above it (routing, cost
/// matrices, caching, traffic) lives here.
///
/// # Tick protocol
///
/// ```text
/// cartographer.pre_tick(&world);                 once, before any movement
/// cartographer.move_to(&mut host, agent, ..);    any number of times
/// cartographer.reconcile_traffic(&mut host);     once, after all movement
/// ```
pub struct Cartographer<P: PathFinder> {
    pub pathfinder:     P,
    pub caches:         Caches,
    pub portals:        PortalIndex,
    /// Intents gathered for the current tick.
    pub ctx:            TickContext,
    /// Base layer every call's options are merged over.
    pub defaults:       MoveOpts,
    /// Merged in for the regeneration after an agent is found stuck.
    pub fallback:       MoveOpts,
    pub reconcile_opts: ReconcileOpts,
}

impl<P: PathFinder> Cartographer<P> {
    pub fn new(pathfinder: P) -> Self {
        Self::with_memory(pathfinder, MemoryCache::default())
    }

    /// Resume from a durable store; the portal index is rebuilt from it.
    pub fn with_memory(pathfinder: P, memory: MemoryCache) -> Self {
        let portals = PortalIndex::from_store(&memory.store().portals);
        Self {
            pathfinder,
            caches: Caches::new(HeapCache::new(), memory),
            portals,
            ctx: TickContext::new(),
            defaults: MoveOpts::defaults(),
            fallback: MoveOpts::stuck_fallback(),
            reconcile_opts: ReconcileOpts::default(),
        }
    }

    /// Resume from the JSON written by [`save`](Self::save).  Heap state
    /// starts empty, as after a restart.
    pub fn restore(pathfinder: P, json: &str) -> MovementResult<Self> {
        Ok(Self::with_memory(pathfinder, MemoryCache::from_json(json)?))
    }

    /// Flush the portal index and serialize the durable store.
    pub fn save(&mut self) -> MovementResult<String> {
        self.caches.memory.store_mut().portals = self.portals.to_store();
        Ok(self.caches.memory.to_json()?)
    }

    /// Evict expired cache entries and refresh keeper and portal intel.
    pub fn pre_tick<W: WorldView + ?Sized>(&mut self, world: &W) -> IntelReport {
        let now = world.time();
        self.ctx.begin_tick(now);
        let evicted = self.caches.clean(now);
        let report = update_intel(world, &mut self.caches.memory, &mut self.portals);
        debug!(%now, evicted, portal_sets = report.portal_sets, "pre-tick");
        report
    }

    // ── Traffic ───────────────────────────────────────────────────────────────

    /// Resolve this tick's intents and issue the moves.
    pub fn reconcile_traffic<H: AgentHost + ?Sized>(&mut self, host: &mut H) -> ReconcileReport {
        self.ctx.begin_tick(host.time());
        reconcile_traffic(&mut self.ctx, host, &mut self.caches.memory, &self.reconcile_opts)
    }

    pub fn reconciled_recently(&mut self, now: Tick) -> bool {
        reconciled_recently(&mut self.caches.memory, now)
    }

    /// Register a custom intent, bypassing the path state machine.
    pub fn register_move<H: AgentHost + ?Sized>(&mut self, host: &H, intent: MoveIntent) {
        self.ctx.begin_tick(host.time());
        let fatigue = host.agent_fatigue(intent.agent);
        let pulled = self
            .ctx
            .room(intent.origin.room())
            .is_some_and(|ledger| ledger.is_pullee(intent.agent));
        self.ctx.register_move(intent, fatigue, pulled);
    }

    pub fn cancel_move(&mut self, agent: AgentId) -> Option<MoveIntent> {
        self.ctx.cancel_move(agent)
    }

    /// Keep `pos` clear this tick.
    pub fn block_square<W: WorldView + ?Sized>(&mut self, world: &W, pos: Position) {
        self.ctx.begin_tick(world.time());
        self.ctx.block_square(pos);
    }

    // ── Shared helpers ────────────────────────────────────────────────────────

    /// Register a one-step intent, or step directly when the scheduler has
    /// not run lately.  `targets` are in preference order.
    pub(crate) fn step<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentId,
        targets: Vec<Position>,
        priority: i32,
    ) -> MoveStatus {
        let Some(pos) = host.agent_pos(agent) else {
            return MoveStatus::InvalidArgs;
        };
        let now = host.time();
        if self.reconciled_recently(now) {
            self.register_move(host, MoveIntent::new(agent, pos, targets, priority));
            return MoveStatus::Ok;
        }
        let Some(&first) = targets.first() else {
            return MoveStatus::Ok;
        };
        if first == pos {
            return MoveStatus::Ok;
        }
        debug!(%agent, %now, "scheduler idle, moving directly");
        match pos.direction_to(first) {
            Some(dir) => host.move_agent(agent, dir),
            None => MoveStatus::InvalidArgs,
        }
    }

    /// Generate a fresh path with this cartographer's portal index and
    /// keeper intel.
    pub fn generate_path<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        origin: Position,
        targets: &[MoveTarget],
        opts: &MoveOpts,
    ) -> Option<Vec<Position>> {
        let opts = self.defaults.merge(opts);
        self.generate_merged(world, origin, targets, &opts)
    }

    /// [`generate_path`](Self::generate_path) with options already merged.
    pub(crate) fn generate_merged<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        origin: Position,
        targets: &[MoveTarget],
        opts: &MoveOpts,
    ) -> Option<Vec<Position>> {
        let mut cx = PathContext { world, portals: &self.portals, memory: &mut self.caches.memory };
        generate_path(&mut cx, &mut self.pathfinder, origin, targets, opts)
    }
}
