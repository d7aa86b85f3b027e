//! The `Sim` struct and its tick loop.

use std::collections::BTreeMap;

use cg_core::{AgentId, MoveStatus, Tick};
use cg_movement::Cartographer;
use cg_spatial::{IntelReport, WorldView};
use cg_traffic::ReconcileReport;
use tracing::{debug, info};

use crate::astar::GridPathFinder;
use crate::behavior::{AgentBehavior, AgentCtx};
use crate::commit::CommitReport;
use crate::config::SimConfig;
use crate::rng::AgentRng;
use crate::world::GridWorld;
use crate::{SimError, SimObserver, SimResult};

/// What happened during one tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tick:    Tick,
    pub intel:   IntelReport,
    pub traffic: ReconcileReport,
    pub commit:  CommitReport,
    /// Behaviour calls that returned something other than `Ok`.
    pub failed:  usize,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The reference host loop.
///
/// Each tick runs the movement core's protocol against [`GridWorld`]:
///
/// 1. **Pre-tick**: cache eviction and keeper/portal intel.
/// 2. **Behaviour**: [`AgentBehavior::act`] for each of our agents, in id
///    order.  Movement calls register intents (or step directly while the
///    scheduler has not run lately).
/// 3. **Reconcile**: resolve the intents and queue the moves.
/// 4. **Commit**: apply all queued moves at once.
/// 5. **Advance** the clock.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<B: AgentBehavior> {
    pub config:       SimConfig,
    pub world:        GridWorld,
    pub cartographer: Cartographer<GridPathFinder>,
    pub behavior:     B,
    /// Created on an agent's first turn.
    rngs:             BTreeMap<AgentId, AgentRng>,
}

impl<B: AgentBehavior> Sim<B> {
    pub(crate) fn new(
        config: SimConfig,
        world: GridWorld,
        cartographer: Cartographer<GridPathFinder>,
        behavior: B,
    ) -> Self {
        Self { config, world, cartographer, behavior, rngs: BTreeMap::new() }
    }

    pub fn now(&self) -> Tick {
        self.world.time()
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let end = self.config.end_tick();
        if self.now() > end {
            return Err(SimError::Config(format!("clock {} is already past the end tick {end}", self.now())));
        }
        info!(start = %self.now(), %end, agents = self.world.my_agents().len(), "simulation started");
        while self.now() < end {
            self.observed_tick(observer);
        }
        observer.on_sim_end(self.now());
        info!(end = %self.now(), "simulation finished");
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) {
        for _ in 0..n {
            self.observed_tick(observer);
        }
    }

    /// One tick without an observer.
    pub fn step(&mut self) -> TickSummary {
        let summary = self.process_tick();
        self.world.advance();
        summary
    }

    /// Serialize the cartographer's durable state.
    pub fn save(&mut self) -> SimResult<String> {
        Ok(self.cartographer.save()?)
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn observed_tick<O: SimObserver>(&mut self, observer: &mut O) {
        let now = self.now();
        observer.on_tick_start(now);
        let summary = self.process_tick();
        observer.on_tick_end(&summary);
        let interval = self.config.output_interval_ticks;
        if interval > 0 && now.0 % interval == 0 {
            observer.on_snapshot(now, &self.world);
        }
        self.world.advance();
    }

    fn process_tick(&mut self) -> TickSummary {
        let tick = self.now();
        let intel = self.cartographer.pre_tick(&self.world);

        let mut failed = 0;
        let seed = self.config.seed;
        for agent in self.world.my_agents() {
            let rng = self.rngs.entry(agent).or_insert_with(|| AgentRng::new(seed, agent));
            let mut cx = AgentCtx {
                cartographer: &mut self.cartographer,
                world:        &mut self.world,
                rng,
            };
            let status = self.behavior.act(agent, &mut cx);
            if status != MoveStatus::Ok {
                debug!(%agent, %status, "behaviour reported failure");
                failed += 1;
            }
        }

        let traffic = self.cartographer.reconcile_traffic(&mut self.world);
        let commit = self.world.commit();
        debug!(
            %tick,
            intents = traffic.intents,
            moved = commit.moved,
            blocked = commit.blocked,
            failed,
            "tick done"
        );
        TickSummary { tick, intel, traffic, commit, failed }
    }
}
