//! Fluent builder for constructing a [`Sim`].

use cg_core::Tick;
use cg_movement::{Cartographer, MoveOpts};
use cg_traffic::ReconcileOpts;

use crate::astar::GridPathFinder;
use crate::behavior::AgentBehavior;
use crate::config::SimConfig;
use crate::world::GridWorld;
use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<B>`].
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                 |
/// |------------------------|-----------------------------------------|
/// | `.memory(json)`        | empty durable store                     |
/// | `.defaults(opts)`      | `MoveOpts::defaults()` only             |
/// | `.reconcile_opts(o)`   | `ReconcileOpts::default()`              |
///
/// # Example
///
/// ```rust,ignore
/// let world = load_world_csv(Path::new("world.csv"), Tick(1))?;
/// let mut sim = SimBuilder::new(config, world, Idle).build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<B: AgentBehavior> {
    config:    SimConfig,
    world:     GridWorld,
    behavior:  B,
    memory:    Option<String>,
    defaults:  Option<MoveOpts>,
    reconcile: Option<ReconcileOpts>,
}

impl<B: AgentBehavior> SimBuilder<B> {
    pub fn new(config: SimConfig, world: GridWorld, behavior: B) -> Self {
        Self {
            config,
            world,
            behavior,
            memory:    None,
            defaults:  None,
            reconcile: None,
        }
    }

    /// Resume from durable state written by [`Sim::save`].
    pub fn memory(mut self, json: impl Into<String>) -> Self {
        self.memory = Some(json.into());
        self
    }

    /// Options layered over the documented defaults for every call.
    pub fn defaults(mut self, opts: MoveOpts) -> Self {
        self.defaults = Some(opts);
        self
    }

    pub fn reconcile_opts(mut self, opts: ReconcileOpts) -> Self {
        self.reconcile = Some(opts);
        self
    }

    /// Validate inputs, snapshot terrain for the pathfinder, and return a
    /// ready-to-run [`Sim`] with the world clock at `config.start_tick`.
    pub fn build(self) -> SimResult<Sim<B>> {
        if self.config.total_ticks == 0 {
            return Err(SimError::Config("total_ticks must be positive".to_string()));
        }
        if self.world.rooms().next().is_none() {
            return Err(SimError::Config("world has no rooms".to_string()));
        }

        let mut world = self.world;
        world.set_time(Tick(self.config.start_tick));
        let pathfinder = GridPathFinder::new(&world);

        let mut cartographer = match self.memory {
            Some(json) => Cartographer::restore(pathfinder, &json)?,
            None => Cartographer::new(pathfinder),
        };
        if let Some(opts) = self.defaults {
            cartographer.defaults = cartographer.defaults.merge(&opts);
        }
        if let Some(opts) = self.reconcile {
            cartographer.reconcile_opts = opts;
        }

        Ok(Sim::new(self.config, world, cartographer, self.behavior))
    }
}
