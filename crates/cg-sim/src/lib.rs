//! `cg-sim` — an in-memory reference host for the cartograph movement core.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`world`]    | `GridWorld`: rooms, terrain, structures, portals, agents     |
//! | [`commit`]   | simultaneous end-of-tick move application                    |
//! | [`astar`]    | `GridPathFinder`: the host search primitive                  |
//! | [`loader`]   | `load_world_csv` / `load_world_reader`                       |
//! | [`behavior`] | `AgentBehavior` trait and stock behaviours                   |
//! | [`sim`]      | `Sim` tick loop, `TickSummary`                               |
//! | [`builder`]  | `SimBuilder`                                                 |
//! | [`observer`] | `SimObserver` hooks                                          |
//! | [`rng`]      | deterministic per-agent RNG                                  |
//!
//! # Tick loop
//!
//! ```text
//! for tick in start..end:
//!   ① pre_tick       — evict expired cache entries, refresh intel
//!   ② behaviour      — AgentBehavior::act for each of our agents
//!   ③ reconcile      — resolve intents, queue one step per agent
//!   ④ commit         — apply every queued step at once
//!   ⑤ advance clock
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cg_core::{MoveTarget, Tick};
//! use cg_movement::MoveOpts;
//! use cg_sim::{load_world_csv, GoTo, NoopObserver, SimBuilder, SimConfig};
//!
//! let mut world = load_world_csv(Path::new("world.csv"), Tick(1))?;
//! world.spawn_agent(AgentId(1), start, body)?;
//! let behavior = GoTo::new().order(AgentId(1), vec![MoveTarget::near(goal)], MoveOpts::default());
//! let mut sim = SimBuilder::new(SimConfig::default(), world, behavior).build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod astar;
pub mod behavior;
pub mod builder;
pub mod commit;
pub mod config;
pub mod error;
pub mod loader;
pub mod observer;
pub mod rng;
pub mod sim;
pub mod world;


pub use astar::GridPathFinder;
pub use behavior::{from_fn, AgentBehavior, AgentCtx, FnBehavior, GoTo, Idle, Wander};
pub use builder::SimBuilder;
pub use commit::CommitReport;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use loader::{load_world_csv, load_world_reader};
pub use observer::{NoopObserver, SimObserver};
pub use rng::AgentRng;
pub use sim::{Sim, TickSummary};
pub use world::{GridWorld, RoomTerrain, SimAgent};
