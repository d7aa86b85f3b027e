//! `cg-movement` — paths and per-agent movement on top of the traffic
//! scheduler.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                    |
//! |-------------------|-------------------------------------------------------------|
//! | [`engine`]        | `Cartographer<P>` — owns caches, portals, tick context; `pre_tick`, traffic entry points |
//! | [`opts`]          | `MoveOpts` (all-optional, mergeable), callbacks, `OptsSnapshot` |
//! | [`targets`]       | target normalization and flee rings                         |
//! | [`generate`]      | `generate_path`: route, cost matrices, portal stitching     |
//! | [`cached_paths`]  | `cache_path`, `get_cached_path`, `reset_cached_path`, `follow_path` |
//! | [`move_to`]       | the `move_to` state machine, `clear_cached_path`            |
//! | [`move_by_path`]  | following a named path with stuck recovery                  |
//! | [`poi`]           | disjoint alternate routes under one key                     |
//! | [`pull`]          | `follow` (pulling)                                          |
//! | [`tracker`]       | heap hints: stuck detection, path index                     |
//! | [`error`]         | `MovementError`, `MovementResult<T>`                        |
//!
//! # Movement model
//!
//! Every entry point ends in at most one step intent for the agent.  While
//! the scheduler runs each tick, intents go to the `TickContext` and are
//! resolved together by [`Cartographer::reconcile_traffic`]; when it has
//! not run for two ticks, steps go straight to the host instead.
//!
//! ```text
//! move_to ──► targets/opts unchanged? ──► cached path ──► follow_path ──► step
//!               │ no                        │ missing
//!               ▼                           ▼
//!          clear path                  generate_path ──► cache
//! ```

pub mod cached_paths;
pub mod engine;
pub mod error;
pub mod generate;
pub mod move_by_path;
pub mod move_to;
pub mod opts;
pub mod poi;
pub mod pull;
pub mod targets;
pub mod tracker;


pub use cached_paths::{path_key, PATH_PREFIX};
pub use engine::Cartographer;
pub use error::{MovementError, MovementResult};
pub use generate::{generate_path, room_cost_matrix, PathContext};
pub use opts::{AvoidTargets, MoveOpts, OptsSnapshot, RoomCallback};
pub use poi::{route_key, DEFAULT_EXTRA_ROUTES};
pub use targets::{flee_destinations, is_safe, normalize_targets};
pub use tracker::AgentTrack;
