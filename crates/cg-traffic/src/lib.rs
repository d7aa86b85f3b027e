//! `cg-traffic` — per-tick move intents and the traffic scheduler.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`host`]      | `AgentHost` — agent queries and move/pull commands            |
//! | [`ledger`]    | `MoveIntent`, `RoomLedger`, `TickContext`                     |
//! | [`reconcile`] | `reconcile_traffic`, `reconciled_recently`, `ReconcileReport` |
//!
//! # Tick model
//!
//! ```text
//! ctx.begin_tick(now)          drop last tick's ledgers
//! ctx.register_move(..)        any number of times, last write per agent wins
//! reconcile_traffic(ctx, ..)   once, after every agent has registered
//! ```
//!
//! Intents live only in the `TickContext`; nothing about them is persisted.
//! The only durable trace is the "last reconciled" tick, which lets movement
//! code fall back to direct moves when the scheduler has stopped running.

pub mod host;
pub mod ledger;
pub mod reconcile;


pub use host::AgentHost;
pub use ledger::{MoveIntent, RoomLedger, TickContext};
pub use reconcile::{
    mark_reconciled, reconcile_traffic, reconciled_recently, ReconcileOpts, ReconcileReport,
    RECONCILE_KEY,
};
