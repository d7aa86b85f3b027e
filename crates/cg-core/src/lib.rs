//! `cg-core` — foundational types for the `cartograph` movement core.
//!
//! This crate is a dependency of every other `cg-*` crate.  It has no `cg-*`
//! dependencies and only `thiserror` (plus optional `serde`) externally.
//!
//! # What lives here
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`ids`]    | `AgentId`                                                     |
//! | [`time`]   | `Tick`                                                        |
//! | [`codec`]  | `Codec`, `Depth` — bit-packing into printable strings         |
//! | [`room`]   | `RoomName`, `ExitDir`, room classification                    |
//! | [`pos`]    | `Position`, `Coord`, `Direction`                              |
//! | [`target`] | `MoveTarget`, edge splitting                                  |
//! | [`body`]   | `BodyInfo` — movement capacity vs. load                       |
//! | [`status`] | `MoveStatus` — host-convention status codes                   |
//! | [`keys`]   | `object_key`, `agent_key`, `room_key`                         |
//! | [`error`]  | `CoreError`, `CoreResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to public value types.      |

pub mod body;
pub mod codec;
pub mod error;
pub mod ids;
pub mod keys;
pub mod pos;
pub mod room;
pub mod status;
pub mod target;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use body::{BodyInfo, TerrainCosts};
pub use codec::{Codec, Depth};
pub use error::{CoreError, CoreResult};
pub use ids::AgentId;
pub use keys::{agent_key, object_key, room_key};
pub use pos::{Coord, Direction, Position};
pub use room::{ExitDir, RoomName, ROOM_SIZE};
pub use status::MoveStatus;
pub use target::MoveTarget;
pub use time::Tick;
