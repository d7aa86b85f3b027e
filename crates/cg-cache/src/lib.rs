//! `cg-cache` — cross-tick key-value caches for the cartograph movement core.
//!
//! Two backends share one contract, [`CachingStrategy`]:
//!
//! | Backend         | Lifetime                     | Cost per access                  |
//! |-----------------|------------------------------|----------------------------------|
//! | [`HeapCache`]   | process; lost on restart     | one hash lookup                  |
//! | [`MemoryCache`] | survives restarts via the host's durable store | lookup plus codec work |
//!
//! Values are stored as strings.  Typed access goes through
//! [`WithSerializer`], a decorator that (de)serializes with a
//! [`Serializer`] and memoizes decoded values for the rest of the tick so
//! repeated reads of an unchanged entry skip decoding:
//!
//! ```rust,ignore
//! use cg_cache::{CacheExt, CachingStrategy, PositionListSerializer};
//!
//! let path = caches.heap.with(PositionListSerializer).get("key");
//! ```
//!
//! Expired entries are evicted by [`CacheBackend::clean`], which the
//! movement layer calls once per tick before any agent runs.

pub mod durable;
pub mod error;
pub mod heap;
pub mod memo;
pub mod pack;
pub mod serializer;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use durable::{DurableStore, MemoryCache};
pub use error::{CacheError, CacheResult};
pub use heap::HeapCache;
pub use memo::Memo;
pub use serializer::{
    Json, MoveTargetListSerializer, NumberSerializer, PositionListSerializer, PositionSerializer,
    Serializer,
};
pub use strategy::{CacheBackend, CacheExt, CacheKind, Caches, CachingStrategy, WithSerializer};
