//! The caching contract, the serializer decorator, and backend selection.

use cg_core::Tick;
use tracing::warn;

use crate::memo::Memo;
use crate::serializer::Serializer;
use crate::{HeapCache, MemoryCache};

/// Key-value cache with optional per-entry expiration.
pub trait CachingStrategy<T> {
    /// The cached value, or `None` if absent.
    fn get(&mut self, key: &str) -> Option<T>;

    /// Store `value`, expiring once the clock reaches `expiration`.
    fn set(&mut self, key: &str, value: T, expiration: Option<Tick>);

    fn delete(&mut self, key: &str);

    /// Expiration tick of `key`, if it exists and has one.
    fn expires(&mut self, key: &str) -> Option<Tick>;
}

/// A raw string backend.  Implemented by [`HeapCache`] and [`MemoryCache`].
pub trait CacheBackend: CachingStrategy<String> {
    /// Evict every entry whose expiration is at or before `now` and reset
    /// the decode memo.  Returns the number of evicted entries.
    fn clean(&mut self, now: Tick) -> usize;

    /// Decoded values belonging to this backend.
    fn memo_mut(&mut self) -> &mut Memo;
}

/// Typed view over a backend.
pub struct WithSerializer<'a, B: ?Sized, S> {
    backend:    &'a mut B,
    serializer: S,
}

impl<'a, B: CacheBackend + ?Sized, S: Serializer> WithSerializer<'a, B, S> {
    pub fn new(backend: &'a mut B, serializer: S) -> Self {
        Self { backend, serializer }
    }
}

impl<B: CacheBackend + ?Sized, S: Serializer> CachingStrategy<S::Value> for WithSerializer<'_, B, S> {
    fn get(&mut self, key: &str) -> Option<S::Value> {
        let Some(raw) = self.backend.get(key) else {
            self.backend.memo_mut().forget(key);
            return None;
        };
        if let Some(value) = self.backend.memo_mut().lookup::<S::Value>(S::KEY, key, &raw) {
            return Some(value);
        }
        match self.serializer.deserialize(&raw) {
            Ok(value) => {
                self.backend.memo_mut().store(S::KEY, key, raw, value.clone());
                Some(value)
            }
            Err(error) => {
                warn!(key, serializer = S::KEY, %error, "dropping undecodable cache entry");
                self.delete(key);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: S::Value, expiration: Option<Tick>) {
        match self.serializer.serialize(&value) {
            Ok(raw) if !raw.is_empty() => {
                self.backend.set(key, raw.clone(), expiration);
                self.backend.memo_mut().store(S::KEY, key, raw, value);
            }
            // The empty string is reserved for "absent".
            Ok(_) => self.delete(key),
            Err(error) => {
                warn!(key, serializer = S::KEY, %error, "value not cacheable");
                self.delete(key);
            }
        }
    }

    fn delete(&mut self, key: &str) {
        self.backend.delete(key);
        self.backend.memo_mut().forget(key);
    }

    fn expires(&mut self, key: &str) -> Option<Tick> {
        self.backend.expires(key)
    }
}

/// `.with(serializer)` on any backend, including `dyn CacheBackend`.
pub trait CacheExt: CacheBackend {
    fn with<S: Serializer>(&mut self, serializer: S) -> WithSerializer<'_, Self, S> {
        WithSerializer::new(self, serializer)
    }
}

impl<B: CacheBackend + ?Sized> CacheExt for B {}

// ── Backend selection ─────────────────────────────────────────────────────────

/// Which backend a caller's cached state lives in.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
pub enum CacheKind {
    #[default]
    Heap,
    Memory,
}

/// Both backends, owned together so one `clean` per tick covers everything.
#[derive(Debug, Default)]
pub struct Caches {
    pub heap:   HeapCache,
    pub memory: MemoryCache,
}

impl Caches {
    pub fn new(heap: HeapCache, memory: MemoryCache) -> Self {
        Self { heap, memory }
    }

    pub fn select(&mut self, kind: CacheKind) -> &mut dyn CacheBackend {
        match kind {
            CacheKind::Heap => &mut self.heap,
            CacheKind::Memory => &mut self.memory,
        }
    }

    /// Clean both backends; returns the total evicted.
    pub fn clean(&mut self, now: Tick) -> usize {
        self.heap.clean(now) + self.memory.clean(now)
    }
}
