//! Cache backed by the host's durable key-value store.
//!
//! The store is a plain serde struct the host persists between process
//! restarts (here: JSON).  Values and expirations live in two parallel maps;
//! expirations are compact-codec strings, so the whole store stays string
//! typed.  The store also carries the global portal-set list, which is
//! rebuilt into an in-memory index on startup and flushed back each tick.

use std::collections::BTreeMap;

use cg_core::{Codec, Tick};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::memo::Memo;
use crate::strategy::{CacheBackend, CachingStrategy};
use crate::CacheResult;

/// Persisted layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableStore {
    #[serde(default)]
    pub cache:            BTreeMap<String, String>,
    #[serde(default)]
    pub cache_expiration: BTreeMap<String, String>,
    #[serde(default)]
    pub portals:          Vec<String>,
}

/// [`DurableStore`]-backed cache.
#[derive(Debug)]
pub struct MemoryCache {
    store: DurableStore,
    ticks: Codec,
    memo:  Memo,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::from_store(DurableStore::default())
    }
}

impl MemoryCache {
    pub fn from_store(store: DurableStore) -> Self {
        Self { store, ticks: Codec::NUMBER, memo: Memo::default() }
    }

    /// Restore from the host's persisted JSON.
    pub fn from_json(json: &str) -> CacheResult<Self> {
        Ok(Self::from_store(serde_json::from_str(json)?))
    }

    /// Serialize for the host to persist.
    pub fn to_json(&self) -> CacheResult<String> {
        Ok(serde_json::to_string(&self.store)?)
    }

    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DurableStore {
        &mut self.store
    }

    pub fn into_store(self) -> DurableStore {
        self.store
    }

    fn decode_expiration(&self, raw: &str) -> Option<Tick> {
        self.ticks.decode_one(raw).ok().map(Tick)
    }
}

impl CachingStrategy<String> for MemoryCache {
    fn get(&mut self, key: &str) -> Option<String> {
        self.store.cache.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String, expiration: Option<Tick>) {
        match expiration.map(|t| self.ticks.encode_one(t.0)).transpose() {
            Ok(Some(exp)) => {
                self.store.cache_expiration.insert(key.to_string(), exp);
            }
            Ok(None) => {
                self.store.cache_expiration.remove(key);
            }
            Err(error) => {
                warn!(key, %error, "expiration out of range; entry not stored");
                self.delete(key);
                return;
            }
        }
        self.store.cache.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.store.cache.remove(key);
        self.store.cache_expiration.remove(key);
    }

    fn expires(&mut self, key: &str) -> Option<Tick> {
        let raw = self.store.cache_expiration.get(key)?;
        self.decode_expiration(raw)
    }
}

impl CacheBackend for MemoryCache {
    fn clean(&mut self, now: Tick) -> usize {
        let expired: Vec<String> = self
            .store
            .cache_expiration
            .iter()
            .filter(|(_, raw)| self.decode_expiration(raw).is_none_or(|t| t <= now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.delete(key);
        }
        self.memo.clear();
        expired.len()
    }

    fn memo_mut(&mut self) -> &mut Memo {
        &mut self.memo
    }
}
