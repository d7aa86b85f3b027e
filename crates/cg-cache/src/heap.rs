//! Process-local cache.

use std::collections::HashMap;

use cg_core::Tick;

use crate::memo::Memo;
use crate::strategy::{CacheBackend, CachingStrategy};

/// In-process string cache.  Contents are lost whenever the process
/// restarts, which callers must tolerate.
#[derive(Debug, Default)]
pub struct HeapCache {
    entries: HashMap<String, (String, Option<Tick>)>,
    memo:    Memo,
}

impl HeapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CachingStrategy<String> for HeapCache {
    fn get(&mut self, key: &str) -> Option<String> {
        self.entries.get(key).map(|(v, _)| v.clone())
    }

    fn set(&mut self, key: &str, value: String, expiration: Option<Tick>) {
        self.entries.insert(key.to_string(), (value, expiration));
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn expires(&mut self, key: &str) -> Option<Tick> {
        self.entries.get(key).and_then(|(_, exp)| *exp)
    }
}

impl CacheBackend for HeapCache {
    fn clean(&mut self, now: Tick) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (_, exp)| exp.is_none_or(|t| t > now));
        self.memo.clear();
        before - self.entries.len()
    }

    fn memo_mut(&mut self) -> &mut Memo {
        &mut self.memo
    }
}
