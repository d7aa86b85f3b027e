//! Per-tick memo of decoded values.
//!
//! Entries are keyed by serializer, then cache key, and remember the raw
//! string they were decoded from.  A lookup only hits when the backend still
//! holds that exact raw string, so a memo can never serve a value that was
//! overwritten behind its back.

use std::any::Any;
use std::collections::HashMap;

#[derive(Default)]
pub struct Memo {
    by_serializer: HashMap<&'static str, HashMap<String, (String, Box<dyn Any>)>>,
}

impl Memo {
    pub fn lookup<V: Clone + 'static>(&self, serializer: &'static str, key: &str, raw: &str) -> Option<V> {
        let (memo_raw, value) = self.by_serializer.get(serializer)?.get(key)?;
        if memo_raw != raw {
            return None;
        }
        value.downcast_ref::<V>().cloned()
    }

    pub fn store<V: 'static>(&mut self, serializer: &'static str, key: &str, raw: String, value: V) {
        self.by_serializer
            .entry(serializer)
            .or_default()
            .insert(key.to_string(), (raw, Box::new(value)));
    }

    /// Drop `key` under every serializer.
    pub fn forget(&mut self, key: &str) {
        for map in self.by_serializer.values_mut() {
            map.remove(key);
        }
    }

    pub fn clear(&mut self) {
        self.by_serializer.clear();
    }

    pub fn len(&self) -> usize {
        self.by_serializer.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Memo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo").field("entries", &self.len()).finish()
    }
}
