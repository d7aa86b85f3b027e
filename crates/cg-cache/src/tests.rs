//! Unit tests for cg-cache.

#[cfg(test)]
mod helpers {
    use cg_core::{Position, RoomName};

    pub fn pos(x: u8, y: u8, room: &str) -> Position {
        Position::new(room.parse::<RoomName>().unwrap(), x, y).unwrap()
    }
}

// ── Packing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod pack {
    use super::helpers::pos;
    use crate::pack::*;
    use cg_core::{Coord, MoveTarget};

    #[test]
    fn position_is_two_characters() {
        let p = pos(49, 0, "W127S127");
        let s = pack_position(p).unwrap();
        assert_eq!(s.chars().count(), 2);
        assert_eq!(unpack_position(&s).unwrap(), p);
    }

    #[test]
    fn position_lists_of_any_length() {
        assert_eq!(pack_positions(&[]).unwrap(), "");
        assert_eq!(unpack_positions("").unwrap(), vec![]);

        let one = vec![pos(1, 2, "E0S0")];
        assert_eq!(unpack_positions(&pack_positions(&one).unwrap()).unwrap(), one);

        let rooms = ["W0N0", "E0N0", "E1N0", "E1S0", "W5N5", "E100S7"];
        let many: Vec<_> = (0..600u32)
            .map(|i| pos((i % 50) as u8, (i * 7 % 50) as u8, rooms[i as usize % rooms.len()]))
            .collect();
        let packed = pack_positions(&many).unwrap();
        assert_eq!(packed.chars().count(), 1200);
        assert_eq!(unpack_positions(&packed).unwrap(), many);
    }

    #[test]
    fn odd_length_list_is_corrupt() {
        let s = pack_positions(&[pos(1, 1, "W0N0")]).unwrap();
        let truncated: String = s.chars().take(1).collect();
        assert!(unpack_positions(&truncated).is_err());
    }

    #[test]
    fn move_targets_keep_range() {
        let targets = vec![
            MoveTarget::new(pos(10, 10, "W1N1"), 0),
            MoveTarget::new(pos(48, 1, "E3S9"), 20),
        ];
        let s = pack_move_targets(&targets).unwrap();
        assert_eq!(s.chars().count(), 6);
        assert_eq!(unpack_move_targets(&s).unwrap(), targets);
    }

    #[test]
    fn coords() {
        let coords = vec![Coord { x: 0, y: 0 }, Coord { x: 49, y: 49 }, Coord { x: 3, y: 40 }];
        assert_eq!(unpack_coords(&pack_coords(&coords).unwrap()).unwrap(), coords);
        assert_eq!(unpack_coords(&pack_coords(&[]).unwrap()).unwrap(), vec![]);
    }
}

// ── Backends ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod backends {
    use crate::{CacheBackend, CachingStrategy, DurableStore, HeapCache, MemoryCache};
    use cg_core::Tick;

    fn exercise(cache: &mut dyn CacheBackend) {
        cache.set("a", "1".into(), Some(Tick(10)));
        cache.set("b", "2".into(), None);
        assert_eq!(cache.get("a").as_deref(), Some("1"));
        assert_eq!(cache.expires("a"), Some(Tick(10)));
        assert_eq!(cache.expires("b"), None);

        assert_eq!(cache.clean(Tick(9)), 0);
        assert_eq!(cache.get("a").as_deref(), Some("1"));
        assert_eq!(cache.clean(Tick(10)), 1);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b").as_deref(), Some("2"));

        cache.delete("b");
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn heap_contract() {
        exercise(&mut HeapCache::new());
    }

    #[test]
    fn memory_contract() {
        exercise(&mut MemoryCache::default());
    }

    #[test]
    fn overwrite_clears_expiration() {
        let mut cache = MemoryCache::default();
        cache.set("k", "v".into(), Some(Tick(3)));
        cache.set("k", "w".into(), None);
        assert_eq!(cache.expires("k"), None);
        assert_eq!(cache.clean(Tick(100)), 0);
    }

    #[test]
    fn memory_survives_a_restart() {
        let mut cache = MemoryCache::default();
        cache.set("path", "xyz".into(), Some(Tick(42)));
        cache.store_mut().portals.push("p".into());
        let json = cache.to_json().unwrap();

        let mut restored = MemoryCache::from_json(&json).unwrap();
        assert_eq!(restored.get("path").as_deref(), Some("xyz"));
        assert_eq!(restored.expires("path"), Some(Tick(42)));
        assert_eq!(restored.store().portals, vec!["p".to_string()]);
    }

    #[test]
    fn missing_store_fields_default() {
        let restored = MemoryCache::from_json("{}").unwrap();
        assert_eq!(restored.store(), &DurableStore::default());
    }

    #[test]
    fn corrupt_expiration_is_evicted() {
        let mut cache = MemoryCache::default();
        cache.set("k", "v".into(), None);
        cache.store_mut().cache_expiration.insert("k".into(), "not a tick".into());
        assert_eq!(cache.clean(Tick(0)), 1);
        assert_eq!(cache.get("k"), None);
    }
}

// ── Serializer decorator ──────────────────────────────────────────────────────

#[cfg(test)]
mod with_serializer {
    use super::helpers::pos;
    use crate::{
        CacheBackend, CacheExt, CacheKind, Caches, CachingStrategy, HeapCache, Json,
        NumberSerializer, PositionListSerializer,
    };
    use cg_core::Tick;

    #[test]
    fn typed_roundtrip() {
        let mut heap = HeapCache::new();
        let path = vec![pos(1, 1, "W0N0"), pos(2, 2, "W0N0")];
        heap.with(PositionListSerializer).set("p", path.clone(), Some(Tick(5)));
        assert_eq!(heap.with(PositionListSerializer).get("p"), Some(path));
        assert_eq!(heap.with(PositionListSerializer).expires("p"), Some(Tick(5)));
    }

    #[test]
    fn empty_value_deletes_key() {
        let mut heap = HeapCache::new();
        heap.set("p", "stale".into(), None);
        heap.with(PositionListSerializer).set("p", vec![], None);
        assert_eq!(heap.get("p"), None);
        assert_eq!(heap.with(PositionListSerializer).get("p"), None);
    }

    #[test]
    fn corrupt_value_self_heals() {
        let mut heap = HeapCache::new();
        heap.set("n", "garbage".into(), None);
        assert_eq!(heap.with(NumberSerializer).get("n"), None);
        assert_eq!(heap.get("n"), None);
    }

    #[test]
    fn reads_are_memoized_until_clean() {
        let mut heap = HeapCache::new();
        heap.with(NumberSerializer).set("n", 77, None);
        assert_eq!(heap.with(NumberSerializer).get("n"), Some(77));
        assert_eq!(heap.memo_mut().len(), 1);
        heap.clean(Tick(1));
        assert!(heap.memo_mut().is_empty());
        assert_eq!(heap.with(NumberSerializer).get("n"), Some(77));
    }

    #[test]
    fn memo_never_outlives_a_raw_overwrite() {
        let mut heap = HeapCache::new();
        heap.with(NumberSerializer).set("n", 1, None);
        assert_eq!(heap.with(NumberSerializer).get("n"), Some(1));
        // Raw write behind the decorator's back.
        let raw = {
            let mut other = HeapCache::new();
            other.with(NumberSerializer).set("n", 2, None);
            other.get("n").unwrap()
        };
        heap.set("n", raw, None);
        assert_eq!(heap.with(NumberSerializer).get("n"), Some(2));
    }

    #[test]
    fn delete_forgets_memo_for_every_serializer() {
        let mut heap = HeapCache::new();
        heap.with(Json::<Vec<u32>>::new()).set("k", vec![1, 2], None);
        heap.with(NumberSerializer).delete("k");
        assert_eq!(heap.with(Json::<Vec<u32>>::new()).get("k"), None);
        assert!(heap.memo_mut().is_empty());
    }

    #[test]
    fn selected_backend_is_dyn() {
        let mut caches = Caches::default();
        caches.select(CacheKind::Memory).with(NumberSerializer).set("t", 9, Some(Tick(2)));
        assert!(caches.memory.get("t").is_some());
        assert_eq!(caches.heap.get("t"), None);
        assert_eq!(caches.clean(Tick(2)), 1);
        assert_eq!(caches.select(CacheKind::Memory).with(NumberSerializer).get("t"), None);
    }
}
