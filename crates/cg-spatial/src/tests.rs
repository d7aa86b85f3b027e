//! Unit tests for cg-spatial.
//!
//! All tests run against `MockWorld`, a hand-built set of rooms with
//! explicit walls and objects.

#[cfg(test)]
mod helpers {
    use std::collections::BTreeSet;

    use cg_core::{ExitDir, Position, RoomName, Tick};

    use crate::world::*;

    pub fn room(s: &str) -> RoomName {
        s.parse().unwrap()
    }

    pub fn pos(x: u8, y: u8, r: &str) -> Position {
        Position::new(room(r), x, y).unwrap()
    }

    #[derive(Default)]
    pub struct MockWorld {
        pub time:       Tick,
        pub rooms:      BTreeSet<RoomName>,
        pub walls:      BTreeSet<Position>,
        pub agents:     Vec<Position>,
        pub structures: Vec<StructureInfo>,
        pub sites:      Vec<ConstructionSiteInfo>,
        pub portals:    Vec<PortalInfo>,
        pub nodes:      Vec<Position>,
    }

    impl MockWorld {
        pub fn with_rooms(names: &[&str]) -> Self {
            Self { rooms: names.iter().map(|n| room(n)).collect(), ..Self::default() }
        }

        pub fn structure(&mut self, pos: Position, kind: StructureKind, my: bool, public: bool) {
            self.structures.push(StructureInfo { pos, kind, my, public });
        }
    }

    impl WorldView for MockWorld {
        fn time(&self) -> Tick {
            self.time
        }

        fn terrain_at(&self, pos: Position) -> Option<Terrain> {
            if !self.rooms.contains(&pos.room()) {
                return None;
            }
            Some(if self.walls.contains(&pos) { Terrain::Wall } else { Terrain::Plain })
        }

        fn has_room(&self, room: RoomName) -> bool {
            self.rooms.contains(&room)
        }

        fn exits(&self, room: RoomName) -> [Option<RoomName>; 4] {
            ExitDir::ALL.map(|d| room.neighbor(d).filter(|n| self.rooms.contains(n)))
        }

        fn visible_rooms(&self) -> Vec<RoomName> {
            self.rooms.iter().copied().collect()
        }

        fn agents_in(&self, room: RoomName) -> Vec<Position> {
            self.agents.iter().copied().filter(|p| p.room() == room).collect()
        }

        fn structures_in(&self, room: RoomName) -> Vec<StructureInfo> {
            self.structures.iter().copied().filter(|s| s.pos.room() == room).collect()
        }

        fn construction_sites_in(&self, room: RoomName) -> Vec<ConstructionSiteInfo> {
            self.sites.iter().copied().filter(|s| s.pos.room() == room).collect()
        }

        fn portals_in(&self, room: RoomName) -> Vec<PortalInfo> {
            self.portals.iter().copied().filter(|p| p.pos.room() == room).collect()
        }

        fn resource_nodes_in(&self, room: RoomName) -> Vec<Position> {
            self.nodes.iter().copied().filter(|p| p.room() == room).collect()
        }
    }
}

// ── Walkability ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod walkable {
    use super::helpers::*;
    use crate::world::{ConstructionSiteInfo, StructureKind};
    use crate::{adjacent_walkable, is_walkable};

    #[test]
    fn terrain_and_unknown_rooms() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.walls.insert(pos(5, 5, "E1S1"));
        assert!(is_walkable(&w, pos(6, 5, "E1S1"), false, false));
        assert!(!is_walkable(&w, pos(5, 5, "E1S1"), true, true));
        assert!(!is_walkable(&w, pos(5, 5, "W9N9"), true, true));
    }

    #[test]
    fn agents_unless_ignored() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.agents.push(pos(5, 5, "E1S1"));
        assert!(!is_walkable(&w, pos(5, 5, "E1S1"), false, false));
        assert!(is_walkable(&w, pos(5, 5, "E1S1"), true, false));
    }

    #[test]
    fn rampart_rules() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.structure(pos(1, 1, "E1S1"), StructureKind::Rampart, false, false);
        w.structure(pos(2, 2, "E1S1"), StructureKind::Rampart, false, true);
        w.structure(pos(3, 3, "E1S1"), StructureKind::Rampart, true, false);
        w.structure(pos(4, 4, "E1S1"), StructureKind::Road, false, false);
        w.structure(pos(5, 5, "E1S1"), StructureKind::Spawn, true, false);
        assert!(!is_walkable(&w, pos(1, 1, "E1S1"), false, false));
        assert!(is_walkable(&w, pos(2, 2, "E1S1"), false, false));
        assert!(is_walkable(&w, pos(3, 3, "E1S1"), false, false));
        assert!(is_walkable(&w, pos(4, 4, "E1S1"), false, false));
        assert!(!is_walkable(&w, pos(5, 5, "E1S1"), false, false));
        assert!(is_walkable(&w, pos(5, 5, "E1S1"), false, true));
    }

    #[test]
    fn only_our_obstacle_sites_block() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.sites.push(ConstructionSiteInfo { pos: pos(1, 1, "E1S1"), kind: StructureKind::Tower, my: true });
        w.sites.push(ConstructionSiteInfo { pos: pos(2, 2, "E1S1"), kind: StructureKind::Tower, my: false });
        w.sites.push(ConstructionSiteInfo { pos: pos(3, 3, "E1S1"), kind: StructureKind::Road, my: true });
        assert!(!is_walkable(&w, pos(1, 1, "E1S1"), false, false));
        assert!(is_walkable(&w, pos(2, 2, "E1S1"), false, false));
        assert!(is_walkable(&w, pos(3, 3, "E1S1"), false, false));
    }

    #[test]
    fn adjacent_filters_walls() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.walls.insert(pos(0, 1, "E1S1"));
        w.agents.push(pos(1, 0, "E1S1"));
        assert_eq!(adjacent_walkable(&w, pos(0, 0, "E1S1"), false), vec![pos(1, 1, "E1S1")]);
        assert_eq!(adjacent_walkable(&w, pos(0, 0, "E1S1"), true).len(), 2);
    }
}

// ── Cost matrices ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod cost_matrix {
    use std::borrow::Cow;

    use super::helpers::*;
    use cg_core::{Coord, MoveTarget};

    use crate::world::{PortalDestination, PortalInfo, StructureKind};
    use crate::{apply_cost_matrix_options, CostMatrix, CostMatrixOpts, IMPASSABLE, SOFT_BLOCK};

    fn at(cm: &CostMatrix, x: u8, y: u8) -> u8 {
        cm.get(Coord { x, y })
    }

    #[test]
    fn untouched_room_is_not_cloned() {
        let w = MockWorld::with_rooms(&["E1S1"]);
        let base = CostMatrix::new();
        let cm = apply_cost_matrix_options(&base, room("E1S1"), &CostMatrixOpts::default(), &w, &[]);
        assert!(matches!(cm, Cow::Borrowed(_)));
    }

    #[test]
    fn agents_then_roads() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.agents.push(pos(5, 5, "E1S1"));
        w.structure(pos(5, 5, "E1S1"), StructureKind::Road, true, false);
        w.structure(pos(6, 5, "E1S1"), StructureKind::Road, true, false);
        let base = CostMatrix::new();
        let opts = CostMatrixOpts { avoid_creeps: true, road_cost: Some(3), ..Default::default() };
        let cm = apply_cost_matrix_options(&base, room("E1S1"), &opts, &w, &[]);
        assert_eq!(at(&cm, 5, 5), IMPASSABLE);
        assert_eq!(at(&cm, 6, 5), 3);
        assert_eq!(base.overrides(), 0);
    }

    #[test]
    fn keeper_danger_zone() {
        let w = MockWorld::with_rooms(&["E5S4"]);
        let base = CostMatrix::new();
        let nodes = [pos(10, 10, "E5S4")];
        let cm = apply_cost_matrix_options(&base, room("E5S4"), &CostMatrixOpts::default(), &w, &nodes);
        assert_eq!(at(&cm, 15, 15), IMPASSABLE);
        assert_eq!(at(&cm, 5, 10), IMPASSABLE);
        assert_eq!(at(&cm, 16, 10), 0);

        let off = CostMatrixOpts { avoid_source_keepers: false, ..Default::default() };
        let cm = apply_cost_matrix_options(&base, room("E5S4"), &off, &w, &nodes);
        assert!(matches!(cm, Cow::Borrowed(_)));
    }

    #[test]
    fn structures_and_ramparts() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.structure(pos(1, 1, "E1S1"), StructureKind::Tower, false, false);
        w.structure(pos(2, 2, "E1S1"), StructureKind::Rampart, false, false);
        w.structure(pos(3, 3, "E1S1"), StructureKind::Rampart, false, true);
        w.structure(pos(2, 2, "E1S1"), StructureKind::Road, false, false);
        let base = CostMatrix::new();
        let cm = apply_cost_matrix_options(&base, room("E1S1"), &CostMatrixOpts::default(), &w, &[]);
        assert_eq!(at(&cm, 1, 1), IMPASSABLE);
        assert_eq!(at(&cm, 2, 2), IMPASSABLE);
        assert_eq!(at(&cm, 3, 3), 0);
    }

    #[test]
    fn avoid_target_gradient() {
        let mut w = MockWorld::with_rooms(&["E1S1"]);
        w.walls.insert(pos(26, 25, "E1S1"));
        let mut base = CostMatrix::new();
        base.set(Coord { x: 24, y: 24 }, IMPASSABLE);
        let targets = [MoveTarget::new(pos(25, 25, "E1S1"), 2)];
        let opts = CostMatrixOpts {
            avoid_targets: &targets,
            avoid_target_gradient: 10.0,
            ..Default::default()
        };
        let cm = apply_cost_matrix_options(&base, room("E1S1"), &opts, &w, &[]);
        assert_eq!(at(&cm, 25, 25), SOFT_BLOCK);
        assert_eq!(at(&cm, 27, 25), 234);
        assert_eq!(at(&cm, 28, 25), 224);
        assert_eq!(at(&cm, 29, 25), 0);
        assert_eq!(at(&cm, 26, 25), 0, "walls are never painted");
        assert_eq!(at(&cm, 24, 24), IMPASSABLE, "higher weights are kept");
    }

    #[test]
    fn flat_soft_block_by_default() {
        let w = MockWorld::with_rooms(&["E1S1"]);
        let base = CostMatrix::new();
        let targets = [MoveTarget::new(pos(10, 10, "E1S1"), 0)];
        let opts = CostMatrixOpts { avoid_targets: &targets, ..Default::default() };
        let cm = apply_cost_matrix_options(&base, room("E1S1"), &opts, &w, &[]);
        assert_eq!(at(&cm, 11, 11), SOFT_BLOCK);
        assert_eq!(at(&cm, 12, 10), 0);
    }

    #[test]
    fn portals_blocked_unless_open() {
        let mut w = MockWorld::with_rooms(&["E0S5"]);
        for x in [10, 11] {
            w.portals.push(PortalInfo {
                pos: pos(x, 10, "E0S5"),
                destination: PortalDestination::Remote,
                ticks_to_decay: None,
            });
        }
        let base = CostMatrix::new();
        let open = [pos(11, 10, "E0S5")];
        let opts = CostMatrixOpts { open_portals: &open, ..Default::default() };
        let cm = apply_cost_matrix_options(&base, room("E0S5"), &opts, &w, &[]);
        assert_eq!(at(&cm, 10, 10), IMPASSABLE);
        assert_eq!(at(&cm, 11, 10), 0);

        let ignore = CostMatrixOpts { block_portals: false, ..Default::default() };
        assert!(matches!(
            apply_cost_matrix_options(&base, room("E0S5"), &ignore, &w, &[]),
            Cow::Borrowed(_)
        ));
    }
}

// ── Region routing ────────────────────────────────────────────────────────────

#[cfg(test)]
mod route {
    use super::helpers::*;
    use cg_core::{Coord, ExitDir, Tick};

    use crate::{find_route, PortalIndex, PortalSet, RouteCallback, RouteEdge, RouteOpts};

    fn corridor() -> MockWorld {
        MockWorld::with_rooms(&["E1S1", "E2S1", "E3S1", "E4S1", "E5S1"])
    }

    #[test]
    fn straight_corridor() {
        let w = corridor();
        let route =
            find_route(&w, &PortalIndex::new(), room("E1S1"), &[room("E4S1")], &RouteOpts::default())
                .unwrap();
        let rooms: Vec<_> = route.steps.iter().map(|s| s.room).collect();
        assert_eq!(rooms, vec![room("E1S1"), room("E2S1"), room("E3S1"), room("E4S1")]);
        assert!(route.steps[..3].iter().all(|s| s.edge == Some(RouteEdge::Exit(ExitDir::Right))));
        assert_eq!(route.steps[3].edge, None);
        assert_eq!(route.portal, None);
        // Flood fill picks up the last corridor room.
        assert_eq!(route.rooms.len(), 5);
    }

    #[test]
    fn origin_is_destination() {
        let w = corridor();
        let route =
            find_route(&w, &PortalIndex::new(), room("E2S1"), &[room("E2S1")], &RouteOpts::default())
                .unwrap();
        assert_eq!(route.len(), 1);
    }

    #[test]
    fn blocked_room_means_no_route() {
        let w = corridor();
        let blocked = room("E3S1");
        let opts = RouteOpts {
            route_callback: Some(RouteCallback::new(move |r, _| (r == blocked).then_some(f64::INFINITY))),
            ..RouteOpts::default()
        };
        assert!(find_route(&w, &PortalIndex::new(), room("E1S1"), &[room("E5S1")], &opts).is_none());
        assert!(find_route(&w, &PortalIndex::new(), room("E1S1"), &[room("W9N9")], &opts).is_none());
    }

    #[test]
    fn cheapest_of_several_destinations() {
        let w = corridor();
        let route = find_route(
            &w,
            &PortalIndex::new(),
            room("E2S1"),
            &[room("E5S1"), room("E1S1")],
            &RouteOpts::default(),
        )
        .unwrap();
        assert_eq!(route.steps.last().map(|s| s.room), Some(room("E1S1")));
    }

    #[test]
    fn room_budget_is_respected() {
        let names: Vec<String> =
            (1..=3).flat_map(|x| (1..=3).map(move |y| format!("E{x}S{y}"))).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let w = MockWorld::with_rooms(&refs);

        let full = find_route(&w, &PortalIndex::new(), room("E1S1"), &[room("E3S3")], &RouteOpts::default())
            .unwrap();
        assert_eq!(full.steps.len(), 5);
        assert_eq!(full.rooms.len(), 9);

        let tight = RouteOpts { max_rooms: 5, ..RouteOpts::default() };
        let route = find_route(&w, &PortalIndex::new(), room("E1S1"), &[room("E3S3")], &tight).unwrap();
        let raw: Vec<_> = route.steps.iter().map(|s| s.room).collect();
        assert_eq!(route.rooms, raw);
    }

    #[test]
    fn one_sided_border_adds_parallel_detour() {
        let mut w = MockWorld::with_rooms(&["E1S1", "E2S1", "E3S1", "E1S2", "E2S2", "E3S2"]);
        for y in 25..49 {
            w.walls.insert(pos(49, y, "E1S1"));
        }
        let opts = RouteOpts { max_rooms: 5, ..RouteOpts::default() };
        let route = find_route(&w, &PortalIndex::new(), room("E1S1"), &[room("E3S1")], &opts).unwrap();
        assert_eq!(
            route.rooms,
            vec![room("E1S1"), room("E2S1"), room("E3S1"), room("E1S2"), room("E2S2")]
        );
    }

    #[test]
    fn portal_hop_joins_disconnected_clusters() {
        let w = MockWorld::with_rooms(&["E1S1", "E2S1", "E8S1", "E9S1"]);
        let mut portals = PortalIndex::new();
        let mut set = PortalSet::new(room("E2S1"), room("E8S1"), Some(Tick(1000)));
        set.link(Coord { x: 25, y: 25 }, Coord { x: 30, y: 30 });
        portals.insert(set);

        let avoid = RouteOpts::default();
        assert!(find_route(&w, &portals, room("E1S1"), &[room("E9S1")], &avoid).is_none());

        let allow = RouteOpts { avoid_portals: false, ..RouteOpts::default() };
        let route = find_route(&w, &portals, room("E1S1"), &[room("E9S1")], &allow).unwrap();
        let rooms: Vec<_> = route.steps.iter().map(|s| s.room).collect();
        assert_eq!(rooms, vec![room("E1S1"), room("E2S1"), room("E8S1"), room("E9S1")]);
        assert_eq!(route.steps[1].edge, Some(RouteEdge::Portal));
        let hop = route.portal.unwrap();
        assert_eq!((hop.from, hop.to), (room("E2S1"), room("E8S1")));
    }
}

// ── Portals and intel ─────────────────────────────────────────────────────────

#[cfg(test)]
mod portals {
    use super::helpers::*;
    use cg_cache::MemoryCache;
    use cg_core::{Coord, Tick};

    use crate::world::{PortalDestination, PortalInfo};
    use crate::{describe_exits_with_portals, source_keeper_nodes, update_intel, PortalIndex, PortalSet};

    fn portal(at: cg_core::Position, to: cg_core::Position, decay: Option<u64>) -> PortalInfo {
        PortalInfo { pos: at, destination: PortalDestination::Local(to), ticks_to_decay: decay }
    }

    #[test]
    fn set_roundtrip() {
        let mut set = PortalSet::new(room("E0S5"), room("W20N5"), Some(Tick(123_456)));
        set.link(Coord { x: 1, y: 2 }, Coord { x: 48, y: 47 });
        set.link(Coord { x: 2, y: 2 }, Coord { x: 47, y: 47 });
        let raw = set.serialize().unwrap();
        assert_eq!(PortalSet::deserialize(&raw).unwrap(), set);

        let permanent = PortalSet::new(room("E0S5"), room("W20N5"), None);
        assert_eq!(PortalSet::deserialize(&permanent.serialize().unwrap()).unwrap(), permanent);
        assert!(PortalSet::deserialize("x").is_err());
    }

    #[test]
    fn destination_either_way() {
        let mut set = PortalSet::new(room("E0S5"), room("E10S5"), None);
        set.link(Coord { x: 1, y: 2 }, Coord { x: 3, y: 4 });
        assert_eq!(set.destination_of(pos(1, 2, "E0S5")), Some(pos(3, 4, "E10S5")));
        assert_eq!(set.destination_of(pos(3, 4, "E10S5")), Some(pos(1, 2, "E0S5")));
        assert_eq!(set.destination_of(pos(9, 9, "E0S5")), None);
        assert_eq!(set.entrances_in(room("E10S5")), vec![pos(3, 4, "E10S5")]);
    }

    #[test]
    fn scan_discovers_and_forgets() {
        let mut w = MockWorld::with_rooms(&["E0S5", "E1S5", "E10S5"]);
        w.portals.push(portal(pos(20, 20, "E0S5"), pos(25, 25, "E10S5"), None));
        w.portals.push(portal(pos(21, 20, "E0S5"), pos(26, 25, "E10S5"), None));
        w.portals.push(PortalInfo {
            pos: pos(22, 20, "E0S5"),
            destination: PortalDestination::Remote,
            ticks_to_decay: None,
        });

        let mut index = PortalIndex::new();
        assert_eq!(index.scan_room(&w, room("E1S5")), 0);
        assert!(index.is_empty());

        index.scan_room(&w, room("E0S5"));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(room("E10S5"), room("E0S5")).map(|s| s.links().len()), Some(2));
        assert_eq!(index.linked_rooms(room("E10S5")), vec![room("E0S5")]);
        assert_eq!(
            describe_exits_with_portals(&w, &index, room("E0S5")),
            vec![room("E1S5"), room("E10S5")]
        );
        assert_eq!(index.nearest(room("E9S5"), 1), vec![(room("E10S5"), room("E0S5"))]);

        w.portals.clear();
        assert_eq!(index.scan_room(&w, room("E0S5")), 1);
        assert!(index.is_empty());
    }

    #[test]
    fn decaying_portals_expire() {
        let mut w = MockWorld::with_rooms(&["E0S5", "E10S5"]);
        w.time = Tick(100);
        w.portals.push(portal(pos(20, 20, "E0S5"), pos(25, 25, "E10S5"), Some(50)));
        let mut index = PortalIndex::new();
        index.scan_room(&w, room("E0S5"));
        assert_eq!(index.get(room("E0S5"), room("E10S5")).and_then(|s| s.expires), Some(Tick(150)));
        assert_eq!(index.prune_expired(Tick(150)), 0);
        assert_eq!(index.prune_expired(Tick(151)), 1);
    }

    #[test]
    fn store_roundtrip() {
        let mut index = PortalIndex::new();
        let mut set = PortalSet::new(room("E0S5"), room("E10S5"), None);
        set.link(Coord { x: 1, y: 1 }, Coord { x: 2, y: 2 });
        index.insert(set.clone());
        let stored = index.to_store();
        let mut restored = PortalIndex::from_store(&stored);
        assert_eq!(restored.get(room("E0S5"), room("E10S5")), Some(&set));

        let with_garbage = vec![stored[0].clone(), "garbage".to_string()];
        restored = PortalIndex::from_store(&with_garbage);
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn intel_records_keepers_and_flushes_portals() {
        let mut w = MockWorld::with_rooms(&["E5S4", "E5S5", "E0S5", "E10S5"]);
        w.nodes.push(pos(10, 10, "E5S4"));
        w.nodes.push(pos(40, 40, "E5S5"));
        w.portals.push(portal(pos(20, 20, "E0S5"), pos(25, 25, "E10S5"), None));
        w.portals.push(portal(pos(25, 25, "E10S5"), pos(20, 20, "E0S5"), None));

        let mut memory = MemoryCache::default();
        let mut index = PortalIndex::new();
        let report = update_intel(&w, &mut memory, &mut index);
        assert_eq!(report.rooms_scanned, 4);
        assert_eq!(report.keeper_rooms_added, 1);
        assert_eq!(report.portal_sets, 1);
        assert_eq!(source_keeper_nodes(&mut memory, room("E5S4")), vec![pos(10, 10, "E5S4")]);
        assert!(source_keeper_nodes(&mut memory, room("E5S5")).is_empty());
        assert_eq!(memory.store().portals.len(), 1);

        // Second pass records nothing new.
        assert_eq!(update_intel(&w, &mut memory, &mut index).keeper_rooms_added, 0);
    }
}
