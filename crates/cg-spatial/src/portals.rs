//! Transient portals between rooms.
//!
//! Portals linking the same pair of rooms are grouped into one
//! [`PortalSet`] with a shared expiration.  Sets are held in a
//! [`PortalIndex`], which answers "what links to this room" and, through an
//! R-tree over room coordinates, "which portal is nearest" for the routing
//! heuristic.  The index is rebuilt from the durable store after a restart
//! and flushed back every tick.
//!
//! # Stored format
//!
//! ```text
//! room1    2 chars   packed room name
//! room2    2 chars   packed room name
//! expires  2 chars   30-bit tick, 0 = permanent
//! links    n chars   length-prefixed coordinate list: a1 b1 a2 b2 …
//! ```

use std::collections::{BTreeMap, BTreeSet};

use cg_cache::pack::{pack_coords, unpack_coords};
use cg_core::{Codec, Coord, Position, RoomName, Tick};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::{debug, warn};

use crate::world::{PortalDestination, WorldView};
use crate::{SpatialError, SpatialResult};

const EXPIRES_DEPTH: u32 = 30;
const HEADER_CHARS: usize = 6;

// ── PortalSet ─────────────────────────────────────────────────────────────────

/// Every portal between two specific rooms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalSet {
    pub room1:   RoomName,
    pub room2:   RoomName,
    pub expires: Option<Tick>,
    /// `(room1 tile, room2 tile)`; portals are assumed reciprocal.
    links:       Vec<(Coord, Coord)>,
}

impl PortalSet {
    pub fn new(room1: RoomName, room2: RoomName, expires: Option<Tick>) -> Self {
        Self { room1, room2, expires, links: Vec::new() }
    }

    pub fn link(&mut self, room1_tile: Coord, room2_tile: Coord) {
        if !self.links.contains(&(room1_tile, room2_tile)) {
            self.links.push((room1_tile, room2_tile));
        }
    }

    pub fn links(&self) -> &[(Coord, Coord)] {
        &self.links
    }

    /// The room on the far side from `room`.
    pub fn other_room(&self, room: RoomName) -> Option<RoomName> {
        if room == self.room1 {
            Some(self.room2)
        } else if room == self.room2 {
            Some(self.room1)
        } else {
            None
        }
    }

    /// Portal tiles on `room`'s side.
    pub fn entrances_in(&self, room: RoomName) -> Vec<Position> {
        if room == self.room1 {
            self.links.iter().map(|&(a, _)| Position::from_coord(room, a)).collect()
        } else if room == self.room2 {
            self.links.iter().map(|&(_, b)| Position::from_coord(room, b)).collect()
        } else {
            Vec::new()
        }
    }

    /// Where stepping onto `entrance` lands.
    pub fn destination_of(&self, entrance: Position) -> Option<Position> {
        let c = entrance.coord();
        if entrance.room() == self.room1 {
            let &(_, b) = self.links.iter().find(|(a, _)| *a == c)?;
            Some(Position::from_coord(self.room2, b))
        } else if entrance.room() == self.room2 {
            let &(a, _) = self.links.iter().find(|(_, b)| *b == c)?;
            Some(Position::from_coord(self.room1, a))
        } else {
            None
        }
    }

    pub fn is_expired(&self, now: Tick) -> bool {
        self.expires.is_some_and(|t| t < now)
    }

    pub fn serialize(&self) -> SpatialResult<String> {
        let rooms = room_codec()?;
        let mut out = String::new();
        out.push_str(&rooms.encode(&room_fields(self.room1))?);
        out.push_str(&rooms.encode(&room_fields(self.room2))?);
        out.push_str(&Codec::scalar(EXPIRES_DEPTH)?.encode_one(self.expires.map_or(0, |t| t.0))?);
        let flat: Vec<Coord> = self.links.iter().flat_map(|&(a, b)| [a, b]).collect();
        out.push_str(&pack_coords(&flat)?);
        Ok(out)
    }

    pub fn deserialize(raw: &str) -> SpatialResult<Self> {
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() <= HEADER_CHARS {
            return Err(SpatialError::CorruptPortalSet(format!("{} characters", chars.len())));
        }
        let part = |r: std::ops::Range<usize>| chars[r].iter().collect::<String>();
        let rooms = room_codec()?;
        let room1 = room_from_fields(&rooms.decode(&part(0..2))?)?;
        let room2 = room_from_fields(&rooms.decode(&part(2..4))?)?;
        let expires = Codec::scalar(EXPIRES_DEPTH)?.decode_one(&part(4..6))?;
        let coords = unpack_coords(&part(HEADER_CHARS..chars.len()))?;
        if coords.len() % 2 != 0 {
            return Err(SpatialError::CorruptPortalSet("unpaired portal coordinate".into()));
        }
        let mut set = PortalSet::new(room1, room2, (expires != 0).then_some(Tick(expires)));
        for pair in coords.chunks(2) {
            set.link(pair[0], pair[1]);
        }
        Ok(set)
    }
}

fn room_codec() -> SpatialResult<Codec> {
    Ok(Codec::per_element(&[8, 8])?)
}

fn room_fields(room: RoomName) -> [u64; 2] {
    let p = room.packed();
    [u64::from(p >> 8), u64::from(p & 0xFF)]
}

fn room_from_fields(fields: &[u64]) -> SpatialResult<RoomName> {
    match *fields {
        [hi, lo] => Ok(RoomName::from_packed(((hi as u16) << 8) | lo as u16)),
        _ => Err(SpatialError::CorruptPortalSet("room field count".into())),
    }
}

// ── R-tree endpoint ───────────────────────────────────────────────────────────

/// One side of a portal set, located at its room's grid coordinates.
#[derive(Clone, Debug)]
struct PortalEndpoint {
    point: [i32; 2],
    room:  RoomName,
    other: RoomName,
}

impl RTreeObject for PortalEndpoint {
    type Envelope = AABB<[i32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for PortalEndpoint {
    fn distance_2(&self, point: &[i32; 2]) -> i32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── PortalIndex ───────────────────────────────────────────────────────────────

/// All known portal sets, addressable from either end.
#[derive(Default)]
pub struct PortalIndex {
    sets: BTreeMap<(RoomName, RoomName), PortalSet>,
    tree: RTree<PortalEndpoint>,
}

impl std::fmt::Debug for PortalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalIndex").field("sets", &self.sets.len()).finish()
    }
}

fn pair_key(a: RoomName, b: RoomName) -> (RoomName, RoomName) {
    if a <= b { (a, b) } else { (b, a) }
}

impl PortalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the stored list.  Entries that fail to decode are
    /// dropped; the next scan of their rooms rediscovers them.
    pub fn from_store(stored: &[String]) -> Self {
        let mut index = Self::new();
        for raw in stored {
            match PortalSet::deserialize(raw) {
                Ok(set) => {
                    index.sets.insert(pair_key(set.room1, set.room2), set);
                }
                Err(error) => warn!(%error, "dropping undecodable portal set"),
            }
        }
        index.rebuild_tree();
        index
    }

    pub fn to_store(&self) -> Vec<String> {
        self.sets
            .values()
            .filter_map(|set| match set.serialize() {
                Ok(s) => Some(s),
                Err(error) => {
                    warn!(%error, room1 = %set.room1, room2 = %set.room2, "portal set not storable");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn insert(&mut self, set: PortalSet) {
        self.sets.insert(pair_key(set.room1, set.room2), set);
        self.rebuild_tree();
    }

    pub fn remove(&mut self, a: RoomName, b: RoomName) -> Option<PortalSet> {
        let removed = self.sets.remove(&pair_key(a, b));
        if removed.is_some() {
            self.rebuild_tree();
        }
        removed
    }

    pub fn get(&self, a: RoomName, b: RoomName) -> Option<&PortalSet> {
        self.sets.get(&pair_key(a, b))
    }

    /// Sets with one end in `room`.
    pub fn sets_touching(&self, room: RoomName) -> impl Iterator<Item = &PortalSet> + '_ {
        self.sets.values().filter(move |s| s.room1 == room || s.room2 == room)
    }

    pub fn linked_rooms(&self, room: RoomName) -> Vec<RoomName> {
        self.sets_touching(room).filter_map(|s| s.other_room(room)).collect()
    }

    /// Up to `k` portal endpoints nearest to `room` as `(near side, far side)`.
    pub fn nearest(&self, room: RoomName, k: usize) -> Vec<(RoomName, RoomName)> {
        self.tree
            .nearest_neighbor_iter(&[room.x(), room.y()])
            .take(k)
            .map(|e| (e.room, e.other))
            .collect()
    }

    /// Refresh the sets seen from a visible room.  Only highway and centre
    /// rooms carry portals, so other rooms are skipped.
    ///
    /// Returns the number of sets dropped because they vanished or expired.
    pub fn scan_room<W: WorldView + ?Sized>(&mut self, world: &W, room: RoomName) -> usize {
        if !room.is_highway() && !room.is_center() {
            return 0;
        }
        let now = world.time();

        let mut observed: BTreeMap<RoomName, PortalSet> = BTreeMap::new();
        for portal in world.portals_in(room) {
            let PortalDestination::Local(dest) = portal.destination else {
                continue;
            };
            if dest.room() == room {
                continue;
            }
            let set = observed
                .entry(dest.room())
                .or_insert_with(|| PortalSet::new(room, dest.room(), None));
            set.link(portal.pos.coord(), dest.coord());
            set.expires = portal.ticks_to_decay.map(|t| now + t);
        }

        let seen: BTreeSet<RoomName> = observed.keys().copied().collect();
        for (to, set) in observed {
            if self.get(room, to).is_none() {
                debug!(%room, %to, portals = set.links.len(), "portal set discovered");
            }
            self.sets.insert(pair_key(room, to), set);
        }

        let stale: Vec<RoomName> = self
            .sets_touching(room)
            .filter(|s| s.is_expired(now) || s.other_room(room).is_some_and(|o| !seen.contains(&o)))
            .filter_map(|s| s.other_room(room))
            .collect();
        for to in &stale {
            debug!(%room, %to, "portal set gone");
            self.sets.remove(&pair_key(room, *to));
        }

        self.rebuild_tree();
        stale.len()
    }

    /// Drop every set whose expiration has passed, visible or not.
    pub fn prune_expired(&mut self, now: Tick) -> usize {
        let before = self.sets.len();
        self.sets.retain(|_, s| !s.is_expired(now));
        let dropped = before - self.sets.len();
        if dropped > 0 {
            self.rebuild_tree();
        }
        dropped
    }

    fn rebuild_tree(&mut self) {
        let endpoints = self
            .sets
            .values()
            .flat_map(|s| {
                [
                    PortalEndpoint { point: [s.room1.x(), s.room1.y()], room: s.room1, other: s.room2 },
                    PortalEndpoint { point: [s.room2.x(), s.room2.y()], room: s.room2, other: s.room1 },
                ]
            })
            .collect();
        self.tree = RTree::bulk_load(endpoints);
    }
}

/// Ordinary exits of `room` plus every room a portal set links it to.
pub fn describe_exits_with_portals<W: WorldView + ?Sized>(
    world: &W,
    portals: &PortalIndex,
    room: RoomName,
) -> Vec<RoomName> {
    let mut out: Vec<RoomName> = world.exits(room).into_iter().flatten().collect();
    for linked in portals.linked_rooms(room) {
        if !out.contains(&linked) {
            out.push(linked);
        }
    }
    out
}
