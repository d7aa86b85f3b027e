//! What the library needs to know about the host world.
//!
//! The host owns terrain, structures and agents; the movement core only
//! reads them through [`WorldView`].  Queries about rooms the host cannot
//! see return empty collections rather than errors.

use cg_core::{Position, RoomName, Tick};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Terrain {
    Plain,
    Swamp,
    Wall,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum StructureKind {
    Road,
    Container,
    Rampart,
    Portal,
    ConstructedWall,
    Spawn,
    Extension,
    Tower,
    Storage,
    Link,
    Lab,
    Terminal,
    Controller,
}

impl StructureKind {
    /// Structures nothing can stand on.
    pub fn is_obstacle(self) -> bool {
        !matches!(
            self,
            StructureKind::Road | StructureKind::Container | StructureKind::Rampart | StructureKind::Portal
        )
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct StructureInfo {
    pub pos:    Position,
    pub kind:   StructureKind,
    pub my:     bool,
    /// Ramparts only: passable for everyone.
    pub public: bool,
}

impl StructureInfo {
    /// Blocks movement for us: an obstacle, or somebody else's closed rampart.
    pub fn blocks(&self) -> bool {
        self.kind.is_obstacle() || (self.kind == StructureKind::Rampart && !self.my && !self.public)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ConstructionSiteInfo {
    pub pos:  Position,
    pub kind: StructureKind,
    pub my:   bool,
}

impl ConstructionSiteInfo {
    /// Only our own sites for obstacle structures block: stepping on them
    /// would stomp our own construction.
    pub fn blocks(&self) -> bool {
        self.my && self.kind.is_obstacle()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PortalDestination {
    /// A tile in this world.
    Local(Position),
    /// Another world entirely; never used for routing.
    Remote,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PortalInfo {
    pub pos:            Position,
    pub destination:    PortalDestination,
    /// `None` for a permanent portal.
    pub ticks_to_decay: Option<u64>,
}

/// Read-only view of the host world.
pub trait WorldView {
    fn time(&self) -> Tick;

    /// Terrain of a tile, or `None` when the room does not exist.
    fn terrain_at(&self, pos: Position) -> Option<Terrain>;

    fn has_room(&self, room: RoomName) -> bool;

    /// Neighbouring rooms indexed by [`ExitDir::index`](cg_core::ExitDir::index).
    fn exits(&self, room: RoomName) -> [Option<RoomName>; 4];

    /// Rooms whose contents are currently observable.
    fn visible_rooms(&self) -> Vec<RoomName>;

    fn is_visible(&self, room: RoomName) -> bool {
        self.visible_rooms().contains(&room)
    }

    /// Positions of every agent in `room`, ours or not.
    fn agents_in(&self, room: RoomName) -> Vec<Position>;

    fn structures_in(&self, room: RoomName) -> Vec<StructureInfo>;

    fn construction_sites_in(&self, _room: RoomName) -> Vec<ConstructionSiteInfo> {
        Vec::new()
    }

    fn portals_in(&self, _room: RoomName) -> Vec<PortalInfo> {
        Vec::new()
    }

    /// Harvestable nodes (sources, minerals) guarded in keeper rooms.
    fn resource_nodes_in(&self, _room: RoomName) -> Vec<Position> {
        Vec::new()
    }
}
