//! `GridWorld`: an in-memory host world.
//!
//! Rooms are 50×50 terrain grids laid side by side on one global grid, so
//! stepping off the east edge of `E1S1` lands on the west edge of `E2S1`.
//! Agents are either ours (controllable, listed by [`AgentHost`]) or
//! foreign (static obstacles that only show up in `agents_in`).
//!
//! Commands issued through [`AgentHost`] are queued and applied together by
//! [`GridWorld::commit`](crate::commit).

use std::collections::{BTreeMap, BTreeSet};

use cg_core::{
    AgentId, BodyInfo, Coord, Direction, ExitDir, MoveStatus, Position, RoomName, Tick, ROOM_SIZE,
};
use cg_spatial::{
    ConstructionSiteInfo, PortalDestination, PortalInfo, StructureInfo, StructureKind, Terrain,
    WorldView,
};
use cg_traffic::AgentHost;

use crate::{SimError, SimResult};

const TILES: usize = ROOM_SIZE as usize * ROOM_SIZE as usize;

// ── Rooms ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct RoomTerrain(Box<[Terrain]>);

impl Default for RoomTerrain {
    fn default() -> Self {
        Self(vec![Terrain::Plain; TILES].into_boxed_slice())
    }
}

impl RoomTerrain {
    #[inline]
    pub fn get(&self, c: Coord) -> Terrain {
        self.0[c.index()]
    }

    #[inline]
    pub fn set(&mut self, c: Coord, t: Terrain) {
        self.0[c.index()] = t;
    }
}

#[derive(Clone, Debug, Default)]
struct Room {
    terrain:    RoomTerrain,
    structures: Vec<StructureInfo>,
    sites:      Vec<ConstructionSiteInfo>,
    portals:    Vec<PortalInfo>,
    nodes:      Vec<Position>,
}

// ── Agents ────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimAgent {
    pub pos:     Position,
    pub fatigue: u32,
    pub body:    BodyInfo,
    /// Controlled by us; foreign agents never move.
    pub my:      bool,
}

// ── GridWorld ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct GridWorld {
    time:              Tick,
    rooms:             BTreeMap<RoomName, Room>,
    hidden:            BTreeSet<RoomName>,
    pub(crate) agents: BTreeMap<AgentId, SimAgent>,
    /// Queued single steps, replaced by later orders for the same agent.
    pub(crate) orders: BTreeMap<AgentId, Direction>,
    /// Pulled agent → puller.
    pub(crate) pulls:  BTreeMap<AgentId, AgentId>,
}

impl GridWorld {
    pub fn new(time: Tick) -> Self {
        Self { time, ..Self::default() }
    }

    /// Advance the clock by one tick.
    pub fn advance(&mut self) {
        self.time = self.time.next();
    }

    pub fn set_time(&mut self, time: Tick) {
        self.time = time;
    }

    // ── Building ──────────────────────────────────────────────────────────

    /// Add an all-plain room; existing rooms are left untouched.
    pub fn add_room(&mut self, room: RoomName) {
        self.rooms.entry(room).or_default();
    }

    pub fn rooms(&self) -> impl Iterator<Item = RoomName> + '_ {
        self.rooms.keys().copied()
    }

    /// The room's terrain, for pathfinder snapshots.
    pub fn room_terrain(&self, room: RoomName) -> Option<&RoomTerrain> {
        self.rooms.get(&room).map(|r| &r.terrain)
    }

    pub fn set_terrain(&mut self, pos: Position, terrain: Terrain) {
        self.rooms.entry(pos.room()).or_default().terrain.set(pos.coord(), terrain);
    }

    /// Wall off every tile of `room` for which `is_wall` holds.
    pub fn wall_where(&mut self, room: RoomName, is_wall: impl Fn(u8, u8) -> bool) -> SimResult<()> {
        for y in 0..ROOM_SIZE {
            for x in 0..ROOM_SIZE {
                if is_wall(x, y) {
                    self.set_terrain(Position::new(room, x, y)?, Terrain::Wall);
                }
            }
        }
        Ok(())
    }

    pub fn add_structure(&mut self, pos: Position, kind: StructureKind, my: bool) {
        let public = false;
        self.rooms.entry(pos.room()).or_default().structures.push(StructureInfo { pos, kind, my, public });
    }

    pub fn add_construction_site(&mut self, pos: Position, kind: StructureKind, my: bool) {
        self.rooms.entry(pos.room()).or_default().sites.push(ConstructionSiteInfo { pos, kind, my });
    }

    /// A portal on `pos` leading to `destination`, decaying after
    /// `ticks_to_decay` when given.
    pub fn add_portal(&mut self, pos: Position, destination: PortalDestination, ticks_to_decay: Option<u64>) {
        self.rooms.entry(pos.room()).or_default().portals.push(PortalInfo { pos, destination, ticks_to_decay });
    }

    pub fn add_resource_node(&mut self, pos: Position) {
        self.rooms.entry(pos.room()).or_default().nodes.push(pos);
    }

    pub fn set_visible(&mut self, room: RoomName, visible: bool) {
        if visible {
            self.hidden.remove(&room);
        } else {
            self.hidden.insert(room);
        }
    }

    // ── Agents ────────────────────────────────────────────────────────────

    /// Place an agent of ours on a free, walkable tile.
    pub fn spawn_agent(&mut self, agent: AgentId, pos: Position, body: BodyInfo) -> SimResult<()> {
        self.place(agent, SimAgent { pos, fatigue: 0, body, my: true })
    }

    /// Place a foreign agent: an obstacle that never moves.
    pub fn spawn_foreign(&mut self, agent: AgentId, pos: Position) -> SimResult<()> {
        self.place(agent, SimAgent { pos, fatigue: 0, body: BodyInfo::default(), my: false })
    }

    fn place(&mut self, agent: AgentId, state: SimAgent) -> SimResult<()> {
        let pos = state.pos;
        if self.agents.contains_key(&agent) {
            return Err(SimError::Placement { pos, reason: "agent id already in use" });
        }
        if !self.is_passable(pos) {
            return Err(SimError::Placement { pos, reason: "tile is not walkable" });
        }
        if self.occupant(pos).is_some() {
            return Err(SimError::Placement { pos, reason: "tile is occupied" });
        }
        self.agents.insert(agent, state);
        Ok(())
    }

    pub fn remove_agent(&mut self, agent: AgentId) -> Option<SimAgent> {
        self.orders.remove(&agent);
        self.pulls.remove(&agent);
        self.agents.remove(&agent)
    }

    pub fn agent(&self, agent: AgentId) -> Option<&SimAgent> {
        self.agents.get(&agent)
    }

    pub fn set_fatigue(&mut self, agent: AgentId, fatigue: u32) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.fatigue = fatigue;
        }
    }

    /// Every agent of ours, in id order.
    pub fn my_agents(&self) -> Vec<AgentId> {
        self.agents.iter().filter(|(_, a)| a.my).map(|(&id, _)| id).collect()
    }

    pub fn occupant(&self, pos: Position) -> Option<AgentId> {
        self.agents.iter().find(|(_, a)| a.pos == pos).map(|(&id, _)| id)
    }

    /// The step queued for `agent` this tick.
    pub fn queued_move(&self, agent: AgentId) -> Option<Direction> {
        self.orders.get(&agent).copied()
    }

    // ── Tiles ─────────────────────────────────────────────────────────────

    /// Terrain and structures allow standing on `pos`; agents not considered.
    pub fn is_passable(&self, pos: Position) -> bool {
        let Some(room) = self.rooms.get(&pos.room()) else {
            return false;
        };
        room.terrain.get(pos.coord()) != Terrain::Wall
            && !room.structures.iter().any(|s| s.pos == pos && s.blocks())
    }

    pub fn has_road(&self, pos: Position) -> bool {
        self.rooms
            .get(&pos.room())
            .is_some_and(|r| r.structures.iter().any(|s| s.pos == pos && s.kind == StructureKind::Road))
    }

    /// Where a portal on `pos` leads within this world.
    pub fn portal_exit(&self, pos: Position) -> Option<Position> {
        self.rooms.get(&pos.room())?.portals.iter().find(|p| p.pos == pos).and_then(|p| match p.destination {
            PortalDestination::Local(dest) => Some(dest),
            PortalDestination::Remote => None,
        })
    }
}

impl WorldView for GridWorld {
    fn time(&self) -> Tick {
        self.time
    }

    fn terrain_at(&self, pos: Position) -> Option<Terrain> {
        self.rooms.get(&pos.room()).map(|r| r.terrain.get(pos.coord()))
    }

    fn has_room(&self, room: RoomName) -> bool {
        self.rooms.contains_key(&room)
    }

    fn exits(&self, room: RoomName) -> [Option<RoomName>; 4] {
        if !self.has_room(room) {
            return [None; 4];
        }
        ExitDir::ALL.map(|d| room.neighbor(d).filter(|n| self.rooms.contains_key(n)))
    }

    fn visible_rooms(&self) -> Vec<RoomName> {
        self.rooms.keys().copied().filter(|r| !self.hidden.contains(r)).collect()
    }

    fn is_visible(&self, room: RoomName) -> bool {
        self.rooms.contains_key(&room) && !self.hidden.contains(&room)
    }

    fn agents_in(&self, room: RoomName) -> Vec<Position> {
        if !self.is_visible(room) {
            return Vec::new();
        }
        self.agents.values().map(|a| a.pos).filter(|p| p.room() == room).collect()
    }

    fn structures_in(&self, room: RoomName) -> Vec<StructureInfo> {
        self.visible(room).map(|r| r.structures.clone()).unwrap_or_default()
    }

    fn construction_sites_in(&self, room: RoomName) -> Vec<ConstructionSiteInfo> {
        self.visible(room).map(|r| r.sites.clone()).unwrap_or_default()
    }

    fn portals_in(&self, room: RoomName) -> Vec<PortalInfo> {
        self.visible(room).map(|r| r.portals.clone()).unwrap_or_default()
    }

    fn resource_nodes_in(&self, room: RoomName) -> Vec<Position> {
        self.visible(room).map(|r| r.nodes.clone()).unwrap_or_default()
    }
}

impl GridWorld {
    fn visible(&self, room: RoomName) -> Option<&Room> {
        self.rooms.get(&room).filter(|_| !self.hidden.contains(&room))
    }
}

impl AgentHost for GridWorld {
    fn agent_pos(&self, agent: AgentId) -> Option<Position> {
        self.agents.get(&agent).filter(|a| a.my).map(|a| a.pos)
    }

    fn agent_fatigue(&self, agent: AgentId) -> u32 {
        self.agents.get(&agent).map_or(0, |a| a.fatigue)
    }

    fn agent_body(&self, agent: AgentId) -> Option<BodyInfo> {
        self.agents.get(&agent).filter(|a| a.my).map(|a| a.body)
    }

    fn my_agents_in(&self, room: RoomName) -> Vec<AgentId> {
        self.agents.iter().filter(|(_, a)| a.my && a.pos.room() == room).map(|(&id, _)| id).collect()
    }

    /// Pulled agents skip the fatigue and body checks.
    fn move_agent(&mut self, agent: AgentId, dir: Direction) -> MoveStatus {
        let Some(a) = self.agents.get(&agent).filter(|a| a.my) else {
            return MoveStatus::InvalidArgs;
        };
        if !self.pulls.contains_key(&agent) {
            if a.body.move_parts == 0 {
                return MoveStatus::NoBodypart;
            }
            if a.fatigue > 0 {
                return MoveStatus::Tired;
            }
        }
        self.orders.insert(agent, dir);
        MoveStatus::Ok
    }

    fn pull_agent(&mut self, puller: AgentId, pulled: AgentId) -> MoveStatus {
        let (Some(a), Some(b)) = (self.agents.get(&puller), self.agents.get(&pulled)) else {
            return MoveStatus::InvalidArgs;
        };
        if !a.my || !b.my || puller == pulled || !a.pos.is_near_to(b.pos) {
            return MoveStatus::InvalidArgs;
        }
        self.pulls.insert(pulled, puller);
        MoveStatus::Ok
    }
}
