//! CSV world loader.
//!
//! # CSV format
//!
//! One row per tile feature.  Rooms are created on first mention, all
//! plain; a `plain` row only declares its room.
//!
//! ```csv
//! room,x,y,kind,dest_room,dest_x,dest_y,decay
//! E1S1,0,0,plain,,,,
//! E1S1,10,10,wall,,,,
//! E1S1,11,10,swamp,,,,
//! E1S1,12,10,road,,,,
//! E1S1,20,20,site:spawn,,,,
//! E0S1,25,25,portal,E5S5,25,25,
//! E5S5,25,25,portal,E0S1,25,25,5000
//! E4S4,30,30,source,,,,
//! ```
//!
//! **`kind`** field:
//!
//! | Value               | Effect                                          |
//! |---------------------|-------------------------------------------------|
//! | `plain`             | declare the room                                |
//! | `wall`, `swamp`     | terrain                                         |
//! | `road`, `spawn`, …  | our structure of that kind                      |
//! | `site:<kind>`       | our construction site for a structure kind      |
//! | `portal`            | portal to `dest_room,dest_x,dest_y`             |
//! | `source`, `mineral` | resource node                                   |
//!
//! A portal's `decay` is its ticks to decay; empty means permanent.
//!
//! The trailing columns may be left off rows that do not need them.

use std::io::Read;
use std::path::Path;

use cg_core::{Position, RoomName, Tick};
use cg_spatial::{PortalDestination, StructureKind, Terrain};
use serde::Deserialize;
use tracing::debug;

use crate::world::GridWorld;
use crate::{SimError, SimResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WorldRecord {
    room:      String,
    x:         u8,
    y:         u8,
    kind:      String,
    #[serde(default)]
    dest_room: Option<String>,
    #[serde(default)]
    dest_x:    Option<u8>,
    #[serde(default)]
    dest_y:    Option<u8>,
    #[serde(default)]
    decay:     Option<u64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a world from a CSV file, with the clock at `time`.
pub fn load_world_csv(path: &Path, time: Tick) -> SimResult<GridWorld> {
    let file = std::fs::File::open(path)?;
    load_world_reader(file, time)
}

/// Like [`load_world_csv`] but accepts any `Read` source.
pub fn load_world_reader<R: Read>(reader: R, time: Tick) -> SimResult<GridWorld> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut world = GridWorld::new(time);
    let mut rows = 0usize;

    // Line 1 is the header.
    for (i, result) in csv_reader.deserialize::<WorldRecord>().enumerate() {
        let row = result?;
        let line = i as u64 + 2;
        apply_row(&mut world, row).map_err(|reason| SimError::Row { line, reason })?;
        rows += 1;
    }

    debug!(rows, rooms = world.rooms().count(), "world loaded");
    Ok(world)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn apply_row(world: &mut GridWorld, row: WorldRecord) -> Result<(), String> {
    let pos = position(&row.room, row.x, row.y)?;
    world.add_room(pos.room());

    let kind = row.kind.to_ascii_lowercase();
    match kind.as_str() {
        "plain" => {}
        "wall" => world.set_terrain(pos, Terrain::Wall),
        "swamp" => world.set_terrain(pos, Terrain::Swamp),
        "source" | "mineral" => world.add_resource_node(pos),
        "portal" => {
            let (Some(room), Some(x), Some(y)) = (row.dest_room.as_deref(), row.dest_x, row.dest_y) else {
                return Err("portal rows need dest_room, dest_x and dest_y".to_string());
            };
            let dest = position(room, x, y)?;
            world.add_portal(pos, PortalDestination::Local(dest), row.decay);
        }
        other => match other.strip_prefix("site:") {
            Some(site) => world.add_construction_site(pos, structure_kind(site)?, true),
            None => world.add_structure(pos, structure_kind(other)?, true),
        },
    }
    Ok(())
}

fn position(room: &str, x: u8, y: u8) -> Result<Position, String> {
    let room: RoomName = room.parse().map_err(|e| format!("{e}"))?;
    Position::new(room, x, y).map_err(|e| format!("{e}"))
}

fn structure_kind(s: &str) -> Result<StructureKind, String> {
    Ok(match s {
        "road" => StructureKind::Road,
        "container" => StructureKind::Container,
        "rampart" => StructureKind::Rampart,
        "constructed_wall" => StructureKind::ConstructedWall,
        "spawn" => StructureKind::Spawn,
        "extension" => StructureKind::Extension,
        "tower" => StructureKind::Tower,
        "storage" => StructureKind::Storage,
        "link" => StructureKind::Link,
        "lab" => StructureKind::Lab,
        "terminal" => StructureKind::Terminal,
        "controller" => StructureKind::Controller,
        other => return Err(format!("unknown kind {other:?}")),
    })
}
