//! corridor — two groups of agents crossing through a narrow gap.
//!
//! Two rooms side by side.  A wall splits the western room except for a
//! three-tile gap, and the two groups start on opposite sides heading for
//! each other's start area, so every path funnels through the gap in both
//! directions at once.  Run with `RUST_LOG=debug` to watch the traffic
//! scheduler at work.

use std::io::Cursor;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cg_core::{AgentId, BodyInfo, MoveTarget, Position, RoomName, Tick};
use cg_movement::MoveOpts;
use cg_sim::{load_world_reader, GoTo, SimBuilder, SimConfig, SimObserver, TickSummary};

// ── Constants ─────────────────────────────────────────────────────────────────

const GROUP_SIZE:     u8  = 5;
const SEED:           u64 = 42;
const TOTAL_TICKS:    u64 = 150;
const PROGRESS_EVERY: u64 = 10;
const WALL_X:         u8  = 40;
const GAP:            std::ops::RangeInclusive<u8> = 24..=26;

// ── World CSV ─────────────────────────────────────────────────────────────────

// Rooms, a swamp band each side of the gap, and a road through it.
const WORLD_CSV: &str = "\
room,x,y,kind\n\
E1S1,0,0,plain\n\
E2S1,0,0,plain\n\
E1S1,38,23,swamp\n\
E1S1,38,27,swamp\n\
E1S1,42,23,swamp\n\
E1S1,42,27,swamp\n\
E1S1,39,25,road\n\
E1S1,40,25,road\n\
E1S1,41,25,road\n\
E2S1,30,10,source\n\
";

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Progress {
    moved:  usize,
    swaps:  usize,
    failed: usize,
}

impl SimObserver for Progress {
    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.moved += summary.commit.moved;
        self.swaps += summary.traffic.swaps;
        self.failed += summary.failed;
        if summary.tick.0 % PROGRESS_EVERY == 0 {
            println!(
                "tick {:>4}: {:>2} moved, {:>2} blocked, {:>2} intents",
                summary.tick, summary.commit.moved, summary.commit.blocked, summary.traffic.intents,
            );
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== corridor — cartograph movement demo ===");
    println!("Agents: {}  |  Ticks: {TOTAL_TICKS}  |  Seed: {SEED}", 2 * GROUP_SIZE);
    println!();

    // 1. World: CSV features, then the dividing wall.
    let west: RoomName = "E1S1".parse()?;
    let east: RoomName = "E2S1".parse()?;
    let mut world = load_world_reader(Cursor::new(WORLD_CSV), Tick(1))?;
    world.wall_where(west, |x, y| x == WALL_X && !GAP.contains(&y))?;
    info!(rooms = world.rooms().count(), "world ready");

    // 2. Agents: ids 1.. go east, the rest go west.
    let body = BodyInfo { move_parts: 1, carry_parts: 1, other_parts: 1, used_capacity: 0 };
    let mut behavior = GoTo::new();
    let mut goals: Vec<(AgentId, Position)> = Vec::new();
    for i in 0..GROUP_SIZE {
        let east_bound = AgentId(u32::from(i) + 1);
        let start = Position::new(west, 10, 22 + i)?;
        let goal = Position::new(east, 25, 22 + i)?;
        world.spawn_agent(east_bound, start, body)?;
        behavior = behavior.order(east_bound, vec![MoveTarget::near(goal)], MoveOpts::default());
        goals.push((east_bound, goal));

        let west_bound = AgentId(u32::from(i + GROUP_SIZE) + 1);
        let start = Position::new(east, 25, 22 + i)?;
        let goal = Position::new(west, 10, 22 + i)?;
        world.spawn_agent(west_bound, start, body)?;
        let opts = MoveOpts { priority: Some(2), ..MoveOpts::default() };
        behavior = behavior.order(west_bound, vec![MoveTarget::near(goal)], opts);
        goals.push((west_bound, goal));
    }

    // 3. Build and run.
    let config = SimConfig {
        start_tick:            1,
        total_ticks:           TOTAL_TICKS,
        seed:                  SEED,
        output_interval_ticks: 0,
    };
    let mut sim = SimBuilder::new(config, world, behavior).build()?;
    let mut progress = Progress::default();

    let t0 = Instant::now();
    sim.run(&mut progress)?;
    let elapsed = t0.elapsed();

    // 4. Summary.
    println!();
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  moves committed : {}", progress.moved);
    println!("  swaps           : {}", progress.swaps);
    println!("  failed calls    : {}", progress.failed);
    println!("  searches        : {}", sim.cartographer.pathfinder.calls);
    println!("  durable state   : {} bytes", sim.save()?.len());
    println!();

    println!("{:<8} {:<16} {:<16} {:<8}", "Agent", "Position", "Goal", "Arrived");
    println!("{}", "-".repeat(50));
    goals.sort_by_key(|(id, _)| *id);
    for (id, goal) in goals {
        let Some(agent) = sim.world.agent(id) else { continue };
        println!(
            "{:<8} {:<16} {:<16} {:<8}",
            id.to_string(),
            agent.pos.to_string(),
            goal.to_string(),
            if agent.pos.is_near_to(goal) { "yes" } else { "no" },
        );
    }

    Ok(())
}
