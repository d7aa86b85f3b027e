//! End-of-tick move commit.
//!
//! # Rules
//!
//! | Situation                                            | Outcome       |
//! |------------------------------------------------------|---------------|
//! | destination is a wall, obstacle or outside the world | stays         |
//! | fatigued, or no move parts, and not being pulled     | stays         |
//! | a lower-id agent already claimed the destination     | stays         |
//! | destination held by an agent that does not move      | stays         |
//! | destination vacated this tick, swaps and cycles too  | moves         |
//! | lands on a portal whose exit is free                 | teleported    |
//!
//! Fatigue per weight part: road 1, plain 2, swamp 10.  Each move part
//! recovers 2 per tick.  A pulled agent generates no fatigue of its own;
//! its puller takes it instead.

use std::collections::BTreeMap;

use cg_core::{AgentId, Position};
use cg_spatial::{Terrain, WorldView};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::world::GridWorld;

const ROAD_FATIGUE: u32 = 1;
const PLAIN_FATIGUE: u32 = 2;
const SWAMP_FATIGUE: u32 = 10;
const RECOVERY_PER_MOVE_PART: u32 = 2;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Agents with a queued step.
    pub ordered:    usize,
    pub moved:      usize,
    /// Ordered but stayed.
    pub blocked:    usize,
    pub teleported: usize,
}

impl GridWorld {
    /// Apply every queued step at once and clear the queue.
    pub fn commit(&mut self) -> CommitReport {
        let orders = std::mem::take(&mut self.orders);
        let pulls = std::mem::take(&mut self.pulls);
        let mut report = CommitReport { ordered: orders.len(), ..CommitReport::default() };

        // ── Candidate destinations ────────────────────────────────────────
        let mut moves: BTreeMap<AgentId, Position> = BTreeMap::new();
        let mut claimed: FxHashSet<Position> = FxHashSet::default();
        for (&agent, &dir) in &orders {
            let Some(a) = self.agents.get(&agent) else { continue };
            let pulled = pulls.contains_key(&agent);
            if !pulled && (a.fatigue > 0 || a.body.move_parts == 0) {
                trace!(%agent, fatigue = a.fatigue, "cannot move");
                continue;
            }
            let Some(dest) = a.pos.step(dir).filter(|&d| self.is_passable(d)) else {
                trace!(%agent, from = %a.pos, ?dir, "destination impassable");
                continue;
            };
            if !claimed.insert(dest) {
                trace!(%agent, %dest, "destination contested");
                continue;
            }
            moves.insert(agent, dest);
        }

        // ── Drop moves into tiles whose occupant stays, to a fixpoint ─────
        let occupants: FxHashMap<Position, AgentId> = self.agents.iter().map(|(&id, a)| (a.pos, id)).collect();
        loop {
            let blocked: Vec<AgentId> = moves
                .iter()
                .filter(|(_, dest)| occupants.get(dest).is_some_and(|o| !moves.contains_key(o)))
                .map(|(&id, _)| id)
                .collect();
            if blocked.is_empty() {
                break;
            }
            for id in blocked {
                moves.remove(&id);
            }
        }

        // ── Fatigue ───────────────────────────────────────────────────────
        let mut gained: BTreeMap<AgentId, u32> = BTreeMap::new();
        for (&agent, &dest) in &moves {
            let Some(a) = self.agents.get(&agent) else { continue };
            let fatigue = a.body.fatigue_for(self.fatigue_factor(dest));
            let payer = match pulls.get(&agent) {
                Some(puller) if moves.contains_key(puller) => *puller,
                Some(_) => continue,
                None => agent,
            };
            *gained.entry(payer).or_default() += fatigue;
        }

        // ── Apply ─────────────────────────────────────────────────────────
        for (id, a) in self.agents.iter_mut() {
            if let Some(&dest) = moves.get(id) {
                a.pos = dest;
            }
            if a.my {
                let total = a.fatigue + gained.get(id).copied().unwrap_or(0);
                a.fatigue = total.saturating_sub(RECOVERY_PER_MOVE_PART * a.body.move_parts);
            }
        }
        report.moved = moves.len();
        report.blocked = report.ordered - report.moved.min(report.ordered);

        // ── Portals ───────────────────────────────────────────────────────
        for (&agent, &dest) in &moves {
            let Some(exit) = self.portal_exit(dest) else { continue };
            if self.occupant(exit).is_some() || !self.is_passable(exit) {
                trace!(%agent, %exit, "portal exit occupied");
                continue;
            }
            if let Some(a) = self.agents.get_mut(&agent) {
                a.pos = exit;
                report.teleported += 1;
                trace!(%agent, from = %dest, to = %exit, "teleported");
            }
        }

        debug!(
            tick = %self.time(),
            ordered = report.ordered,
            moved = report.moved,
            blocked = report.blocked,
            teleported = report.teleported,
            "moves committed"
        );
        report
    }

    fn fatigue_factor(&self, pos: Position) -> u32 {
        if self.has_road(pos) {
            return ROAD_FATIGUE;
        }
        match self.terrain_at(pos) {
            Some(Terrain::Swamp) => SWAMP_FATIGUE,
            _ => PLAIN_FATIGUE,
        }
    }
}
