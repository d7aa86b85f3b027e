//! Tick-scoped move intents.
//!
//! # Indexes per room
//!
//! | Index             | Shape                                           |
//! |-------------------|-------------------------------------------------|
//! | `by_agent`        | agent → intent                                  |
//! | `by_priority`     | priority (desc) → viable targets (asc) → intents in arrival order |
//! | `by_target`       | tile → intents that list it                     |
//! | `pullers`         | puller → its tile                               |
//! | `pullees`         | agents being pulled                             |
//! | `prefers_to_stay` | tiles whose agent listed its own tile first     |
//! | `blocked_squares` | tiles nobody may be assigned                    |
//!
//! Intents sit in an arena and are addressed by index.  Cancelling an
//! intent unlinks it from every index but leaves the slot in place.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use cg_core::{AgentId, Position, RoomName, Tick};
use rustc_hash::{FxHashMap, FxHashSet};

/// "Move `agent` to one of `targets` this tick", best first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveIntent {
    pub agent:    AgentId,
    pub origin:   Position,
    pub priority: i32,
    pub targets:  Vec<Position>,
}

impl MoveIntent {
    pub fn new(agent: AgentId, origin: Position, targets: Vec<Position>, priority: i32) -> Self {
        Self { agent, origin, priority, targets }
    }

    /// Stay put, or step to any of `alternatives`.
    pub fn stay_or(agent: AgentId, origin: Position, alternatives: &[Position], priority: i32) -> Self {
        let mut targets = Vec::with_capacity(alternatives.len() + 1);
        targets.push(origin);
        targets.extend(alternatives.iter().copied().filter(|&p| p != origin));
        Self::new(agent, origin, targets, priority)
    }
}

#[derive(Debug)]
pub(crate) struct Slot {
    pub intent:       MoveIntent,
    /// Targets not yet claimed by somebody else.
    pub target_count: usize,
    pub resolved:     bool,
    pub resolved_to:  Option<Position>,
    /// `(target_count, seq)` while queued in `by_priority`.
    bucket:           Option<(usize, u64)>,
}

type Buckets = BTreeMap<usize, BTreeMap<u64, usize>>;

/// Every intent registered in one room this tick.
#[derive(Debug, Default)]
pub struct RoomLedger {
    slots:           Vec<Slot>,
    by_agent:        FxHashMap<AgentId, usize>,
    by_priority:     BTreeMap<Reverse<i32>, Buckets>,
    by_target:       FxHashMap<Position, Vec<usize>>,
    pullers:         FxHashMap<AgentId, Position>,
    pullees:         FxHashSet<AgentId>,
    prefers_to_stay: FxHashSet<Position>,
    blocked_squares: FxHashSet<Position>,
    seq:             u64,
}

impl RoomLedger {
    /// Add `intent`, replacing any earlier intent of the same agent.
    pub fn register(&mut self, intent: MoveIntent) {
        self.cancel(intent.agent);
        let id = self.slots.len();
        if intent.targets.first() == Some(&intent.origin) {
            self.prefers_to_stay.insert(intent.origin);
        }
        for &t in &intent.targets {
            let listed = self.by_target.entry(t).or_default();
            if !listed.contains(&id) {
                listed.push(id);
            }
        }
        self.by_agent.insert(intent.agent, id);
        let count = intent.targets.len();
        self.slots.push(Slot {
            intent,
            target_count: count,
            resolved: false,
            resolved_to: None,
            bucket: None,
        });
        self.enqueue(id);
    }

    /// Remove the agent's intent, if any.
    pub fn cancel(&mut self, agent: AgentId) -> Option<MoveIntent> {
        let id = self.by_agent.remove(&agent)?;
        self.dequeue(id);
        let slot = &self.slots[id];
        for t in &slot.intent.targets {
            if let Some(listed) = self.by_target.get_mut(t) {
                listed.retain(|&i| i != id);
            }
        }
        Some(slot.intent.clone())
    }

    pub fn register_pull(&mut self, puller: AgentId, puller_pos: Position, pulled: AgentId) {
        self.pullers.insert(puller, puller_pos);
        self.pullees.insert(pulled);
    }

    pub fn block_square(&mut self, pos: Position) {
        self.blocked_squares.insert(pos);
    }

    pub fn intent(&self, agent: AgentId) -> Option<&MoveIntent> {
        self.by_agent.get(&agent).map(|&id| &self.slots[id].intent)
    }

    /// Where reconciliation sent the agent; its origin when it stays put.
    pub fn resolution(&self, agent: AgentId) -> Option<Position> {
        self.by_agent.get(&agent).and_then(|&id| self.slots[id].resolved_to)
    }

    pub fn len(&self) -> usize {
        self.by_agent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_agent.is_empty()
    }

    pub fn has_intent(&self, agent: AgentId) -> bool {
        self.by_agent.contains_key(&agent)
    }

    pub fn is_puller(&self, agent: AgentId) -> bool {
        self.pullers.contains_key(&agent)
    }

    pub fn is_pullee(&self, agent: AgentId) -> bool {
        self.pullees.contains(&agent)
    }

    pub fn prefers_to_stay(&self, pos: Position) -> bool {
        self.prefers_to_stay.contains(&pos)
    }

    pub fn is_blocked(&self, pos: Position) -> bool {
        self.blocked_squares.contains(&pos)
    }

    // ── Scheduler access ──────────────────────────────────────────────────────

    pub(crate) fn slot(&self, id: usize) -> &Slot {
        &self.slots[id]
    }

    pub(crate) fn slot_mut(&mut self, id: usize) -> &mut Slot {
        &mut self.slots[id]
    }

    pub(crate) fn pullers(&self) -> impl Iterator<Item = (AgentId, Position)> + '_ {
        self.pullers.iter().map(|(&a, &p)| (a, p))
    }

    pub(crate) fn blocked_squares(&self) -> &FxHashSet<Position> {
        &self.blocked_squares
    }

    /// Live intents listing `pos`, in registration order.
    pub(crate) fn targeting(&self, pos: Position) -> Vec<usize> {
        self.by_target.get(&pos).cloned().unwrap_or_default()
    }

    /// Priorities with queued intents, highest first.
    pub(crate) fn priorities(&self) -> Vec<i32> {
        self.by_priority.keys().map(|&Reverse(p)| p).collect()
    }

    /// The most constrained batch still queued at `priority`.
    pub(crate) fn tightest_batch(&mut self, priority: i32) -> Option<Vec<usize>> {
        let buckets = self.by_priority.get_mut(&Reverse(priority))?;
        buckets.retain(|_, b| !b.is_empty());
        buckets.values().next().map(|b| b.values().copied().collect())
    }

    /// One fewer viable target; re-files the intent if it is still queued.
    pub(crate) fn decrement_target_count(&mut self, id: usize) {
        let queued = self.slots[id].bucket.is_some();
        if queued {
            self.dequeue(id);
        }
        let slot = &mut self.slots[id];
        slot.target_count = slot.target_count.saturating_sub(1);
        if queued {
            self.enqueue(id);
        }
    }

    pub(crate) fn dequeue(&mut self, id: usize) {
        let Some((count, seq)) = self.slots[id].bucket.take() else {
            return;
        };
        let priority = Reverse(self.slots[id].intent.priority);
        if let Some(bucket) = self.by_priority.get_mut(&priority).and_then(|b| b.get_mut(&count)) {
            bucket.remove(&seq);
        }
    }

    fn enqueue(&mut self, id: usize) {
        self.seq += 1;
        let seq = self.seq;
        let slot = &mut self.slots[id];
        slot.bucket = Some((slot.target_count, seq));
        self.by_priority
            .entry(Reverse(slot.intent.priority))
            .or_default()
            .entry(slot.target_count)
            .or_default()
            .insert(seq, id);
    }
}

// ── TickContext ───────────────────────────────────────────────────────────────

/// All ledgers for the tick being assembled.
#[derive(Debug, Default)]
pub struct TickContext {
    tick:  Option<Tick>,
    rooms: BTreeMap<RoomName, RoomLedger>,
}

impl TickContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start collecting for `now`.  Ledgers left over from an earlier tick
    /// are dropped; calling again within the same tick keeps them.
    pub fn begin_tick(&mut self, now: Tick) {
        if self.tick != Some(now) {
            self.tick = Some(now);
            self.rooms.clear();
        }
    }

    pub fn tick(&self) -> Option<Tick> {
        self.tick
    }

    pub fn room(&self, room: RoomName) -> Option<&RoomLedger> {
        self.rooms.get(&room)
    }

    pub fn room_mut(&mut self, room: RoomName) -> &mut RoomLedger {
        self.rooms.entry(room).or_default()
    }

    /// Rooms with anything registered, in name order.
    pub fn rooms(&self) -> Vec<RoomName> {
        self.rooms.keys().copied().collect()
    }

    /// Register `intent` in its origin room.  A fatigued agent that is not
    /// being pulled can only stay where it is.
    pub fn register_move(&mut self, mut intent: MoveIntent, fatigue: u32, pulled: bool) {
        if fatigue > 0 && !pulled {
            intent.targets = vec![intent.origin];
        }
        let room = intent.origin.room();
        // An agent that changed rooms since registering elsewhere.
        for (r, ledger) in self.rooms.iter_mut() {
            if *r != room {
                ledger.cancel(intent.agent);
            }
        }
        self.room_mut(room).register(intent);
    }

    pub fn cancel_move(&mut self, agent: AgentId) -> Option<MoveIntent> {
        self.rooms.values_mut().find_map(|ledger| ledger.cancel(agent))
    }

    pub fn register_pull(&mut self, puller: AgentId, puller_pos: Position, pulled: AgentId) {
        self.room_mut(puller_pos.room()).register_pull(puller, puller_pos, pulled);
    }

    pub fn block_square(&mut self, pos: Position) {
        self.room_mut(pos.room()).block_square(pos);
    }

    pub fn intent(&self, agent: AgentId) -> Option<&MoveIntent> {
        self.rooms.values().find_map(|ledger| ledger.intent(agent))
    }

    pub fn resolution(&self, agent: AgentId) -> Option<Position> {
        self.rooms.values().find_map(|ledger| ledger.resolution(agent))
    }

    pub(crate) fn ledgers_mut(&mut self) -> impl Iterator<Item = (RoomName, &mut RoomLedger)> {
        self.rooms.iter_mut().map(|(&r, l)| (r, l))
    }
}
