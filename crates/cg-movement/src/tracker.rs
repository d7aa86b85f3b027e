//! Per-agent hints kept in the heap cache.
//!
//! | Suffix | Value                                             |
//! |--------|---------------------------------------------------|
//! | `_csp` | last observed position                            |
//! | `_cst` | tick the agent arrived at that position           |
//! | `_cpi` | index on the path being followed                  |
//! | `_rsi` | path index to rejoin after getting stuck          |
//!
//! Path indexes are signed: `-1` means "next to the first tile" and
//! `len` means "next to the last tile" when walking in reverse.

use cg_cache::{CacheExt, CachingStrategy, HeapCache, Json, NumberSerializer, PositionSerializer};
use cg_core::{agent_key, AgentId, Position, Tick};

pub const LAST_POSITION_SUFFIX: &str = "_csp";
pub const LAST_POSITION_TIME_SUFFIX: &str = "_cst";
pub const MOVE_INDEX_SUFFIX: &str = "_cpi";
pub const STUCK_INDEX_SUFFIX: &str = "_rsi";

/// One agent's slice of the heap cache.
pub struct AgentTrack<'a> {
    heap:  &'a mut HeapCache,
    agent: AgentId,
}

impl<'a> AgentTrack<'a> {
    pub fn new(heap: &'a mut HeapCache, agent: AgentId) -> Self {
        Self { heap, agent }
    }

    fn key(&self, suffix: &str) -> String {
        agent_key(self.agent, suffix)
    }

    /// Record `pos` and report whether the agent has stood on it, free of
    /// fatigue, for at least `limit` ticks.  Reporting restarts the count,
    /// so a stuck agent is reported once per `limit` ticks.  Fatigued agents
    /// are never stuck and leave the record untouched.
    pub fn is_stuck(&mut self, pos: Position, fatigue: u32, now: Tick, limit: u64) -> bool {
        if fatigue > 0 {
            return false;
        }
        let (pos_key, time_key) = (self.key(LAST_POSITION_SUFFIX), self.key(LAST_POSITION_TIME_SUFFIX));
        let last_pos = self.heap.with(PositionSerializer).get(&pos_key);
        let since = self.heap.with(NumberSerializer).get(&time_key);
        self.heap.with(PositionSerializer).set(&pos_key, pos, None);

        let stuck = match (last_pos, since) {
            (Some(last), Some(since)) if last == pos => now.since(Tick(since)) >= limit,
            _ => false,
        };
        if stuck || last_pos != Some(pos) || since.is_none() {
            self.heap.with(NumberSerializer).set(&time_key, now.0, None);
        }
        stuck
    }

    pub fn move_index(&mut self) -> Option<i64> {
        let key = self.key(MOVE_INDEX_SUFFIX);
        self.heap.with(Json::<i64>::new()).get(&key)
    }

    pub fn set_move_index(&mut self, index: i64) {
        let key = self.key(MOVE_INDEX_SUFFIX);
        self.heap.with(Json::<i64>::new()).set(&key, index, None);
    }

    pub fn clear_move_index(&mut self) {
        let key = self.key(MOVE_INDEX_SUFFIX);
        self.heap.with(Json::<i64>::new()).delete(&key);
    }

    pub fn stuck_index(&mut self) -> Option<i64> {
        let key = self.key(STUCK_INDEX_SUFFIX);
        self.heap.with(Json::<i64>::new()).get(&key)
    }

    pub fn set_stuck_index(&mut self, index: i64) {
        let key = self.key(STUCK_INDEX_SUFFIX);
        self.heap.with(Json::<i64>::new()).set(&key, index, None);
    }

    pub fn clear_stuck_index(&mut self) {
        let key = self.key(STUCK_INDEX_SUFFIX);
        self.heap.with(Json::<i64>::new()).delete(&key);
    }
}
