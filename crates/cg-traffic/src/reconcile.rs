//! Traffic reconciliation: turn every registered intent into at most one
//! conflict-free step.
//!
//! # Algorithm (per room)
//!
//! 1. Idle agents (no intent, not pulling or pulled) get a priority-0
//!    "stay, or step anywhere walkable" intent so they can be shoved.
//! 2. Pullers' tiles are claimed up front; intents listing them lose one
//!    viable target.
//! 3. Priorities are drained highest first.  Within a priority the batch
//!    with the fewest viable targets goes first, in arrival order.
//! 4. Each intent takes its first unclaimed target, skipping tiles another
//!    agent would rather stay on (unless it is its own tile, which a puller
//!    may even reclaim).  Failing that, the first unclaimed target at all.
//! 5. A claim costs every other unresolved intent listing that tile one
//!    viable target.
//! 6. When a mover leaves a tile that is the single target of the agent it
//!    is displacing, that agent jumps the queue so the two swap, and the
//!    vacated tile's claim is released for it.
//!
//! Agents that find nothing simply do not move this tick.

use std::collections::VecDeque;

use cg_cache::{CacheExt, CachingStrategy, MemoryCache, NumberSerializer};
use cg_core::{MoveStatus, Position, RoomName, Tick};
use cg_spatial::adjacent_walkable;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::host::AgentHost;
use crate::ledger::{MoveIntent, RoomLedger, TickContext};

/// Memory key holding the tick of the last completed reconciliation.
pub const RECONCILE_KEY: &str = "_crr";

/// How many ticks may pass without reconciliation before movement falls
/// back to direct steps.
const RECENT_TICKS: u64 = 2;

#[derive(Clone, Debug, Default)]
pub struct ReconcileOpts {
    /// Trace every decision.
    pub visualize: bool,
}

/// Tick totals across all rooms.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub rooms:      usize,
    pub intents:    usize,
    /// Intents resolved to a different tile.
    pub moved:      usize,
    /// Intents resolved to their own tile.
    pub stayed:     usize,
    /// Intents left without any tile.
    pub unresolved: usize,
    /// Swap partners moved to the front of the queue.
    pub swaps:      usize,
}

/// Whether reconciliation ran within the last two ticks.
pub fn reconciled_recently(memory: &mut MemoryCache, now: Tick) -> bool {
    memory
        .with(NumberSerializer)
        .get(RECONCILE_KEY)
        .is_some_and(|last| now.0.saturating_sub(RECENT_TICKS) <= last)
}

pub fn mark_reconciled(memory: &mut MemoryCache, now: Tick) {
    memory.with(NumberSerializer).set(RECONCILE_KEY, now.0, None);
}

/// Resolve every room with registered intents and issue the moves.
///
/// Must run once per tick, after all movement calls.
pub fn reconcile_traffic<H: AgentHost + ?Sized>(
    ctx: &mut TickContext,
    host: &mut H,
    memory: &mut MemoryCache,
    opts: &ReconcileOpts,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for (room, ledger) in ctx.ledgers_mut() {
        if !host.is_visible(room) {
            continue;
        }
        report.rooms += 1;
        reconcile_room(room, ledger, host, opts, &mut report);
    }
    mark_reconciled(memory, host.time());
    report
}

fn reconcile_room<H: AgentHost + ?Sized>(
    room: RoomName,
    ledger: &mut RoomLedger,
    host: &mut H,
    opts: &ReconcileOpts,
    report: &mut ReconcileReport,
) {
    for agent in host.my_agents_in(room) {
        if ledger.has_intent(agent) || ledger.is_pullee(agent) || ledger.is_puller(agent) {
            continue;
        }
        let Some(pos) = host.agent_pos(agent) else { continue };
        let mut intent = MoveIntent::stay_or(agent, pos, &adjacent_walkable(&*host, pos, true), 0);
        if host.agent_fatigue(agent) > 0 {
            intent.targets.truncate(1);
        }
        ledger.register(intent);
    }

    let mut used: FxHashSet<Position> = ledger.blocked_squares().clone();

    let pullers: Vec<_> = ledger.pullers().collect();
    for (puller, pos) in pullers {
        used.insert(pos);
        for id in ledger.targeting(pos) {
            if ledger.slot(id).intent.agent != puller {
                ledger.decrement_target_count(id);
            }
        }
    }

    let (moved_before, stayed_before) = (report.moved, report.stayed);

    for priority in ledger.priorities() {
        while let Some(batch) = ledger.tightest_batch(priority) {
            let mut work: VecDeque<usize> = batch.into();
            while let Some(id) = work.pop_front() {
                ledger.dequeue(id);
                if ledger.slot(id).resolved {
                    continue;
                }
                let intent = ledger.slot(id).intent.clone();
                let is_puller = ledger.is_puller(intent.agent);

                let Some(target) = choose_target(ledger, &intent, is_puller, &used) else {
                    if opts.visualize {
                        trace!(agent = %intent.agent, origin = %intent.origin, "no free target");
                    }
                    continue;
                };

                if target != intent.origin {
                    if let Some(dir) = intent.origin.direction_to(target) {
                        let status = host.move_agent(intent.agent, dir);
                        if status != MoveStatus::Ok {
                            debug!(agent = %intent.agent, %status, "host rejected move");
                        }
                    }
                    report.moved += 1;
                } else {
                    report.stayed += 1;
                }
                if opts.visualize {
                    trace!(agent = %intent.agent, from = %intent.origin, to = %target, priority, "resolved");
                }
                {
                    let slot = ledger.slot_mut(id);
                    slot.resolved = true;
                    slot.resolved_to = Some(target);
                }

                used.insert(target);
                for other in ledger.targeting(target) {
                    if !ledger.slot(other).resolved {
                        ledger.decrement_target_count(other);
                    }
                }

                if target != intent.origin && !is_puller {
                    let partner = ledger.targeting(intent.origin).into_iter().find(|&other| {
                        let s = ledger.slot(other);
                        other != id
                            && s.intent.targets.len() < 2
                            && !s.resolved
                            && s.intent.origin == target
                            && !ledger.is_puller(s.intent.agent)
                    });
                    if let Some(partner) = partner {
                        if opts.visualize {
                            trace!(agent = %ledger.slot(partner).intent.agent, "swap promoted");
                        }
                        report.swaps += 1;
                        // The tile being vacated is the partner's to take,
                        // unless somebody already resolved onto it.
                        let taken = ledger
                            .targeting(intent.origin)
                            .into_iter()
                            .any(|other| ledger.slot(other).resolved_to == Some(intent.origin));
                        if !taken {
                            used.remove(&intent.origin);
                        }
                        work.push_front(partner);
                    }
                }
            }
        }
    }

    let moved = report.moved - moved_before;
    let resolved = moved + report.stayed - stayed_before;
    let unresolved = ledger.len().saturating_sub(resolved);
    report.intents += ledger.len();
    report.unresolved += unresolved;
    debug!(%room, intents = ledger.len(), moved, unresolved, "traffic reconciled");
}

/// First unclaimed target nobody else prefers to stay on, else the first
/// unclaimed target.
fn choose_target(
    ledger: &RoomLedger,
    intent: &MoveIntent,
    is_puller: bool,
    used: &FxHashSet<Position>,
) -> Option<Position> {
    let mut fallback = None;
    for &t in &intent.targets {
        let own = t == intent.origin;
        if used.contains(&t) && !(own && is_puller) {
            continue;
        }
        if own || !ledger.prefers_to_stay(t) {
            return Some(t);
        }
        fallback.get_or_insert(t);
    }
    fallback
}
