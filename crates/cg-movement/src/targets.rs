//! Target normalization.

use cg_core::{MoveTarget, Position};

use crate::opts::MoveOpts;

/// Split edge-straddling targets when `keep_target_in_room` is on.  Flee
/// targets are left whole: their discs describe danger, not destinations.
pub fn normalize_targets(targets: &[MoveTarget], opts: &MoveOpts) -> Vec<MoveTarget> {
    if opts.keep_target_in_room() && !opts.flee() {
        targets.iter().flat_map(|t| t.fix_edge_position()).collect()
    } else {
        targets.to_vec()
    }
}

/// Out of range of every flee target.
pub fn is_safe(pos: Position, flee_from: &[MoveTarget]) -> bool {
    flee_from.iter().all(|t| pos.range_to(t.pos) >= t.range)
}

/// Destinations for fleeing: the ring at exactly `range` around each
/// target, minus tiles still too close to another target.
pub fn flee_destinations(flee_from: &[MoveTarget]) -> Vec<MoveTarget> {
    let mut out: Vec<MoveTarget> = Vec::new();
    for t in flee_from {
        let Ok(range) = u8::try_from(t.range) else { continue };
        for p in t.pos.positions_at_range(range) {
            if is_safe(p, flee_from) && !out.iter().any(|o| o.pos == p) {
                out.push(MoveTarget::exact(p));
            }
        }
    }
    out
}
