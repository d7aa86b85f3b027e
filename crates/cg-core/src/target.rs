//! Movement targets: a position plus an acceptable range.

use std::fmt;

use crate::pos::{Coord, Position};
use crate::room::ROOM_SIZE;

/// A disc (Chebyshev square) of acceptable destinations around `pos`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveTarget {
    pub pos:   Position,
    pub range: u32,
}

impl MoveTarget {
    pub fn new(pos: Position, range: u32) -> Self {
        Self { pos, range }
    }

    /// Stand exactly on `pos`.
    pub fn exact(pos: Position) -> Self {
        Self { pos, range: 0 }
    }

    /// Stand next to `pos`, the convention for objects given without a range.
    pub fn near(pos: Position) -> Self {
        Self { pos, range: 1 }
    }

    /// `pos` lies within this target's range.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        self.pos.in_range_to(pos, self.range)
    }

    /// Split a target whose range reaches a room edge into up to four
    /// smaller targets that stay inside the room's walkable interior
    /// (`1..=48`) and together cover the same area.
    ///
    /// Targets clear of the edges are returned unchanged.
    pub fn fix_edge_position(self) -> Vec<MoveTarget> {
        let (x, y, r) = (self.pos.x() as i64, self.pos.y() as i64, self.range as i64);
        let edge = (ROOM_SIZE - 1) as i64;
        if x > r && edge - x > r && y > r && edge - y > r {
            return vec![self];
        }

        let (x1, x2) = ((x - r).max(1), (x + r).min(edge - 1));
        let (y1, y2) = ((y - r).max(1), (y + r).min(edge - 1));
        let span = (x2 - x1).min(y2 - y1);
        // ceil((span - 1) / 2) for possibly negative spans
        let qr = ((span - 1) as f64 / 2.0).ceil().max(0.0) as i64;

        let corners = [
            (x1 + qr, y1 + qr),
            (x1 + qr, y2 - qr),
            (x2 - qr, y2 - qr),
            (x2 - qr, y1 + qr),
        ];
        let mut out: Vec<MoveTarget> = Vec::with_capacity(4);
        for (cx, cy) in corners {
            let coord = Coord { x: cx.clamp(0, edge) as u8, y: cy.clamp(0, edge) as u8 };
            let pos = Position::from_coord(self.pos.room(), coord);
            if !out.iter().any(|t| t.pos == pos) {
                out.push(MoveTarget { pos, range: qr as u32 });
            }
        }
        out
    }
}

impl fmt::Debug for MoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.pos, self.range)
    }
}
