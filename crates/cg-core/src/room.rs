//! Room names and the room-adjacency grid.
//!
//! The world is an unbounded-looking grid of 50x50 rooms named by quadrant:
//! `W3N7`, `E0S12`.  Internally a room is a pair of signed coordinates with
//! `W n -> x = -n - 1`, `E n -> x = n`, `N n -> y = -n - 1`, `S n -> y = n`,
//! so `W0N0` sits at `(-1, -1)` and `E0S0` at `(0, 0)`.  The pair packs into a
//! `u16` as `(x + 128) << 8 | (y + 128)`, giving 128 rooms in each direction.

use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Tiles per room edge.
pub const ROOM_SIZE: u8 = 50;

/// Largest quadrant index that still packs (`W127`, `E127`).
pub const MAX_ROOM_INDEX: u32 = 127;

/// A packed room name.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomName(u16);

/// One of the four room-edge directions.  Values match the host's odd
/// direction constants so they double as [`Direction`](crate::Direction)s.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitDir {
    Top    = 1,
    Right  = 3,
    Bottom = 5,
    Left   = 7,
}

impl ExitDir {
    pub const ALL: [ExitDir; 4] = [ExitDir::Top, ExitDir::Right, ExitDir::Bottom, ExitDir::Left];

    /// Index into a `[_; 4]` exits table (`Top = 0` clockwise).
    #[inline]
    pub fn index(self) -> usize {
        (self as usize - 1) / 2
    }

    pub fn opposite(self) -> ExitDir {
        match self {
            ExitDir::Top => ExitDir::Bottom,
            ExitDir::Right => ExitDir::Left,
            ExitDir::Bottom => ExitDir::Top,
            ExitDir::Left => ExitDir::Right,
        }
    }

    /// Room-grid step `(dx, dy)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            ExitDir::Top => (0, -1),
            ExitDir::Right => (1, 0),
            ExitDir::Bottom => (0, 1),
            ExitDir::Left => (-1, 0),
        }
    }
}

impl RoomName {
    /// Build from signed room-grid coordinates.
    pub fn from_coords(x: i32, y: i32) -> CoreResult<Self> {
        if !(-128..=127).contains(&x) || !(-128..=127).contains(&y) {
            return Err(CoreError::RoomOutOfWorld { x, y });
        }
        Ok(Self((((x + 128) as u16) << 8) | (y + 128) as u16))
    }

    /// Rebuild from [`packed`](Self::packed).
    #[inline]
    pub const fn from_packed(packed: u16) -> Self {
        Self(packed)
    }

    #[inline]
    pub const fn packed(self) -> u16 {
        self.0
    }

    /// Signed room-grid x (west negative).
    #[inline]
    pub fn x(self) -> i32 {
        (self.0 >> 8) as i32 - 128
    }

    /// Signed room-grid y (north negative).
    #[inline]
    pub fn y(self) -> i32 {
        (self.0 & 0xFF) as i32 - 128
    }

    /// Quadrant-relative indices as they appear in the name, e.g. `(3, 7)`
    /// for `W3N7`.
    fn name_indices(self) -> (u32, u32) {
        let fold = |c: i32| if c < 0 { (-c - 1) as u32 } else { c as u32 };
        (fold(self.x()), fold(self.y()))
    }

    /// Either coordinate on a multiple of ten.
    pub fn is_highway(self) -> bool {
        let (h, v) = self.name_indices();
        h % 10 == 0 || v % 10 == 0
    }

    /// Both coordinates at 5 mod 10: the sector centre.
    pub fn is_center(self) -> bool {
        let (h, v) = self.name_indices();
        h % 10 == 5 && v % 10 == 5
    }

    /// The 3x3 block around a sector centre.  Includes the centre room
    /// itself; callers that need to exclude it test [`is_center`](Self::is_center).
    pub fn is_source_keeper(self) -> bool {
        let (h, v) = self.name_indices();
        (4..=6).contains(&(h % 10)) && (4..=6).contains(&(v % 10))
    }

    /// Manhattan distance on the room grid.
    pub fn distance(self, other: RoomName) -> u32 {
        self.x().abs_diff(other.x()) + self.y().abs_diff(other.y())
    }

    /// Chebyshev distance on the room grid.
    pub fn linear_distance(self, other: RoomName) -> u32 {
        self.x().abs_diff(other.x()).max(self.y().abs_diff(other.y()))
    }

    /// The room across `dir`, or `None` at the edge of the packable world.
    pub fn neighbor(self, dir: ExitDir) -> Option<RoomName> {
        let (dx, dy) = dir.delta();
        RoomName::from_coords(self.x() + dx, self.y() + dy).ok()
    }

    /// Direction of an adjacent room, if `other` shares an edge with `self`.
    pub fn exit_to(self, other: RoomName) -> Option<ExitDir> {
        ExitDir::ALL.into_iter().find(|&d| self.neighbor(d) == Some(other))
    }
}

impl FromStr for RoomName {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let bad = || CoreError::InvalidRoomName(s.to_string());
        let bytes = s.as_bytes();
        let (h, rest) = bytes.split_first().ok_or_else(bad)?;
        let split = rest.iter().position(|b| !b.is_ascii_digit()).ok_or_else(bad)?;
        let (h_digits, rest) = rest.split_at(split);
        let (v, v_digits) = rest.split_first().ok_or_else(bad)?;

        let parse = |digits: &[u8]| -> CoreResult<u32> {
            if digits.is_empty() || digits.len() > 3 || !digits.iter().all(u8::is_ascii_digit) {
                return Err(bad());
            }
            let n = digits.iter().fold(0u32, |n, d| n * 10 + u32::from(d - b'0'));
            if n > MAX_ROOM_INDEX { Err(bad()) } else { Ok(n) }
        };
        let hn = parse(h_digits)? as i32;
        let vn = parse(v_digits)? as i32;

        let x = match h {
            b'W' => -hn - 1,
            b'E' => hn,
            _ => return Err(bad()),
        };
        let y = match v {
            b'N' => -vn - 1,
            b'S' => vn,
            _ => return Err(bad()),
        };
        RoomName::from_coords(x, y)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, v) = self.name_indices();
        let ew = if self.x() < 0 { 'W' } else { 'E' };
        let ns = if self.y() < 0 { 'N' } else { 'S' };
        write!(f, "{ew}{h}{ns}{v}")
    }
}

impl fmt::Debug for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoomName({self})")
    }
}
