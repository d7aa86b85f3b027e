//! Packed world positions.
//!
//! A [`Position`] is a `u32`: `room << 16 | x << 8 | y`, where `room` is the
//! packed [`RoomName`].  Ordering and hashing follow the packed integer, so
//! positions can key `BTreeMap`s deterministically.
//!
//! Rooms tile a single contiguous global grid: tile `(x, y)` of the room at
//! room-grid `(rx, ry)` is world tile `(rx * 50 + x, ry * 50 + y)`.  Ranges
//! and directions between positions in different rooms are measured on that
//! grid.

use std::fmt;

use crate::room::{RoomName, ROOM_SIZE};
use crate::{CoreError, CoreResult};

const EDGE: u8 = ROOM_SIZE - 1;

/// A tile coordinate inside one room.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub x: u8,
    pub y: u8,
}

impl Coord {
    pub fn new(x: u8, y: u8) -> CoreResult<Self> {
        if x >= ROOM_SIZE || y >= ROOM_SIZE {
            return Err(CoreError::PositionOutOfRoom { x: x as i32, y: y as i32 });
        }
        Ok(Self { x, y })
    }

    /// 12-bit packing `x << 6 | y`.
    #[inline]
    pub fn packed(self) -> u16 {
        (u16::from(self.x) << 6) | u16::from(self.y)
    }

    pub fn from_packed(packed: u16) -> CoreResult<Self> {
        Self::new((packed >> 6) as u8, (packed & 0x3F) as u8)
    }

    /// Row-major index into a 2500-tile room array.
    #[inline]
    pub fn index(self) -> usize {
        self.y as usize * ROOM_SIZE as usize + self.x as usize
    }
}

/// The eight movement directions, clockwise from `Top`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Top         = 1,
    TopRight    = 2,
    Right       = 3,
    BottomRight = 4,
    Bottom      = 5,
    BottomLeft  = 6,
    Left        = 7,
    TopLeft     = 8,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Top,
        Direction::TopRight,
        Direction::Right,
        Direction::BottomRight,
        Direction::Bottom,
        Direction::BottomLeft,
        Direction::Left,
        Direction::TopLeft,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Top => (0, -1),
            Direction::TopRight => (1, -1),
            Direction::Right => (1, 0),
            Direction::BottomRight => (1, 1),
            Direction::Bottom => (0, 1),
            Direction::BottomLeft => (-1, 1),
            Direction::Left => (-1, 0),
            Direction::TopLeft => (-1, -1),
        }
    }

    fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| d.delta() == (dx.signum(), dy.signum()))
    }

    pub fn reverse(self) -> Direction {
        Direction::ALL[(self as usize + 3) % 8]
    }
}

/// A packed `(room, x, y)` triple.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position(u32);

impl Position {
    /// # Errors
    ///
    /// [`CoreError::PositionOutOfRoom`] when `x` or `y` is 50 or more.
    pub fn new(room: RoomName, x: u8, y: u8) -> CoreResult<Self> {
        let c = Coord::new(x, y)?;
        Ok(Self::from_coord(room, c))
    }

    #[inline]
    pub fn from_coord(room: RoomName, c: Coord) -> Self {
        Self((u32::from(room.packed()) << 16) | (u32::from(c.x) << 8) | u32::from(c.y))
    }

    /// Inverse of [`packed`](Self::packed).  Rejects in-room coordinates
    /// outside the grid.
    pub fn from_packed(packed: u32) -> CoreResult<Self> {
        let p = Self(packed);
        Coord::new(p.x(), p.y())?;
        Ok(p)
    }

    #[inline]
    pub const fn packed(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn room(self) -> RoomName {
        RoomName::from_packed((self.0 >> 16) as u16)
    }

    #[inline]
    pub fn x(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn y(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub fn coord(self) -> Coord {
        Coord { x: self.x(), y: self.y() }
    }

    /// Tile on the global grid.
    pub fn world_coords(self) -> (i32, i32) {
        let room = self.room();
        (
            room.x() * ROOM_SIZE as i32 + self.x() as i32,
            room.y() * ROOM_SIZE as i32 + self.y() as i32,
        )
    }

    /// Inverse of [`world_coords`](Self::world_coords); `None` outside the
    /// packable world.
    pub fn from_world(wx: i32, wy: i32) -> Option<Self> {
        let size = ROOM_SIZE as i32;
        let room = RoomName::from_coords(wx.div_euclid(size), wy.div_euclid(size)).ok()?;
        Some(Self::from_coord(
            room,
            Coord { x: wx.rem_euclid(size) as u8, y: wy.rem_euclid(size) as u8 },
        ))
    }

    /// Chebyshev distance on the global grid.
    pub fn range_to(self, other: Position) -> u32 {
        let (ax, ay) = self.world_coords();
        let (bx, by) = other.world_coords();
        ax.abs_diff(bx).max(ay.abs_diff(by))
    }

    #[inline]
    pub fn in_range_to(self, other: Position, range: u32) -> bool {
        self.range_to(other) <= range
    }

    pub fn is_near_to(self, other: Position) -> bool {
        self.in_range_to(other, 1)
    }

    /// On the outermost ring of its room.
    pub fn is_exit(self) -> bool {
        self.x() == 0 || self.y() == 0 || self.x() == EDGE || self.y() == EDGE
    }

    /// Direction of the first step toward `other`; `None` when equal.
    pub fn direction_to(self, other: Position) -> Option<Direction> {
        let (ax, ay) = self.world_coords();
        let (bx, by) = other.world_coords();
        Direction::from_delta(bx - ax, by - ay)
    }

    /// Shift by `(dx, dy)` on the global grid, crossing room edges.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Position> {
        let (x, y) = self.world_coords();
        Position::from_world(x + dx, y + dy)
    }

    /// One step in `dir`, crossing into the next room at an edge.
    pub fn step(self, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    /// The same-room 8-neighbourhood; tiles off the room grid are dropped.
    pub fn adjacent(self) -> Vec<Position> {
        self.nearby(1, false)
    }

    /// Every same-room tile within `range`, optionally including `self`.
    pub fn nearby(self, range: u8, include_center: bool) -> Vec<Position> {
        let (cx, cy) = (self.x() as i32, self.y() as i32);
        let r = range as i32;
        let mut out = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
        for y in (cy - r).max(0)..=(cy + r).min(EDGE as i32) {
            for x in (cx - r).max(0)..=(cx + r).min(EDGE as i32) {
                if !include_center && x == cx && y == cy {
                    continue;
                }
                out.push(self.with_xy(x as u8, y as u8));
            }
        }
        out
    }

    /// The same-room perimeter of the square at exactly `range`.
    pub fn positions_at_range(self, range: u8) -> Vec<Position> {
        if range == 0 {
            return vec![self];
        }
        let (cx, cy) = (self.x() as i32, self.y() as i32);
        let r = range as i32;
        let in_room = |v: i32| (0..=EDGE as i32).contains(&v);
        let mut out = Vec::with_capacity(8 * range as usize);
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                let on_ring = (x - cx).abs() == r || (y - cy).abs() == r;
                if on_ring && in_room(x) && in_room(y) {
                    out.push(self.with_xy(x as u8, y as u8));
                }
            }
        }
        out
    }

    #[inline]
    fn with_xy(self, x: u8, y: u8) -> Position {
        Position::from_coord(self.room(), Coord { x, y })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {},{}]", self.room(), self.x(), self.y())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
