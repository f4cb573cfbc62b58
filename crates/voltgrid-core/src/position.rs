//! World positions, six-way adjacency, and the coarse region grid.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An integer coordinate in the simulated world.
///
/// Ordered by x, then y, then z so node maps keyed by position iterate in a
/// stable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position shifted by the given deltas, or `None` if any coordinate
    /// leaves the `i32` range.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }

    /// The neighbouring position in `direction`. `None` at the edge of the
    /// coordinate range.
    pub fn step(&self, direction: Direction) -> Option<Self> {
        let (dx, dy, dz) = direction.offset();
        self.offset(dx, dy, dz)
    }

    /// The axis-aligned neighbours, in [`Direction::ALL`] order. Positions
    /// on the edge of the coordinate range have fewer than six.
    pub fn neighbors(&self) -> impl Iterator<Item = Position> + use<> {
        let origin = *self;
        Direction::ALL.into_iter().filter_map(move |d| origin.step(d))
    }

    /// Manhattan distance to another position, saturating at `u32::MAX`.
    pub fn manhattan_distance(&self, other: &Position) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
            .saturating_add(self.z.abs_diff(other.z))
    }

    /// `true` if `other` is exactly one axis-aligned step away.
    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The six axis-aligned directions.
///
/// North is -z, south is +z, east is +x, west is -x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All six directions in neighbour-expansion order.
    pub const ALL: [Direction; 6] = [
        Direction::Up,
        Direction::Down,
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit offset for this direction.
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Direction::Up => (0, 1, 0),
            Direction::Down => (0, -1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Direction from `from` to an adjacent `to`, or `None` if they are not
    /// adjacent.
    pub fn between(from: &Position, to: &Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| from.step(*d) == Some(*to))
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Edge length of a region column, in blocks. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionSize(NonZeroU32);

impl RegionSize {
    /// Sixteen blocks, the world's chunk width.
    pub const DEFAULT: RegionSize = RegionSize(NonZeroU32::new(16).unwrap());

    /// Returns `None` for zero or for sizes that do not fit an `i32`.
    pub fn new(size: u32) -> Option<Self> {
        if size > i32::MAX as u32 {
            return None;
        }
        NonZeroU32::new(size).map(RegionSize)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for RegionSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A region ("chunk") key: a vertical column of `size x size` blocks.
///
/// Regions only drive load/unload bookkeeping; pathfinding never looks at
/// them except to ask whether a position is currently loaded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Region {
    pub x: i32,
    pub z: i32,
}

impl Region {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The region containing `pos` on a grid of `size`-wide columns.
    pub fn containing(pos: Position, size: RegionSize) -> Self {
        let s = size.get() as i32;
        Self {
            x: pos.x.div_euclid(s),
            z: pos.z.div_euclid(s),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
