use serde::{Deserialize, Serialize};
use voltgrid_core::position::Position;

/// An ordered, hop-adjacent route from source to destination, inclusive.
///
/// An empty path means the destination is unreachable. That is a normal
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Position>);

impl Path {
    /// The "unreachable" path.
    pub fn unreachable() -> Self {
        Self(Vec::new())
    }

    /// Wrap a position sequence. Debug builds check that consecutive
    /// positions are adjacent.
    pub fn from_positions(positions: Vec<Position>) -> Self {
        debug_assert!(
            positions.windows(2).all(|w| w[0].is_adjacent(&w[1])),
            "path positions must be hop-adjacent"
        );
        Self(positions)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if the path reaches its destination.
    pub fn is_reachable(&self) -> bool {
        !self.0.is_empty()
    }

    /// Number of positions, endpoints included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of hops (`len - 1`), zero for empty and single-position paths.
    pub fn hops(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn source(&self) -> Option<Position> {
        self.0.first().copied()
    }

    pub fn destination(&self) -> Option<Position> {
        self.0.last().copied()
    }

    pub fn positions(&self) -> &[Position] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.0.iter()
    }

    pub fn into_positions(self) -> Vec<Position> {
        self.0
    }
}
