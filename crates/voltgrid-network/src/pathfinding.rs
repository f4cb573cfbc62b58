//! A* search over the implicit six-neighbour grid of a network's nodes.
//!
//! Only positions that hold a node of the network *and* lie in a loaded
//! region are traversable. Every hop costs 1 and the heuristic is Manhattan
//! distance, which is consistent on this grid, so the first time the
//! destination is popped its path has the minimum hop count.
//!
//! Results are deterministic for a given topology: neighbours are expanded
//! in [`Direction::ALL`](voltgrid_core::position::Direction::ALL) order and
//! equal f-scores pop in insertion order.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use tracing::trace;
use voltgrid_core::fixed::Ticks;
use voltgrid_core::position::Position;

use crate::cache::PathCache;
use crate::path::Path;
use crate::region::RegionOracle;
use crate::topology::NetworkTopology;

/// Frontier entry, ordered so the max-heap pops the lowest f-score first and
/// breaks ties by insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    seq: u64,
    g: u32,
    position: Position,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a minimum-hop path from `from` to `to`.
///
/// Returns [`Path::unreachable`] if either endpoint is not traversable or the
/// frontier is exhausted. `from == to` yields a single-position path.
pub fn find_path(
    topology: &NetworkTopology,
    world: &impl RegionOracle,
    from: Position,
    to: Position,
) -> Path {
    if !topology.is_traversable(from, world) || !topology.is_traversable(to, world) {
        return Path::unreachable();
    }
    if from == to {
        return Path::from_positions(vec![from]);
    }

    let mut open = BinaryHeap::new();
    let mut g_score: HashMap<Position, u32> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut closed: HashSet<Position> = HashSet::new();
    let mut seq = 0u64;

    g_score.insert(from, 0);
    open.push(OpenEntry {
        f: from.manhattan_distance(&to),
        seq,
        g: 0,
        position: from,
    });

    while let Some(current) = open.pop() {
        if current.position == to {
            return reconstruct(&came_from, from, to);
        }
        // Already expanded through a cheaper entry.
        if !closed.insert(current.position) {
            continue;
        }

        let tentative = current.g + 1;
        for neighbor in current.position.neighbors() {
            if closed.contains(&neighbor) || !topology.is_traversable(neighbor, world) {
                continue;
            }
            if g_score.get(&neighbor).is_some_and(|&g| g <= tentative) {
                continue;
            }
            g_score.insert(neighbor, tentative);
            came_from.insert(neighbor, current.position);
            seq += 1;
            open.push(OpenEntry {
                f: tentative.saturating_add(neighbor.manhattan_distance(&to)),
                seq,
                g: tentative,
                position: neighbor,
            });
        }
    }

    Path::unreachable()
}

/// Resolve a path through `cache`, searching on a miss.
///
/// A cached route that now crosses a position that is no longer
/// traversable (its region unloaded, or the node gone) is discarded and the
/// pair searched again. Cached unreachable results are served as-is until
/// they expire or the cache is invalidated. With `use_cache == false` every
/// call searches.
pub fn resolve_cached(
    cache: &mut PathCache,
    topology: &NetworkTopology,
    world: &impl RegionOracle,
    from: Position,
    to: Position,
    now: Ticks,
    use_cache: bool,
) -> Path {
    let search = || find_path(topology, world, from, to);
    if !use_cache {
        return search();
    }
    match cache.lookup(from, to, now) {
        Some(path) if path.iter().all(|p| topology.is_traversable(*p, world)) => {
            return path.clone();
        }
        Some(_) => trace!(%from, %to, "cached path crosses an untraversable node, re-resolving"),
        None => {}
    }
    cache.resolve_fresh(from, to, now, search)
}

/// Walk back-pointers from `to` to `from`, then reverse.
fn reconstruct(came_from: &HashMap<Position, Position>, from: Position, to: Position) -> Path {
    let mut positions = vec![to];
    let mut current = to;
    while current != from {
        match came_from.get(&current) {
            Some(&prev) => {
                positions.push(prev);
                current = prev;
            }
            None => return Path::unreachable(),
        }
    }
    positions.reverse();
    Path::from_positions(positions)
}

/// Every node position 6-connected to `start`, ignoring region load state.
///
/// Empty if `start` is not a node.
pub fn flood_fill(topology: &NetworkTopology, start: Position) -> BTreeSet<Position> {
    let mut visited = BTreeSet::new();
    if !topology.contains(start) {
        return visited;
    }
    let mut stack = vec![start];
    visited.insert(start);
    while let Some(current) = stack.pop() {
        for neighbor in current.neighbors() {
            if topology.contains(neighbor) && visited.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }
    visited
}
