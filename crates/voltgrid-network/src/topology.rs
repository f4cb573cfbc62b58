//! Node storage for a single network: a position map plus a region index.
//!
//! The region index groups node positions by [`Region`] so load/unload
//! events can be mapped to the nodes they affect without a full scan. It is
//! maintained incrementally by [`add_node`](NetworkTopology::add_node) and
//! [`remove_node`](NetworkTopology::remove_node) and is always consistent
//! with the position map; a mismatch is a bug and panics.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use voltgrid_core::energy::EnergyType;
use voltgrid_core::position::{Position, Region, RegionSize};
use voltgrid_core::storage::EnergyHandler;

use crate::region::RegionOracle;

/// A heap-allocated node handler.
pub type BoxedHandler = Box<dyn EnergyHandler>;

/// The nodes of one network, keyed by position.
#[derive(Debug)]
pub struct NetworkTopology {
    energy_type: EnergyType,
    region_size: RegionSize,
    nodes: BTreeMap<Position, BoxedHandler>,
    regions: BTreeMap<Region, BTreeSet<Position>>,
}

impl NetworkTopology {
    /// Create an empty topology for `energy_type`.
    pub fn new(energy_type: EnergyType, region_size: RegionSize) -> Self {
        Self {
            energy_type,
            region_size,
            nodes: BTreeMap::new(),
            regions: BTreeMap::new(),
        }
    }

    pub fn energy_type(&self) -> EnergyType {
        self.energy_type
    }

    pub fn region_size(&self) -> RegionSize {
        self.region_size
    }

    /// The region a position belongs to.
    pub fn region_of(&self, position: Position) -> Region {
        Region::containing(position, self.region_size)
    }

    // -- Mutation --

    /// Register a handler at `position`.
    ///
    /// Returns `false` without mutating if the position is occupied or the
    /// handler carries a different energy type than the network.
    pub fn add_node(&mut self, position: Position, handler: BoxedHandler) -> bool {
        if self.nodes.contains_key(&position) {
            debug!(%position, "add_node rejected: position occupied");
            return false;
        }
        if handler.energy_type() != self.energy_type {
            debug!(
                %position,
                network_type = %self.energy_type,
                handler_type = %handler.energy_type(),
                "add_node rejected: energy type mismatch"
            );
            return false;
        }

        let region = self.region_of(position);
        self.nodes.insert(position, handler);
        self.regions.entry(region).or_default().insert(position);
        true
    }

    /// Unregister the node at `position`. Returns `false` if there is none.
    pub fn remove_node(&mut self, position: Position) -> bool {
        self.take_node(position).is_some()
    }

    /// Unregister the node at `position` and hand its handler back.
    pub fn take_node(&mut self, position: Position) -> Option<BoxedHandler> {
        let handler = self.nodes.remove(&position)?;
        let region = self.region_of(position);

        let emptied = match self.regions.get_mut(&region) {
            Some(members) => {
                assert!(
                    members.remove(&position),
                    "region index out of sync: {position} missing from region {region}"
                );
                members.is_empty()
            }
            None => panic!("region index out of sync: region {region} missing for {position}"),
        };
        if emptied {
            self.regions.remove(&region);
        }

        Some(handler)
    }

    /// Remove and return every node, in position order.
    pub fn drain(&mut self) -> Vec<(Position, BoxedHandler)> {
        self.regions.clear();
        std::mem::take(&mut self.nodes).into_iter().collect()
    }

    // -- Queries --

    pub fn get_node(&self, position: Position) -> Option<&dyn EnergyHandler> {
        self.nodes.get(&position).map(|h| h.as_ref())
    }

    pub fn get_node_mut(&mut self, position: Position) -> Option<&mut dyn EnergyHandler> {
        match self.nodes.get_mut(&position) {
            Some(handler) => Some(handler.as_mut()),
            None => None,
        }
    }

    /// Snapshot of every node, in position order.
    pub fn all_nodes(&self) -> Vec<(Position, &dyn EnergyHandler)> {
        self.nodes.iter().map(|(p, h)| (*p, h.as_ref())).collect()
    }

    /// All node positions, in order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.nodes.keys().copied()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.nodes.contains_key(&position)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Regions that currently hold at least one node.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.regions.keys().copied()
    }

    /// `true` if any node lies in `region`.
    pub fn has_nodes_in(&self, region: Region) -> bool {
        self.regions.contains_key(&region)
    }

    /// Node positions inside `region`, in order.
    pub fn nodes_in_region(&self, region: Region) -> impl Iterator<Item = Position> + '_ {
        self.regions.get(&region).into_iter().flatten().copied()
    }

    /// `true` if `position` holds a node whose region is loaded.
    pub fn is_traversable(&self, position: Position, world: &impl RegionOracle) -> bool {
        self.nodes.contains_key(&position) && world.is_region_loaded(self.region_of(position))
    }

    /// Verify the region index matches the position map exactly.
    pub fn check_region_index(&self) -> bool {
        let indexed: usize = self.regions.values().map(BTreeSet::len).sum();
        indexed == self.nodes.len()
            && self.regions.iter().all(|(region, members)| {
                !members.is_empty()
                    && members
                        .iter()
                        .all(|p| self.nodes.contains_key(p) && self.region_of(*p) == *region)
            })
    }
}
