//! The per-network façade: topology, path cache and configuration in one
//! value, with the operations the world calls.
//!
//! Every change that can alter routes (node added or removed, a region
//! coming back into memory, a merge) drops the whole path cache. Unloading a
//! region does not: cached routes through it are re-checked on the next hit
//! and re-resolved if they cross an untraversable node.

use std::collections::BTreeMap;

use tracing::debug;
use voltgrid_core::energy::EnergyType;
use voltgrid_core::fixed::{Fixed64, Ticks};
use voltgrid_core::position::{Position, Region};
use voltgrid_core::storage::{Action, EnergyHandler};

use crate::cache::{CacheStats, PathCache};
use crate::config::NetworkConfig;
use crate::distribution::{DistributionReport, distribute};
use crate::path::Path;
use crate::pathfinding::{flood_fill, resolve_cached};
use crate::rate_limit::RateLimit;
use crate::region::RegionOracle;
use crate::topology::{BoxedHandler, NetworkTopology};
use crate::transfer::{self, TransferError, TransferReceipt};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why two networks could not be merged. Neither side is modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("cannot merge a {other} network into a {network} network")]
    TypeMismatch {
        network: EnergyType,
        other: EnergyType,
    },
    #[error("both networks hold a node at {0}")]
    Overlap(Position),
}

// ---------------------------------------------------------------------------
// EnergyNetwork
// ---------------------------------------------------------------------------

/// One network of a single energy type.
#[derive(Debug)]
pub struct EnergyNetwork {
    topology: NetworkTopology,
    cache: PathCache,
    config: NetworkConfig,
    rate_limits: BTreeMap<Position, RateLimit>,
}

impl EnergyNetwork {
    /// Empty network with the default configuration.
    pub fn new(energy_type: EnergyType) -> Self {
        Self::with_config(energy_type, NetworkConfig::default())
    }

    pub fn with_config(energy_type: EnergyType, config: NetworkConfig) -> Self {
        Self {
            topology: NetworkTopology::new(energy_type, config.region_size),
            cache: PathCache::new(config.path_ttl),
            config,
            rate_limits: BTreeMap::new(),
        }
    }

    pub fn energy_type(&self) -> EnergyType {
        self.topology.energy_type()
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // -- Nodes --

    /// Register `handler` at `position`. See [`NetworkTopology::add_node`].
    pub fn add_node<H: EnergyHandler + 'static>(&mut self, position: Position, handler: H) -> bool {
        self.add_boxed(position, Box::new(handler))
    }

    pub fn add_boxed(&mut self, position: Position, handler: BoxedHandler) -> bool {
        let added = self.topology.add_node(position, handler);
        if added {
            self.invalidate_paths("node added");
        }
        added
    }

    pub fn remove_node(&mut self, position: Position) -> bool {
        self.take_node(position).is_some()
    }

    /// Remove the node at `position` and hand its handler back.
    pub fn take_node(&mut self, position: Position) -> Option<BoxedHandler> {
        let handler = self.topology.take_node(position)?;
        self.rate_limits.remove(&position);
        self.invalidate_paths("node removed");
        Some(handler)
    }

    pub fn get_node(&self, position: Position) -> Option<&dyn EnergyHandler> {
        self.topology.get_node(position)
    }

    pub fn get_node_mut(&mut self, position: Position) -> Option<&mut dyn EnergyHandler> {
        self.topology.get_node_mut(position)
    }

    pub fn all_nodes(&self) -> Vec<(Position, &dyn EnergyHandler)> {
        self.topology.all_nodes()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.topology.contains(position)
    }

    pub fn len(&self) -> usize {
        self.topology.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topology.is_empty()
    }

    // -- Network-wide energy --

    /// Sum of `stored()` over every node.
    pub fn total_stored(&self) -> u64 {
        self.topology
            .all_nodes()
            .iter()
            .map(|(_, h)| h.stored())
            .sum()
    }

    /// Sum of `capacity()` over every node.
    pub fn total_capacity(&self) -> u64 {
        self.topology
            .all_nodes()
            .iter()
            .map(|(_, h)| h.capacity())
            .sum()
    }

    /// Push `amount` into the network, split evenly over every node that can
    /// receive. Returns the units accepted.
    ///
    /// Nodes are visited in position order and the first `amount % n` of
    /// them are offered one extra unit. A node that takes less than its
    /// share leaves the rest unplaced; nothing is redistributed. Loss and
    /// region load state do not apply.
    pub fn insert(&mut self, amount: u64, action: Action) -> u64 {
        let receivers = self.capable_positions(|h| h.can_receive());
        let accepted = self.spread(&receivers, amount, |h, share| h.receive(share, action));
        if !action.is_simulate() && accepted > 0 {
            debug!(energy_type = %self.energy_type(), amount, accepted, "energy inserted");
        }
        accepted
    }

    /// Pull `amount` out of the network, split evenly over every node that
    /// can extract, with the same remainder rule as [`insert`](Self::insert).
    /// Returns the units released.
    pub fn extract(&mut self, amount: u64, action: Action) -> u64 {
        let providers = self.capable_positions(|h| h.can_extract());
        let released = self.spread(&providers, amount, |h, share| h.extract(share, action));
        if !action.is_simulate() && released > 0 {
            debug!(energy_type = %self.energy_type(), amount, released, "energy extracted");
        }
        released
    }

    fn capable_positions(&self, capable: impl Fn(&dyn EnergyHandler) -> bool) -> Vec<Position> {
        self.topology
            .all_nodes()
            .into_iter()
            .filter(|(_, h)| capable(*h))
            .map(|(p, _)| p)
            .collect()
    }

    fn spread(
        &mut self,
        positions: &[Position],
        amount: u64,
        mut apply: impl FnMut(&mut dyn EnergyHandler, u64) -> u64,
    ) -> u64 {
        if positions.is_empty() || amount == 0 {
            return 0;
        }
        let n = positions.len() as u64;
        let share = amount / n;
        let mut remainder = amount % n;
        let mut moved = 0u64;
        for &position in positions {
            let mut portion = share;
            if remainder > 0 {
                portion += 1;
                remainder -= 1;
            }
            if portion == 0 {
                break;
            }
            if let Some(handler) = self.topology.get_node_mut(position) {
                moved += apply(handler, portion);
            }
        }
        moved
    }

    // -- Rate limits --

    /// Cap what the node at `position` may send through
    /// [`transfer`](Self::transfer) to `per_window` units per
    /// `rate_limit_window` ticks. Replaces any earlier limit and its usage.
    /// Returns `false` if there is no node at `position`.
    pub fn set_transfer_rate_limit(&mut self, position: Position, per_window: u64) -> bool {
        if !self.topology.contains(position) {
            return false;
        }
        self.rate_limits
            .insert(position, RateLimit::new(per_window, self.config.rate_limit_window));
        true
    }

    /// Remove the limit on `position`. Returns `true` if there was one.
    pub fn clear_transfer_rate_limit(&mut self, position: Position) -> bool {
        self.rate_limits.remove(&position).is_some()
    }

    pub fn transfer_rate_limit(&self, position: Position) -> Option<&RateLimit> {
        self.rate_limits.get(&position)
    }

    // -- Paths --

    /// Cache-backed path lookup.
    pub fn find_path(
        &mut self,
        from: Position,
        to: Position,
        world: &impl RegionOracle,
        now: Ticks,
    ) -> Path {
        resolve_cached(
            &mut self.cache,
            &self.topology,
            world,
            from,
            to,
            now,
            self.config.use_path_caching,
        )
    }

    pub fn are_connected(
        &mut self,
        a: Position,
        b: Position,
        world: &impl RegionOracle,
        now: Ticks,
    ) -> bool {
        self.find_path(a, b, world, now).is_reachable()
    }

    /// Fraction of energy lost along `path`.
    pub fn loss_rate(&self, path: &Path) -> Fixed64 {
        self.config.loss_rate(path.len())
    }

    /// Units that may travel `path` in one tick. Zero for an unreachable path.
    pub fn transfer_rate(&self, path: &Path) -> u64 {
        if path.is_empty() {
            0
        } else {
            self.config.transfer_rate_cap
        }
    }

    /// React to a region load-state change reported by the world.
    ///
    /// A region coming into memory can reconnect routes, so every cached
    /// path is dropped. Unloading leaves the cache alone.
    pub fn on_region_status_change(&mut self, region: Region, loaded: bool) {
        if loaded {
            debug!(
                %region,
                energy_type = %self.energy_type(),
                cached = self.cache.len(),
                "region loaded, invalidating paths"
            );
            self.cache.invalidate_all();
        }
    }

    fn invalidate_paths(&mut self, reason: &'static str) {
        if !self.cache.is_empty() {
            debug!(energy_type = %self.energy_type(), reason, "invalidating paths");
        }
        self.cache.invalidate_all();
    }

    // -- Distribution --

    /// Run one distribution pass and return the total delivered to sinks.
    pub fn distribute(&mut self, world: &impl RegionOracle, now: Ticks) -> u64 {
        self.distribute_detailed(world, now).delivered
    }

    pub fn distribute_detailed(&mut self, world: &impl RegionOracle, now: Ticks) -> DistributionReport {
        distribute(&mut self.topology, &mut self.cache, &self.config, world, now)
    }

    /// Move up to `amount` units from one node to another along the cached
    /// route, with the same cap and loss as a distribution pass.
    ///
    /// [`Action::Simulate`] reports what would move without touching either
    /// node. A rate limit on `from` trims the request to what is left of its
    /// budget; only executed transfers are charged against it.
    pub fn transfer(
        &mut self,
        from: Position,
        to: Position,
        amount: u64,
        action: Action,
        world: &impl RegionOracle,
        now: Ticks,
    ) -> Result<TransferReceipt, TransferError> {
        for position in [from, to] {
            if !self.topology.contains(position) {
                return Err(TransferError::MissingNode(position));
            }
            let region = self.topology.region_of(position);
            if !world.is_region_loaded(region) {
                return Err(TransferError::RegionUnloaded { position, region });
            }
        }
        if from == to {
            return Err(TransferError::SameNode(from));
        }

        let path = self.find_path(from, to, world, now);
        if path.is_empty() {
            return Err(TransferError::NoPath { from, to });
        }

        let requested = match self.rate_limits.get(&from) {
            Some(limit) => {
                let remaining = limit.remaining(now);
                if remaining == 0 && amount > 0 {
                    return Err(TransferError::RateLimited(from));
                }
                amount.min(remaining)
            }
            None => amount,
        };

        let receipt = transfer::execute(
            &mut self.topology,
            &self.config,
            from,
            to,
            path.len(),
            requested,
            action,
        )?;
        if !action.is_simulate() {
            if let Some(limit) = self.rate_limits.get_mut(&from) {
                limit.record(now, receipt.extracted);
            }
        }
        Ok(receipt)
    }

    // -- Merge / split --

    /// Move every node of `other` into this network.
    ///
    /// On error neither network changes. On success `other` is left empty.
    pub fn merge(&mut self, other: &mut EnergyNetwork) -> Result<(), MergeError> {
        if other.energy_type() != self.energy_type() {
            return Err(MergeError::TypeMismatch {
                network: self.energy_type(),
                other: other.energy_type(),
            });
        }
        if let Some(position) = other.topology.positions().find(|p| self.topology.contains(*p)) {
            return Err(MergeError::Overlap(position));
        }

        let moved = other.topology.drain();
        let count = moved.len();
        self.rate_limits.append(&mut other.rate_limits);
        for (position, handler) in moved {
            // Types and positions were checked above.
            let added = self.topology.add_node(position, handler);
            debug_assert!(added, "merge failed to add node at {position}");
        }
        other.cache.invalidate_all();
        self.cache.invalidate_all();
        debug!(energy_type = %self.energy_type(), moved = count, total = self.len(), "networks merged");
        Ok(())
    }

    /// `true` if every node is 6-connected to every other, ignoring region
    /// load state. An empty network counts as connected.
    pub fn is_contiguous(&self) -> bool {
        match self.topology.positions().next() {
            Some(first) => flood_fill(&self.topology, first).len() == self.len(),
            None => true,
        }
    }

    /// Break the network into its connected components, one network each,
    /// ordered by each component's smallest position. Every piece keeps this
    /// network's configuration and starts with an empty cache.
    pub fn split_components(mut self) -> Vec<EnergyNetwork> {
        let energy_type = self.energy_type();
        let mut pieces = Vec::new();

        loop {
            let Some(start) = self.topology.positions().next() else {
                break;
            };
            let component = flood_fill(&self.topology, start);
            let mut piece = EnergyNetwork::with_config(energy_type, self.config.clone());
            for position in component {
                if let Some(handler) = self.topology.take_node(position) {
                    piece.topology.add_node(position, handler);
                }
                if let Some(limit) = self.rate_limits.remove(&position) {
                    piece.rate_limits.insert(position, limit);
                }
            }
            pieces.push(piece);
        }

        if pieces.len() > 1 {
            debug!(%energy_type, components = pieces.len(), "network split");
        }
        pieces
    }
}
