//! Owner of every network in a world.
//!
//! The registry keeps networks in a [`SlotMap`] keyed by [`NetworkId`],
//! tracks which regions are loaded, and buffers region load/unload events
//! reported by the world. Buffered events are applied at the start of the
//! next [`tick`](NetworkRegistry::tick), never in the middle of a
//! distribution pass.
//!
//! Placing a node next to nodes of one or more same-type networks joins them
//! into one; removing a node that held a network together splits it.

use slotmap::{SlotMap, new_key_type};
use tracing::debug;
use voltgrid_core::energy::EnergyType;
use voltgrid_core::fixed::Ticks;
use voltgrid_core::position::{Position, Region};

use crate::config::NetworkConfig;
use crate::distribution::DistributionReport;
use crate::network::{EnergyNetwork, MergeError};
use crate::region::LoadedRegions;
use crate::topology::BoxedHandler;

new_key_type! {
    /// Identifies a network inside a [`NetworkRegistry`].
    pub struct NetworkId;
}

// ---------------------------------------------------------------------------
// Events and results
// ---------------------------------------------------------------------------

/// A region load-state change reported by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEvent {
    pub region: Region,
    pub loaded: bool,
}

/// What one registry tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick that was simulated.
    pub tick: Ticks,
    /// Region events applied before distribution.
    pub region_events: usize,
    /// Per-network distribution reports, in key order.
    pub reports: Vec<(NetworkId, DistributionReport)>,
}

impl TickSummary {
    /// Total delivered to sinks across every network.
    pub fn delivered(&self) -> u64 {
        self.reports.iter().map(|(_, r)| r.delivered).sum()
    }

    /// Total lost in transit across every network.
    pub fn lost(&self) -> u64 {
        self.reports.iter().map(|(_, r)| r.lost).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a {energy_type} network already holds a node at {position}")]
    Occupied {
        energy_type: EnergyType,
        position: Position,
    },
    #[error("no {energy_type} node at {position}")]
    NodeNotFound {
        energy_type: EnergyType,
        position: Position,
    },
    #[error(transparent)]
    Merge(#[from] MergeError),
}

// ---------------------------------------------------------------------------
// NetworkRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NetworkRegistry {
    networks: SlotMap<NetworkId, EnergyNetwork>,
    loaded: LoadedRegions,
    pending: Vec<RegionEvent>,
    tick: Ticks,
    config: NetworkConfig,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose new networks all use `config`.
    pub fn with_config(config: NetworkConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The tick the next call to [`tick`](Self::tick) will simulate.
    pub fn current_tick(&self) -> Ticks {
        self.tick
    }

    pub fn loaded_regions(&self) -> &LoadedRegions {
        &self.loaded
    }

    // -- Networks --

    /// Create an empty network.
    pub fn create_network(&mut self, energy_type: EnergyType) -> NetworkId {
        let network = EnergyNetwork::with_config(energy_type, self.config.clone());
        self.networks.insert(network)
    }

    pub fn network(&self, id: NetworkId) -> Option<&EnergyNetwork> {
        self.networks.get(id)
    }

    pub fn network_mut(&mut self, id: NetworkId) -> Option<&mut EnergyNetwork> {
        self.networks.get_mut(id)
    }

    pub fn remove_network(&mut self, id: NetworkId) -> Option<EnergyNetwork> {
        self.networks.remove(id)
    }

    /// Every network, in key order.
    pub fn networks(&self) -> impl Iterator<Item = (NetworkId, &EnergyNetwork)> {
        self.networks.iter()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// The `energy_type` network holding a node at `position`, if any.
    pub fn network_at(&self, energy_type: EnergyType, position: Position) -> Option<NetworkId> {
        self.networks
            .iter()
            .find(|(_, n)| n.energy_type() == energy_type && n.contains(position))
            .map(|(id, _)| id)
    }

    // -- Nodes --

    /// Place a node, joining it to every adjacent network of its type.
    ///
    /// With no such neighbour a new network is created. With several, they
    /// are merged into the one with the lowest key. Returns the network the
    /// node ended up in.
    pub fn connect_node(
        &mut self,
        position: Position,
        handler: BoxedHandler,
    ) -> Result<NetworkId, RegistryError> {
        let energy_type = handler.energy_type();
        if self.network_at(energy_type, position).is_some() {
            return Err(RegistryError::Occupied {
                energy_type,
                position,
            });
        }

        let mut adjacent: Vec<NetworkId> = position
            .neighbors()
            .filter_map(|n| self.network_at(energy_type, n))
            .collect();
        adjacent.sort();
        adjacent.dedup();

        let target = match adjacent.split_first() {
            None => self.create_network(energy_type),
            Some((&first, rest)) => {
                for &id in rest {
                    self.absorb(first, id)?;
                }
                first
            }
        };

        let network = self
            .networks
            .get_mut(target)
            .ok_or(RegistryError::NodeNotFound {
                energy_type,
                position,
            })?;
        if !network.add_boxed(position, handler) {
            return Err(RegistryError::Occupied {
                energy_type,
                position,
            });
        }
        debug!(%position, %energy_type, ?target, joined = adjacent.len(), "node connected");
        Ok(target)
    }

    /// Remove a node and hand its handler back.
    ///
    /// A network left empty is dropped. A network left in pieces is replaced
    /// by one network per piece.
    pub fn disconnect_node(
        &mut self,
        energy_type: EnergyType,
        position: Position,
    ) -> Result<BoxedHandler, RegistryError> {
        let not_found = RegistryError::NodeNotFound {
            energy_type,
            position,
        };
        let id = self.network_at(energy_type, position).ok_or(not_found.clone())?;
        let network = self.networks.get_mut(id).ok_or(not_found.clone())?;
        let handler = network.take_node(position).ok_or(not_found)?;

        if network.is_empty() {
            self.networks.remove(id);
            debug!(%position, %energy_type, ?id, "last node removed, network dropped");
        } else if !network.is_contiguous() {
            if let Some(network) = self.networks.remove(id) {
                let pieces = network.split_components();
                debug!(%position, %energy_type, ?id, pieces = pieces.len(), "network split");
                for piece in pieces {
                    self.networks.insert(piece);
                }
            }
        }
        Ok(handler)
    }

    /// Merge network `from` into `into`. On failure `from` is put back under
    /// a fresh key.
    fn absorb(&mut self, into: NetworkId, from: NetworkId) -> Result<(), RegistryError> {
        let Some(mut other) = self.networks.remove(from) else {
            return Ok(());
        };
        let result = match self.networks.get_mut(into) {
            Some(target) => target.merge(&mut other),
            None => Ok(()),
        };
        if let Err(e) = result {
            self.networks.insert(other);
            return Err(e.into());
        }
        Ok(())
    }

    // -- Region events --

    /// Buffer a region load-state change until the next tick.
    pub fn queue_region_change(&mut self, region: Region, loaded: bool) {
        self.pending.push(RegionEvent { region, loaded });
    }

    /// Number of buffered region events.
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    // -- Tick --

    /// Apply buffered region events, run one distribution pass on every
    /// network, and advance the clock.
    pub fn tick(&mut self) -> TickSummary {
        let now = self.tick;
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            let changed = self.loaded.set_loaded(event.region, event.loaded);
            debug!(tick = now, region = %event.region, loaded = event.loaded, changed, "region event");
            // Repeating a region's current state is not a transition.
            if !changed {
                continue;
            }
            for network in self.networks.values_mut() {
                network.on_region_status_change(event.region, event.loaded);
            }
        }

        let mut reports = Vec::with_capacity(self.networks.len());
        for (id, network) in self.networks.iter_mut() {
            reports.push((id, network.distribute_detailed(&self.loaded, now)));
        }

        self.tick += 1;
        TickSummary {
            tick: now,
            region_events: events.len(),
            reports,
        }
    }
}
