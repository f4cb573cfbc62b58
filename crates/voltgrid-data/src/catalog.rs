//! Resolved tier and node tables built from data files.

use std::collections::BTreeMap;

use voltgrid_core::energy::EnergyType;
use voltgrid_core::storage::{EnergyStorage, StorageTier};

// ===========================================================================
// Tiers
// ===========================================================================

/// Capacity and transfer rate of one storage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSpec {
    pub capacity: u64,
    pub transfer_rate: u64,
}

impl TierSpec {
    /// Built-in numbers for `tier`.
    pub fn builtin(tier: StorageTier) -> Self {
        Self {
            capacity: tier.default_capacity(),
            transfer_rate: tier.default_transfer_rate(),
        }
    }
}

/// Every storage tier with its (possibly overridden) numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    specs: BTreeMap<StorageTier, TierSpec>,
}

impl Default for TierTable {
    fn default() -> Self {
        let specs = StorageTier::ALL
            .iter()
            .map(|&tier| (tier, TierSpec::builtin(tier)))
            .collect();
        Self { specs }
    }
}

impl TierTable {
    pub fn get(&self, tier: StorageTier) -> TierSpec {
        self.specs
            .get(&tier)
            .copied()
            .unwrap_or_else(|| TierSpec::builtin(tier))
    }

    pub fn set(&mut self, tier: StorageTier, spec: TierSpec) {
        self.specs.insert(tier, spec);
    }

    /// Empty storage of `energy_type` using this table's numbers for `tier`.
    pub fn build(&self, energy_type: EnergyType, tier: StorageTier) -> EnergyStorage {
        let spec = self.get(tier);
        EnergyStorage::new(energy_type, spec.capacity, spec.transfer_rate, spec.transfer_rate)
    }
}

// ===========================================================================
// Node templates
// ===========================================================================

/// A fully resolved node definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTemplate {
    pub energy_type: EnergyType,
    pub capacity: u64,
    pub max_receive: u64,
    pub max_extract: u64,
}

impl NodeTemplate {
    /// Fresh, empty storage built from this template.
    pub fn build(&self) -> EnergyStorage {
        EnergyStorage::new(self.energy_type, self.capacity, self.max_receive, self.max_extract)
    }
}

/// Node templates by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCatalog {
    templates: BTreeMap<String, NodeTemplate>,
}

impl NodeCatalog {
    pub fn get(&self, name: &str) -> Option<&NodeTemplate> {
        self.templates.get(name)
    }

    /// Build a storage from the named template.
    pub fn build(&self, name: &str) -> Option<EnergyStorage> {
        self.get(name).map(NodeTemplate::build)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, template: NodeTemplate) {
        self.templates.insert(name, template);
    }
}
