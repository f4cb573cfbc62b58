//! Serde structs for the on-disk formats.

use serde::Deserialize;
use voltgrid_core::energy::EnergyType;
use voltgrid_core::storage::StorageTier;

// ===========================================================================
// Storage tiers
// ===========================================================================

/// Override of one tier's defaults. Missing numbers keep the built-in value.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageTierData {
    pub tier: StorageTier,
    #[serde(default)]
    pub capacity: Option<u64>,
    #[serde(default)]
    pub transfer_rate: Option<u64>,
}

/// Wrapper for a list of tier overrides in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlStorageTiers {
    pub tiers: Vec<StorageTierData>,
}

// ===========================================================================
// Node templates
// ===========================================================================

/// A named node definition.
///
/// Either `tier` or `capacity` must be given. Rates default to the tier's
/// transfer rate, or to zero without a tier.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeData {
    pub name: String,
    pub energy_type: EnergyType,
    #[serde(default)]
    pub tier: Option<StorageTier>,
    #[serde(default)]
    pub capacity: Option<u64>,
    #[serde(default)]
    pub max_receive: Option<u64>,
    #[serde(default)]
    pub max_extract: Option<u64>,
}

/// Wrapper for a list of node templates in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlNodes {
    pub nodes: Vec<NodeData>,
}
