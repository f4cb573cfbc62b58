//! Energy types carried by networks and the units used to display them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EnergyType
// ---------------------------------------------------------------------------

/// The resource a network carries. Every node handler and every stored
/// amount is tagged with exactly one type; operations across types are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    Electrical,
    Steam,
    Nuclear,
    Solar,
}

impl EnergyType {
    pub const ALL: [EnergyType; 4] = [
        EnergyType::Electrical,
        EnergyType::Steam,
        EnergyType::Nuclear,
        EnergyType::Solar,
    ];

    /// Stable string id, as used in data files.
    pub fn id(&self) -> &'static str {
        match self {
            EnergyType::Electrical => "electrical",
            EnergyType::Steam => "steam",
            EnergyType::Nuclear => "nuclear",
            EnergyType::Solar => "solar",
        }
    }
}

impl fmt::Display for EnergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when parsing an unknown energy type id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown energy type '{0}'")]
pub struct ParseEnergyTypeError(pub String);

impl FromStr for EnergyType {
    type Err = ParseEnergyTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnergyType::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| ParseEnergyTypeError(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// EnergyUnit
// ---------------------------------------------------------------------------

/// Display and interchange units.
///
/// Each unit has a fixed rate relative to the internal unit, stored in
/// thousandths so conversions stay exact integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyUnit {
    /// Internal unit (rate 1.0).
    GalacticEnergyUnit,
    /// Rate 1.0.
    ForgeEnergy,
    /// Rate 0.5.
    ThermalUnit,
    /// Rate 2.0.
    KineticUnit,
    /// Rate 0.2.
    SteamUnit,
}

impl EnergyUnit {
    /// Rate relative to the internal unit, in thousandths.
    pub fn milli_rate(&self) -> u64 {
        match self {
            EnergyUnit::GalacticEnergyUnit => 1000,
            EnergyUnit::ForgeEnergy => 1000,
            EnergyUnit::ThermalUnit => 500,
            EnergyUnit::KineticUnit => 2000,
            EnergyUnit::SteamUnit => 200,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            EnergyUnit::GalacticEnergyUnit => "GEU",
            EnergyUnit::ForgeEnergy => "FE",
            EnergyUnit::ThermalUnit => "TU",
            EnergyUnit::KineticUnit => "KU",
            EnergyUnit::SteamUnit => "SU",
        }
    }

    /// Convert `amount` of this unit into `target`, rounding down.
    ///
    /// Saturates at `u64::MAX`.
    pub fn convert_to(&self, amount: u64, target: EnergyUnit) -> u64 {
        let scaled = amount as u128 * self.milli_rate() as u128 / target.milli_rate() as u128;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}
