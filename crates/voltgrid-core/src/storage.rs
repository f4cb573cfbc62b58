//! Capacity-bounded, rate-limited energy storage and the handler capability
//! set networks operate on.

use serde::{Deserialize, Serialize};

use crate::energy::EnergyType;
use crate::fixed::{Fixed64, unit_ratio};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Whether a receive/extract call mutates the storage or only reports what
/// it would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Apply the change.
    Execute,
    /// Dry run: compute the result without mutating.
    Simulate,
}

impl Action {
    pub fn is_simulate(&self) -> bool {
        matches!(self, Action::Simulate)
    }
}

// ---------------------------------------------------------------------------
// EnergyHandler trait
// ---------------------------------------------------------------------------

/// Capability set a network node exposes.
///
/// Implementors must keep `stored()` within `[0, capacity()]` under any
/// sequence of `receive`/`extract` calls and must never accept or release
/// more than requested.
pub trait EnergyHandler: std::fmt::Debug {
    /// The energy type this handler stores.
    fn energy_type(&self) -> EnergyType;

    /// Amount currently stored.
    fn stored(&self) -> u64;

    /// Maximum amount this handler can hold.
    fn capacity(&self) -> u64;

    /// Maximum accepted per `receive` call.
    fn max_receive(&self) -> u64;

    /// Maximum released per `extract` call.
    fn max_extract(&self) -> u64;

    /// Accept up to `amount`; returns how much was (or would be) accepted.
    fn receive(&mut self, amount: u64, action: Action) -> u64;

    /// Release up to `amount`; returns how much was (or would be) released.
    fn extract(&mut self, amount: u64, action: Action) -> u64;

    /// `true` when the handler can currently release energy.
    fn can_extract(&self) -> bool {
        self.max_extract() > 0 && self.stored() > 0
    }

    /// `true` when the handler can currently accept energy.
    fn can_receive(&self) -> bool {
        self.max_receive() > 0 && self.stored() < self.capacity()
    }

    /// Free space left before the handler is full.
    fn headroom(&self) -> u64 {
        self.capacity().saturating_sub(self.stored())
    }

    /// Fill level as a ratio in [0, 1].
    fn fill_ratio(&self) -> Fixed64 {
        unit_ratio(self.stored(), self.capacity())
    }
}

// ---------------------------------------------------------------------------
// Storage tiers
// ---------------------------------------------------------------------------

/// Preset capacity / rate tiers for storage blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageTier {
    Basic,
    Advanced,
    Elite,
    Ultimate,
}

impl StorageTier {
    pub const ALL: [StorageTier; 4] = [
        StorageTier::Basic,
        StorageTier::Advanced,
        StorageTier::Elite,
        StorageTier::Ultimate,
    ];

    /// Default capacity for the tier.
    pub fn default_capacity(&self) -> u64 {
        match self {
            StorageTier::Basic => 10_000,
            StorageTier::Advanced => 50_000,
            StorageTier::Elite => 250_000,
            StorageTier::Ultimate => 1_000_000,
        }
    }

    /// Default receive and extract rate for the tier.
    pub fn default_transfer_rate(&self) -> u64 {
        match self {
            StorageTier::Basic => 100,
            StorageTier::Advanced => 500,
            StorageTier::Elite => 2_500,
            StorageTier::Ultimate => 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// EnergyStorage
// ---------------------------------------------------------------------------

/// The stock accumulator: fixed capacity and rate limits, mutated only via
/// [`receive`](EnergyHandler::receive) and [`extract`](EnergyHandler::extract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyStorage {
    energy_type: EnergyType,
    capacity: u64,
    max_receive: u64,
    max_extract: u64,
    /// Clamped to [0, capacity].
    stored: u64,
}

impl EnergyStorage {
    /// Create an empty storage. Rates above `capacity` are clamped to it.
    pub fn new(energy_type: EnergyType, capacity: u64, max_receive: u64, max_extract: u64) -> Self {
        Self {
            energy_type,
            capacity,
            max_receive: max_receive.min(capacity),
            max_extract: max_extract.min(capacity),
            stored: 0,
        }
    }

    /// Create a storage pre-filled with `stored` (clamped to capacity).
    pub fn with_stored(mut self, stored: u64) -> Self {
        self.set_stored(stored);
        self
    }

    /// Storage using the tier's default capacity and transfer rate.
    pub fn from_tier(energy_type: EnergyType, tier: StorageTier) -> Self {
        let rate = tier.default_transfer_rate();
        Self::new(energy_type, tier.default_capacity(), rate, rate)
    }

    /// Overwrite the stored amount, clamped to [0, capacity].
    pub fn set_stored(&mut self, stored: u64) {
        self.stored = stored.min(self.capacity);
    }

    pub fn is_full(&self) -> bool {
        self.stored >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.stored == 0
    }
}

impl EnergyHandler for EnergyStorage {
    fn energy_type(&self) -> EnergyType {
        self.energy_type
    }

    fn stored(&self) -> u64 {
        self.stored
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn max_receive(&self) -> u64 {
        self.max_receive
    }

    fn max_extract(&self) -> u64 {
        self.max_extract
    }

    fn receive(&mut self, amount: u64, action: Action) -> u64 {
        let accepted = self
            .capacity
            .saturating_sub(self.stored)
            .min(self.max_receive)
            .min(amount);
        if !action.is_simulate() {
            self.stored = (self.stored + accepted).min(self.capacity);
        }
        accepted
    }

    fn extract(&mut self, amount: u64, action: Action) -> u64 {
        let released = self.stored.min(self.max_extract).min(amount);
        if !action.is_simulate() {
            self.stored -= released;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn battery(capacity: u64, rate: u64) -> EnergyStorage {
        EnergyStorage::new(EnergyType::Electrical, capacity, rate, rate)
    }

    #[test]
    fn receive_is_bounded_by_rate_headroom_and_request() {
        let mut s = battery(1000, 300);
        assert_eq!(s.receive(500, Action::Execute), 300);
        assert_eq!(s.stored(), 300);
        assert_eq!(s.receive(50, Action::Execute), 50);
        assert_eq!(s.stored(), 350);

        let mut s = battery(1000, 1000).with_stored(900);
        assert_eq!(s.receive(500, Action::Execute), 100);
        assert!(s.is_full());
    }

    #[test]
    fn extract_is_bounded_by_rate_stored_and_request() {
        let mut s = battery(1000, 300).with_stored(1000);
        assert_eq!(s.extract(500, Action::Execute), 300);
        assert_eq!(s.stored(), 700);

        let mut s = battery(1000, 1000).with_stored(40);
        assert_eq!(s.extract(500, Action::Execute), 40);
        assert!(s.is_empty());
    }

    #[test]
    fn simulate_does_not_mutate() {
        let mut s = battery(1000, 1000).with_stored(500);
        assert_eq!(s.receive(200, Action::Simulate), 200);
        assert_eq!(s.extract(200, Action::Simulate), 200);
        assert_eq!(s.stored(), 500);
    }

    #[test]
    fn capability_flags_follow_state_and_rates() {
        let empty = battery(100, 10);
        assert!(!empty.can_extract());
        assert!(empty.can_receive());

        let full = battery(100, 10).with_stored(100);
        assert!(full.can_extract());
        assert!(!full.can_receive());

        let generator = EnergyStorage::new(EnergyType::Electrical, 100, 0, 10).with_stored(50);
        assert!(!generator.can_receive());
        assert!(generator.can_extract());
    }

    #[test]
    fn construction_clamps_stored_and_rates() {
        let s = EnergyStorage::new(EnergyType::Steam, 100, 500, 500).with_stored(9999);
        assert_eq!(s.stored(), 100);
        assert_eq!(s.max_receive(), 100);
        assert_eq!(s.max_extract(), 100);
    }

    #[test]
    fn tier_defaults() {
        let s = EnergyStorage::from_tier(EnergyType::Electrical, StorageTier::Elite);
        assert_eq!(s.capacity(), 250_000);
        assert_eq!(s.max_receive(), 2_500);
        assert_eq!(s.max_extract(), 2_500);
        assert_eq!(s.stored(), 0);
    }

    #[test]
    fn fill_ratio_and_headroom() {
        let s = battery(1000, 10).with_stored(250);
        assert_eq!(s.fill_ratio(), Fixed64::from_num(0.25));
        assert_eq!(s.headroom(), 750);
        assert_eq!(battery(0, 0).fill_ratio(), Fixed64::ZERO);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Receive(u64, bool),
        Extract(u64, bool),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u64>(), any::<bool>()).prop_map(|(a, s)| Op::Receive(a, s)),
            (any::<u64>(), any::<bool>()).prop_map(|(a, s)| Op::Extract(a, s)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Stored amount never leaves [0, capacity], even under u64::MAX requests.
        #[test]
        fn stored_stays_within_capacity(
            capacity in 0u64..100_000,
            rate in 0u64..200_000,
            initial in any::<u64>(),
            ops in proptest::collection::vec(arb_op(), 1..64),
        ) {
            let mut s = battery(capacity, rate).with_stored(initial);
            prop_assert!(s.stored() <= capacity);
            for op in ops {
                let before = s.stored();
                match op {
                    Op::Receive(amount, simulate) => {
                        let action = if simulate { Action::Simulate } else { Action::Execute };
                        let accepted = s.receive(amount, action);
                        prop_assert!(accepted <= amount);
                        if simulate {
                            prop_assert_eq!(s.stored(), before);
                        } else {
                            prop_assert_eq!(s.stored(), before + accepted);
                        }
                    }
                    Op::Extract(amount, simulate) => {
                        let action = if simulate { Action::Simulate } else { Action::Execute };
                        let released = s.extract(amount, action);
                        prop_assert!(released <= amount);
                        if simulate {
                            prop_assert_eq!(s.stored(), before);
                        } else {
                            prop_assert_eq!(s.stored(), before - released);
                        }
                    }
                }
                prop_assert!(s.stored() <= capacity);
            }
        }
    }
}
