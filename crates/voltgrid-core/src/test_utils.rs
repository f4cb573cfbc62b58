//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::energy::EnergyType;
use crate::position::Position;
use crate::storage::EnergyStorage;

pub fn pos(x: i32, y: i32, z: i32) -> Position {
    Position::new(x, y, z)
}

/// Position on the x axis at height 0.
pub fn px(x: i32) -> Position {
    Position::new(x, 0, 0)
}

/// Electrical storage with equal receive/extract rates.
pub fn battery(stored: u64, capacity: u64, rate: u64) -> EnergyStorage {
    EnergyStorage::new(EnergyType::Electrical, capacity, rate, rate).with_stored(stored)
}

/// Full electrical storage that can only release energy.
pub fn generator(capacity: u64, rate: u64) -> EnergyStorage {
    EnergyStorage::new(EnergyType::Electrical, capacity, 0, rate).with_stored(capacity)
}

/// Empty electrical storage that can only accept energy.
pub fn consumer(capacity: u64, rate: u64) -> EnergyStorage {
    EnergyStorage::new(EnergyType::Electrical, capacity, rate, 0)
}

/// Electrical storage with no rate at all, used as a pass-through conduit.
pub fn cable() -> EnergyStorage {
    EnergyStorage::new(EnergyType::Electrical, 0, 0, 0)
}

/// Storage of an arbitrary type with equal rates.
pub fn storage_of(energy_type: EnergyType, stored: u64, capacity: u64, rate: u64) -> EnergyStorage {
    EnergyStorage::new(energy_type, capacity, rate, rate).with_stored(stored)
}
