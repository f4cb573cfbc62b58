//! Voltgrid Core -- primitives shared by every energy network.
//!
//! This crate holds the value types the distribution network is built on:
//! world positions and their coarse regions, energy types and display units,
//! and the capacity-bounded storage every network node wraps.
//!
//! # Key Types
//!
//! - [`position::Position`] -- integer world coordinate with six-way adjacency.
//! - [`position::Region`] -- chunk column used for load/unload bookkeeping.
//! - [`energy::EnergyType`] -- the resource a network (and every node) carries.
//! - [`energy::EnergyUnit`] -- display units with exact integer conversion.
//! - [`storage::EnergyHandler`] -- capability set a node exposes to a network.
//! - [`storage::EnergyStorage`] -- the stock rate-limited accumulator.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point for ratios handed to callers.

pub mod energy;
pub mod fixed;
pub mod position;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
