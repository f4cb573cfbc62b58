//! Network fixtures for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use voltgrid_core::energy::EnergyType;
use voltgrid_core::position::Position;
use voltgrid_core::test_utils::{cable, pos, px};

use crate::config::NetworkConfig;
use crate::network::EnergyNetwork;

/// Electrical network of cables along the x axis from `0` to `n - 1`.
pub fn line(n: i32) -> EnergyNetwork {
    let mut net = EnergyNetwork::new(EnergyType::Electrical);
    for x in 0..n {
        net.add_node(px(x), cable());
    }
    net
}

/// Electrical network of cables filling the `w` by `d` rectangle at `y = 0`.
pub fn grid(w: i32, d: i32) -> EnergyNetwork {
    grid_with_config(w, d, NetworkConfig::default())
}

pub fn grid_with_config(w: i32, d: i32, config: NetworkConfig) -> EnergyNetwork {
    let mut net = EnergyNetwork::with_config(EnergyType::Electrical, config);
    for x in 0..w {
        for z in 0..d {
            net.add_node(pos(x, 0, z), cable());
        }
    }
    net
}

/// Replace the node at `position` (if any) with `handler`.
pub fn replace(
    net: &mut EnergyNetwork,
    position: Position,
    handler: impl voltgrid_core::storage::EnergyHandler + 'static,
) {
    net.remove_node(position);
    net.add_node(position, handler);
}
