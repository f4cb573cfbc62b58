//! Voltgrid Network -- routing and distribution of energy between nodes.
//!
//! A network is a set of nodes of one [`EnergyType`](voltgrid_core::energy::EnergyType)
//! placed at integer positions. Two nodes are linked when their positions
//! are adjacent. Each tick, energy flows from nodes that can release it to
//! nodes that can accept it along the shortest route, losing one percent
//! per hop (capped at half) and moving at most a fixed amount per route.
//!
//! # Key Types
//!
//! - [`topology::NetworkTopology`] -- node map plus region index.
//! - [`pathfinding::find_path`] -- A* over loaded nodes.
//! - [`cache::PathCache`] -- sliding-TTL memo of resolved routes.
//! - [`distribution::distribute`] -- one tick of source-to-sink flow.
//! - [`network::EnergyNetwork`] -- the façade the world talks to.
//! - [`rate_limit::RateLimit`] -- per-node budget for explicit transfers.
//! - [`registry::NetworkRegistry`] -- every network, with merge/split and
//!   buffered region events.
//!
//! Only nodes in loaded regions take part in routing. The world reports
//! load state through [`region::RegionOracle`].

pub mod cache;
pub mod config;
pub mod distribution;
pub mod network;
pub mod path;
pub mod pathfinding;
pub mod rate_limit;
pub mod region;
pub mod registry;
pub mod topology;
pub mod transfer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CacheStats, PathCache};
pub use config::{ConfigError, NetworkConfig};
pub use distribution::DistributionReport;
pub use network::{EnergyNetwork, MergeError};
pub use path::Path;
pub use rate_limit::RateLimit;
pub use region::{AllLoaded, LoadedRegions, RegionOracle};
pub use registry::{NetworkId, NetworkRegistry, RegionEvent, RegistryError, TickSummary};
pub use topology::{BoxedHandler, NetworkTopology};
pub use transfer::{TransferError, TransferReceipt};
