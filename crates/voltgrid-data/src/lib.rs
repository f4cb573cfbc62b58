//! Data-driven configuration for voltgrid networks.
//!
//! A data directory may hold any of the following, each in exactly one of
//! RON, TOML or JSON:
//!
//! - `network.*` -- a [`NetworkConfig`](voltgrid_network::config::NetworkConfig);
//!   omitted fields keep their defaults.
//! - `storage_tiers.*` -- capacity / rate overrides per storage tier.
//! - `nodes.*` -- named node templates built from a tier or explicit numbers.
//!
//! Every file is optional. [`load_voltgrid_data`] returns defaults for the
//! missing ones.

pub mod catalog;
pub mod loader;
pub mod schema;

pub use catalog::{NodeCatalog, NodeTemplate, TierSpec, TierTable};
pub use loader::{DataLoadError, VoltgridData, load_voltgrid_data};
