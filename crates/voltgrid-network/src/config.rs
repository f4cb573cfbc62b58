//! Tuning constants for a network's distribution pass.

use serde::{Deserialize, Serialize};
use voltgrid_core::fixed::{BASIS_POINTS, Fixed64, Ticks, apply_basis_points, basis_points_to_fixed};
use voltgrid_core::position::RegionSize;

/// Per-network configuration.
///
/// The transfer cap and loss constants are flat values, not derived from
/// any node tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Maximum units moved along one path per tick.
    pub transfer_rate_cap: u64,
    /// Loss per hop beyond the source, in basis points (100 = 1%).
    pub loss_per_hop_bp: u32,
    /// Upper bound on the loss rate, in basis points (5000 = 50%).
    pub max_loss_bp: u32,
    /// Sliding time-to-live of a cached path, in ticks.
    pub path_ttl: Ticks,
    /// Width of a region column.
    pub region_size: RegionSize,
    /// When `false`, every path lookup runs a fresh search.
    pub use_path_caching: bool,
    /// Sinks farther than this (Manhattan) from a source are not considered.
    pub max_transport_distance: Option<u32>,
    /// Length of a per-node transfer rate-limit window, in ticks.
    pub rate_limit_window: Ticks,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            transfer_rate_cap: 1000,
            loss_per_hop_bp: 100,
            max_loss_bp: 5000,
            path_ttl: 30,
            region_size: RegionSize::DEFAULT,
            use_path_caching: true,
            max_transport_distance: None,
            rate_limit_window: 20,
        }
    }
}

/// Errors from [`NetworkConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("loss per hop of {0} bp exceeds 100%")]
    LossPerHopTooHigh(u32),
    #[error("maximum loss of {0} bp exceeds 100%")]
    MaxLossTooHigh(u32),
    #[error("path ttl must be at least one tick")]
    ZeroTtl,
    #[error("rate limit window must be at least one tick")]
    ZeroRateLimitWindow,
    #[error("region size {0} does not fit a signed coordinate")]
    RegionSizeTooLarge(u32),
}

impl NetworkConfig {
    /// Check the loss constants are valid fractions, the time spans are
    /// non-zero and the region size fits a coordinate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loss_per_hop_bp > BASIS_POINTS {
            return Err(ConfigError::LossPerHopTooHigh(self.loss_per_hop_bp));
        }
        if self.max_loss_bp > BASIS_POINTS {
            return Err(ConfigError::MaxLossTooHigh(self.max_loss_bp));
        }
        if self.path_ttl == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.rate_limit_window == 0 {
            return Err(ConfigError::ZeroRateLimitWindow);
        }
        if RegionSize::new(self.region_size.get()).is_none() {
            return Err(ConfigError::RegionSizeTooLarge(self.region_size.get()));
        }
        Ok(())
    }

    /// Loss rate for a path of `path_len` positions, in basis points:
    /// `min(loss_per_hop * (path_len - 1), max_loss)`.
    pub fn loss_bp(&self, path_len: usize) -> u32 {
        let hops = path_len.saturating_sub(1) as u64;
        let raw = hops.saturating_mul(self.loss_per_hop_bp as u64);
        raw.min(self.max_loss_bp as u64) as u32
    }

    /// [`loss_bp`](Self::loss_bp) as a ratio.
    pub fn loss_rate(&self, path_len: usize) -> Fixed64 {
        basis_points_to_fixed(self.loss_bp(path_len))
    }

    /// Amount that arrives after `extracted` travels a path of `path_len`
    /// positions: `extracted - round(extracted * loss_rate)`.
    pub fn delivered_after_loss(&self, extracted: u64, path_len: usize) -> u64 {
        extracted - apply_basis_points(extracted, self.loss_bp(path_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let c = NetworkConfig::default();
        assert_eq!(c.transfer_rate_cap, 1000);
        assert_eq!(c.loss_per_hop_bp, 100);
        assert_eq!(c.max_loss_bp, 5000);
        assert_eq!(c.path_ttl, 30);
        assert_eq!(c.region_size.get(), 16);
        assert!(c.use_path_caching);
        assert_eq!(c.max_transport_distance, None);
        assert_eq!(c.rate_limit_window, 20);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn loss_grows_per_hop_and_caps() {
        let c = NetworkConfig::default();
        assert_eq!(c.loss_bp(1), 0);
        assert_eq!(c.loss_bp(2), 100);
        assert_eq!(c.loss_bp(4), 300);
        assert_eq!(c.loss_bp(51), 5000);
        assert_eq!(c.loss_bp(1000), 5000);
        assert_eq!(c.loss_rate(1000), Fixed64::from_num(0.5));
    }

    #[test]
    fn loss_is_monotone_in_path_length() {
        let c = NetworkConfig::default();
        let mut prev = 0;
        for len in 1..200 {
            let bp = c.loss_bp(len);
            assert!(bp >= prev);
            assert!(bp <= 5000);
            prev = bp;
        }
    }

    #[test]
    fn delivered_matches_reference_examples() {
        let c = NetworkConfig::default();
        // Adjacent pair: 1% loss.
        assert_eq!(c.delivered_after_loss(1000, 2), 990);
        // One relay in between: 2% loss.
        assert_eq!(c.delivered_after_loss(500, 3), 490);
        // Two relays: 3% loss.
        assert_eq!(c.delivered_after_loss(500, 4), 485);
        // Zero-hop path loses nothing.
        assert_eq!(c.delivered_after_loss(777, 1), 777);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let c = NetworkConfig {
            loss_per_hop_bp: 10_001,
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::LossPerHopTooHigh(10_001)));

        let c = NetworkConfig {
            max_loss_bp: 20_000,
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::MaxLossTooHigh(20_000)));

        let c = NetworkConfig {
            path_ttl: 0,
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ZeroTtl));

        let c = NetworkConfig {
            rate_limit_window: 0,
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ZeroRateLimitWindow));
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let c: NetworkConfig = serde_json::from_str(r#"{"transfer_rate_cap": 250}"#).unwrap();
        assert_eq!(c.transfer_rate_cap, 250);
        assert_eq!(c.path_ttl, 30);
    }
}
