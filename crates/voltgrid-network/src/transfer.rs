//! Point-to-point transfers between two named nodes.
//!
//! Unlike a distribution pass, a transfer reports why it could not happen.

use voltgrid_core::position::{Position, Region};
use voltgrid_core::storage::Action;

use crate::config::NetworkConfig;
use crate::topology::NetworkTopology;

/// Why a transfer moved nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("no node at {0}")]
    MissingNode(Position),
    #[error("region {region} holding {position} is not loaded")]
    RegionUnloaded { position: Position, region: Region },
    #[error("no path from {from} to {to}")]
    NoPath { from: Position, to: Position },
    #[error("node at {0} has nothing to release")]
    SourceEmpty(Position),
    #[error("node at {0} cannot accept anything")]
    SinkFull(Position),
    #[error("source and destination are the same node at {0}")]
    SameNode(Position),
    #[error("transfer of zero units requested")]
    ZeroAmount,
    #[error("node at {0} has used its transfer budget for this window")]
    RateLimited(Position),
}

/// What a completed (or simulated) transfer moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub extracted: u64,
    pub delivered: u64,
    pub lost: u64,
    /// Positions on the path, endpoints included.
    pub path_len: usize,
}

/// Move up to `requested` units from `from` to `to` over a resolved path of
/// `path_len` positions. The caller resolves the path and checks load state.
pub(crate) fn execute(
    topology: &mut NetworkTopology,
    config: &NetworkConfig,
    from: Position,
    to: Position,
    path_len: usize,
    requested: u64,
    action: Action,
) -> Result<TransferReceipt, TransferError> {
    if requested == 0 {
        return Err(TransferError::ZeroAmount);
    }

    let available = topology
        .get_node_mut(from)
        .ok_or(TransferError::MissingNode(from))?
        .extract(requested, Action::Simulate);
    if available == 0 {
        return Err(TransferError::SourceEmpty(from));
    }
    let room = topology
        .get_node_mut(to)
        .ok_or(TransferError::MissingNode(to))?
        .receive(u64::MAX, Action::Simulate);
    if room == 0 {
        return Err(TransferError::SinkFull(to));
    }

    let amount = available.min(room).min(config.transfer_rate_cap);

    if action.is_simulate() {
        let delivered = config.delivered_after_loss(amount, path_len);
        return Ok(TransferReceipt {
            extracted: amount,
            delivered,
            lost: amount - delivered,
            path_len,
        });
    }

    let extracted = topology
        .get_node_mut(from)
        .ok_or(TransferError::MissingNode(from))?
        .extract(amount, Action::Execute);
    let delivered = config.delivered_after_loss(extracted, path_len);
    let received = topology
        .get_node_mut(to)
        .ok_or(TransferError::MissingNode(to))?
        .receive(delivered, Action::Execute);

    Ok(TransferReceipt {
        extracted,
        delivered: received,
        lost: extracted - received,
        path_len,
    })
}
