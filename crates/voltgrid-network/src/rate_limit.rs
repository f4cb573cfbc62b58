//! Outflow budgets for explicit transfers.
//!
//! A limit caps how much one source node may send through
//! [`EnergyNetwork::transfer`](crate::network::EnergyNetwork::transfer)
//! within a window of ticks. Distribution passes ignore it.

use voltgrid_core::fixed::Ticks;

/// At most `limit` units per `window` ticks.
///
/// A window opens at the first recorded transfer and closes `window` ticks
/// later. The next transfer after that opens a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    limit: u64,
    window: Ticks,
    window_start: Option<Ticks>,
    used: u64,
}

impl RateLimit {
    /// A window of zero ticks is treated as one.
    pub fn new(limit: u64, window: Ticks) -> Self {
        Self {
            limit,
            window: window.max(1),
            window_start: None,
            used: 0,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Ticks {
        self.window
    }

    /// Units already sent in the window that is open at `now`.
    pub fn used(&self, now: Ticks) -> u64 {
        if self.window_closed(now) { 0 } else { self.used }
    }

    /// Units that may still be sent at `now`.
    pub fn remaining(&self, now: Ticks) -> u64 {
        self.limit.saturating_sub(self.used(now))
    }

    /// Charge `amount` against the window open at `now`, opening one if
    /// needed.
    pub fn record(&mut self, now: Ticks, amount: u64) {
        if self.window_closed(now) {
            self.window_start = Some(now);
            self.used = 0;
        }
        self.used = self.used.saturating_add(amount);
    }

    fn window_closed(&self, now: Ticks) -> bool {
        self.window_start
            .is_none_or(|start| now >= start.saturating_add(self.window))
    }
}
