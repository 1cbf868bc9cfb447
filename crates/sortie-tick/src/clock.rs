//! The shared tick counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cloneable handle on the global tick counter.
///
/// Every clone observes the same counter. Only the tick driver calls
/// [`advance`](Self::advance); command handlers and hosts read
/// [`now`](Self::now) from whatever thread they run on.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    ticks: Arc<AtomicU64>,
}

impl TickClock {
    /// A clock starting at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tick.
    pub fn now(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Moves the clock forward by exactly one tick and returns the new value.
    pub fn advance(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::AcqRel) + 1
    }
}
