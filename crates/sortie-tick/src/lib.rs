//! Global tick clock and fixed-rate tick scheduler for Sortie.
//!
//! Two pieces live here:
//!
//! - [`TickClock`]: the process-wide monotonic tick counter. The tick
//!   driver advances it by exactly one per pass; everything else only
//!   reads it.
//! - [`TickScheduler`]: an async waiter that resolves once per tick
//!   period (20 Hz by default) with overrun detection and tick budget
//!   monitoring.
//!
//! # Integration
//!
//! The scheduler sits inside the server's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = shutdown.changed() => break,
//!         _ = scheduler.wait_for_tick() => {
//!             let tick = clock.advance();
//!             leases.tick(|key| host.destroy_world(key));
//!             matches.advance_all(tick, &host);
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

mod clock;
mod config;
mod scheduler;

pub use clock::TickClock;
pub use config::{TickConfig, TickPolicy};
pub use scheduler::{TickInfo, TickMetrics, TickScheduler};
