//! Extraction match lifecycle for Sortie.
//!
//! Each match owns one isolated world on the host and walks a strict
//! warmup → playing → ended lifecycle driven by the global tick. Players
//! leave a running match by completing a timed extraction; whoever is
//! still inside when the timer runs out is removed by force.
//!
//! # Key types
//!
//! - [`Match`]: the per-match state machine
//! - [`MatchDirectory`]: every running match, keyed by world
//! - [`WorldHost`]: what the engine needs from the host server
//! - [`MatchState`]: lifecycle states
//! - [`MatchConfig`]: timings and spawn settings

mod config;
mod directory;
mod error;
mod host;
mod keys;
mod lifecycle;
mod spawn;

pub use config::{MatchConfig, MatchState};
pub use directory::MatchDirectory;
pub use error::{DestroyError, MatchError, ProvisionError};
pub use host::{Location, WorldHost, provision_with_timeout};
pub use keys::KeyAllocator;
pub use lifecycle::{Match, MatchSummary};
pub use spawn::pick_spawn;
