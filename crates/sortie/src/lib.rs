//! # Sortie
//!
//! Tick-driven extraction matches for block-world game servers.
//!
//! A host server implements [`WorldHost`]; Sortie does the rest: it
//! provisions an isolated world per match, walks every match through
//! warmup, gameplay, and forced termination on a fixed tick, lets players
//! extract early, and tears down temporary worlds when their lease runs
//! out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sortie::prelude::*;
//!
//! # async fn demo() -> Result<(), SortieError> {
//! sortie::telemetry::init_tracing("info");
//!
//! let host = MemoryHost::new();
//! host.connect(PlayerId(1));
//!
//! let server = ExtractionServer::new(ServerConfig::default(), host);
//! let handle = server.handle();
//! tokio::spawn(server.run());
//!
//! let feedback = handle.execute("extraction start".parse()?).await?;
//! println!("{feedback}");
//! # Ok(())
//! # }
//! ```

mod commands;
mod config;
mod error;
mod memory;
mod server;
pub mod telemetry;

pub use commands::{Command, CommandError, Feedback};
pub use config::{EndedWorldPolicy, ServerConfig};
pub use error::{ConfigError, SortieError};
pub use memory::{MemoryHost, MemoryWorld, PlayerRecord};
pub use server::{ExtractionServer, ServerHandle};

pub use sortie_lease::{LeaseError, LeaseRegistry};
pub use sortie_match::{
    DestroyError, KeyAllocator, Location, Match, MatchConfig, MatchDirectory, MatchError,
    MatchState, MatchSummary, ProvisionError, WorldHost,
};
pub use sortie_protocol::{BlockPos, Notice, PlayerId, WorldKey};
pub use sortie_tick::{TickClock, TickConfig, TickPolicy};

/// Everything a host integration usually needs.
pub mod prelude {
    pub use crate::{
        BlockPos, Command, CommandError, EndedWorldPolicy, ExtractionServer, Feedback, Location,
        MatchConfig, MemoryHost, Notice, PlayerId, ServerConfig, ServerHandle, SortieError,
        WorldHost, WorldKey,
    };
}
