//! Unified error type for Sortie.

use std::path::PathBuf;

use sortie_lease::LeaseError;
use sortie_match::{DestroyError, MatchError, ProvisionError};

/// The server configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SortieError {
    /// Starting a match failed.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A world could not be created.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// A world could not be torn down.
    #[error(transparent)]
    Destroy(#[from] DestroyError),

    /// A lease was rejected.
    #[error(transparent)]
    Lease(#[from] LeaseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Command(#[from] crate::CommandError),
}
