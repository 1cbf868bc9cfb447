//! Error types for the match layer.

use sortie_protocol::WorldKey;

/// The host could not produce a world for a new match.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The host tried and gave up.
    #[error("failed to provision world {key}: {reason}")]
    Failed { key: WorldKey, reason: String },

    /// Provisioning did not finish within the configured limit.
    #[error("provisioning world {key} timed out after {timeout_ms} ms")]
    TimedOut { key: WorldKey, timeout_ms: u64 },
}

/// The host could not tear a world down.
#[derive(Debug, thiserror::Error)]
pub enum DestroyError {
    /// No world with this key is loaded.
    #[error("world {0} not found")]
    NotFound(WorldKey),

    /// The world was unloaded but its on-disk data could not be removed.
    #[error("failed to delete storage for world {key}")]
    Storage {
        key: WorldKey,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from starting or driving matches.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A match needs at least one participant.
    #[error("no participants for match")]
    NoParticipants,

    #[error(transparent)]
    Provision(#[from] ProvisionError),
}
