//! Operator commands.
//!
//! The textual forms mirror the in-game commands:
//!
//! ```text
//! extraction start
//! temp_dimension create_dimension [lifetime_ticks]
//! temp_dimension remove_dimension <namespace:path>
//! ```

use std::fmt;
use std::str::FromStr;

use sortie_match::{DestroyError, MatchError};
use sortie_protocol::WorldKey;

use crate::SortieError;

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a match with every connected player.
    StartMatch,
    /// Create a world that is torn down after `lifetime_ticks` (server
    /// default when `None`).
    CreateTemporaryWorld { lifetime_ticks: Option<u64> },
    /// Tear a world down now.
    RemoveTemporaryWorld { key: WorldKey },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let line = input.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        let words: Vec<&str> = line.split_whitespace().collect();

        match words.as_slice() {
            ["extraction", "start"] => Ok(Self::StartMatch),
            ["temp_dimension", "create_dimension"] => Ok(Self::CreateTemporaryWorld {
                lifetime_ticks: None,
            }),
            ["temp_dimension", "create_dimension", ticks] => ticks
                .parse()
                .map(|ticks| Self::CreateTemporaryWorld {
                    lifetime_ticks: Some(ticks),
                })
                .map_err(|_| CommandError::Unknown(line.to_string())),
            ["temp_dimension", "remove_dimension", key] => Ok(Self::RemoveTemporaryWorld {
                key: WorldKey::new(*key),
            }),
            _ => Err(CommandError::Unknown(line.to_string())),
        }
    }
}

/// What a successful command reports back to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    MatchStarting { players: usize, world: WorldKey },
    TemporaryWorldCreated { world: WorldKey, lifetime_ticks: u64 },
    TemporaryWorldRemoved { world: WorldKey },
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchStarting { players, .. } => {
                write!(f, "Starting match with {players} players...")
            }
            Self::TemporaryWorldCreated {
                world,
                lifetime_ticks,
            } => write!(
                f,
                "Created temporary dimension {world}, removed in {lifetime_ticks} ticks"
            ),
            Self::TemporaryWorldRemoved { world } => write!(f, "Removed dimension {world}"),
        }
    }
}

/// A command could not be parsed or did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No players online to start match.")]
    NoParticipants,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error(transparent)]
    Failed(Box<SortieError>),
}

impl From<SortieError> for CommandError {
    fn from(error: SortieError) -> Self {
        Self::Failed(Box::new(error))
    }
}

impl From<MatchError> for CommandError {
    fn from(error: MatchError) -> Self {
        match error {
            MatchError::NoParticipants => Self::NoParticipants,
            other => Self::Failed(Box::new(other.into())),
        }
    }
}

impl From<DestroyError> for CommandError {
    fn from(error: DestroyError) -> Self {
        Self::Failed(Box::new(error.into()))
    }
}
