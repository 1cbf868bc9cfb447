//! User-facing notices sent by the match engine.
//!
//! The engine never formats chat text itself at the call site. It picks a
//! [`Notice`] variant and hands it to the host, which decides how to show
//! it (chat line, action bar, log line in tests). `Display` renders the
//! canonical English text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A message shown to one player.
///
/// Variants carry numbers, not strings: the engine decides *what* to say
/// and the host decides *how*. A host with localisation can match on the
/// variant and ignore [`Display`](fmt::Display) entirely.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "TeleportCountdown", "seconds": 3 }`, so hosts that forward
/// notices to an external UI get a self-describing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// The player was placed into a new match and will be teleported
    /// once warmup finishes.
    MatchFound {
        /// Warmup length in whole seconds.
        seconds: u64,
    },

    /// Final seconds of warmup.
    TeleportCountdown {
        /// Seconds until gameplay starts.
        seconds: u64,
    },

    /// Gameplay began; the player was moved into the match world.
    MatchStarted {
        /// Match length in whole minutes.
        minutes: u64,
    },

    /// The player began extracting.
    ExtractionStarted {
        /// Seconds the player must survive.
        seconds: u64,
    },

    /// Periodic reminder while extracting.
    ///
    /// Sent once per second, so hosts usually render it in an overlay
    /// rather than the chat log (see [`Notice::is_overlay`]).
    ExtractionCountdown {
        /// Seconds left until extraction completes.
        seconds: u64,
    },

    /// Extraction completed; the player left the match safely.
    ExtractionSucceeded,

    /// The match timer ran out.
    ///
    /// Sent to every player still inside right before they are removed.
    MatchEnded,
}

impl Notice {
    /// `true` for transient notices that hosts should render in an
    /// overlay (action bar) rather than the chat log.
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::ExtractionCountdown { .. })
    }
}

/// The canonical English text. Seconds and minutes are interpolated from
/// the variant's fields, so the same notice always renders the same way.
impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchFound { seconds } => {
                write!(f, "Match found! Teleporting in {seconds} seconds...")
            }
            Self::TeleportCountdown { seconds } => write!(f, "Teleporting in {seconds}..."),
            Self::MatchStarted { minutes } => write!(
                f,
                "Match started! You have {minutes} minutes to extract. Find the Extraction Block!"
            ),
            Self::ExtractionStarted { seconds } => {
                write!(f, "Extraction started! Stay alive for {seconds} seconds.")
            }
            Self::ExtractionCountdown { seconds } => write!(f, "Extracting in {seconds}..."),
            Self::ExtractionSucceeded => f.write_str("Extraction Successful!"),
            Self::MatchEnded => f.write_str("Match Ended! All remaining players are lost."),
        }
    }
}
