//! Match configuration and state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Timings and spawn settings shared by every match in a directory.
///
/// All durations are in ticks. The defaults are a 15 second warmup, a
/// 30 minute match, and a 15 second extraction at 20 ticks per second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Ticks per second of the global clock. Used to place countdown
    /// notices on whole-second boundaries.
    pub ticks_per_second: u64,

    /// Time between match creation and gameplay start.
    pub warmup_ticks: u64,

    /// Length of gameplay before the match ends.
    pub match_duration_ticks: u64,

    /// Time a player must survive after starting an extraction.
    pub extraction_ticks: u64,

    /// The warmup countdown is announced only in its final N seconds.
    pub countdown_from_secs: u64,

    /// Spawn points are picked in `[-spawn_radius, spawn_radius)` on
    /// both horizontal axes.
    pub spawn_radius: i32,

    /// How long world provisioning may take before the start request
    /// fails. 0 disables the limit.
    pub provision_timeout_ms: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            warmup_ticks: 15 * 20,
            match_duration_ticks: 30 * 60 * 20,
            extraction_ticks: 15 * 20,
            countdown_from_secs: 5,
            spawn_radius: 500,
            provision_timeout_ms: 30_000,
        }
    }
}

impl MatchConfig {
    /// Fixes values that would break the arithmetic below.
    ///
    /// - `ticks_per_second` at least 1
    /// - `spawn_radius` at least 1 (an empty range cannot be sampled)
    pub fn validated(mut self) -> Self {
        if self.ticks_per_second == 0 {
            tracing::warn!("ticks_per_second is 0, using 1");
            self.ticks_per_second = 1;
        }
        if self.spawn_radius < 1 {
            tracing::warn!(radius = self.spawn_radius, "spawn_radius below 1, using 1");
            self.spawn_radius = 1;
        }
        self
    }

    /// Whole seconds remaining in a countdown of `total` ticks after
    /// `elapsed` ticks, rounded up.
    pub fn seconds_left(&self, total: u64, elapsed: u64) -> u64 {
        total.saturating_sub(elapsed).div_ceil(self.ticks_per_second)
    }

    /// `true` when `elapsed` sits exactly on a whole-second boundary.
    pub fn on_second_boundary(&self, elapsed: u64) -> bool {
        elapsed % self.ticks_per_second == 0
    }

    /// Warmup length in whole seconds.
    pub fn warmup_secs(&self) -> u64 {
        self.warmup_ticks.div_ceil(self.ticks_per_second)
    }

    /// Extraction length in whole seconds.
    pub fn extraction_secs(&self) -> u64 {
        self.extraction_ticks.div_ceil(self.ticks_per_second)
    }

    /// Match length in whole minutes.
    pub fn match_minutes(&self) -> u64 {
        self.match_duration_ticks.div_ceil(self.ticks_per_second * 60)
    }
}

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// The lifecycle state of a match.
///
/// Transitions only move forward:
///
/// ```text
/// Warmup → Playing → Ended
/// ```
///
/// - **Warmup**: the world exists and participants are known, but
///   nobody has been moved in yet.
/// - **Playing**: participants are in the match world and may extract.
/// - **Ended**: the timer ran out. Remaining participants were removed.
///   The directory drops the match on its next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchState {
    Warmup,
    Playing,
    Ended,
}

impl MatchState {
    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Warmup => Some(Self::Playing),
            Self::Playing => Some(Self::Ended),
            Self::Ended => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Returns `true` if players can start extracting.
    pub fn accepts_extractions(self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warmup => write!(f, "Warmup"),
            Self::Playing => write!(f, "Playing"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
