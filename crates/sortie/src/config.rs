//! Server configuration, loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sortie_match::MatchConfig;
use sortie_tick::TickConfig;

use crate::ConfigError;

/// What happens to a match world once its match ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndedWorldPolicy {
    /// Leave the world loaded and on disk.
    Keep,
    /// Tear the world down on the tick the match ends.
    Destroy,
    /// Tear the world down `ticks` after the match ends.
    Lease { ticks: u64 },
}

impl Default for EndedWorldPolicy {
    fn default() -> Self {
        // One minute at 20 TPS.
        Self::Lease { ticks: 1_200 }
    }
}

/// Top-level server configuration.
///
/// Every field is optional in TOML; missing fields take their defaults.
///
/// ```toml
/// log_filter = "sortie=debug,info"
/// temporary_world_lifetime_ticks = 6000
///
/// [tick]
/// tick_rate_hz = 20
///
/// [matches]
/// warmup_ticks = 300
/// match_duration_ticks = 36000
///
/// [ended_worlds]
/// kind = "lease"
/// ticks = 1200
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub tick: TickConfig,
    /// `matches.ticks_per_second` always follows `tick.tick_rate_hz`.
    pub matches: MatchConfig,
    pub ended_worlds: EndedWorldPolicy,
    /// Default lease for `temp_dimension create_dimension`.
    pub temporary_world_lifetime_ticks: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            tick: TickConfig::default(),
            matches: MatchConfig::default(),
            ended_worlds: EndedWorldPolicy::default(),
            temporary_world_lifetime_ticks: 6_000,
        }
    }
}

impl ServerConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Clamps sub-configs and ties the match clock to the tick rate.
    ///
    /// A zero-tick lease becomes [`EndedWorldPolicy::Destroy`], and a zero
    /// temporary-world lifetime falls back to the default.
    pub fn validated(mut self) -> Self {
        self.tick = self.tick.validated();
        self.matches.ticks_per_second = u64::from(self.tick.tick_rate_hz);
        self.matches = self.matches.validated();

        if self.ended_worlds == (EndedWorldPolicy::Lease { ticks: 0 }) {
            tracing::warn!("ended world lease of 0 ticks, destroying immediately instead");
            self.ended_worlds = EndedWorldPolicy::Destroy;
        }
        if self.temporary_world_lifetime_ticks == 0 {
            let fallback = Self::default().temporary_world_lifetime_ticks;
            tracing::warn!(fallback, "temporary_world_lifetime_ticks is 0, using default");
            self.temporary_world_lifetime_ticks = fallback;
        }
        self
    }
}
