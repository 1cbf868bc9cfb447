//! Match directory: starts, drives, and reaps matches.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use sortie_protocol::{Notice, PlayerId, WorldKey};

use crate::host::provision_with_timeout;
use crate::{KeyAllocator, Match, MatchConfig, MatchError, MatchSummary, WorldHost};

/// Every running match, keyed by its world.
///
/// Shared between the tick driver ([`advance_all`](Self::advance_all))
/// and command handlers ([`start_match`](Self::start_match),
/// [`route_extraction_request`](Self::route_extraction_request)). The map
/// is a `DashMap` and each match sits behind its own mutex, so a command
/// for one match never waits on another.
///
/// World keys are `sortie:match_<salt>_<n>`. The salt is random per
/// directory, so keys stay unique across server restarts even though the
/// counter starts over.
pub struct MatchDirectory {
    matches: DashMap<WorldKey, Arc<Mutex<Match>>>,
    config: Arc<MatchConfig>,
    keys: KeyAllocator,
}

impl MatchDirectory {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            matches: DashMap::new(),
            config: Arc::new(config.validated()),
            keys: KeyAllocator::new("match"),
        }
    }

    /// Effective (validated) match settings.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Reserves a fresh world key for a new match.
    pub fn allocate_key(&self) -> WorldKey {
        self.keys.allocate()
    }

    /// Provisions a world and creates a match for `participants`.
    ///
    /// Every participant is told a match was found. They are not moved
    /// until warmup ends. Warmup is measured from `current_tick`, so time
    /// spent provisioning counts against it.
    ///
    /// # Errors
    /// - [`MatchError::NoParticipants`] if `participants` is empty
    /// - [`MatchError::Provision`] if the host fails or times out; no
    ///   match is registered in that case
    pub async fn start_match<H: WorldHost>(
        &self,
        current_tick: u64,
        participants: Vec<PlayerId>,
        host: &H,
    ) -> Result<WorldKey, MatchError> {
        if participants.is_empty() {
            return Err(MatchError::NoParticipants);
        }

        let key = self.allocate_key();
        let provisioned =
            provision_with_timeout(host, &key, self.config.provision_timeout_ms).await;
        if let Err(error) = provisioned {
            tracing::error!(world = %key, %error, "failed to provision match world");
            return Err(error.into());
        }

        let game = Match::new(
            key.clone(),
            current_tick,
            participants.iter().copied(),
            Arc::clone(&self.config),
        );
        self.matches.insert(key.clone(), Arc::new(Mutex::new(game)));

        let found = Notice::MatchFound {
            seconds: self.config.warmup_secs(),
        };
        for &player in &participants {
            host.notify(player, &found);
        }

        tracing::info!(
            world = %key,
            players = participants.len(),
            tick = current_tick,
            "match created"
        );
        Ok(key)
    }

    /// Advances every match by one tick and drops the finished ones.
    ///
    /// Matches whose world the host no longer knows about are dropped
    /// without being advanced. Returns the keys of matches that ended on
    /// this pass, so the caller can decide what to do with their worlds.
    pub fn advance_all<H: WorldHost>(&self, current_tick: u64, host: &H) -> Vec<WorldKey> {
        // Snapshot first: no shard lock is held while a match runs, so
        // handlers may start or remove matches mid-pass.
        let entries: Vec<(WorldKey, Arc<Mutex<Match>>)> = self
            .matches
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut ended = Vec::new();
        for (key, entry) in entries {
            let Some(world) = host.lookup_world(&key) else {
                self.matches.remove(&key);
                tracing::debug!(world = %key, "match world vanished, dropping match");
                continue;
            };

            let finished = {
                let mut game = entry.lock();
                game.advance(current_tick, &world, host);
                game.is_ended()
            };

            if finished {
                self.matches.remove(&key);
                ended.push(key);
            }
        }
        ended
    }

    /// Forwards an extraction request to the match running in `world`.
    ///
    /// Returns `false` if there is no such match or the match ignored the
    /// request.
    pub fn route_extraction_request<H: WorldHost>(
        &self,
        player: PlayerId,
        world: &WorldKey,
        current_tick: u64,
        host: &H,
    ) -> bool {
        match self.get(world) {
            Some(entry) => entry.lock().request_extraction(player, current_tick, host),
            None => false,
        }
    }

    /// Drops `player` from the match in `world` (disconnect, death).
    pub fn remove_participant(&self, player: PlayerId, world: &WorldKey) -> bool {
        match self.get(world) {
            Some(entry) => entry.lock().leave(player),
            None => false,
        }
    }

    /// The match `player` is taking part in, if any.
    pub fn find_player(&self, player: PlayerId) -> Option<WorldKey> {
        self.matches
            .iter()
            .find(|entry| entry.value().lock().is_participant(player))
            .map(|entry| entry.key().clone())
    }

    /// Runs `f` against the match in `world`.
    pub fn with_match<R>(&self, world: &WorldKey, f: impl FnOnce(&Match) -> R) -> Option<R> {
        self.get(world).map(|entry| f(&entry.lock()))
    }

    pub fn summary(&self, world: &WorldKey) -> Option<MatchSummary> {
        self.with_match(world, Match::summary)
    }

    /// Summaries of every running match, sorted by world key.
    pub fn summaries(&self) -> Vec<MatchSummary> {
        let mut all: Vec<MatchSummary> = self
            .matches
            .iter()
            .map(|entry| entry.value().lock().summary())
            .collect();
        all.sort_by(|a, b| a.world.cmp(&b.world));
        all
    }

    pub fn contains(&self, world: &WorldKey) -> bool {
        self.matches.contains_key(world)
    }

    pub fn keys(&self) -> Vec<WorldKey> {
        self.matches.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Clones the entry out so the shard lock is released before the
    /// match mutex is taken.
    fn get(&self, world: &WorldKey) -> Option<Arc<Mutex<Match>>> {
        self.matches.get(world).map(|entry| Arc::clone(entry.value()))
    }
}
