//! The per-match state machine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use sortie_protocol::{Notice, PlayerId, WorldKey};

use crate::spawn::pick_spawn;
use crate::{MatchConfig, MatchState, WorldHost};

/// Snapshot of a match for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// The match world.
    pub world: WorldKey,
    /// Current lifecycle state.
    pub state: MatchState,
    /// Tick the match was created on.
    pub created_at: u64,
    /// Tick gameplay started on, once it has.
    pub started_at: Option<u64>,
    /// Players still in the match, extracting or not.
    pub participants: usize,
    /// Players currently extracting.
    pub extracting: usize,
}

/// One extraction match bound to one world.
///
/// A match does nothing on its own; the directory calls
/// [`advance`](Self::advance) once per global tick with the current tick
/// number and the world's handle. All elapsed-time checks compare against
/// that tick, so a match is deterministic for a given tick sequence.
///
/// Invariants:
/// - every extracting player is a participant
/// - `started_at` is set exactly when the state is not `Warmup`
/// - once `Ended`, both player sets are empty and stay empty
pub struct Match {
    world: WorldKey,
    config: Arc<MatchConfig>,
    state: MatchState,
    created_at: u64,
    started_at: Option<u64>,
    participants: HashSet<PlayerId>,
    /// Player → tick their extraction started.
    extracting: HashMap<PlayerId, u64>,
}

impl Match {
    /// Creates a match in `Warmup`.
    pub fn new(
        world: WorldKey,
        current_tick: u64,
        participants: impl IntoIterator<Item = PlayerId>,
        config: Arc<MatchConfig>,
    ) -> Self {
        Self {
            world,
            config,
            state: MatchState::Warmup,
            created_at: current_tick,
            started_at: None,
            participants: participants.into_iter().collect(),
            extracting: HashMap::new(),
        }
    }

    /// Runs one tick of the match.
    ///
    /// - `Warmup`: announces the last seconds of the countdown, then
    ///   starts gameplay once `warmup_ticks` have elapsed.
    /// - `Playing`: resolves extractions first, then ends the match once
    ///   `match_duration_ticks` have elapsed since the start. A player
    ///   whose extraction completes on the final tick is extracted, not
    ///   removed.
    /// - `Ended`: nothing.
    pub fn advance<H: WorldHost>(&mut self, current_tick: u64, world: &H::World, host: &H) {
        match self.state {
            MatchState::Warmup => self.advance_warmup(current_tick, world, host),
            MatchState::Playing => self.advance_playing(current_tick, world, host),
            MatchState::Ended => {}
        }
    }

    /// Starts an extraction for `player`.
    ///
    /// Ignored (returns `false`) unless the match is `Playing`, the player
    /// is a participant, and they are not already extracting. Asking
    /// twice does not restart the timer.
    pub fn request_extraction<H: WorldHost>(
        &mut self,
        player: PlayerId,
        current_tick: u64,
        host: &H,
    ) -> bool {
        if !self.state.accepts_extractions() {
            tracing::debug!(
                world = %self.world,
                %player,
                state = %self.state,
                "extraction request outside gameplay, ignoring"
            );
            return false;
        }
        if !self.participants.contains(&player) || self.extracting.contains_key(&player) {
            return false;
        }

        self.extracting.insert(player, current_tick);
        host.notify(
            player,
            &Notice::ExtractionStarted {
                seconds: self.config.extraction_secs(),
            },
        );
        tracing::info!(
            world = %self.world,
            %player,
            tick = current_tick,
            "extraction started"
        );
        true
    }

    /// Drops `player` from the match without touching them in the world
    /// (they disconnected or died). Returns `true` if they were a
    /// participant.
    pub fn leave(&mut self, player: PlayerId) -> bool {
        self.extracting.remove(&player);
        let removed = self.participants.remove(&player);
        if removed {
            tracing::info!(
                world = %self.world,
                %player,
                remaining = self.participants.len(),
                "participant left"
            );
        }
        removed
    }

    /// The match world's key.
    pub fn world(&self) -> &WorldKey {
        &self.world
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == MatchState::Ended
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn is_participant(&self, player: PlayerId) -> bool {
        self.participants.contains(&player)
    }

    /// Tick `player`'s extraction started on, if they are extracting.
    pub fn extraction_started_at(&self, player: PlayerId) -> Option<u64> {
        self.extracting.get(&player).copied()
    }

    /// Current participants, in no particular order.
    pub fn participants(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.participants.iter().copied()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn extracting_count(&self) -> usize {
        self.extracting.len()
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            world: self.world.clone(),
            state: self.state,
            created_at: self.created_at,
            started_at: self.started_at,
            participants: self.participants.len(),
            extracting: self.extracting.len(),
        }
    }

    // -- State handlers ----------------------------------------------------

    fn advance_warmup<H: WorldHost>(&mut self, current_tick: u64, world: &H::World, host: &H) {
        let elapsed = current_tick.saturating_sub(self.created_at);
        let warmup = self.config.warmup_ticks;

        if elapsed >= warmup {
            self.transition_to_playing(current_tick, world, host);
            return;
        }

        if self.config.on_second_boundary(elapsed) {
            let seconds = self.config.seconds_left(warmup, elapsed);
            if seconds > 0 && seconds <= self.config.countdown_from_secs {
                self.broadcast(host, &Notice::TeleportCountdown { seconds });
            }
        }
    }

    fn advance_playing<H: WorldHost>(&mut self, current_tick: u64, world: &H::World, host: &H) {
        let Some(started_at) = self.started_at else {
            return;
        };

        self.resolve_extractions(current_tick, host);

        if current_tick.saturating_sub(started_at) >= self.config.match_duration_ticks {
            self.transition_to_ended(current_tick, world, host);
        }
    }

    fn resolve_extractions<H: WorldHost>(&mut self, current_tick: u64, host: &H) {
        let total = self.config.extraction_ticks;
        let mut completed = Vec::new();

        for (&player, &started) in &self.extracting {
            let elapsed = current_tick.saturating_sub(started);
            if elapsed >= total {
                completed.push(player);
            } else if self.config.on_second_boundary(elapsed) {
                let seconds = self.config.seconds_left(total, elapsed);
                host.notify(player, &Notice::ExtractionCountdown { seconds });
            }
        }

        if completed.is_empty() {
            return;
        }
        completed.sort();

        let lobby = host.lobby();
        if lobby.is_none() {
            tracing::warn!(world = %self.world, "no lobby loaded, extracted players stay in place");
        }

        for player in completed {
            self.extracting.remove(&player);
            self.participants.remove(&player);

            host.notify(player, &Notice::ExtractionSucceeded);
            if let Some(lobby) = &lobby {
                host.move_player(player, &lobby.world, lobby.pos);
            }

            tracing::info!(
                world = %self.world,
                %player,
                tick = current_tick,
                remaining = self.participants.len(),
                "player extracted"
            );
        }
    }

    fn enter(&mut self, target: MatchState) {
        debug_assert!(
            self.state.can_transition_to(target),
            "illegal match transition {} -> {target}",
            self.state
        );
        self.state = target;
    }

    fn transition_to_playing<H: WorldHost>(
        &mut self,
        current_tick: u64,
        world: &H::World,
        host: &H,
    ) {
        self.enter(MatchState::Playing);
        self.started_at = Some(current_tick);

        let mut rng = rand::rng();
        for &player in &self.participants {
            let pos = pick_spawn(host, world, self.config.spawn_radius, &mut rng);
            host.move_player(player, world, pos);
            tracing::debug!(world = %self.world, %player, %pos, "participant spawned");
        }

        self.broadcast(
            host,
            &Notice::MatchStarted {
                minutes: self.config.match_minutes(),
            },
        );
        tracing::info!(
            world = %self.world,
            players = self.participants.len(),
            tick = current_tick,
            "match started"
        );
    }

    fn transition_to_ended<H: WorldHost>(&mut self, current_tick: u64, world: &H::World, host: &H) {
        self.enter(MatchState::Ended);

        let lost = self.participants.len();
        self.broadcast(host, &Notice::MatchEnded);
        for &player in &self.participants {
            host.remove_player(player, world);
        }
        self.participants.clear();
        self.extracting.clear();

        tracing::info!(
            world = %self.world,
            lost,
            tick = current_tick,
            "match ended"
        );
    }

    fn broadcast<H: WorldHost>(&self, host: &H, notice: &Notice) {
        for &player in &self.participants {
            host.notify(player, notice);
        }
    }
}
