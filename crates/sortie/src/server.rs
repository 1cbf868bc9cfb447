//! `ExtractionServer` and its tick loop.
//!
//! This ties the layers together: the tick scheduler drives the clock,
//! every tick counts down temporary-world leases and advances every
//! match, and the handle lets command handlers on other tasks start
//! matches and route player requests in between.

use std::sync::Arc;

use sortie_lease::{LeaseError, LeaseRegistry};
use sortie_match::{
    DestroyError, KeyAllocator, MatchDirectory, MatchError, WorldHost, provision_with_timeout,
};
use sortie_protocol::{PlayerId, WorldKey};
use sortie_tick::{TickClock, TickScheduler};
use tokio::sync::watch;

use crate::{Command, CommandError, EndedWorldPolicy, Feedback, ServerConfig, SortieError};

/// State shared between the tick loop and every [`ServerHandle`].
struct ServerState<H: WorldHost> {
    host: H,
    config: ServerConfig,
    clock: TickClock,
    matches: MatchDirectory,
    leases: LeaseRegistry<WorldKey>,
    temp_keys: KeyAllocator,
    shutdown: watch::Sender<bool>,
}

impl<H: WorldHost> ServerState<H> {
    fn tick_once(&self) -> u64 {
        let tick = self.clock.advance();

        self.leases.tick(|key| self.host.destroy_world(key));

        for world in self.matches.advance_all(tick, &self.host) {
            self.retire_world(world);
        }

        tick
    }

    fn retire_world(&self, world: WorldKey) {
        match self.config.ended_worlds {
            EndedWorldPolicy::Keep => {
                tracing::debug!(%world, "match ended, keeping world");
            }
            EndedWorldPolicy::Destroy => match self.host.destroy_world(&world) {
                Ok(()) => tracing::info!(%world, "match ended, world destroyed"),
                Err(error) => tracing::warn!(%world, %error, "failed to destroy ended match world"),
            },
            EndedWorldPolicy::Lease { ticks } => {
                if let Err(error) = self.leases.register(world.clone(), ticks) {
                    tracing::warn!(%world, %error, "failed to lease ended match world");
                }
            }
        }
    }
}

/// A tick-driven extraction server.
///
/// Either call [`run()`](Self::run) to let the built-in scheduler drive
/// the ticks, or call [`tick_once()`](Self::tick_once) from the host's
/// own tick event.
pub struct ExtractionServer<H: WorldHost> {
    state: Arc<ServerState<H>>,
    scheduler: TickScheduler,
    shutdown_rx: watch::Receiver<bool>,
}

impl<H: WorldHost> ExtractionServer<H> {
    pub fn new(config: ServerConfig, host: H) -> Self {
        let config = config.validated();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let state = Arc::new(ServerState {
            host,
            clock: TickClock::new(),
            matches: MatchDirectory::new(config.matches.clone()),
            leases: LeaseRegistry::new(),
            temp_keys: KeyAllocator::new("temp"),
            shutdown,
            config: config.clone(),
        });

        Self {
            state,
            scheduler: TickScheduler::new(config.tick),
            shutdown_rx,
        }
    }

    /// A cloneable handle for command handlers and host event callbacks.
    pub fn handle(&self) -> ServerHandle<H> {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs one tick: advances the clock, expires leases, advances every
    /// match, and applies the ended-world policy. Returns the new tick.
    pub fn tick_once(&self) -> u64 {
        self.state.tick_once()
    }

    /// Drives ticks at the configured rate until
    /// [`ServerHandle::shutdown`] is called.
    pub async fn run(mut self) {
        tracing::info!(
            rate_hz = self.scheduler.tick_rate_hz(),
            "extraction server running"
        );

        loop {
            if *self.shutdown_rx.borrow_and_update() {
                break;
            }

            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = self.scheduler.wait_for_tick() => {
                    self.state.tick_once();
                    self.scheduler.record_tick_end();
                }
            }
        }

        let metrics = self.scheduler.metrics();
        tracing::info!(
            tick = self.state.clock.now(),
            overruns = metrics.total_overruns,
            skipped = metrics.total_skipped,
            "extraction server stopped"
        );
    }
}

/// Cheap, cloneable access to a running server.
pub struct ServerHandle<H: WorldHost> {
    state: Arc<ServerState<H>>,
}

impl<H: WorldHost> Clone for ServerHandle<H> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<H: WorldHost> ServerHandle<H> {
    pub fn current_tick(&self) -> u64 {
        self.state.clock.now()
    }

    pub fn host(&self) -> &H {
        &self.state.host
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn matches(&self) -> &MatchDirectory {
        &self.state.matches
    }

    pub fn leases(&self) -> &LeaseRegistry<WorldKey> {
        &self.state.leases
    }

    /// Provisions a match world for `participants` and starts warmup.
    pub async fn start_match(&self, participants: Vec<PlayerId>) -> Result<WorldKey, MatchError> {
        let tick = self.current_tick();
        self.state
            .matches
            .start_match(tick, participants, &self.state.host)
            .await
    }

    /// `player` used the extraction point in `world`.
    pub fn request_extraction(&self, player: PlayerId, world: &WorldKey) -> bool {
        self.state.matches.route_extraction_request(
            player,
            world,
            self.current_tick(),
            &self.state.host,
        )
    }

    /// `player` left `world` outside the engine's control (disconnect,
    /// death). They are no longer a participant.
    pub fn player_left(&self, player: PlayerId, world: &WorldKey) -> bool {
        self.state.matches.remove_participant(player, world)
    }

    /// Provisions a `sortie:temp_*` world that is destroyed after
    /// `lifetime_ticks`, or the configured default when `None`.
    pub async fn create_temporary_world(
        &self,
        lifetime_ticks: Option<u64>,
    ) -> Result<WorldKey, SortieError> {
        let lifetime =
            lifetime_ticks.unwrap_or(self.state.config.temporary_world_lifetime_ticks);
        let key = self.state.temp_keys.allocate();

        if lifetime == 0 {
            return Err(LeaseError::ZeroLifetime(key.to_string()).into());
        }

        provision_with_timeout(
            &self.state.host,
            &key,
            self.state.config.matches.provision_timeout_ms,
        )
        .await?;
        self.state.leases.register(key.clone(), lifetime)?;

        tracing::info!(world = %key, lifetime_ticks = lifetime, "temporary world created");
        Ok(key)
    }

    /// Cancels any lease on `world` and destroys it now.
    pub fn remove_temporary_world(&self, world: &WorldKey) -> Result<(), DestroyError> {
        self.state.leases.cancel(world);
        self.state.host.destroy_world(world)?;
        tracing::info!(%world, "world removed on request");
        Ok(())
    }

    /// Runs an operator command.
    pub async fn execute(&self, command: Command) -> Result<Feedback, CommandError> {
        match command {
            Command::StartMatch => {
                let players = self.state.host.connected_players();
                if players.is_empty() {
                    return Err(CommandError::NoParticipants);
                }
                let count = players.len();
                let world = self.start_match(players).await?;
                Ok(Feedback::MatchStarting {
                    players: count,
                    world,
                })
            }
            Command::CreateTemporaryWorld { lifetime_ticks } => {
                let lifetime_ticks =
                    lifetime_ticks.unwrap_or(self.state.config.temporary_world_lifetime_ticks);
                let world = self.create_temporary_world(Some(lifetime_ticks)).await?;
                Ok(Feedback::TemporaryWorldCreated {
                    world,
                    lifetime_ticks,
                })
            }
            Command::RemoveTemporaryWorld { key } => {
                self.remove_temporary_world(&key)?;
                Ok(Feedback::TemporaryWorldRemoved { world: key })
            }
        }
    }

    /// Stops [`ExtractionServer::run`] after the current tick.
    pub fn shutdown(&self) {
        self.state.shutdown.send_replace(true);
    }
}
