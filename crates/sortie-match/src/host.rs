//! The boundary between the match engine and the game server.
//!
//! The engine never touches worlds or players directly. Everything it
//! needs (creating a world, moving a player, measuring terrain, sending
//! a message) goes through [`WorldHost`], so the same engine runs
//! against a real server, the in-memory host, or a test double.

use sortie_protocol::{BlockPos, Notice, PlayerId, WorldKey};

use crate::{DestroyError, ProvisionError};

/// A position in a specific world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location<W> {
    pub world: W,
    pub pos: BlockPos,
}

impl<W> Location<W> {
    pub fn new(world: W, pos: BlockPos) -> Self {
        Self { world, pos }
    }
}

/// Everything the match engine asks of the host server.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static`: one host is shared by the tick driver and
///   every command handler for the life of the server.
/// - `World: Clone`: handles are cheap references to a loaded world
///   (an `Arc`, an index, a key), not the world itself.
///
/// Player operations are fire-and-forget. A player who disconnected
/// between ticks is silently skipped by the host.
pub trait WorldHost: Send + Sync + 'static {
    /// Handle to a loaded world.
    type World: Clone + Send + Sync + 'static;

    /// Creates (or loads) the world stored under `key`.
    ///
    /// May take a while; the directory bounds it with
    /// [`MatchConfig::provision_timeout_ms`](crate::MatchConfig).
    fn provision_world(
        &self,
        key: &WorldKey,
    ) -> impl std::future::Future<Output = Result<Self::World, ProvisionError>> + Send;

    /// The loaded world under `key`, if it still exists.
    fn lookup_world(&self, key: &WorldKey) -> Option<Self::World>;

    /// Unloads the world under `key` and deletes its data.
    fn destroy_world(&self, key: &WorldKey) -> Result<(), DestroyError>;

    /// Every player currently connected.
    fn connected_players(&self) -> Vec<PlayerId>;

    /// Teleports `player` to `pos` in `world`.
    fn move_player(&self, player: PlayerId, world: &Self::World, pos: BlockPos);

    /// Forcibly takes `player` out of `world`, however the host defines
    /// that (kill, kick, send to lobby).
    fn remove_player(&self, player: PlayerId, world: &Self::World);

    /// Shows `notice` to `player`.
    fn notify(&self, player: PlayerId, notice: &Notice);

    /// Y of the highest motion-blocking block at column `(x, z)`.
    fn surface_height(&self, world: &Self::World, x: i32, z: i32) -> i32;

    /// Lowest buildable Y in `world`.
    fn min_build_height(&self, world: &Self::World) -> i32;

    /// Sea level of `world`.
    fn sea_level(&self, world: &Self::World) -> i32;

    /// Where extracted players are sent. `None` if the host has no lobby
    /// loaded, in which case extracted players stay where they are.
    fn lobby(&self) -> Option<Location<Self::World>>;
}

/// Awaits `host.provision_world(key)`, giving up after `timeout_ms`.
///
/// A `timeout_ms` of 0 waits indefinitely.
pub async fn provision_with_timeout<H: WorldHost>(
    host: &H,
    key: &WorldKey,
    timeout_ms: u64,
) -> Result<H::World, ProvisionError> {
    if timeout_ms == 0 {
        return host.provision_world(key).await;
    }

    let limit = std::time::Duration::from_millis(timeout_ms);
    match tokio::time::timeout(limit, host.provision_world(key)).await {
        Ok(result) => result,
        Err(_) => Err(ProvisionError::TimedOut {
            key: key.clone(),
            timeout_ms,
        }),
    }
}
