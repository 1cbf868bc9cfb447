//! A recording `WorldHost` for match tests.
//!
//! Worlds are plain keys. Every notice, move, and removal is appended to
//! a log so tests can assert on exactly what the engine asked for.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use sortie_match::{DestroyError, Location, ProvisionError, WorldHost};
use sortie_protocol::{BlockPos, Notice, PlayerId, WorldKey};

pub const LOBBY_SPAWN: BlockPos = BlockPos::new(0, 100, 0);

pub struct FakeHost {
    pub worlds: Mutex<HashSet<WorldKey>>,
    pub online: Vec<PlayerId>,
    pub notices: Mutex<Vec<(PlayerId, Notice)>>,
    pub moves: Mutex<Vec<(PlayerId, WorldKey, BlockPos)>>,
    pub removed: Mutex<Vec<(PlayerId, WorldKey)>>,
    pub surface: i32,
    pub min_build: i32,
    pub sea_level: i32,
    pub has_lobby: bool,
    pub fail_next_provision: AtomicBool,
    pub provision_delay: Mutex<Option<Duration>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            worlds: Mutex::new(HashSet::new()),
            online: Vec::new(),
            notices: Mutex::new(Vec::new()),
            moves: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            surface: 70,
            min_build: -64,
            sea_level: 62,
            has_lobby: true,
            fail_next_provision: AtomicBool::new(false),
            provision_delay: Mutex::new(None),
        }
    }
}

impl FakeHost {
    pub fn with_players(ids: &[u64]) -> Self {
        Self {
            online: ids.iter().map(|&id| PlayerId(id)).collect(),
            ..Self::default()
        }
    }

    /// Registers a world as if it had been provisioned.
    pub fn add_world(&self, key: &WorldKey) {
        self.worlds.lock().insert(key.clone());
    }

    /// Unloads a world behind the engine's back.
    pub fn forget_world(&self, key: &WorldKey) {
        self.worlds.lock().remove(key);
    }

    pub fn fail_next_provision(&self) {
        self.fail_next_provision.store(true, Ordering::SeqCst);
    }

    pub fn delay_provisioning(&self, delay: Duration) {
        *self.provision_delay.lock() = Some(delay);
    }

    pub fn notices_for(&self, player: u64) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|(p, _)| *p == PlayerId(player))
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn moves_for(&self, player: u64) -> Vec<(WorldKey, BlockPos)> {
        self.moves
            .lock()
            .iter()
            .filter(|(p, _, _)| *p == PlayerId(player))
            .map(|(_, w, pos)| (w.clone(), *pos))
            .collect()
    }

    pub fn was_removed(&self, player: u64) -> bool {
        self.removed.lock().iter().any(|(p, _)| *p == PlayerId(player))
    }

    pub fn clear_log(&self) {
        self.notices.lock().clear();
        self.moves.lock().clear();
        self.removed.lock().clear();
    }
}

impl WorldHost for FakeHost {
    type World = WorldKey;

    async fn provision_world(&self, key: &WorldKey) -> Result<WorldKey, ProvisionError> {
        let delay = *self.provision_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next_provision.swap(false, Ordering::SeqCst) {
            return Err(ProvisionError::Failed {
                key: key.clone(),
                reason: "disk full".into(),
            });
        }
        self.worlds.lock().insert(key.clone());
        Ok(key.clone())
    }

    fn lookup_world(&self, key: &WorldKey) -> Option<WorldKey> {
        self.worlds.lock().get(key).cloned()
    }

    fn destroy_world(&self, key: &WorldKey) -> Result<(), DestroyError> {
        if self.worlds.lock().remove(key) {
            Ok(())
        } else {
            Err(DestroyError::NotFound(key.clone()))
        }
    }

    fn connected_players(&self) -> Vec<PlayerId> {
        self.online.clone()
    }

    fn move_player(&self, player: PlayerId, world: &WorldKey, pos: BlockPos) {
        self.moves.lock().push((player, world.clone(), pos));
    }

    fn remove_player(&self, player: PlayerId, world: &WorldKey) {
        self.removed.lock().push((player, world.clone()));
    }

    fn notify(&self, player: PlayerId, notice: &Notice) {
        self.notices.lock().push((player, notice.clone()));
    }

    fn surface_height(&self, _world: &WorldKey, _x: i32, _z: i32) -> i32 {
        self.surface
    }

    fn min_build_height(&self, _world: &WorldKey) -> i32 {
        self.min_build
    }

    fn sea_level(&self, _world: &WorldKey) -> i32 {
        self.sea_level
    }

    fn lobby(&self) -> Option<Location<WorldKey>> {
        self.has_lobby
            .then(|| Location::new(WorldKey::new("minecraft:overworld"), LOBBY_SPAWN))
    }
}
