//! In-process [`WorldHost`] for demos, tests, and headless runs.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sortie_match::{DestroyError, Location, ProvisionError, WorldHost};
use sortie_protocol::{BlockPos, Notice, PlayerId, WorldKey};
use tokio::task::JoinHandle;

/// Key of the world extracted and removed players are sent to.
pub const LOBBY_WORLD: &str = "minecraft:overworld";

/// A world held in memory.
///
/// Terrain is a deterministic function of the column, so the same key
/// always produces the same spawn heights.
#[derive(Debug)]
pub struct MemoryWorld {
    key: WorldKey,
    sea_level: i32,
    min_build_height: i32,
    void: bool,
    storage: Option<PathBuf>,
}

impl MemoryWorld {
    fn new(key: WorldKey, void: bool, storage: Option<PathBuf>) -> Self {
        Self {
            key,
            sea_level: 62,
            min_build_height: -64,
            void,
            storage,
        }
    }

    pub fn key(&self) -> &WorldKey {
        &self.key
    }

    /// On-disk directory backing this world, if the host has a storage root.
    pub fn storage(&self) -> Option<&Path> {
        self.storage.as_deref()
    }

    /// Highest solid block at `(x, z)`: gentle hills around sea level, or
    /// the world floor in a void world.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        if self.void {
            return self.min_build_height;
        }
        let noise = (x.wrapping_mul(73_856_093) ^ z.wrapping_mul(19_349_663)).rem_euclid(16);
        self.sea_level + noise - 4
    }
}

/// What the host knows about one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub connected: bool,
    /// Last position the engine moved the player to.
    pub location: Option<(WorldKey, BlockPos)>,
    /// Notices in the order they were sent.
    pub inbox: Vec<Notice>,
    /// Times the player was forcibly removed from a match world.
    pub removals: u32,
}

impl PlayerRecord {
    fn online() -> Self {
        Self {
            connected: true,
            location: None,
            inbox: Vec::new(),
            removals: 0,
        }
    }
}

/// A [`WorldHost`] that keeps worlds and players in memory.
///
/// With a storage root, every provisioned world also gets a directory at
/// `<root>/dimensions/<namespace>/<path>`, which is deleted when the
/// world is destroyed. `destroy_world` is called from the tick pass, so
/// inside a tokio runtime the directory is removed on a background task
/// and the world is only unloaded synchronously. Outside a runtime the
/// removal happens inline.
pub struct MemoryHost {
    worlds: Mutex<HashMap<WorldKey, Arc<MemoryWorld>>>,
    players: Mutex<BTreeMap<PlayerId, PlayerRecord>>,
    lobby: Location<Arc<MemoryWorld>>,
    storage_root: Option<PathBuf>,
    void_terrain: bool,
    fail_next_provision: AtomicBool,
    teardown: Mutex<Vec<JoinHandle<()>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        let lobby = Arc::new(MemoryWorld::new(WorldKey::new(LOBBY_WORLD), false, None));
        let spawn_y = lobby.surface_height(0, 0) + 1;
        Self {
            worlds: Mutex::new(HashMap::new()),
            players: Mutex::new(BTreeMap::new()),
            lobby: Location::new(lobby, BlockPos::new(0, spawn_y, 0)),
            storage_root: None,
            void_terrain: false,
            fail_next_provision: AtomicBool::new(false),
            teardown: Mutex::new(Vec::new()),
        }
    }

    /// Back provisioned worlds with directories under `root`.
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = Some(root.into());
        self
    }

    /// Provision worlds with no terrain at all.
    pub fn with_void_terrain(mut self) -> Self {
        self.void_terrain = true;
        self
    }

    /// Makes the next `provision_world` call fail.
    pub fn fail_next_provision(&self) {
        self.fail_next_provision.store(true, Ordering::SeqCst);
    }

    /// Marks `player` online. Reconnecting keeps their record.
    pub fn connect(&self, player: PlayerId) {
        self.players
            .lock()
            .entry(player)
            .and_modify(|record| record.connected = true)
            .or_insert_with(PlayerRecord::online);
    }

    pub fn disconnect(&self, player: PlayerId) {
        if let Some(record) = self.players.lock().get_mut(&player) {
            record.connected = false;
        }
    }

    pub fn player(&self, player: PlayerId) -> Option<PlayerRecord> {
        self.players.lock().get(&player).cloned()
    }

    /// Drains and returns `player`'s inbox.
    pub fn take_inbox(&self, player: PlayerId) -> Vec<Notice> {
        self.players
            .lock()
            .get_mut(&player)
            .map(|record| std::mem::take(&mut record.inbox))
            .unwrap_or_default()
    }

    pub fn location(&self, player: PlayerId) -> Option<(WorldKey, BlockPos)> {
        self.players
            .lock()
            .get(&player)
            .and_then(|record| record.location.clone())
    }

    pub fn world_exists(&self, key: &WorldKey) -> bool {
        self.worlds.lock().contains_key(key)
    }

    pub fn world_count(&self) -> usize {
        self.worlds.lock().len()
    }

    /// Where `key` would be stored, if the host has a storage root.
    pub fn storage_path(&self, key: &WorldKey) -> Option<PathBuf> {
        let root = self.storage_root.as_ref()?;
        let namespace = key.namespace().unwrap_or("minecraft");
        Some(root.join("dimensions").join(namespace).join(key.path()))
    }

    /// Waits until every storage removal started by `destroy_world` has
    /// finished.
    pub async fn flush_teardown(&self) {
        let pending = std::mem::take(&mut *self.teardown.lock());
        for task in pending {
            if let Err(error) = task.await {
                tracing::warn!(%error, "world storage removal task failed");
            }
        }
    }

    /// Removes `dir` without blocking the calling runtime thread.
    fn remove_storage(&self, key: &WorldKey, dir: PathBuf) -> Result<(), DestroyError> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return match std::fs::remove_dir_all(&dir) {
                Err(source) if source.kind() != std::io::ErrorKind::NotFound => {
                    Err(DestroyError::Storage {
                        key: key.clone(),
                        source,
                    })
                }
                _ => Ok(()),
            };
        };

        let world = key.clone();
        let task = runtime.spawn(async move {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => tracing::debug!(%world, "world storage removed"),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => tracing::warn!(
                    %world,
                    path = %dir.display(),
                    %error,
                    "failed to remove world storage"
                ),
            }
        });

        let mut pending = self.teardown.lock();
        pending.retain(|task| !task.is_finished());
        pending.push(task);
        Ok(())
    }

    fn send_to_lobby(&self, record: &mut PlayerRecord) {
        record.location = Some((self.lobby.world.key().clone(), self.lobby.pos));
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldHost for MemoryHost {
    type World = Arc<MemoryWorld>;

    async fn provision_world(&self, key: &WorldKey) -> Result<Arc<MemoryWorld>, ProvisionError> {
        if self.fail_next_provision.swap(false, Ordering::SeqCst) {
            return Err(ProvisionError::Failed {
                key: key.clone(),
                reason: "injected failure".to_string(),
            });
        }

        let existing = self.worlds.lock().get(key).cloned();
        if let Some(world) = existing {
            return Ok(world);
        }

        let storage = self.storage_path(key);
        if let Some(dir) = &storage {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|error| ProvisionError::Failed {
                    key: key.clone(),
                    reason: error.to_string(),
                })?;
        }

        let world = Arc::new(MemoryWorld::new(key.clone(), self.void_terrain, storage));
        let world = Arc::clone(self.worlds.lock().entry(key.clone()).or_insert(world));
        tracing::debug!(world = %key, "world provisioned");
        Ok(world)
    }

    fn lookup_world(&self, key: &WorldKey) -> Option<Arc<MemoryWorld>> {
        self.worlds.lock().get(key).cloned()
    }

    fn destroy_world(&self, key: &WorldKey) -> Result<(), DestroyError> {
        let world = self
            .worlds
            .lock()
            .remove(key)
            .ok_or_else(|| DestroyError::NotFound(key.clone()))?;

        // Nobody may be left standing in an unloaded world.
        {
            let mut players = self.players.lock();
            for record in players.values_mut() {
                if matches!(&record.location, Some((w, _)) if w == key) {
                    self.send_to_lobby(record);
                }
            }
        }

        if let Some(dir) = world.storage() {
            self.remove_storage(key, dir.to_path_buf())?;
        }

        tracing::debug!(world = %key, "world destroyed");
        Ok(())
    }

    fn connected_players(&self) -> Vec<PlayerId> {
        self.players
            .lock()
            .iter()
            .filter(|(_, record)| record.connected)
            .map(|(&id, _)| id)
            .collect()
    }

    fn move_player(&self, player: PlayerId, world: &Arc<MemoryWorld>, pos: BlockPos) {
        match self.players.lock().get_mut(&player) {
            Some(record) if record.connected => {
                record.location = Some((world.key().clone(), pos));
            }
            _ => tracing::debug!(%player, "move skipped, player offline"),
        }
    }

    fn remove_player(&self, player: PlayerId, world: &Arc<MemoryWorld>) {
        let mut players = self.players.lock();
        let Some(record) = players.get_mut(&player) else {
            return;
        };
        if matches!(&record.location, Some((w, _)) if w == world.key()) {
            record.removals += 1;
            self.send_to_lobby(record);
        }
    }

    fn notify(&self, player: PlayerId, notice: &Notice) {
        if let Some(record) = self.players.lock().get_mut(&player) {
            if record.connected {
                record.inbox.push(notice.clone());
            }
        }
    }

    fn surface_height(&self, world: &Arc<MemoryWorld>, x: i32, z: i32) -> i32 {
        world.surface_height(x, z)
    }

    fn min_build_height(&self, world: &Arc<MemoryWorld>) -> i32 {
        world.min_build_height
    }

    fn sea_level(&self, world: &Arc<MemoryWorld>) -> i32 {
        world.sea_level
    }

    fn lobby(&self) -> Option<Location<Arc<MemoryWorld>>> {
        Some(self.lobby.clone())
    }
}
