//! Identity and position types shared across the workspace.
//!
//! Everything here is plain data: no locks, no host handles, no clock.
//! The match engine, the lease registry, and the host adapter all agree
//! on these types, so they live at the bottom of the dependency graph
//! where every other crate can reach them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player on the host server.
///
/// Newtype over `u64` so a player can never be confused with a tick count
/// or a coordinate. `#[serde(transparent)]` keeps the serialized form a
/// bare number: `PlayerId(42)` becomes `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// `{}` formatting, used in every `tracing` field that names a player:
/// `tracing::info!(%player, "extracted")` logs `player=P-42`.
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The identifier of an isolated world on the host.
///
/// Keys are namespaced strings (`namespace:path`), mirroring how game
/// servers name dimensions. A match world looks like
/// `sortie:match_3f9a1c2e_7`; a temporary world `sortie:temp_3f9a1c2e_1`.
///
/// A `WorldKey` is the primary key of both the match directory and the
/// lease registry, so it must be cheap to clone and hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldKey(String);

impl WorldKey {
    /// The namespace used for every world Sortie allocates.
    ///
    /// Keeping engine-owned worlds under one namespace lets an operator
    /// tell them apart from the host's permanent worlds at a glance, and
    /// lets storage cleanup stay inside `dimensions/sortie/`.
    pub const NAMESPACE: &'static str = "sortie";

    /// Wraps an already-formatted key.
    ///
    /// No validation happens here: keys coming back from the host (for
    /// example the lobby, `minecraft:overworld`) are taken as-is.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Builds `sortie:<path>`.
    ///
    /// Takes `impl Display` rather than `&str` so callers can pass a
    /// `format_args!` or any id type without allocating twice.
    pub fn in_namespace(path: impl fmt::Display) -> Self {
        Self(format!("{}:{path}", Self::NAMESPACE))
    }

    /// The full key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `:`; `None` for un-namespaced keys.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(':').map(|(ns, _)| ns)
    }

    /// The part after the first `:` (the whole key if there is none).
    ///
    /// Only the first `:` splits, so a path may itself contain colons.
    pub fn path(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(_, path)| path)
    }
}

impl fmt::Display for WorldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lets tests and config code write `WorldKey::from("sortie:x")` or pass
/// a string literal where a key is expected.
impl From<&str> for WorldKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Integer block coordinates inside a world.
///
/// `Copy` because a position is three `i32`s: passing it by value is
/// cheaper than borrowing. Serialized as `{ "x": .., "y": .., "z": .. }`
/// so it reads the same in logs and in any UI a host forwards it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// East/west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North/south axis.
    pub z: i32,
}

impl BlockPos {
    /// Creates a position from its three coordinates.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
