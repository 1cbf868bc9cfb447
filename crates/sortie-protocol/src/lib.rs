//! Shared vocabulary for Sortie.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - **Identity** ([`PlayerId`], [`WorldKey`]): who is playing and which
//!   isolated world a match or temporary resource lives in.
//! - **Positions** ([`BlockPos`]): integer block coordinates used for
//!   spawn points and lobby relocation.
//! - **Notices** ([`Notice`]): the catalogue of user-facing messages the
//!   match engine sends to players.
//!
//! The crate knows nothing about ticks, matches, or hosts. It only
//! defines data.
//!
//! ```text
//! sortie-match / sortie-lease / sortie (above)  ← use these types
//!     ↕
//! sortie-protocol (this crate)                  ← plain data, serde only
//! ```

mod notice;
mod types;

pub use notice::Notice;
pub use types::{BlockPos, PlayerId, WorldKey};
