//! World key allocation.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use sortie_protocol::WorldKey;

/// Hands out `sortie:<prefix>_<salt>_<n>` keys.
///
/// The counter restarts with the process, so the salt is what keeps keys
/// from one run apart from leftovers of the previous one.
#[derive(Debug)]
pub struct KeyAllocator {
    prefix: &'static str,
    salt: String,
    next: AtomicU64,
}

impl KeyAllocator {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            salt: generate_salt(),
            next: AtomicU64::new(1),
        }
    }

    /// Reserves the next key. Safe to call from any thread.
    pub fn allocate(&self) -> WorldKey {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        WorldKey::in_namespace(format!("{}_{}_{n}", self.prefix, self.salt))
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }
}

/// Random 8-character hex string.
fn generate_salt() -> String {
    let bytes: [u8; 4] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
