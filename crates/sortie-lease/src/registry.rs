//! The lease registry.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::LeaseError;

/// Tracks remaining lifetimes of temporary resources.
///
/// ## Lifecycle
///
/// ```text
/// register(key, n) ──→ tick() × n ──→ destroy(key) ──→ [forgotten]
///        │
///        └──→ cancel(key) ──→ [forgotten, not destroyed]
/// ```
///
/// All methods take `&self`; the map sits behind a mutex so command
/// handlers can register or cancel leases while the tick driver runs.
/// The destroy callback is always invoked after the lock is released,
/// so it may call back into the registry.
pub struct LeaseRegistry<K> {
    leases: Mutex<HashMap<K, u64>>,
}

impl<K> LeaseRegistry<K>
where
    K: Eq + Hash + Clone + Display,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Starts (or restarts) a countdown of `lifetime_ticks` for `key`.
    ///
    /// # Errors
    /// Returns [`LeaseError::ZeroLifetime`] if `lifetime_ticks` is 0.
    pub fn register(&self, key: K, lifetime_ticks: u64) -> Result<(), LeaseError> {
        if lifetime_ticks == 0 {
            return Err(LeaseError::ZeroLifetime(key.to_string()));
        }

        let previous = self.leases.lock().insert(key.clone(), lifetime_ticks);
        match previous {
            Some(old) => tracing::debug!(
                %key,
                old_remaining = old,
                lifetime_ticks,
                "lease replaced"
            ),
            None => tracing::debug!(%key, lifetime_ticks, "lease registered"),
        }
        Ok(())
    }

    /// Counts every lease down by one tick and destroys the ones that ran
    /// out.
    ///
    /// Expired leases are removed before `destroy` runs, and are never
    /// retried: a failing `destroy` is logged and the lease is still
    /// forgotten. Returns the keys that expired on this tick, in no
    /// particular order.
    pub fn tick<E, F>(&self, mut destroy: F) -> Vec<K>
    where
        E: Display,
        F: FnMut(&K) -> Result<(), E>,
    {
        let expired: Vec<K> = {
            let mut leases = self.leases.lock();
            let mut expired = Vec::new();
            leases.retain(|key, remaining| {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    expired.push(key.clone());
                    false
                } else {
                    true
                }
            });
            expired
        };

        for key in &expired {
            match destroy(key) {
                Ok(()) => tracing::info!(%key, "lease expired, resource destroyed"),
                Err(error) => tracing::warn!(
                    %key,
                    %error,
                    "lease expired but resource teardown failed"
                ),
            }
        }

        expired
    }

    /// Drops the lease for `key` without destroying the resource.
    ///
    /// Returns `true` if a lease existed.
    pub fn cancel(&self, key: &K) -> bool {
        let removed = self.leases.lock().remove(key).is_some();
        if removed {
            tracing::debug!(%key, "lease cancelled");
        }
        removed
    }

    /// Ticks left on `key`'s lease, if any.
    pub fn remaining(&self, key: &K) -> Option<u64> {
        self.leases.lock().get(key).copied()
    }

    /// Number of live leases.
    pub fn len(&self) -> usize {
        self.leases.lock().len()
    }

    /// `true` if no leases are live.
    pub fn is_empty(&self) -> bool {
        self.leases.lock().is_empty()
    }
}

impl<K> Default for LeaseRegistry<K>
where
    K: Eq + Hash + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}
