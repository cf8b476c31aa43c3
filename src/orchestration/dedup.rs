//! # Dedup Lock
//!
//! Non-blocking, per-key mutual exclusion preventing overlapping task
//! execution for the same logical entity. A failed acquire means another
//! execution is in flight: the duplicate dispatch is dropped silently and
//! does not touch anyone's retry budget.
//!
//! The guard releases on Drop, so the lock is freed when the holding task
//! finishes for any reason, including timeout cancellation.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of in-flight logical keys.
#[derive(Debug, Default, Clone)]
pub struct DedupLockRegistry {
    keys: Arc<DashMap<String, ()>>,
}

impl DedupLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim `key`. Returns `None` when another holder is in flight.
    pub fn try_acquire(&self, key: &str) -> Option<DedupGuard> {
        use dashmap::mapref::entry::Entry;
        match self.keys.entry(key.to_string()) {
            Entry::Occupied(_) => {
                debug!(key, "Dedup lock busy, dropping duplicate dispatch");
                None
            }
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(DedupGuard {
                    keys: Arc::clone(&self.keys),
                    key: key.to_string(),
                })
            }
        }
    }
}

/// Holds one key; releases it when dropped.
#[derive(Debug)]
pub struct DedupGuard {
    keys: Arc<DashMap<String, ()>>,
    key: String,
}

impl Drop for DedupGuard {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}
