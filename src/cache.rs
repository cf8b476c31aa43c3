//! # Ephemeral Progress Cache
//!
//! Short-TTL, non-authoritative side channel for UI polling of in-flight
//! work. Tasks write progress snapshots; the UI tolerates staleness or a
//! missing entry entirely. The orchestrator never reads this back as a
//! decision input; the persistent aggregate is the source of truth.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Injectable key-value abstraction with TTL.
pub trait ProgressCache: Send + Sync {
    fn put(&self, key: &str, value: Value, ttl: Duration);
    fn get(&self, key: &str) -> Option<Value>;
    fn remove(&self, key: &str);
}

/// In-memory TTL cache; expired entries are dropped lazily on read.
#[derive(Debug, Default, Clone)]
pub struct MemoryProgressCache {
    entries: Arc<DashMap<String, (Value, Instant)>>,
}

impl MemoryProgressCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressCache for MemoryProgressCache {
    fn put(&self, key: &str, value: Value, ttl: Duration) {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }

    fn get(&self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, deadline) = entry.value();
                if Instant::now() < *deadline {
                    return Some(value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
