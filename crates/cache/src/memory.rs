//! In-process fallback store
//!
//! Uses DashMap for concurrent reads/writes. Entries leave only through TTL
//! expiry (checked on read) or explicit removal; there is no size bound.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Value with an absolute expiry
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub value: String,
    pub expires_at: Instant,
}

impl MemoryEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live value for `key`; an expired entry is deleted and reported absent
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();

        match self.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => {}
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    pub fn set(&self, key: &str, value: String, ttl: Duration) {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
