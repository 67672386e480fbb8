//! A TTL key/value store with a background sweeper.
//!
//! Reads never return expired entries; the sweeper only reclaims the
//! memory of entries nobody asks for anymore.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::select;
use tokio::time::{interval, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V> {
    entries: Arc<Mutex<HashMap<String, Entry<V>>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.lock().insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.lock().remove(key).map(|entry| entry.value)
    }

    /// Drops every expired entry; returns how many were reclaimed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }
}

/// Spawns the sweeper task; dropping the guard stops it.
pub fn spawn_sweeper<V: Send + 'static>(cache: TtlCache<V>, every: Duration) -> cancel::Guard {
    let cancel_token = cancel::Token::new();
    let token = cancel_token.clone();
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            select! {
                biased;

                _ = token.cancelled() => return,

                _ = ticker.tick() => {}
            }
            let purged = cache.purge_expired();
            if purged > 0 {
                log::debug!("cache sweeper reclaimed {purged} expired entries");
            }
        }
    });
    cancel_token.guard()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_on_read() {
        let cache = TtlCache::new();
        cache.insert("k", 7u32, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(7));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("k"), None);
        // Expired but not yet reclaimed.
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_refreshes_ttl() {
        let cache = TtlCache::new();
        cache.insert("k", 1u32, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert("k", 2u32, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_reclaims_expired_entries() {
        let cache = TtlCache::new();
        cache.insert("a", 1u32, Duration::from_secs(5));
        cache.insert("b", 2u32, Duration::from_secs(500));
        let _guard = spawn_sweeper(cache.clone(), Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }
}
