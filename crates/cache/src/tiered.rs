//! Remote-first cache with transparent in-memory fallback
//!
//! Two levels of fallback:
//! - mode level: connection-health signals flip the whole cache between
//!   `RemoteActive` and `LocalFallback`
//! - operation level: a single failed remote call is served by the local
//!   store without touching the mode

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tokenagg_core::CacheConfig;

use crate::backend::{CacheBackend, RedisBackend};
use crate::memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    RemoteActive,
    LocalFallback,
}

impl CacheMode {
    pub fn name(&self) -> &'static str {
        match self {
            CacheMode::RemoteActive => "redis",
            CacheMode::LocalFallback => "memory",
        }
    }
}

pub struct TieredCache {
    remote: Option<Arc<dyn CacheBackend>>,
    local: MemoryStore,
    use_remote: AtomicBool,
    default_ttl: Duration,
}

impl TieredCache {
    /// Remote-backed cache, starting in `RemoteActive`
    pub fn new(remote: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            remote: Some(remote),
            local: MemoryStore::new(),
            use_remote: AtomicBool::new(true),
            default_ttl,
        }
    }

    /// Memory-only cache; recovery signals are ignored
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self {
            remote: None,
            local: MemoryStore::new(),
            use_remote: AtomicBool::new(false),
            default_ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.redis_url.is_empty() {
            info!("No Redis URL configured, using in-memory cache");
            return Self::in_memory(config.default_ttl());
        }

        match RedisBackend::new(&config.redis_url, config.operation_timeout()) {
            Ok(backend) => Self::new(Arc::new(backend), config.default_ttl()),
            Err(e) => {
                warn!("Invalid Redis URL {}: {}, using in-memory cache", config.redis_url, e);
                Self::in_memory(config.default_ttl())
            }
        }
    }

    pub fn mode(&self) -> CacheMode {
        if self.use_remote.load(Ordering::Acquire) {
            CacheMode::RemoteActive
        } else {
            CacheMode::LocalFallback
        }
    }

    /// Remote connection failed: serve everything from memory
    pub fn on_backend_error(&self, reason: &str) {
        if self.use_remote.swap(false, Ordering::AcqRel) {
            warn!("Redis connection failed ({}), switching to in-memory cache", reason);
        }
    }

    /// Remote connection is back: resume using it
    pub fn on_backend_recovered(&self) {
        if self.remote.is_none() {
            return;
        }
        if !self.use_remote.swap(true, Ordering::AcqRel) {
            info!("Redis connected, switching back to Redis cache");
        }
    }

    fn active_remote(&self) -> Option<&dyn CacheBackend> {
        if self.use_remote.load(Ordering::Acquire) {
            self.remote.as_deref()
        } else {
            None
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        if let Some(remote) = self.active_remote() {
            match remote.get(key).await {
                Ok(value) => return value,
                Err(e) => warn!("Cache get error, falling back to memory: {}", e),
            }
        }

        self.local.get(key)
    }

    /// Store with the default TTL
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Not caching {}: {}", key, e);
                return;
            }
        };

        if let Some(remote) = self.active_remote() {
            match remote.set(key, &raw, ttl).await {
                Ok(()) => return,
                Err(e) => warn!("Cache set error, falling back to memory: {}", e),
            }
        }

        self.local.set(key, raw, ttl);
    }

    /// Remove from both tiers so a fallback copy cannot resurface
    pub async fn delete(&self, key: &str) {
        if let Some(remote) = self.active_remote() {
            if let Err(e) = remote.delete(key).await {
                warn!("Cache del error: {}", e);
            }
        }

        self.local.remove(key);
    }

    /// Ping the remote backend every `interval` (at least 1ms) and drive the
    /// mode from the result. `None` for a memory-only cache.
    pub fn spawn_health_monitor(self: &Arc<Self>, interval: Duration) -> Option<JoinHandle<()>> {
        let remote = self.remote.clone()?;
        let cache = Arc::clone(self);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match remote.ping().await {
                    Ok(()) => cache.on_backend_recovered(),
                    Err(e) => {
                        debug!("{} health check failed: {}", remote.name(), e);
                        cache.on_backend_error(&e.to_string());
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheError, CacheResult};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Remote stand-in that can be switched into a failing state
    #[derive(Default)]
    struct FakeBackend {
        store: Mutex<HashMap<String, String>>,
        failing: AtomicBool,
    }

    impl FakeBackend {
        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> CacheResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(CacheError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        fn contains(&self, key: &str) -> bool {
            self.store.lock().contains_key(key)
        }
    }

    #[async_trait::async_trait]
    impl CacheBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            self.check()?;
            Ok(self.store.lock().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
            self.check()?;
            self.store.lock().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.check()?;
            self.store.lock().remove(key);
            Ok(())
        }

        async fn ping(&self) -> CacheResult<()> {
            self.check()
        }
    }

    fn remote_cache() -> (Arc<TieredCache>, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::default());
        let cache = TieredCache::new(backend.clone(), Duration::from_secs(30));
        (Arc::new(cache), backend)
    }

    #[tokio::test]
    async fn test_round_trip_through_remote() {
        let (cache, backend) = remote_cache();
        let value = vec!["a".to_string(), "b".to_string()];

        cache.set("k", &value).await;

        assert_eq!(cache.get::<Vec<String>>("k").await, Some(value));
        assert!(backend.contains("k"));
        assert!(cache.local.is_empty());
    }

    #[tokio::test]
    async fn test_error_signal_switches_to_local() {
        let (cache, backend) = remote_cache();
        cache.on_backend_error("connection refused");
        assert_eq!(cache.mode(), CacheMode::LocalFallback);

        cache.set("k", &42u32).await;

        assert_eq!(cache.get::<u32>("k").await, Some(42));
        assert!(!backend.contains("k"));
    }

    #[tokio::test]
    async fn test_recovery_signal_switches_back() {
        let (cache, backend) = remote_cache();
        cache.on_backend_error("connection refused");
        cache.set("during-outage", &1u32).await;

        cache.on_backend_recovered();
        assert_eq!(cache.mode(), CacheMode::RemoteActive);

        // remote is consulted again and never saw the outage write
        assert_eq!(cache.get::<u32>("during-outage").await, None);
        cache.set("after", &2u32).await;
        assert!(backend.contains("after"));
    }

    #[tokio::test]
    async fn test_failed_operation_falls_back_without_mode_change() {
        let (cache, backend) = remote_cache();
        backend.fail(true);

        cache.set("k", &"v").await;

        assert_eq!(cache.mode(), CacheMode::RemoteActive);
        assert_eq!(cache.get::<String>("k").await.as_deref(), Some("v"));
        assert_eq!(cache.local.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_swallows_remote_errors() {
        let (cache, backend) = remote_cache();
        backend.fail(true);
        cache.set("k", &1u32).await;

        cache.delete("k").await;

        assert_eq!(cache.get::<u32>("k").await, None);
    }

    #[tokio::test]
    async fn test_delete_removes_from_remote() {
        let (cache, backend) = remote_cache();
        cache.set("k", &1u32).await;

        cache.delete("k").await;

        assert!(!backend.contains("k"));
        assert_eq!(cache.get::<u32>("k").await, None);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_absent() {
        let (cache, _) = remote_cache();
        cache.set("k", &"text").await;

        assert_eq!(cache.get::<u64>("k").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_in_memory() {
        let cache = TieredCache::in_memory(Duration::from_secs(30));
        cache.set_with_ttl("k", &1u32, Duration::from_secs(60)).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get::<u32>("k").await, Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get::<u32>("k").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_applies() {
        let cache = TieredCache::in_memory(Duration::from_secs(30));
        cache.set("k", &1u32).await;

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.get::<u32>("k").await, None);
    }

    #[tokio::test]
    async fn test_in_memory_ignores_recovery() {
        let cache = TieredCache::in_memory(Duration::from_secs(30));
        cache.on_backend_recovered();

        assert_eq!(cache.mode(), CacheMode::LocalFallback);
        cache.set("k", &1u32).await;
        assert_eq!(cache.get::<u32>("k").await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_monitor_drives_mode() {
        let (cache, backend) = remote_cache();
        let interval = Duration::from_millis(100);
        backend.fail(true);

        let handle = cache.spawn_health_monitor(interval).unwrap();
        tokio::time::sleep(interval / 2).await;
        assert_eq!(cache.mode(), CacheMode::LocalFallback);

        backend.fail(false);
        tokio::time::sleep(interval).await;
        assert_eq!(cache.mode(), CacheMode::RemoteActive);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_health_interval_still_runs() {
        let (cache, backend) = remote_cache();
        backend.fail(true);

        let handle = cache.spawn_health_monitor(Duration::ZERO).unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.mode(), CacheMode::LocalFallback);
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test]
    async fn test_memory_only_has_no_monitor() {
        let cache = Arc::new(TieredCache::in_memory(Duration::from_secs(30)));
        assert!(cache.spawn_health_monitor(Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_empty_url_means_memory_only() {
        let config = CacheConfig {
            redis_url: String::new(),
            ..Default::default()
        };
        assert_eq!(TieredCache::from_config(&config).mode(), CacheMode::LocalFallback);
    }
}
