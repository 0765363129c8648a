//! Remote cache backends

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::RedisResult;
use tokio::sync::Mutex;
use tracing::info;

use crate::{CacheError, CacheResult};

/// A remote string store with per-key expiry
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;
    async fn delete(&self, key: &str) -> CacheResult<()>;
    /// Connection health probe
    async fn ping(&self) -> CacheResult<()>;
}

/// Redis via a lazily created, self-reconnecting connection manager
pub struct RedisBackend {
    client: redis::Client,
    connection: Mutex<Option<ConnectionManager>>,
    timeout: Duration,
}

impl RedisBackend {
    /// Validates the URL only; the connection is opened on first use.
    pub fn new(url: &str, timeout: Duration) -> CacheResult<Self> {
        Ok(Self {
            client: redis::Client::open(url)?,
            connection: Mutex::new(None),
            timeout,
        })
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self.bounded(self.client.get_connection_manager()).await?;
        info!("Connected to Redis");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn bounded<T>(&self, fut: impl Future<Output = RedisResult<T>>) -> CacheResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        self.bounded(redis::cmd("GET").arg(key).query_async::<_, Option<String>>(&mut conn))
            .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1);
        self.bounded(
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(seconds)
                .query_async::<_, ()>(&mut conn),
        )
        .await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        self.bounded(redis::cmd("DEL").arg(key).query_async::<_, ()>(&mut conn))
            .await
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let reply = self
            .bounded(redis::cmd("PING").query_async::<_, String>(&mut conn))
            .await?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Unavailable(format!("unexpected PING reply: {}", reply)))
        }
    }
}
