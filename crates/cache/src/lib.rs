//! Tiered key-value cache
//!
//! Redis is the primary store. When it becomes unreachable the cache keeps
//! serving from process memory and switches back once Redis recovers.
//! Callers never see a cache error.

pub mod backend;
pub mod memory;
pub mod tiered;

use thiserror::Error;

pub use backend::{CacheBackend, RedisBackend};
pub use memory::MemoryStore;
pub use tiered::{CacheMode, TieredCache};

/// Backend errors, logged and absorbed by `TieredCache`
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timed out")]
    Timeout,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = Result<T, CacheError>;
