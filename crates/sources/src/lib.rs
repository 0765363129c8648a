//! Upstream market-data providers
//!
//! Features:
//! - Per-client request spacing
//! - Bounded exponential-backoff retries
//! - Zero-defaulting payload mapping for partial upstream responses
//! - DexScreener (price/liquidity authority) and Jupiter (discovery) clients

pub mod limiter;
pub mod retry;
pub mod http;
pub mod provider;
pub mod dexscreener;
pub mod jupiter;

pub use dexscreener::DexScreenerClient;
pub use jupiter::JupiterClient;
pub use limiter::RateLimiter;
pub use provider::TokenProvider;
pub use retry::RetryPolicy;
