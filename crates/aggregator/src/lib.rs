//! Token search aggregation and background refresh
//!
//! - `TokenAggregator` fans a query out to both providers, merges the
//!   results with fixed precedence and caches them
//! - `RefreshLoop` periodically re-fetches the tracked query and
//!   broadcasts jittered records to subscribers

pub mod aggregator;
pub mod refresh;

#[cfg(test)]
mod test_support;

pub use aggregator::{merge_records, TokenAggregator, TokenQuery};
pub use refresh::{apply_jitter, RefreshLoop};
