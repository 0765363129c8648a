//! Provider abstraction used by the aggregator

use tokenagg_core::{SourceResult, TokenRecord, TokenSource};

/// An upstream market-data provider
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Provenance tag stamped on every record this provider returns
    fn source(&self) -> TokenSource;

    /// Free-text token search.
    ///
    /// Concrete clients degrade to an empty list once retries are exhausted;
    /// an `Err` means the provider could not be asked at all.
    async fn search(&self, query: &str) -> SourceResult<Vec<TokenRecord>>;

    /// Single-token lookup by address. Providers without one report absent.
    async fn lookup(&self, _address: &str) -> SourceResult<Option<TokenRecord>> {
        Ok(None)
    }
}
