//! Scripted providers for aggregator and refresh tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokenagg_cache::TieredCache;
use tokenagg_core::{AggregatorConfig, SourceError, SourceResult, TokenRecord, TokenSource};
use tokenagg_sources::TokenProvider;

use crate::TokenAggregator;

pub struct MockProvider {
    source: TokenSource,
    records: Vec<TokenRecord>,
    fail: bool,
    found: Option<TokenRecord>,
    delay: Duration,
    pub calls: AtomicU32,
    pub lookups: AtomicU32,
}

impl MockProvider {
    pub fn returning(source: TokenSource, records: Vec<TokenRecord>) -> Arc<Self> {
        Arc::new(Self {
            source,
            records,
            fail: false,
            found: None,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            lookups: AtomicU32::new(0),
        })
    }

    /// Like `returning`, but every search takes `delay` to answer
    pub fn returning_after(
        source: TokenSource,
        records: Vec<TokenRecord>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            records,
            fail: false,
            found: None,
            delay,
            calls: AtomicU32::new(0),
            lookups: AtomicU32::new(0),
        })
    }

    pub fn failing(source: TokenSource) -> Arc<Self> {
        Arc::new(Self {
            source,
            records: Vec::new(),
            fail: true,
            found: None,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            lookups: AtomicU32::new(0),
        })
    }

    pub fn finding(record: TokenRecord) -> Arc<Self> {
        Arc::new(Self {
            source: TokenSource::DexScreener,
            records: Vec::new(),
            fail: false,
            found: Some(record),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            lookups: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenProvider for MockProvider {
    fn source(&self) -> TokenSource {
        self.source
    }

    async fn search(&self, _query: &str) -> SourceResult<Vec<TokenRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(SourceError::Request("connection reset".to_string()));
        }
        Ok(self.records.clone())
    }

    async fn lookup(&self, _address: &str) -> SourceResult<Option<TokenRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::RetriesExhausted {
                source_name: "mock",
                attempts: 4,
                last_error: "connection reset".to_string(),
            });
        }
        Ok(self.found.clone())
    }
}

pub fn record(addr: &str, source: TokenSource, volume: f64) -> TokenRecord {
    let mut record = TokenRecord::new(addr, addr, addr, source);
    record.volume_24h = volume;
    record
}

pub fn aggregator(primary: Arc<MockProvider>, secondary: Arc<MockProvider>) -> TokenAggregator {
    TokenAggregator::new(
        primary,
        secondary,
        Arc::new(TieredCache::in_memory(Duration::from_secs(30))),
        AggregatorConfig::default(),
    )
}
