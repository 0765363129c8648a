//! Shared handler state

use std::sync::Arc;

use tokenagg_aggregator::{RefreshLoop, TokenAggregator};
use tokenagg_cache::TieredCache;
use tokenagg_core::{AppConfig, SourceResult};
use tokenagg_sources::{DexScreenerClient, JupiterClient};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<TokenAggregator>,
    pub refresh: Arc<RefreshLoop>,
    pub cache: Arc<TieredCache>,
}

impl AppState {
    pub fn new(aggregator: Arc<TokenAggregator>, refresh: Arc<RefreshLoop>) -> Self {
        Self {
            cache: Arc::clone(aggregator.cache()),
            aggregator,
            refresh,
        }
    }

    /// Wire clients, cache, aggregator and refresh loop from configuration.
    /// Nothing is started.
    pub fn from_config(config: &AppConfig) -> SourceResult<Self> {
        let dexscreener = Arc::new(DexScreenerClient::new(&config.sources.dexscreener)?);
        let jupiter = Arc::new(JupiterClient::new(&config.sources.jupiter)?);
        let cache = Arc::new(TieredCache::from_config(&config.cache));

        let aggregator = Arc::new(TokenAggregator::new(
            dexscreener,
            jupiter,
            cache,
            config.aggregator.clone(),
        ));
        let refresh = Arc::new(RefreshLoop::new(Arc::clone(&aggregator), config.refresh.clone()));

        Ok(Self::new(aggregator, refresh))
    }
}
