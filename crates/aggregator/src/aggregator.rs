//! Search aggregation over both upstream providers

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use tokenagg_cache::TieredCache;
use tokenagg_core::{
    paginate, sort_records, AggregatorConfig, Page, SortKey, SourceResult, TokenRecord,
};
use tokenagg_sources::TokenProvider;

const SEARCH_KEY_PREFIX: &str = "tokens:search:";
const ADDRESS_KEY_PREFIX: &str = "tokens:address:";

pub fn search_key(query: &str) -> String {
    format!("{}{}", SEARCH_KEY_PREFIX, query)
}

pub fn address_key(address: &str) -> String {
    format!("{}{}", ADDRESS_KEY_PREFIX, address)
}

/// Listing request; `None` fields take the configured defaults
#[derive(Debug, Clone, Default)]
pub struct TokenQuery {
    pub query: Option<String>,
    pub sort: SortKey,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Merge two provider result sets.
///
/// Output holds one record per address, ordered by first appearance. A
/// repeated `primary` address replaces the earlier record in place. A
/// `secondary` record is appended only if its address has not been seen, so
/// primary data is never overwritten regardless of which fetch finished first.
pub fn merge_records(primary: Vec<TokenRecord>, secondary: Vec<TokenRecord>) -> Vec<TokenRecord> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(primary.len() + secondary.len());
    let mut merged: Vec<TokenRecord> = Vec::with_capacity(primary.len() + secondary.len());

    for record in primary {
        match index.get(&record.token_address) {
            Some(&i) => merged[i] = record,
            None => {
                index.insert(record.token_address.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    for record in secondary {
        if !index.contains_key(&record.token_address) {
            index.insert(record.token_address.clone(), merged.len());
            merged.push(record);
        }
    }

    merged
}

/// Combines the two providers behind the tiered cache
pub struct TokenAggregator {
    primary: Arc<dyn TokenProvider>,
    secondary: Arc<dyn TokenProvider>,
    cache: Arc<TieredCache>,
    config: AggregatorConfig,
}

impl TokenAggregator {
    /// `primary` wins every address collision and serves single-token lookups
    pub fn new(
        primary: Arc<dyn TokenProvider>,
        secondary: Arc<dyn TokenProvider>,
        cache: Arc<TieredCache>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    /// Merged search results for `query`.
    ///
    /// Served from cache unless `skip_cache` is set. A provider that fails
    /// contributes nothing; the search itself never fails.
    pub async fn search_tokens(&self, query: &str, skip_cache: bool) -> Vec<TokenRecord> {
        let key = search_key(query);

        if !skip_cache {
            if let Some(cached) = self.cache.get::<Vec<TokenRecord>>(&key).await {
                debug!("Cache hit for {}", key);
                return cached;
            }
        }

        let (primary, secondary) = tokio::join!(
            fetch(self.primary.as_ref(), query),
            fetch(self.secondary.as_ref(), query),
        );

        let merged = merge_records(primary, secondary);
        info!("Merged {} tokens for query \"{}\"", merged.len(), query);

        self.cache
            .set_with_ttl(&key, &merged, self.config.search_ttl())
            .await;

        merged
    }

    /// Sorted, paginated listing
    pub async fn get_tokens(&self, request: TokenQuery) -> Page<TokenRecord> {
        let query = request
            .query
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or(self.config.default_query.as_str());
        let limit = request
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(self.config.default_limit);

        let mut tokens = self.search_tokens(query, false).await;
        sort_records(&mut tokens, request.sort);

        paginate(&tokens, request.cursor.as_deref(), limit)
    }

    /// One token by address via the primary provider.
    ///
    /// Upstream failures are returned to the caller; a found record is
    /// cached with the default TTL.
    pub async fn get_token(&self, address: &str) -> SourceResult<Option<TokenRecord>> {
        let key = address_key(address);

        if let Some(cached) = self.cache.get::<TokenRecord>(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(Some(cached));
        }

        let record = self.primary.lookup(address).await?;
        if let Some(record) = &record {
            self.cache.set(&key, record).await;
        }

        Ok(record)
    }
}

async fn fetch(provider: &dyn TokenProvider, query: &str) -> Vec<TokenRecord> {
    match provider.search(query).await {
        Ok(records) => records,
        Err(e) => {
            warn!("{} search for \"{}\" failed: {}", provider.source(), query, e);
            Vec::new()
        }
    }
}
