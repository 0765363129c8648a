//! DexScreener client
//!
//! The authoritative source for price, liquidity and volume. A search
//! returns trading pairs; several pairs can share a base token, in which
//! case the most liquid pair wins.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

use tokenagg_core::{now_ms, SourceConfig, SourceError, SourceResult, TokenRecord, TokenSource};

use crate::http::UpstreamClient;
use crate::provider::TokenProvider;

pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";

/// `/search` and `/tokens/{address}` share this envelope.
/// Pairs are kept raw so one malformed pair does not sink the whole page.
#[derive(Debug, Default, Deserialize)]
pub struct PairsResponse {
    #[serde(default)]
    pub pairs: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DexPair {
    pub pair_address: Option<String>,
    pub base_token: Option<BaseToken>,
    pub price_native: Option<Value>,
    pub liquidity: Option<Liquidity>,
    pub volume: Option<Volume>,
    pub price_change: Option<PriceChange>,
    pub txns: Option<Txns>,
    pub fdv: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BaseToken {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub h24: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PriceChange {
    pub h1: Option<f64>,
    pub h24: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Txns {
    pub h24: Option<TxnCounts>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TxnCounts {
    pub buys: Option<u64>,
    pub sells: Option<u64>,
}

impl DexPair {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    /// `priceNative` arrives as a decimal string, occasionally as a number
    pub fn price_native(&self) -> f64 {
        match &self.price_native {
            Some(Value::String(s)) => s.parse().unwrap_or(0.0),
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn base_address(&self) -> Option<&str> {
        self.base_token
            .as_ref()
            .and_then(|t| t.address.as_deref())
            .filter(|a| !a.is_empty())
    }

    /// Map to a record; `None` when the pair has no base token address
    pub fn to_record(&self) -> Option<TokenRecord> {
        let address = self.base_address()?;
        let base = self.base_token.as_ref()?;
        let txns = self.txns.as_ref().and_then(|t| t.h24.as_ref());

        Some(TokenRecord {
            token_address: address.to_string(),
            name: base.name.clone().unwrap_or_default(),
            symbol: base.symbol.clone().unwrap_or_default(),
            price_sol: self.price_native(),
            market_cap: self.fdv.unwrap_or(0.0),
            volume_24h: self.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0),
            liquidity: self.liquidity_usd(),
            price_change_1h: self.price_change.as_ref().and_then(|p| p.h1).unwrap_or(0.0),
            price_change_24h: self.price_change.as_ref().and_then(|p| p.h24).unwrap_or(0.0),
            transaction_count: txns
                .map(|t| t.buys.unwrap_or(0).saturating_add(t.sells.unwrap_or(0)))
                .unwrap_or(0),
            source: TokenSource::DexScreener,
            last_updated: now_ms(),
        })
    }
}

fn parse_pairs(raw: Vec<Value>) -> Vec<DexPair> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<DexPair>(value) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("Skipping malformed DexScreener pair: {}", e);
                None
            }
        })
        .collect()
}

/// One record per base token, keeping the most liquid pair.
/// Output order follows the first appearance of each token.
pub fn records_from_pairs(raw: Vec<Value>) -> Vec<TokenRecord> {
    let mut records: Vec<TokenRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for pair in parse_pairs(raw) {
        let Some(record) = pair.to_record() else {
            warn!(
                "Skipping DexScreener pair {} without base token address",
                pair.pair_address.as_deref().unwrap_or("<unknown>")
            );
            continue;
        };

        match index.get(&record.token_address) {
            Some(&i) => {
                if record.liquidity > records[i].liquidity {
                    records[i] = record;
                }
            }
            None => {
                index.insert(record.token_address.clone(), records.len());
                records.push(record);
            }
        }
    }

    records
}

/// Most liquid pair across the whole response, first one on ties
pub fn best_pair_record(raw: Vec<Value>) -> Option<TokenRecord> {
    let mut best: Option<DexPair> = None;

    for pair in parse_pairs(raw) {
        if pair.base_address().is_none() {
            continue;
        }
        let better = match &best {
            Some(current) => pair.liquidity_usd() > current.liquidity_usd(),
            None => true,
        };
        if better {
            best = Some(pair);
        }
    }

    best.and_then(|p| p.to_record())
}

/// DexScreener API client
pub struct DexScreenerClient {
    upstream: UpstreamClient,
}

impl DexScreenerClient {
    pub fn new(config: &SourceConfig) -> SourceResult<Self> {
        Ok(Self {
            upstream: UpstreamClient::new("DexScreener", config, DEXSCREENER_BASE_URL)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.upstream.base_url()
    }

    /// Search pairs by free text. Exhausted retries yield an empty list.
    pub async fn search_tokens(&self, query: &str) -> SourceResult<Vec<TokenRecord>> {
        match self
            .upstream
            .get_json::<PairsResponse>("/search", &[("q", query)])
            .await
        {
            Ok(response) => {
                let records = records_from_pairs(response.pairs.unwrap_or_default());
                info!("DexScreener found {} tokens for query \"{}\"", records.len(), query);
                Ok(records)
            }
            Err(SourceError::RetriesExhausted { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Look up one token by address, using its most liquid pair.
    ///
    /// Unlike search, exhausted retries are returned to the caller.
    pub async fn get_token(&self, address: &str) -> SourceResult<Option<TokenRecord>> {
        let path = format!("/tokens/{}", address);
        let response = self.upstream.get_json::<PairsResponse>(&path, &[]).await?;

        Ok(best_pair_record(response.pairs.unwrap_or_default()))
    }
}

#[async_trait::async_trait]
impl TokenProvider for DexScreenerClient {
    fn source(&self) -> TokenSource {
        TokenSource::DexScreener
    }

    async fn search(&self, query: &str) -> SourceResult<Vec<TokenRecord>> {
        self.search_tokens(query).await
    }

    async fn lookup(&self, address: &str) -> SourceResult<Option<TokenRecord>> {
        self.get_token(address).await
    }
}
