//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    DexScreener,
    Jupiter,
    Aggregated,
}

impl TokenSource {
    pub fn name(&self) -> &'static str {
        match self {
            TokenSource::DexScreener => "dexscreener",
            TokenSource::Jupiter => "jupiter",
            TokenSource::Aggregated => "aggregated",
        }
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A token's market snapshot, materialized fresh on every upstream fetch.
///
/// `token_address` is the identity key for merge and cache operations.
/// Numeric fields absent upstream are stored as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub token_address: String,
    pub name: String,
    pub symbol: String,
    pub price_sol: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub price_change_1h: f64,
    pub price_change_24h: f64,
    pub transaction_count: u64,
    pub source: TokenSource,
    /// Unix millis at which this system built the record
    pub last_updated: i64,
}

impl TokenRecord {
    /// Record with identity fields set and every metric zeroed
    pub fn new(token_address: &str, name: &str, symbol: &str, source: TokenSource) -> Self {
        Self {
            token_address: token_address.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            price_sol: 0.0,
            market_cap: 0.0,
            volume_24h: 0.0,
            liquidity: 0.0,
            price_change_1h: 0.0,
            price_change_24h: 0.0,
            transaction_count: 0,
            source,
            last_updated: now_ms(),
        }
    }
}

/// Current wall-clock time in unix millis
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Field used to order a token listing (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Volume,
    Price,
    MarketCap,
    Change1h,
    Change24h,
}

impl SortKey {
    pub fn name(&self) -> &'static str {
        match self {
            SortKey::Volume => "volume",
            SortKey::Price => "price",
            SortKey::MarketCap => "marketCap",
            SortKey::Change1h => "change1h",
            SortKey::Change24h => "change24h",
        }
    }

    /// Parse a request parameter; anything unrecognised sorts by volume
    pub fn from_param(param: Option<&str>) -> Self {
        param.and_then(|p| p.parse().ok()).unwrap_or_default()
    }

    pub fn value_of(&self, record: &TokenRecord) -> f64 {
        match self {
            SortKey::Volume => record.volume_24h,
            SortKey::Price => record.price_sol,
            SortKey::MarketCap => record.market_cap,
            SortKey::Change1h => record.price_change_1h,
            SortKey::Change24h => record.price_change_24h,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volume" => Ok(SortKey::Volume),
            "price" => Ok(SortKey::Price),
            "marketCap" => Ok(SortKey::MarketCap),
            "change1h" => Ok(SortKey::Change1h),
            "change24h" => Ok(SortKey::Change24h),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stable descending sort on the selected field
pub fn sort_records(records: &mut [TokenRecord], key: SortKey) {
    records.sort_by(|a, b| key.value_of(b).total_cmp(&key.value_of(a)));
}
