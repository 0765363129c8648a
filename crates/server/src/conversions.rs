//! Wire representations of internal types

use serde::{Deserialize, Serialize};

use tokenagg_core::TokenRecord;

/// Snake_case token shape served over HTTP and WebSocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub token_address: String,
    pub token_name: String,
    pub token_ticker: String,
    pub price_sol: f64,
    pub market_cap_sol: f64,
    pub volume_sol: f64,
    pub liquidity_sol: f64,
    pub transaction_count: u64,
    pub price_1hr_change: f64,
    pub protocol: String,
    pub last_updated: i64,
}

impl From<&TokenRecord> for TokenSnapshot {
    fn from(record: &TokenRecord) -> Self {
        Self {
            token_address: record.token_address.clone(),
            token_name: record.name.clone(),
            token_ticker: record.symbol.clone(),
            price_sol: record.price_sol,
            market_cap_sol: record.market_cap,
            volume_sol: record.volume_24h,
            liquidity_sol: record.liquidity,
            transaction_count: record.transaction_count,
            price_1hr_change: record.price_change_1h,
            protocol: record.source.name().to_string(),
            last_updated: record.last_updated,
        }
    }
}

/// Frame pushed to WebSocket subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub event: String,
    pub data: TokenSnapshot,
}

impl PushMessage {
    pub const PRICE_UPDATE: &'static str = "priceUpdate";

    pub fn price_update(record: &TokenRecord) -> Self {
        Self {
            event: Self::PRICE_UPDATE.to_string(),
            data: record.into(),
        }
    }
}
