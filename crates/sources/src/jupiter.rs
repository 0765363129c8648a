//! Jupiter token search client
//!
//! The lite token API is used for discovery only: it yields identity and
//! naming, and every market metric on its records is zero.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use tokenagg_core::{SourceConfig, SourceError, SourceResult, TokenRecord, TokenSource};

use crate::http::UpstreamClient;
use crate::provider::TokenProvider;

pub const JUPITER_BASE_URL: &str = "https://lite-api.jup.ag/tokens/v2";

/// The search endpoint has shipped both a bare array and a `{tokens: [...]}`
/// envelope; accept either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SearchPayload {
    List(Vec<Value>),
    Wrapped {
        #[serde(default)]
        tokens: Option<Vec<Value>>,
    },
}

impl SearchPayload {
    pub fn into_tokens(self) -> Vec<Value> {
        match self {
            SearchPayload::List(tokens) => tokens,
            SearchPayload::Wrapped { tokens } => tokens.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JupiterToken {
    #[serde(alias = "id")]
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

impl JupiterToken {
    pub fn to_record(&self) -> Option<TokenRecord> {
        let address = self.address.as_deref().filter(|a| !a.is_empty())?;

        Some(TokenRecord::new(
            address,
            self.name.as_deref().unwrap_or_default(),
            self.symbol.as_deref().unwrap_or_default(),
            TokenSource::Jupiter,
        ))
    }
}

pub fn records_from_tokens(raw: Vec<Value>) -> Vec<TokenRecord> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<JupiterToken>(value) {
            Ok(token) => token.to_record(),
            Err(e) => {
                warn!("Skipping malformed Jupiter token: {}", e);
                None
            }
        })
        .collect()
}

/// Jupiter API client
pub struct JupiterClient {
    upstream: UpstreamClient,
}

impl JupiterClient {
    pub fn new(config: &SourceConfig) -> SourceResult<Self> {
        Ok(Self {
            upstream: UpstreamClient::new("Jupiter", config, JUPITER_BASE_URL)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.upstream.base_url()
    }

    /// Search tokens by free text. Exhausted retries yield an empty list.
    pub async fn search_tokens(&self, query: &str) -> SourceResult<Vec<TokenRecord>> {
        match self
            .upstream
            .get_json::<SearchPayload>("/search", &[("query", query)])
            .await
        {
            Ok(payload) => {
                let records = records_from_tokens(payload.into_tokens());
                info!("Jupiter found {} tokens for query \"{}\"", records.len(), query);
                Ok(records)
            }
            Err(SourceError::RetriesExhausted { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for JupiterClient {
    fn source(&self) -> TokenSource {
        TokenSource::Jupiter
    }

    async fn search(&self, query: &str) -> SourceResult<Vec<TokenRecord>> {
        self.search_tokens(query).await
    }
}
