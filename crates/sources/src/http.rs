//! HTTP plumbing shared by the upstream clients

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use tokenagg_core::{SourceConfig, SourceError, SourceResult};

use crate::limiter::RateLimiter;
use crate::retry::RetryPolicy;

/// A rate-limited, retrying JSON-over-HTTP client for one upstream
pub struct UpstreamClient {
    name: &'static str,
    http: Client,
    base_url: String,
    enabled: bool,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(
        name: &'static str,
        config: &SourceConfig,
        default_base_url: &str,
    ) -> SourceResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SourceError::Request(format!("failed to build http client: {}", e)))?;

        let base_url = if config.base_url.is_empty() {
            default_base_url
        } else {
            config.base_url.as_str()
        };

        Ok(Self {
            name,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
            limiter: RateLimiter::new(name, config.min_request_interval()),
            retry: RetryPolicy::from(config),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}{path}` and decode the JSON body, retrying transient
    /// failures. Every attempt goes through the rate limiter.
    pub async fn get_json<T>(&self, path: &str, params: &[(&str, &str)]) -> SourceResult<T>
    where
        T: DeserializeOwned,
    {
        if !self.enabled {
            return Err(SourceError::Disabled(self.name));
        }

        let url = format!("{}{}", self.base_url, path);
        let this = self;
        let url = url.as_str();

        self.retry
            .run(self.name, move || this.get_json_once::<T>(url, params))
            .await
    }

    async fn get_json_once<T>(&self, url: &str, params: &[(&str, &str)]) -> SourceResult<T>
    where
        T: DeserializeOwned,
    {
        self.limiter.wait().await;
        debug!("{} GET {} {:?}", self.name, url, params);

        let response = self
            .http
            .get(url)
            .query(params)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}
