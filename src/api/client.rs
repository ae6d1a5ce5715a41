//! Marketplace search API client.

use super::{DataConverter, Fetcher, SearchResponse};
use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::state::Listing;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

const SEARCH_PATH: &str = "/buy/browse/v1/item_summary/search";

/// Builder for creating a search client.
pub struct BrowseClientBuilder {
    config: ApiConfig,
    token: Option<String>,
}

impl BrowseClientBuilder {
    /// Create a new builder with default config.
    pub fn new() -> Self {
        Self {
            config: ApiConfig::default(),
            token: None,
        }
    }

    /// Set the API configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an explicit bearer token instead of reading `token_env`.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<BrowseClient, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .user_agent(concat!("groovewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(BrowseClient {
            rate_limiter: Arc::new(RwLock::new(RateLimiter::new(self.config.rate_limit))),
            config: self.config,
            token: self.token,
            http,
        })
    }
}

impl Default for BrowseClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the marketplace item search endpoint.
///
/// Construction never needs credentials; the bearer token is looked up on
/// every fetch so that a missing token surfaces as a per-cycle
/// [`FetchError::Auth`].
pub struct BrowseClient {
    config: ApiConfig,
    token: Option<String>,
    http: reqwest::Client,
    rate_limiter: Arc<RwLock<RateLimiter>>,
}

impl BrowseClient {
    /// Create a client from configuration.
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        BrowseClientBuilder::new().config(config).build()
    }

    fn token(&self) -> Result<String, FetchError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        match std::env::var(&self.config.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(FetchError::auth(format!(
                "no API token; set {}",
                self.config.token_env
            ))),
        }
    }

    fn search_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), SEARCH_PATH)
    }

    /// Apply rate limiting.
    async fn rate_limit(&self) {
        let mut limiter = self.rate_limiter.write().await;
        limiter.wait().await;
    }
}

#[async_trait]
impl Fetcher for BrowseClient {
    async fn fetch(&self, query: &str, limit: u32) -> Result<Vec<Listing>, FetchError> {
        let token = self.token()?;
        self.rate_limit().await;

        let limit = limit.clamp(1, 200).to_string();
        let response = self
            .http
            .get(self.search_url())
            .bearer_auth(token)
            .header("X-EBAY-C-MARKETPLACE-ID", &self.config.marketplace_id)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("sort", "newlyListed"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Err(FetchError::RateLimited(retry_after));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::auth(format!("marketplace returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        let now = Utc::now();
        let listings: Vec<Listing> = parsed
            .item_summaries
            .into_iter()
            .filter_map(|item| DataConverter::convert_listing(item, now))
            .collect();

        debug!(query, count = listings.len(), "Fetched listings");
        Ok(listings)
    }
}

/// Simple rate limiter.
struct RateLimiter {
    requests_per_second: u32,
    last_request: std::time::Instant,
    tokens: f64,
}

impl RateLimiter {
    fn new(requests_per_second: u32) -> Self {
        let requests_per_second = requests_per_second.max(1);
        Self {
            requests_per_second,
            last_request: std::time::Instant::now(),
            tokens: requests_per_second as f64,
        }
    }

    async fn wait(&mut self) {
        let now = std::time::Instant::now();
        let elapsed = now.duration_since(self.last_request).as_secs_f64();

        // Replenish tokens
        self.tokens = (self.tokens + elapsed * self.requests_per_second as f64)
            .min(self.requests_per_second as f64);

        if self.tokens < 1.0 {
            let wait_time = (1.0 - self.tokens) / self.requests_per_second as f64;
            tokio::time::sleep(Duration::from_secs_f64(wait_time)).await;
            self.tokens = 1.0;
        }

        self.tokens -= 1.0;
        self.last_request = std::time::Instant::now();
    }
}
