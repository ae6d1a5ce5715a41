//! Marketplace listing sources.
//!
//! The watch loop only sees the [`Fetcher`] trait. [`BrowseClient`] talks to
//! the marketplace search API; [`FixtureFetcher`] serves fixed listings for
//! offline runs and smoke tests.

mod client;
mod converter;
mod fixture;

pub use client::{BrowseClient, BrowseClientBuilder};
pub use converter::{DataConverter, ItemSummary, SearchResponse};
pub use fixture::FixtureFetcher;

use crate::error::FetchError;
use crate::state::Listing;
use async_trait::async_trait;

/// A source of marketplace listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch up to `limit` current listings matching `query`.
    async fn fetch(&self, query: &str, limit: u32) -> Result<Vec<Listing>, FetchError>;
}
