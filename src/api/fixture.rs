//! Offline listing source.

use super::Fetcher;
use crate::error::FetchError;
use crate::state::Listing;
use async_trait::async_trait;
use std::path::Path;

/// Serves a fixed set of listings regardless of the query.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    listings: Vec<Listing>,
}

impl FixtureFetcher {
    /// Create a fetcher serving `listings`.
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Load listings from a JSON array file.
    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let fixture_err = |message: String| FetchError::Fixture {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| fixture_err(e.to_string()))?;
        let listings: Vec<Listing> =
            serde_json::from_str(&content).map_err(|e| fixture_err(e.to_string()))?;
        Ok(Self::new(listings))
    }

    /// Listings served by this fetcher.
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, _query: &str, limit: u32) -> Result<Vec<Listing>, FetchError> {
        Ok(self
            .listings
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fetch_respects_limit() {
        let fetcher = FixtureFetcher::new(vec![
            Listing::new("1", "A").with_price(dec!(1)),
            Listing::new("2", "B").with_price(dec!(2)),
            Listing::new("3", "C").with_price(dec!(3)),
        ]);
        let listings = fetcher.fetch("anything", 2).await.unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, "1");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        std::fs::write(
            &path,
            r#"[{ "id": "9", "title": "Low LP", "price": "14.00", "time_remaining_secs": 300 }]"#,
        )
        .unwrap();

        let fetcher = FixtureFetcher::from_file(&path).unwrap();
        assert_eq!(fetcher.listings().len(), 1);
        assert_eq!(fetcher.listings()[0].price, Some(dec!(14.00)));
    }

    #[test]
    fn test_missing_fixture_file() {
        let err = FixtureFetcher::from_file(Path::new("/nonexistent/listings.json")).unwrap_err();
        assert!(matches!(err, FetchError::Fixture { .. }));
    }
}
