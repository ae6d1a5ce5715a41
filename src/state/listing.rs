//! Marketplace listings and their scored form.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A listing as returned by a fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Marketplace item identifier.
    pub id: String,
    /// Listing title.
    pub title: String,
    /// Total price including the cheapest shipping option.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// ISO currency code of `price`.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Time left on a timed listing. `None` for fixed-price listings.
    #[serde(
        default,
        rename = "time_remaining_secs",
        with = "duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_remaining: Option<Duration>,
    /// Link to the listing page.
    #[serde(default)]
    pub url: String,
    /// Seller metadata as reported by the marketplace.
    #[serde(default)]
    pub seller: BTreeMap<String, serde_json::Value>,
}

fn default_currency() -> String {
    "GBP".to_string()
}

impl Listing {
    /// Create a listing with an id and title and nothing else.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price: None,
            currency: default_currency(),
            time_remaining: None,
            url: String::new(),
            seller: BTreeMap::new(),
        }
    }

    /// Set the price.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the remaining time.
    pub fn with_time_remaining(mut self, remaining: Duration) -> Self {
        self.time_remaining = Some(remaining);
        self
    }

    /// Set the listing URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Add a seller metadata entry.
    pub fn with_seller(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.seller.insert(key.into(), value);
        self
    }

    /// Seller feedback percentage, when the marketplace reports one.
    pub fn seller_feedback_pct(&self) -> Option<f64> {
        match self.seller.get("feedback_pct")? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Action tier of a scored listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Below the candidate floor; not surfaced.
    Reject,
    /// Worth a manual look.
    Candidate,
    /// Worth acting on immediately.
    AutoMatch,
}

impl Tier {
    /// Whether listings of this tier are emitted by default.
    pub fn is_surfaced(self) -> bool {
        !matches!(self, Self::Reject)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "REJECT"),
            Self::Candidate => write!(f, "CANDIDATE"),
            Self::AutoMatch => write!(f, "AUTO-MATCH"),
        }
    }
}

/// A listing with its score, ending-soon flag and tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredListing {
    pub listing: Listing,
    /// Name of the saved search that found the listing.
    pub search: String,
    /// Desirability in [0, 1].
    pub score: f64,
    pub ending_soon: bool,
    pub tier: Tier,
    pub scored_at: DateTime<Utc>,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
