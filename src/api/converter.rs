//! Data conversion utilities for API responses.

use crate::state::Listing;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Search endpoint response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub item_summaries: Vec<ItemSummary>,
}

/// One item in a search response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: Option<String>,
    pub title: Option<String>,
    pub price: Option<Amount>,
    #[serde(default)]
    pub shipping_options: Vec<ShippingOption>,
    pub item_web_url: Option<String>,
    pub item_end_date: Option<DateTime<Utc>>,
    pub seller: Option<Seller>,
    #[serde(default)]
    pub buying_options: Vec<String>,
}

/// A money amount. The API sends the value as a string.
#[derive(Debug, Default, Deserialize)]
pub struct Amount {
    pub value: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub shipping_cost: Option<Amount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub username: Option<String>,
    pub feedback_percentage: Option<String>,
    pub feedback_score: Option<i64>,
}

/// Converts API responses to internal state types.
pub struct DataConverter;

impl DataConverter {
    /// Convert a search item into a listing. Items without an id are dropped;
    /// everything else is kept, including items whose price cannot be read,
    /// so that the scorer reports them.
    pub fn convert_listing(item: ItemSummary, now: DateTime<Utc>) -> Option<Listing> {
        let id = item.item_id.filter(|id| !id.trim().is_empty())?;

        let price = item
            .price
            .as_ref()
            .and_then(|p| Self::parse_amount(p.value.as_deref()));
        let shipping = item
            .shipping_options
            .first()
            .and_then(|o| o.shipping_cost.as_ref())
            .and_then(|c| Self::parse_amount(c.value.as_deref()))
            .unwrap_or(Decimal::ZERO);
        let currency = item
            .price
            .as_ref()
            .and_then(|p| p.currency.clone())
            .unwrap_or_else(|| "GBP".to_string());

        let is_auction = item.buying_options.iter().any(|o| o == "AUCTION");
        let time_remaining = item
            .item_end_date
            .filter(|_| is_auction)
            .map(|end| (end - now).to_std().unwrap_or_default());

        Some(Listing {
            id,
            title: item.title.unwrap_or_default(),
            price: price.map(|p| p + shipping),
            currency,
            time_remaining,
            url: item.item_web_url.unwrap_or_default(),
            seller: item.seller.map(Self::convert_seller).unwrap_or_default(),
        })
    }

    fn convert_seller(seller: Seller) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        if let Some(username) = seller.username {
            out.insert("username".to_string(), Value::String(username));
        }
        if let Some(pct) = seller
            .feedback_percentage
            .and_then(|p| p.trim().parse::<f64>().ok())
            .and_then(serde_json::Number::from_f64)
        {
            out.insert("feedback_pct".to_string(), Value::Number(pct));
        }
        if let Some(score) = seller.feedback_score {
            out.insert("feedback_score".to_string(), Value::from(score));
        }
        out
    }

    fn parse_amount(value: Option<&str>) -> Option<Decimal> {
        value?.trim().parse().ok()
    }
}
