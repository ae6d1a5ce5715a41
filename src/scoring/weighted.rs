//! Default weighted desirability model.

use super::ScoreModel;
use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::state::Listing;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Title terms that mark bundles, multi-album lots and damaged goods.
const BLOCKED_TERMS: &[&str] = &[
    "job lot",
    "joblot",
    "bundle",
    "box set",
    "boxset",
    "spares",
    "repair",
    "case only",
    "cover only",
    "sleeve only",
    "inlay only",
    "for parts",
    "not working",
    "damaged",
];

/// Signal used when the config or listing gives nothing to compare against.
const NEUTRAL: f64 = 0.5;

/// Weighted mean of a price, a title and a seller signal.
///
/// - price: `1 - price / (2 * target_price)`, so a listing at the target
///   price scores 0.5 and anything at twice the target or more scores 0.
/// - title: share of configured keywords present, zeroed by any exclude
///   or blocked term.
/// - seller: feedback percentage over 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer;

impl WeightedScorer {
    /// Create the model.
    pub fn new() -> Self {
        Self
    }

    /// Price signal in [0, 1]. Non-increasing in `price`.
    pub fn price_signal(price: Decimal, target: Option<Decimal>) -> f64 {
        let Some(target) = target.filter(|t| *t > Decimal::ZERO) else {
            return NEUTRAL;
        };
        let ratio = price
            .checked_div(target)
            .and_then(|r| r.to_f64())
            .unwrap_or(f64::MAX);
        (1.0 - ratio / 2.0).clamp(0.0, 1.0)
    }

    /// Title signal in [0, 1].
    pub fn title_signal(title: &str, config: &ScoringConfig) -> f64 {
        let title = title.to_lowercase();
        let words: Vec<&str> = title
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let blocked = BLOCKED_TERMS
            .iter()
            .copied()
            .chain(config.exclude_terms.iter().map(String::as_str))
            .any(|term| contains_term(&title, &words, term));
        if blocked {
            return 0.0;
        }

        if config.keywords.is_empty() {
            return 1.0;
        }
        let hits = config
            .keywords
            .iter()
            .filter(|k| contains_term(&title, &words, k))
            .count();
        hits as f64 / config.keywords.len() as f64
    }

    /// Seller signal in [0, 1].
    pub fn seller_signal(listing: &Listing) -> f64 {
        listing
            .seller_feedback_pct()
            .filter(|pct| pct.is_finite())
            .map(|pct| (pct / 100.0).clamp(0.0, 1.0))
            .unwrap_or(NEUTRAL)
    }
}

/// Single words match whole words only ("lp" does not match "help");
/// phrases match as substrings.
fn contains_term(title: &str, words: &[&str], term: &str) -> bool {
    if term.contains(char::is_whitespace) {
        title.contains(term)
    } else {
        words.contains(&term)
    }
}

impl ScoreModel for WeightedScorer {
    fn name(&self) -> &str {
        "weighted"
    }

    fn desirability(
        &self,
        listing: &Listing,
        config: &ScoringConfig,
    ) -> Result<f64, ScoringError> {
        let price = listing
            .price
            .ok_or_else(|| ScoringError::new(&listing.id, "missing price"))?;

        let weights = config.weights;
        let total = weights.total();
        if total <= 0.0 {
            return Ok(0.0);
        }

        let weighted = weights.price * Self::price_signal(price, config.target_price)
            + weights.title * Self::title_signal(&listing.title, config)
            + weights.seller * Self::seller_signal(listing);
        Ok(weighted / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ScoreWeights};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn scoring() -> ScoringConfig {
        Config::sample().scoring
    }

    #[test]
    fn test_price_signal() {
        let target = Some(dec!(20));
        assert_eq!(WeightedScorer::price_signal(dec!(0), target), 1.0);
        assert_eq!(WeightedScorer::price_signal(dec!(20), target), 0.5);
        assert_eq!(WeightedScorer::price_signal(dec!(10), target), 0.75);
        assert_eq!(WeightedScorer::price_signal(dec!(40), target), 0.0);
        assert_eq!(WeightedScorer::price_signal(dec!(400), target), 0.0);
        assert_eq!(WeightedScorer::price_signal(dec!(10), None), NEUTRAL);
    }

    #[test]
    fn test_price_signal_huge_ratio() {
        // price / target does not fit in a Decimal
        let target = Some(dec!(0.0001));
        assert_eq!(WeightedScorer::price_signal(Decimal::MAX, target), 0.0);
        assert_eq!(
            WeightedScorer::price_signal(dec!(10000000000000000000000000), target),
            0.0
        );

        let mut config = scoring();
        config.target_price = target;
        let listing = Listing::new("big", "Rare vinyl LP").with_price(Decimal::MAX);
        let score = WeightedScorer::new().desirability(&listing, &config).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_title_keywords_are_whole_words() {
        let config = scoring();
        // keywords: vinyl, lp
        assert_eq!(
            WeightedScorer::title_signal("Blue Lines VINYL LP 1991", &config),
            1.0
        );
        assert_eq!(WeightedScorer::title_signal("Blue Lines vinyl", &config), 0.5);
        assert_eq!(WeightedScorer::title_signal("Help! (vinyl)", &config), 0.5);
    }

    #[test]
    fn test_title_blocked_terms() {
        let config = scoring();
        assert_eq!(
            WeightedScorer::title_signal("Job Lot of 30 vinyl LP records", &config),
            0.0
        );
        assert_eq!(
            WeightedScorer::title_signal("Abbey Road LP - sleeve only", &config),
            0.0
        );
        // configured exclude term
        assert_eq!(
            WeightedScorer::title_signal("Abbey Road CD and vinyl LP", &config),
            0.0
        );
    }

    #[test]
    fn test_seller_signal() {
        let listing = Listing::new("1", "LP").with_seller("feedback_pct", json!(99.0));
        assert_eq!(WeightedScorer::seller_signal(&listing), 0.99);
        assert_eq!(WeightedScorer::seller_signal(&Listing::new("1", "LP")), NEUTRAL);

        let listing = Listing::new("1", "LP").with_seller("feedback_pct", json!("NaN"));
        assert_eq!(WeightedScorer::seller_signal(&listing), NEUTRAL);
    }

    #[test]
    fn test_weighted_mean() {
        let mut config = scoring();
        config.weights = ScoreWeights {
            price: 1.0,
            title: 1.0,
            seller: 0.0,
        };
        let listing = Listing::new("1", "Mezzanine vinyl LP").with_price(dec!(25));
        // price 0.5, title 1.0
        let value = WeightedScorer.desirability(&listing, &config).unwrap();
        assert!((value - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_missing_price_is_an_error() {
        let err = WeightedScorer
            .desirability(&Listing::new("abc", "LP"), &scoring())
            .unwrap_err();
        assert_eq!(err.listing_id, "abc");
    }
}
