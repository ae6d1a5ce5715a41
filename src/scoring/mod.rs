//! Listing scoring and classification.
//!
//! [`score`] turns a listing into a desirability value and an ending-soon
//! flag; [`classify`] maps the value onto a [`Tier`] using the configured
//! thresholds.

mod traits;
mod weighted;

pub use traits::ScoreModel;
pub use weighted::WeightedScorer;

use crate::config::{Config, ScoringConfig};
use crate::error::ScoringError;
use crate::state::{Listing, Tier};
use rust_decimal::Decimal;

/// Result of scoring a single listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Desirability in [0, 1].
    pub value: f64,
    /// Whether the listing ends within the configured window.
    pub ending_soon: bool,
}

/// Score a listing with `model`.
///
/// Fails only on malformed listing data (blank id or title, missing or
/// negative price) or a model that produces NaN. Config edge values never
/// cause an error.
pub fn score(model: &dyn ScoreModel, listing: &Listing, config: &Config) -> Result<Score, ScoringError> {
    validate_listing(listing)?;

    let raw = model.desirability(listing, &config.scoring)?;
    if raw.is_nan() {
        return Err(ScoringError::new(
            &listing.id,
            format!("model '{}' produced NaN", model.name()),
        ));
    }

    Ok(Score {
        value: raw.clamp(0.0, 1.0),
        ending_soon: ending_soon(listing, config),
    })
}

/// Whether `listing` ends within the configured window. Always false when
/// the feature is disabled or the listing is not timed.
pub fn ending_soon(listing: &Listing, config: &Config) -> bool {
    match (config.end_soon_window(), listing.time_remaining) {
        (Some(window), Some(remaining)) => remaining <= window,
        _ => false,
    }
}

/// Map a score onto a tier.
pub fn classify(score: f64, config: &ScoringConfig) -> Tier {
    if score >= config.auto_match_threshold {
        Tier::AutoMatch
    } else if score >= config.candidate_floor {
        Tier::Candidate
    } else {
        Tier::Reject
    }
}

fn validate_listing(listing: &Listing) -> Result<(), ScoringError> {
    if listing.id.trim().is_empty() {
        return Err(ScoringError::new("<blank>", "missing id"));
    }
    if listing.title.trim().is_empty() {
        return Err(ScoringError::new(&listing.id, "missing title"));
    }
    match listing.price {
        None => Err(ScoringError::new(&listing.id, "missing price")),
        Some(p) if p < Decimal::ZERO => Err(ScoringError::new(
            &listing.id,
            format!("negative price {p}"),
        )),
        Some(_) => Ok(()),
    }
}
