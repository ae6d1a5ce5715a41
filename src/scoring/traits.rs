//! Score model trait.

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::state::Listing;
use std::fmt::Debug;

/// A desirability model.
///
/// Models are pure: the same listing and config must always produce the
/// same value, and a listing that differs only by a strictly lower price must
/// never score lower. Callers validate the listing before calling
/// [`ScoreModel::desirability`] and clamp the result into [0, 1].
pub trait ScoreModel: Send + Sync + Debug {
    /// Returns the name of this model, used in logs.
    fn name(&self) -> &str;

    /// Compute the raw desirability of a well-formed listing.
    ///
    /// Returning an error skips just this listing.
    fn desirability(&self, listing: &Listing, config: &ScoringConfig)
    -> Result<f64, ScoringError>;
}
