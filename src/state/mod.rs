//! Domain state for Groovewatch.
//!
//! Listings flow through the watch loop one cycle at a time; only their
//! identifiers survive, in the seen set.

mod listing;
mod seen;

pub use listing::{Listing, ScoredListing, Tier};
pub use seen::{DedupStore, FileSeenStore, MemorySeenStore, SeenSet};
