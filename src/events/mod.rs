//! Event sinks for scored listings.
//!
//! The watch loop hands every surfaced [`ScoredListing`] to an [`EventSink`].
//! Sinks are observers: nothing in the engine depends on which one is used,
//! so the CLI printer, the deal log and a GUI channel are interchangeable.

mod sink;

pub use sink::{ChannelSink, ConsoleSink, DealLogSink, FanoutSink, OutputFormat};

use crate::error::SinkError;
use crate::state::ScoredListing;

/// Consumer of scored-listing events.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send {
    /// Deliver one event. Returning `Ok` means the sink has taken the event;
    /// only then is the listing recorded as seen.
    fn emit(&mut self, event: &ScoredListing) -> Result<(), SinkError>;
}
