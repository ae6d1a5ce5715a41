//! # Groovewatch - marketplace record watcher
//!
//! Polls a marketplace search for vinyl listings, skips the ones already
//! processed, scores the rest and surfaces the ones worth a look.
//!
//! ## Architecture
//!
//! - **Config**: Typed JSON settings, thresholds and the `tune` command
//! - **API**: Listing sources (marketplace REST client, fixtures)
//! - **State**: Listings, tiers and the persistent seen set
//! - **Scoring**: Desirability models, ending-soon and tier classification
//! - **Watch**: The polling state machine
//! - **Events**: Sinks that receive scored listings
//! - **App**: Process wiring for the command line

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod scoring;
pub mod state;
pub mod watch;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use watch::{CycleReport, Watcher};
