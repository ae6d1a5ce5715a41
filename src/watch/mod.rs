//! Watch loop: fetch, deduplicate, score, classify, emit.

mod engine;

pub use engine::{CycleReport, WatchState, Watcher};
