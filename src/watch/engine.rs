//! Watch engine - runs polling cycles against a fetcher, a seen store and a sink.

use crate::api::Fetcher;
use crate::config::{Config, SearchConfig};
use crate::error::Result;
use crate::events::EventSink;
use crate::scoring::{self, ScoreModel, WeightedScorer};
use crate::state::{DedupStore, Listing, ScoredListing, Tier};
use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Phase of the watch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Between cycles.
    Idle,
    /// Waiting on the fetcher.
    Fetching,
    /// Scoring and classifying the batch.
    Scoring,
    /// Handing surfaced listings to the sink.
    Emitting,
    /// Finished; no more cycles will run.
    Done,
}

impl std::fmt::Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Scoring => write!(f, "scoring"),
            Self::Emitting => write!(f, "emitting"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Searches attempted.
    pub searches: usize,
    /// Searches whose fetch failed.
    pub fetch_errors: usize,
    /// Listings returned by the fetcher.
    pub fetched: usize,
    /// Listings skipped because their id was already processed.
    pub already_seen: usize,
    /// Listings scored successfully.
    pub scored: usize,
    /// Scored listings below the candidate floor or over their search's price cap.
    pub rejected: usize,
    /// Rejected because the price exceeds the search's `max_price`.
    pub over_max_price: usize,
    /// Scored listings in the candidate band.
    pub candidates: usize,
    /// Scored listings at or above the auto-match threshold.
    pub auto_matches: usize,
    /// Events accepted by the sink.
    pub emitted: usize,
    /// Listings skipped because of malformed data.
    pub scoring_errors: usize,
    /// Events the sink refused; their listings stay unseen.
    pub sink_errors: usize,
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "searches {}/{}, fetched {}, new {}, auto-match {}, candidate {}, reject {}, errors {}",
            self.searches - self.fetch_errors,
            self.searches,
            self.fetched,
            self.fetched - self.already_seen,
            self.auto_matches,
            self.candidates,
            self.rejected,
            self.scoring_errors + self.sink_errors
        )
    }
}

/// Runs the fetch → dedup → score → classify → emit pipeline.
///
/// The watcher owns its seen store and config snapshot; nothing else writes
/// to them while it runs. Cycles never overlap and cancellation is only
/// observed between cycles.
pub struct Watcher {
    fetcher: Box<dyn Fetcher>,
    store: Box<dyn DedupStore>,
    sink: Box<dyn EventSink>,
    model: Box<dyn ScoreModel>,
    /// Current config snapshot.
    config: Arc<Config>,
    /// File to reload the config from between cycles.
    config_path: Option<PathBuf>,
    state: WatchState,
    cycles: u64,
    consecutive_failures: u32,
}

impl Watcher {
    /// Create a watcher using the default weighted score model.
    pub fn new(
        config: Config,
        fetcher: impl Fetcher + 'static,
        store: impl DedupStore + 'static,
        sink: impl EventSink + 'static,
    ) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            store: Box::new(store),
            sink: Box::new(sink),
            model: Box::new(WeightedScorer::new()),
            config: Arc::new(config),
            config_path: None,
            state: WatchState::Idle,
            cycles: 0,
            consecutive_failures: 0,
        }
    }

    /// Replace the score model.
    pub fn with_model(mut self, model: impl ScoreModel + 'static) -> Self {
        self.model = Box::new(model);
        self
    }

    /// Reload the config from `path` at every cycle boundary in continuous mode.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Current state.
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Current config snapshot.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The seen store.
    pub fn store(&self) -> &dyn DedupStore {
        self.store.as_ref()
    }

    /// Number of cycles started.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Failed cycles since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn transition(&mut self, next: WatchState) {
        debug!("Watcher {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run exactly one cycle and finish.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        let result = self.run_cycle().await;
        self.transition(WatchState::Done);
        result
    }

    /// Run cycles every `watch.interval_secs` until `shutdown` becomes true or
    /// its sender is dropped. Cycle failures are logged, not returned.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Watcher started ({} searches, every {}s)",
            self.config.watch.searches().len(),
            self.config.watch.interval_secs
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.reload_config();

            match self.run_cycle().await {
                Ok(report) => info!("Cycle {} complete: {}", self.cycles, report),
                Err(e) if e.is_recoverable() => {
                    warn!("Cycle {} failed, retrying next interval: {}", self.cycles, e)
                }
                Err(e) => error!("Cycle {} failed: {}", self.cycles, e),
            }

            let interval = self.config.watch.interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.store.flush()?;
        self.transition(WatchState::Done);
        info!("Watcher stopped after {} cycles", self.cycles);
        Ok(())
    }

    /// Run one fetch → score → emit cycle over every configured search.
    ///
    /// A failed fetch skips its search without marking anything from it. The
    /// cycle fails only when every search failed to fetch.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycles += 1;
        let span = info_span!("cycle", n = self.cycles, id = %Uuid::new_v4());
        let result = self.cycle().instrument(span).await;

        match &result {
            Ok(_) => self.consecutive_failures = 0,
            Err(_) => self.consecutive_failures += 1,
        }
        if self.state != WatchState::Done {
            self.transition(WatchState::Idle);
        }
        result
    }

    async fn cycle(&mut self) -> Result<CycleReport> {
        let config = Arc::clone(&self.config);
        let searches = config.watch.searches();
        let mut report = CycleReport::default();
        let mut in_batch = HashSet::new();
        let mut failure = None;

        for search in &searches {
            report.searches += 1;
            self.transition(WatchState::Fetching);
            let listings = match self.fetcher.fetch(&search.query, config.watch.limit).await {
                Ok(listings) => listings,
                Err(e) => {
                    warn!("Search '{}' failed, nothing from it is marked: {}", search.name, e);
                    report.fetch_errors += 1;
                    failure.get_or_insert(e);
                    continue;
                }
            };
            debug!("Search '{}' returned {} listings", search.name, listings.len());
            report.fetched += listings.len();

            let scoped = config.for_search(search);
            self.process(&scoped, search, listings, &mut in_batch, &mut report)?;
        }

        if let Some(e) = failure.filter(|_| report.fetch_errors == searches.len()) {
            return Err(e.into());
        }

        self.store.flush()?;
        Ok(report)
    }

    /// Score, classify and emit one search's listings.
    fn process(
        &mut self,
        config: &Config,
        search: &SearchConfig,
        listings: Vec<Listing>,
        in_batch: &mut HashSet<String>,
        report: &mut CycleReport,
    ) -> Result<()> {
        self.transition(WatchState::Scoring);
        let mut pending = Vec::new();
        let scored_at = Utc::now();

        for listing in listings {
            if self.store.has_seen(&listing.id) || !in_batch.insert(listing.id.clone()) {
                report.already_seen += 1;
                continue;
            }

            let score = match scoring::score(self.model.as_ref(), &listing, config) {
                Ok(score) => score,
                Err(e) => {
                    warn!("Skipping listing: {}", e);
                    report.scoring_errors += 1;
                    self.store.mark_seen(&listing.id)?;
                    continue;
                }
            };
            report.scored += 1;

            let tier = if search.allows_price(listing.price) {
                scoring::classify(score.value, &config.scoring)
            } else {
                report.over_max_price += 1;
                Tier::Reject
            };
            match tier {
                Tier::Reject => report.rejected += 1,
                Tier::Candidate => report.candidates += 1,
                Tier::AutoMatch => report.auto_matches += 1,
            }
            debug!(
                id = %listing.id,
                search = %search.name,
                score = score.value,
                ending_soon = score.ending_soon,
                "Classified as {}",
                tier
            );

            if tier.is_surfaced() || config.watch.emit_rejects {
                pending.push(ScoredListing {
                    listing,
                    search: search.name.clone(),
                    score: score.value,
                    ending_soon: score.ending_soon,
                    tier,
                    scored_at,
                });
            } else {
                self.store.mark_seen(&listing.id)?;
            }
        }

        self.transition(WatchState::Emitting);
        for event in pending {
            match self.sink.emit(&event) {
                Ok(()) => {
                    report.emitted += 1;
                    self.store.mark_seen(&event.listing.id)?;
                }
                Err(e) => {
                    error!(
                        "Sink refused listing {}, will retry next cycle: {}",
                        event.listing.id, e
                    );
                    report.sink_errors += 1;
                }
            }
        }

        Ok(())
    }

    fn reload_config(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        match Config::load(path) {
            Ok(config) if config != *self.config => {
                info!("Config reloaded from {}", path.display());
                self.config = Arc::new(config);
            }
            Ok(_) => {}
            Err(e) => warn!("Keeping previous config, reload failed: {}", e),
        }
    }
}
