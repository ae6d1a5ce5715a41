//! Application wiring.
//!
//! `App` turns a config file and command-line overrides into a running
//! [`Watcher`]: it picks the fetcher, opens the seen store and assembles the
//! sinks.

use crate::api::{BrowseClient, FixtureFetcher};
use crate::config::{self, Config, TunePatch};
use crate::error::{Error, Result};
use crate::events::{ChannelSink, ConsoleSink, DealLogSink, FanoutSink, OutputFormat};
use crate::state::{FileSeenStore, Listing, MemorySeenStore, Tier};
use crate::watch::{CycleReport, Watcher};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Options for the `watch` command.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Run a single cycle and exit.
    pub once: bool,
    /// Read listings from this JSON file instead of the marketplace API.
    pub fixture: Option<PathBuf>,
    /// Override `watch.interval_secs`.
    pub interval_secs: Option<u64>,
    /// Also emit rejected listings.
    pub emit_rejects: bool,
    /// Console output format.
    pub format: OutputFormat,
    /// Deal log file, if any.
    pub deal_log: Option<PathBuf>,
}

impl WatchOptions {
    fn has_overrides(&self) -> bool {
        self.interval_secs.is_some() || self.emit_rejects
    }
}

/// The main application.
pub struct App {
    /// Configuration.
    config: Config,
    /// File the configuration was loaded from.
    config_path: Option<PathBuf>,
}

impl App {
    /// Create an application from an in-memory config.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Load the config from `path`. A missing file is an error; run `init`
    /// first.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load(&path)?;
        info!("Loaded config from {}", path.display());
        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a watcher for `options`, with a file-backed seen store.
    pub fn watcher(&self, options: &WatchOptions) -> Result<Watcher> {
        let mut config = self.config.clone();
        if let Some(secs) = options.interval_secs {
            config.watch.interval_secs = secs.max(1);
        }
        if options.emit_rejects {
            config.watch.emit_rejects = true;
        }

        let store = FileSeenStore::open(config.state_path(), config.dedup.retention())?;
        info!(
            "Seen store {} holds {} ids",
            store.path().display(),
            store.seen().len()
        );

        let mut sink = FanoutSink::new().with(ConsoleSink::stdout(options.format));
        if let Some(path) = &options.deal_log {
            sink = sink.with(DealLogSink::new(path));
        }

        let watcher = match &options.fixture {
            Some(path) => {
                let fetcher = FixtureFetcher::from_file(path)?;
                info!(
                    "Using {} fixture listings from {}",
                    fetcher.listings().len(),
                    path.display()
                );
                Watcher::new(config, fetcher, store, sink)
            }
            None => Watcher::new(config.clone(), BrowseClient::new(config.api)?, store, sink),
        };

        // Command-line overrides would be lost on reload.
        match &self.config_path {
            Some(path) if !options.has_overrides() => Ok(watcher.with_config_path(path)),
            _ => Ok(watcher),
        }
    }

    /// Run the `watch` command. Returns the cycle report in `--once` mode.
    pub async fn watch(&self, options: &WatchOptions) -> Result<Option<CycleReport>> {
        let mut watcher = self.watcher(options)?;

        if options.once {
            let report = watcher.run_once().await?;
            info!("Single cycle complete: {}", report);
            if report.fetch_errors > 0 {
                return Err(Error::application(format!(
                    "{} of {} searches failed to fetch",
                    report.fetch_errors, report.searches
                )));
            }
            return Ok(Some(report));
        }

        let (tx, shutdown) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current cycle");
                    let _ = tx.send(true);
                }
                Err(e) => {
                    warn!("Cannot listen for Ctrl-C: {}", e);
                    tx.closed().await;
                }
            }
        });

        watcher.run(shutdown).await?;
        Ok(None)
    }

    /// Write the sample config to `path` unless a file already exists.
    /// Returns whether a file was written.
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            info!("Config already exists at {}", path.display());
            return Ok(false);
        }
        Config::sample().save(path)?;
        info!("Wrote sample config to {}", path.display());
        Ok(true)
    }

    /// Apply `patch` to the config file at `path`.
    pub fn tune(path: &Path, patch: &TunePatch) -> Result<Config> {
        if patch.is_empty() {
            return Err(Error::application("nothing to tune; pass at least one option"));
        }
        Ok(config::tune(path, patch)?)
    }

    /// Offline wiring check: sample config, built-in listings, in-memory
    /// store. Runs two cycles and verifies tiers and deduplication.
    pub async fn smoke(format: OutputFormat) -> Result<CycleReport> {
        let (channel, mut rx) = ChannelSink::new();
        let sink = FanoutSink::new()
            .with(ConsoleSink::stdout(format))
            .with(channel);
        let mut watcher = Watcher::new(
            Config::sample(),
            FixtureFetcher::new(smoke_listings()),
            MemorySeenStore::new(),
            sink,
        );

        let report = watcher.run_cycle().await?;
        let repeat = watcher.run_once().await?;

        let mut tiers = Vec::new();
        while let Ok(event) = rx.try_recv() {
            tiers.push(event.tier);
        }

        let checks = [
            (report.auto_matches == 1, "one auto-match"),
            (report.candidates == 1, "one candidate"),
            (report.rejected == 1, "one reject"),
            (report.already_seen == 1, "in-batch duplicate skipped"),
            (report.scoring_errors + report.sink_errors == 0, "no errors"),
            (tiers == [Tier::AutoMatch, Tier::Candidate], "surfaced events in order"),
            (repeat.emitted == 0, "second cycle emits nothing"),
            (watcher.store().len() == 3, "every processed id seen"),
        ];
        for (ok, what) in checks {
            if !ok {
                return Err(Error::application(format!("smoke check failed: {what}")));
            }
        }

        info!("Smoke run passed: {}", report);
        Ok(report)
    }
}

/// Listings used by the smoke run, scored against [`Config::sample`].
fn smoke_listings() -> Vec<Listing> {
    vec![
        Listing::new("smoke-1", "Joy Division - Unknown Pleasures Vinyl LP")
            .with_price(Decimal::from(1))
            .with_time_remaining(Duration::from_secs(10 * 60))
            .with_seller("feedback_pct", json!(100.0))
            .with_url("https://www.ebay.co.uk/itm/smoke-1"),
        Listing::new("smoke-2", "Massive Attack - Blue Lines Vinyl LP")
            .with_price(Decimal::from(10))
            .with_time_remaining(Duration::from_secs(60 * 60))
            .with_seller("feedback_pct", json!(98.0))
            .with_url("https://www.ebay.co.uk/itm/smoke-2"),
        Listing::new("smoke-3", "Greatest Hits CD")
            .with_price(Decimal::from(5))
            .with_url("https://www.ebay.co.uk/itm/smoke-3"),
        Listing::new("smoke-1", "Joy Division - Unknown Pleasures Vinyl LP")
            .with_price(Decimal::from(1)),
    ]
}
