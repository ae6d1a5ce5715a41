use groovewatch::api::FixtureFetcher;
use groovewatch::config::{Config, ScoringConfig, TunePatch, tune};
use groovewatch::error::ScoringError;
use groovewatch::events::ChannelSink;
use groovewatch::scoring::ScoreModel;
use groovewatch::state::{DedupStore, FileSeenStore, Listing, Tier};
use groovewatch::Watcher;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::path::Path;
use std::time::Duration;

/// Reads the desirability straight from the seller map.
#[derive(Debug)]
struct PresetScore;

impl ScoreModel for PresetScore {
    fn name(&self) -> &str {
        "preset"
    }

    fn desirability(&self, listing: &Listing, _: &ScoringConfig) -> Result<f64, ScoringError> {
        listing
            .seller
            .get("preset")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ScoringError::new(&listing.id, "no preset score"))
    }
}

fn listing(id: &str, score: f64, minutes_left: Option<u64>) -> Listing {
    let listing = Listing::new(id, format!("Listing {id} LP"))
        .with_price(dec!(12.00))
        .with_seller("preset", serde_json::json!(score));
    match minutes_left {
        Some(m) => listing.with_time_remaining(Duration::from_secs(m * 60)),
        None => listing,
    }
}

fn fixture() -> FixtureFetcher {
    FixtureFetcher::new(vec![
        listing("1001", 0.97, Some(10)),
        listing("1002", 0.70, Some(60)),
        listing("1003", 0.40, None),
    ])
}

async fn run_once(config: &Config, state: &Path) -> Vec<(String, Tier, bool)> {
    let store = FileSeenStore::open(state, config.dedup.retention()).unwrap();
    let (sink, mut rx) = ChannelSink::new();
    let mut watcher = Watcher::new(config.clone(), fixture(), store, sink).with_model(PresetScore);
    watcher.run_once().await.unwrap();
    drop(watcher);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push((event.listing.id, event.tier, event.ending_soon));
    }
    events
}

#[tokio::test]
async fn second_run_against_same_state_emits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("seen.json");
    let config = Config::sample();

    let first = run_once(&config, &state).await;
    assert_eq!(
        first,
        vec![
            ("1001".to_string(), Tier::AutoMatch, true),
            ("1002".to_string(), Tier::Candidate, false),
        ]
    );

    let store = FileSeenStore::open(&state, None).unwrap();
    for id in ["1001", "1002", "1003"] {
        assert!(store.has_seen(id), "{id} should be persisted");
    }

    let second = run_once(&config, &state).await;
    assert!(second.is_empty());
}

#[tokio::test]
async fn disabling_end_soon_clears_the_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let mut config = Config::sample();
    config.dedup.state_path = Some(dir.path().join("seen.json"));
    config.save(&config_path).unwrap();

    let patch = TunePatch {
        end_soon_enabled: Some(false),
        ..TunePatch::default()
    };
    let tuned = tune(&config_path, &patch).unwrap();
    assert_eq!(tuned, Config::load(&config_path).unwrap());
    assert!(tuned.end_soon_window().is_none());

    let events = run_once(&tuned, &tuned.state_path()).await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|(_, _, ending_soon)| !ending_soon));
}
