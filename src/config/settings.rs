//! Configuration settings for Groovewatch.
//!
//! The config file is a JSON object. The tuning keys (`end_soon.*` and
//! `scoring.*`) are validated strictly and never defaulted; the operational
//! sections (`watch`, `dedup`, `api`) fall back to their `Default` impls.

use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
///
/// A `Config` is an immutable snapshot: the watch engine reads it but never
/// changes it. Use [`crate::config::tune`] to patch the file on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Ending-soon detection. `None` disables the feature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_soon: Option<EndSoonConfig>,
    /// Scoring thresholds and model parameters.
    pub scoring: ScoringConfig,
    /// Polling loop settings.
    pub watch: WatchConfig,
    /// Seen-set persistence.
    pub dedup: DedupConfig,
    /// Marketplace API settings.
    pub api: ApiConfig,
}

impl Config {
    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_json_str(&content, path)
    }

    /// Parse and validate configuration from JSON text. `origin` is only used
    /// for error messages.
    pub fn from_json_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        raw.validate()
    }

    /// Parse and validate configuration from an already-decoded JSON document.
    pub fn from_value(value: serde_json::Value, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_value(value).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        raw.validate()
    }

    /// Save configuration to file, replacing it atomically.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        content.push('\n');
        super::write_atomic(path, content.as_bytes()).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A complete, valid configuration used by `init` and smoke mode.
    pub fn sample() -> Self {
        Self {
            end_soon: Some(EndSoonConfig {
                enabled: true,
                minutes_window: Some(20),
            }),
            scoring: ScoringConfig {
                candidate_floor: 0.62,
                auto_match_threshold: 0.95,
                target_price: Some(Decimal::from(25)),
                keywords: vec!["vinyl".to_string(), "lp".to_string()],
                exclude_terms: vec!["cd".to_string(), "cassette".to_string()],
                weights: ScoreWeights::default(),
            },
            watch: WatchConfig {
                searches: vec![SearchConfig {
                    max_price: Some(Decimal::from(60)),
                    ..SearchConfig::new("vinyl-lp", "vinyl lp")
                }],
                ..WatchConfig::default()
            },
            dedup: DedupConfig::default(),
            api: ApiConfig::default(),
        }
    }

    /// This config with `search`'s exclusions added to the scoring terms.
    pub fn for_search(&self, search: &SearchConfig) -> Config {
        let mut config = self.clone();
        for term in &search.exclude_terms {
            if !config.scoring.exclude_terms.contains(term) {
                config.scoring.exclude_terms.push(term.clone());
            }
        }
        config
    }

    /// The ending-soon window, if the feature is enabled.
    pub fn end_soon_window(&self) -> Option<Duration> {
        self.end_soon.as_ref().and_then(EndSoonConfig::window)
    }

    /// Path of the seen-set state file.
    pub fn state_path(&self) -> PathBuf {
        self.dedup
            .state_path
            .clone()
            .unwrap_or_else(super::default_state_path)
    }
}

/// Ending-soon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndSoonConfig {
    /// Whether ending-soon flagging is on.
    pub enabled: bool,
    /// Window in minutes. Required when `enabled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_window: Option<u32>,
}

impl EndSoonConfig {
    /// The window as a duration, or `None` when disabled.
    pub fn window(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        self.minutes_window
            .map(|m| Duration::from_secs(u64::from(m) * 60))
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    /// Minimum score for a listing to be surfaced at all.
    pub candidate_floor: f64,
    /// Score at or above which a listing is an auto-match.
    pub auto_match_threshold: f64,
    /// Reference price a listing is compared against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_price: Option<Decimal>,
    /// Terms expected in a good listing title.
    pub keywords: Vec<String>,
    /// Terms that disqualify a title.
    pub exclude_terms: Vec<String>,
    /// Relative weights of the score signals.
    pub weights: ScoreWeights,
}

/// Relative weights of the price, title and seller signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub price: f64,
    pub title: f64,
    pub seller: f64,
}

impl ScoreWeights {
    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.price + self.title + self.seller
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            price: 0.6,
            title: 0.3,
            seller: 0.1,
        }
    }
}

/// Polling loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Search query used when no named searches are configured.
    pub query: String,
    /// Named saved searches, each fetched once per cycle.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub searches: Vec<SearchConfig>,
    /// Seconds between cycles in continuous mode.
    pub interval_secs: u64,
    /// Maximum listings requested per cycle.
    pub limit: u32,
    /// Emit rejected listings too (debugging aid).
    pub emit_rejects: bool,
}

impl WatchConfig {
    /// Interval between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Searches to run each cycle. Without named searches this is a single
    /// `default` search for `query`.
    pub fn searches(&self) -> Vec<SearchConfig> {
        if self.searches.is_empty() {
            vec![SearchConfig::new("default", &self.query)]
        } else {
            self.searches.clone()
        }
    }
}

/// A named saved search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Label carried on every event from this search.
    pub name: String,
    /// Marketplace search query.
    pub query: String,
    /// Listings priced above this are rejected whatever their score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    /// Title terms rejected for this search, on top of `scoring.exclude_terms`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_terms: Vec<String>,
}

impl SearchConfig {
    /// A search with no price cap or extra exclusions.
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            max_price: None,
            exclude_terms: Vec::new(),
        }
    }

    /// Whether `price` is within the cap. Unpriced listings pass; scoring
    /// rejects them separately.
    pub fn allows_price(&self, price: Option<Decimal>) -> bool {
        match (self.max_price, price) {
            (Some(max), Some(price)) => price <= max,
            _ => true,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            query: "vinyl lp".to_string(),
            searches: Vec::new(),
            interval_secs: 300,
            limit: 50,
            emit_rejects: false,
        }
    }
}

/// Seen-set persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// State file location. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
    /// Days an identifier is remembered. `null` keeps identifiers forever.
    pub retention_days: Option<u32>,
}

impl DedupConfig {
    /// Retention window as a chrono duration.
    pub fn retention(&self) -> Option<chrono::Duration> {
        self.retention_days
            .map(|days| chrono::Duration::days(i64::from(days)))
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            retention_days: Some(90),
        }
    }
}

/// Marketplace API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL.
    pub base_url: String,
    /// Marketplace identifier sent with every request.
    pub marketplace_id: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Rate limit (requests per second).
    pub rate_limit: u32,
    /// Environment variable holding the bearer token.
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.ebay.com".to_string(),
            marketplace_id: "EBAY_GB".to_string(),
            timeout_secs: 12,
            rate_limit: 2,
            token_env: "GROOVEWATCH_API_TOKEN".to_string(),
        }
    }
}

/// On-disk shape before validation. Tuning keys are optional here so that a
/// missing key is reported by its full dotted name.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    end_soon: Option<RawEndSoon>,
    #[serde(default)]
    scoring: Option<RawScoring>,
    #[serde(default)]
    watch: WatchConfig,
    #[serde(default)]
    dedup: DedupConfig,
    #[serde(default)]
    api: ApiConfig,
}

#[derive(Debug, Deserialize)]
struct RawEndSoon {
    enabled: Option<bool>,
    minutes_window: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawScoring {
    candidate_floor: Option<f64>,
    auto_match_threshold: Option<f64>,
    #[serde(default)]
    target_price: Option<Decimal>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    exclude_terms: Vec<String>,
    #[serde(default)]
    weights: ScoreWeights,
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let end_soon = self.end_soon.map(RawEndSoon::validate).transpose()?;
        let scoring = self
            .scoring
            .ok_or(ConfigError::Missing("scoring"))?
            .validate()?;

        let mut watch = self.watch;
        if watch.searches.is_empty() && watch.query.trim().is_empty() {
            return Err(ConfigError::invalid("watch.query", "must not be empty"));
        }
        watch.searches = validate_searches(watch.searches)?;
        if watch.interval_secs == 0 {
            return Err(ConfigError::invalid(
                "watch.interval_secs",
                "must be a positive number of seconds",
            ));
        }
        if !(1..=200).contains(&watch.limit) {
            return Err(ConfigError::invalid(
                "watch.limit",
                format!("{} is outside 1..=200", watch.limit),
            ));
        }
        if self.dedup.retention_days == Some(0) {
            return Err(ConfigError::invalid(
                "dedup.retention_days",
                "must be positive or null",
            ));
        }
        if self.api.rate_limit == 0 {
            return Err(ConfigError::invalid("api.rate_limit", "must be positive"));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::invalid("api.timeout_secs", "must be positive"));
        }

        Ok(Config {
            end_soon,
            scoring,
            watch,
            dedup: self.dedup,
            api: self.api,
        })
    }
}

impl RawEndSoon {
    fn validate(self) -> Result<EndSoonConfig, ConfigError> {
        let enabled = self.enabled.ok_or(ConfigError::Missing("end_soon.enabled"))?;

        let minutes_window = match self.minutes_window {
            Some(m) if m <= 0 || m > i64::from(u32::MAX) => {
                return Err(ConfigError::invalid(
                    "end_soon.minutes_window",
                    format!("{m} is not a positive number of minutes"),
                ));
            }
            Some(m) => Some(m as u32),
            None if enabled => return Err(ConfigError::Missing("end_soon.minutes_window")),
            None => None,
        };

        Ok(EndSoonConfig {
            enabled,
            minutes_window,
        })
    }
}

impl RawScoring {
    #[allow(clippy::collapsible_if)] // Intentionally avoiding let-chains for stable Rust
    fn validate(self) -> Result<ScoringConfig, ConfigError> {
        let candidate_floor = self
            .candidate_floor
            .ok_or(ConfigError::Missing("scoring.candidate_floor"))?;
        check_unit("scoring.candidate_floor", candidate_floor)?;

        let auto_match_threshold = self
            .auto_match_threshold
            .ok_or(ConfigError::Missing("scoring.auto_match_threshold"))?;
        check_unit("scoring.auto_match_threshold", auto_match_threshold)?;

        if auto_match_threshold < candidate_floor {
            return Err(ConfigError::invalid(
                "scoring.auto_match_threshold",
                format!(
                    "{auto_match_threshold} is below scoring.candidate_floor {candidate_floor}"
                ),
            ));
        }

        if let Some(price) = self.target_price {
            if price <= Decimal::ZERO {
                return Err(ConfigError::invalid(
                    "scoring.target_price",
                    "must be greater than zero",
                ));
            }
        }

        let w = self.weights;
        for (key, value) in [
            ("scoring.weights.price", w.price),
            ("scoring.weights.title", w.title),
            ("scoring.weights.seller", w.seller),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(key, "must be a non-negative number"));
            }
        }
        if w.total() <= 0.0 {
            return Err(ConfigError::invalid(
                "scoring.weights",
                "at least one weight must be positive",
            ));
        }

        Ok(ScoringConfig {
            candidate_floor,
            auto_match_threshold,
            target_price: self.target_price,
            keywords: normalize_terms(self.keywords),
            exclude_terms: normalize_terms(self.exclude_terms),
            weights: w,
        })
    }
}

fn validate_searches(searches: Vec<SearchConfig>) -> Result<Vec<SearchConfig>, ConfigError> {
    let mut names = std::collections::HashSet::new();
    searches
        .into_iter()
        .map(|search| {
            let name = search.name.trim().to_string();
            if name.is_empty() {
                return Err(ConfigError::invalid("watch.searches.name", "must not be empty"));
            }
            if !names.insert(name.clone()) {
                return Err(ConfigError::invalid(
                    "watch.searches.name",
                    format!("duplicate search '{name}'"),
                ));
            }
            if search.query.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "watch.searches.query",
                    format!("search '{name}' has an empty query"),
                ));
            }
            if search.max_price.is_some_and(|max| max < Decimal::ZERO) {
                return Err(ConfigError::invalid(
                    "watch.searches.max_price",
                    format!("search '{name}' has a negative price cap"),
                ));
            }
            Ok(SearchConfig {
                name,
                query: search.query,
                max_price: search.max_price,
                exclude_terms: normalize_terms(search.exclude_terms),
            })
        })
        .collect()
}

fn check_unit(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("{value} is outside [0, 1]")))
    }
}

fn normalize_terms(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Config, ConfigError> {
        Config::from_value(value, Path::new("test.json"))
    }

    fn minimal() -> serde_json::Value {
        json!({
            "end_soon": { "enabled": true, "minutes_window": 20 },
            "scoring": { "candidate_floor": 0.62, "auto_match_threshold": 0.95 }
        })
    }

    #[test]
    fn test_minimal_config() {
        let config = parse(minimal()).unwrap();
        assert_eq!(config.scoring.candidate_floor, 0.62);
        assert_eq!(config.scoring.auto_match_threshold, 0.95);
        assert_eq!(config.end_soon_window(), Some(Duration::from_secs(20 * 60)));
        assert_eq!(config.watch, WatchConfig::default());
        assert_eq!(config.dedup.retention_days, Some(90));
    }

    #[test]
    fn test_absent_end_soon_disables_feature() {
        let config = parse(json!({
            "scoring": { "candidate_floor": 0.5, "auto_match_threshold": 0.9 }
        }))
        .unwrap();
        assert!(config.end_soon.is_none());
        assert_eq!(config.end_soon_window(), None);
    }

    #[test]
    fn test_disabled_end_soon_without_window() {
        let config = parse(json!({
            "end_soon": { "enabled": false },
            "scoring": { "candidate_floor": 0.5, "auto_match_threshold": 0.9 }
        }))
        .unwrap();
        assert_eq!(config.end_soon_window(), None);
    }

    #[test]
    fn test_enabled_end_soon_requires_window() {
        let err = parse(json!({
            "end_soon": { "enabled": true },
            "scoring": { "candidate_floor": 0.5, "auto_match_threshold": 0.9 }
        }))
        .unwrap_err();
        assert_eq!(err.key(), Some("end_soon.minutes_window"));
    }

    #[test]
    fn test_window_must_be_positive() {
        let mut value = minimal();
        value["end_soon"]["minutes_window"] = json!(0);
        assert_eq!(parse(value).unwrap_err().key(), Some("end_soon.minutes_window"));

        let mut value = minimal();
        value["end_soon"]["minutes_window"] = json!(-5);
        assert_eq!(parse(value).unwrap_err().key(), Some("end_soon.minutes_window"));
    }

    #[test]
    fn test_threshold_below_floor_rejected() {
        let mut value = minimal();
        value["scoring"]["auto_match_threshold"] = json!(0.5);
        let err = parse(value).unwrap_err();
        assert_eq!(err.key(), Some("scoring.auto_match_threshold"));
    }

    #[test]
    fn test_equal_thresholds_accepted() {
        let mut value = minimal();
        value["scoring"]["auto_match_threshold"] = json!(0.62);
        assert!(parse(value).is_ok());
    }

    #[test]
    fn test_floor_out_of_range() {
        let mut value = minimal();
        value["scoring"]["candidate_floor"] = json!(1.5);
        assert_eq!(parse(value).unwrap_err().key(), Some("scoring.candidate_floor"));
    }

    #[test]
    fn test_missing_scoring_keys() {
        assert_eq!(
            parse(json!({})).unwrap_err().key(),
            Some("scoring")
        );
        assert_eq!(
            parse(json!({ "scoring": { "auto_match_threshold": 0.9 } }))
                .unwrap_err()
                .key(),
            Some("scoring.candidate_floor")
        );
        assert_eq!(
            parse(json!({ "scoring": { "candidate_floor": 0.4 } }))
                .unwrap_err()
                .key(),
            Some("scoring.auto_match_threshold")
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = Config::from_json_str("{ not json", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_zero_weights_rejected() {
        let mut value = minimal();
        value["scoring"]["weights"] = json!({ "price": 0.0, "title": 0.0, "seller": 0.0 });
        assert_eq!(parse(value).unwrap_err().key(), Some("scoring.weights"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/groovewatch.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::sample();
        config.dedup.retention_days = None;
        config.dedup.state_path = Some(dir.path().join("seen.json"));
        config.save(&path).unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_round_trip_is_exact_for_arbitrary_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        // Linear congruential sequence of values in [0, 1).
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };

        let mut config = Config::sample();
        for _ in 0..2_000 {
            let (a, b) = (next(), next());
            config.scoring.candidate_floor = a.min(b);
            config.scoring.auto_match_threshold = a.max(b);
            config.save(&path).unwrap();

            let reloaded = Config::load(&path).unwrap();
            assert_eq!(
                reloaded.scoring.candidate_floor.to_bits(),
                config.scoring.candidate_floor.to_bits()
            );
            assert_eq!(
                reloaded.scoring.auto_match_threshold.to_bits(),
                config.scoring.auto_match_threshold.to_bits()
            );
        }

        config.scoring.candidate_floor = 0.9556395672092627;
        config.scoring.auto_match_threshold = 0.9556395672092628;
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_round_trip_without_end_soon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::sample();
        config.end_soon = None;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_single_query_is_default_search() {
        let config = parse(minimal()).unwrap();
        let searches = config.watch.searches();
        assert_eq!(searches, vec![SearchConfig::new("default", "vinyl lp")]);
    }

    #[test]
    fn test_named_searches() {
        let mut value = minimal();
        value["watch"] = json!({
            "searches": [
                { "name": "shoegaze", "query": "shoegaze lp", "max_price": "40", "exclude_terms": ["  Reissue "] },
                { "name": "dub", "query": "dub 12\"" }
            ]
        });
        let config = parse(value).unwrap();
        let searches = config.watch.searches();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].max_price, Some(Decimal::from(40)));
        assert_eq!(searches[0].exclude_terms, vec!["reissue".to_string()]);
        assert_eq!(searches[1].max_price, None);
    }

    #[test]
    fn test_invalid_searches() {
        for (searches, key) in [
            (json!([{ "name": " ", "query": "lp" }]), "watch.searches.name"),
            (
                json!([{ "name": "a", "query": "lp" }, { "name": "a", "query": "12\"" }]),
                "watch.searches.name",
            ),
            (json!([{ "name": "a", "query": "" }]), "watch.searches.query"),
            (
                json!([{ "name": "a", "query": "lp", "max_price": "-1" }]),
                "watch.searches.max_price",
            ),
        ] {
            let mut value = minimal();
            value["watch"] = json!({ "searches": searches });
            assert_eq!(parse(value).unwrap_err().key(), Some(key));
        }
    }

    #[test]
    fn test_for_search_merges_exclusions() {
        let config = Config::sample();
        let search = SearchConfig {
            exclude_terms: vec!["cd".to_string(), "picture disc".to_string()],
            ..SearchConfig::new("x", "lp")
        };
        let scoped = config.for_search(&search);
        assert_eq!(
            scoped.scoring.exclude_terms,
            vec!["cd".to_string(), "cassette".to_string(), "picture disc".to_string()]
        );
        assert_eq!(scoped.scoring.candidate_floor, config.scoring.candidate_floor);
    }

    #[test]
    fn test_price_cap() {
        let search = SearchConfig {
            max_price: Some(Decimal::from(30)),
            ..SearchConfig::new("x", "lp")
        };
        assert!(search.allows_price(Some(Decimal::from(30))));
        assert!(!search.allows_price(Some(Decimal::from(31))));
        assert!(search.allows_price(None));
        assert!(SearchConfig::new("y", "lp").allows_price(Some(Decimal::MAX)));
    }
}
