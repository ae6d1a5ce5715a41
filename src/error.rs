//! Error types for Groovewatch.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Groovewatch.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or unreadable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Listing fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A single listing could not be scored.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// The event sink refused an event.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Seen-set persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Generic application error
    #[error("{0}")]
    Application(String),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new application error.
    pub fn application(msg: impl Into<String>) -> Self {
        Self::Application(msg.into())
    }

    /// Check if this error is recoverable (the next cycle may succeed).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_transient(),
            Self::Scoring(_) | Self::Sink(_) => true,
            _ => false,
        }
    }
}

/// Configuration errors. Every variant names the offending key or file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The config file could not be read or written.
    #[error("config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or a key has the wrong type.
    #[error("malformed config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A required key is absent.
    #[error("missing config key `{0}`")]
    Missing(&'static str),

    /// A key is present but its value violates an invariant.
    #[error("invalid config key `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    /// Create a new invalid-value error.
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }

    /// The config key this error refers to, if any.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::Missing(key) | Self::Invalid { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Transport-level listing fetch errors.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The marketplace answered with a non-success status.
    #[error("marketplace returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Credentials are missing or were rejected.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Rate limiting errors
    #[error("rate limited: retry after {0} seconds")]
    RateLimited(u64),

    /// The response body could not be decoded.
    #[error("could not decode listings: {0}")]
    Decode(String),

    /// A fixture file could not be loaded.
    #[error("fixture {}: {message}", path.display())]
    Fixture { path: PathBuf, message: String },
}

impl FetchError {
    /// Create a new authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Whether retrying on the next interval can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::RateLimited(_) | Self::Status { .. }
        )
    }
}

/// Malformed listing data.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot score listing {listing_id}: {reason}")]
pub struct ScoringError {
    pub listing_id: String,
    pub reason: String,
}

impl ScoringError {
    /// Create a new scoring error for a listing.
    pub fn new(listing_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            listing_id: listing_id.into(),
            reason: reason.into(),
        }
    }
}

/// Event sink errors.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The receiving side of a channel sink is gone.
    #[error("event channel closed")]
    Closed,

    /// Writing the event failed.
    #[error("sink IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The event could not be serialized.
    #[error("sink serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Seen-set persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the state file failed.
    #[error("seen store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but cannot be parsed.
    #[error("seen store {} is corrupt: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_key() {
        let err = ConfigError::invalid("scoring.auto_match_threshold", "below floor");
        assert_eq!(err.key(), Some("scoring.auto_match_threshold"));
        assert!(err.to_string().contains("scoring.auto_match_threshold"));

        let err = ConfigError::Missing("end_soon.minutes_window");
        assert_eq!(err.key(), Some("end_soon.minutes_window"));
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::from(FetchError::RateLimited(30)).is_recoverable());
        assert!(!Error::from(FetchError::auth("no token")).is_recoverable());
        assert!(!Error::from(ConfigError::Missing("scoring")).is_recoverable());
        assert!(Error::from(ScoringError::new("1", "no price")).is_recoverable());
    }
}
