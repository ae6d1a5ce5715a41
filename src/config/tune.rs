//! Read-modify-write patching of the tuning keys in a config file.
//!
//! The file is handled as a raw JSON document so that keys this crate does
//! not know about survive a tune.

use super::Config;
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::path::Path;

/// A partial update of the tuning keys. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TunePatch {
    pub end_soon_enabled: Option<bool>,
    pub minutes_window: Option<u32>,
    pub candidate_floor: Option<f64>,
    pub auto_match_threshold: Option<f64>,
}

impl TunePatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to a config document in place.
    pub fn apply(&self, doc: &mut Value) -> Result<(), ConfigError> {
        let root = doc
            .as_object_mut()
            .ok_or_else(|| ConfigError::invalid("<root>", "config must be a JSON object"))?;

        if self.end_soon_enabled.is_some() || self.minutes_window.is_some() {
            let end_soon = section(root, "end_soon")?;
            if let Some(enabled) = self.end_soon_enabled {
                end_soon.insert("enabled".to_string(), Value::Bool(enabled));
            }
            if let Some(window) = self.minutes_window {
                end_soon.insert("minutes_window".to_string(), Value::from(window));
            }
        }

        if self.candidate_floor.is_some() || self.auto_match_threshold.is_some() {
            let scoring = section(root, "scoring")?;
            if let Some(floor) = self.candidate_floor {
                scoring.insert(
                    "candidate_floor".to_string(),
                    number("scoring.candidate_floor", floor)?,
                );
            }
            if let Some(threshold) = self.auto_match_threshold {
                scoring.insert(
                    "auto_match_threshold".to_string(),
                    number("scoring.auto_match_threshold", threshold)?,
                );
            }
        }

        Ok(())
    }
}

/// Patch the config file at `path` and return the validated result.
///
/// The whole document is rewritten atomically. If the patched document does
/// not validate, the file is left untouched.
pub fn tune(path: &Path, patch: &TunePatch) -> Result<Config, ConfigError> {
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
    let mut doc: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    patch.apply(&mut doc)?;
    let config = Config::from_value(doc.clone(), path)?;

    let mut out = serde_json::to_string_pretty(&doc).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    out.push('\n');
    super::write_atomic(path, out.as_bytes()).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), ?patch, "Config tuned");
    Ok(config)
}

fn section<'a>(
    root: &'a mut Map<String, Value>,
    key: &'static str,
) -> Result<&'a mut Map<String, Value>, ConfigError> {
    root.entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| ConfigError::invalid(key, "must be a JSON object"))
}

fn number(key: &'static str, value: f64) -> Result<Value, ConfigError> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ConfigError::invalid(key, "must be a finite number"))
}
