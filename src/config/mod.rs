//! Configuration management for Groovewatch.

mod settings;
mod tune;

pub use settings::{
    ApiConfig, Config, DedupConfig, EndSoonConfig, ScoreWeights, ScoringConfig, SearchConfig,
    WatchConfig,
};
pub use tune::{TunePatch, tune};

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "groovewatch", "groovewatch")
}

/// Get the configuration directory path.
pub fn config_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::application("Could not determine config directory"))
}

/// Get the data directory path.
pub fn data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::application("Could not determine data directory"))
}

/// Get the log directory path.
pub fn log_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("logs"))
        .ok_or_else(|| Error::application("Could not determine log directory"))
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    config_dir()
        .map(|p| p.join("config.json"))
        .unwrap_or_else(|_| PathBuf::from("config.json"))
}

/// Default location of the seen-set state file.
pub fn default_state_path() -> PathBuf {
    data_dir()
        .map(|p| p.join("seen.json"))
        .unwrap_or_else(|_| PathBuf::from("seen.json"))
}

/// Write `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)
}
