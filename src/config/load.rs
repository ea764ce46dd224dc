use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

/// Default config file, overridable via `TOMBO_CONFIG`.
pub fn config_path() -> PathBuf {
    std::env::var_os("TOMBO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tombo.toml"))
}

/// Load the effective config: file (if present), then env overrides.
///
/// A missing file is the defaults; an unreadable or unparseable file is
/// warned about and also the defaults. Config problems never block the
/// inventory core.
pub fn load() -> Config {
    load_from(&config_path())
}

pub fn load_from(path: &Path) -> Config {
    let mut config = match read_file(path) {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(reason) => {
            tracing::warn!(path = %path.display(), %reason, "config unusable, using defaults");
            Config::default()
        }
    };
    apply_env_overrides(&mut config);
    config
}

fn read_file(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;
    toml::from_str(&contents).map(Some).map_err(|e| e.to_string())
}

pub fn apply_env_overrides(config: &mut Config) {
    if let Some(value) = env_parsed::<u32>("TOMBO_ALLOC_ATTEMPTS") {
        config.allocation.attempts = value;
    }
    if let Some(value) = env_parsed::<u32>("TOMBO_READ_ATTEMPTS") {
        config.reads.attempts = value;
    }
    if let Some(value) = env_parsed::<usize>("TOMBO_FEED_LIMIT") {
        config.activity.feed_limit = value;
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("invalid {key}, ignoring: {err}");
            None
        }
    }
}
