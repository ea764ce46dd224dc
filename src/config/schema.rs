use serde::{Deserialize, Serialize};

use crate::ops::queries::DEFAULT_FEED_LIMIT;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub allocation: AllocationConfig,
    pub reads: ReadRetryConfig,
    pub activity: ActivityConfig,
    pub logging: LoggingConfig,
}

/// Budget for re-running a lost allocation claim (and the delete guard,
/// which shares it).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AllocationConfig {
    pub attempts: u32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self { attempts: 5 }
    }
}

/// Backoff schedule for idempotent reads. Writes are never retried.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReadRetryConfig {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReadRetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 25,
            max_delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActivityConfig {
    /// How many feed entries the dashboard view returns.
    pub feed_limit: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether to install a stdout subscriber at all.
    pub stdout: bool,
    /// Tracing filter directive, e.g. `"tombo=debug,info"`.
    /// `TOMBO_LOG` overrides it at init.
    pub filter: Option<String>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            filter: None,
            format: LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let config = Config::default();
        assert_eq!(config.allocation.attempts, 5);
        assert_eq!(config.reads.attempts, 3);
        assert_eq!(config.activity.feed_limit, DEFAULT_FEED_LIMIT);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [allocation]
            attempts = 8

            [logging]
            format = "json"
            "#,
        )
        .expect("parse");
        assert_eq!(config.allocation.attempts, 8);
        assert_eq!(config.reads, ReadRetryConfig::default());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, None);
    }
}
