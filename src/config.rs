// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for contribution trend collection.

use crate::fetch::RetryPolicy;
use crate::limiter::TokenBucket;
use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub trend: TrendConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Concurrent fetch workers.
    pub max_workers: usize,
    /// Optional cap on how many users of the input list are processed.
    pub limit: Option<usize>,
    /// Total fetch attempts per user, including the first.
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// API requests allowed per minute across all workers; absent disables
    /// the shared rate limiter.
    pub requests_per_minute: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Trailing moving-average window, in complete weeks.
    pub moving_average_window: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            limit: None,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 10_000,
            requests_per_minute: Some(60),
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            moving_average_window: crate::trend::DEFAULT_MOVING_AVERAGE_WINDOW,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            trend: TrendConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path.as_std_path())
            .with_context(|| format!("failed to read config file at {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file at {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self> {
        if path.as_std_path().exists() {
            Self::load(path)
        } else {
            debug!("no config file at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_workers == 0 {
            bail!("fetch.max_workers must be positive");
        }
        if self.fetch.retry_attempts == 0 {
            bail!("fetch.retry_attempts must be positive");
        }
        if self.fetch.limit == Some(0) {
            bail!("fetch.limit must be positive when set");
        }
        if self.fetch.requests_per_minute == Some(0) {
            bail!("fetch.requests_per_minute must be positive when set");
        }
        if self.trend.moving_average_window == 0 {
            bail!("trend.moving_average_window must be positive");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch.retry_attempts,
            base_delay: Duration::from_millis(self.fetch.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.fetch.retry_max_delay_ms),
        }
    }

    /// Shared token bucket for the worker pool, if rate limiting is on.
    pub fn rate_limiter(&self) -> Option<Arc<TokenBucket>> {
        self.fetch
            .requests_per_minute
            .map(|rate| Arc::new(TokenBucket::new(rate, Duration::from_secs(60))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(config.fetch.max_workers, parsed.fetch.max_workers);
        assert_eq!(
            config.trend.moving_average_window,
            parsed.trend.moving_average_window
        );
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[fetch]
max_workers = 3
limit = 25
retry_attempts = 5
requests_per_minute = 30

[trend]
moving_average_window = 6
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.fetch.max_workers, 3);
        assert_eq!(config.fetch.limit, Some(25));
        assert_eq!(config.fetch.retry_attempts, 5);
        assert_eq!(config.trend.moving_average_window, 6);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert!(config.rate_limiter().is_some());
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.fetch.max_workers, 8);
        assert_eq!(config.trend.moving_average_window, 4);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config: Config = toml::from_str("[fetch]\nmax_workers = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config: Config = toml::from_str("[trend]\nmoving_average_window = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
