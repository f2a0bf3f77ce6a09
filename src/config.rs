//! Configuration management module
//!
//! Loads environment-based configuration with sensible defaults.
//! Variables use the `PLANWATCH__SECTION__KEY` form.

use config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

use crate::evaluator::EvaluatorConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Server configuration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// Weather feed configuration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Interval in milliseconds between generated readings
    pub interval_ms: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

/// Plan watcher configuration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    /// Interval in milliseconds between evaluation sweeps
    pub interval_ms: u64,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self { interval_ms: 5000 }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub feed: FeedSettings,
    pub watcher: WatcherSettings,
    pub evaluator: EvaluatorConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        let loaded = Config::builder()
            .add_source(
                Environment::with_prefix("PLANWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(loaded.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_settings() {
        env::remove_var("PLANWATCH__SERVER__PORT");
        env::remove_var("PLANWATCH__FEED__INTERVAL_MS");

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.feed.interval_ms, 1000);
        assert!((settings.evaluator.tolerance - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("PLANWATCH__SERVER__HOST", "127.0.0.1");
        env::set_var("PLANWATCH__WATCHER__INTERVAL_MS", "250");

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.watcher.interval_ms, 250);

        env::remove_var("PLANWATCH__SERVER__HOST");
        env::remove_var("PLANWATCH__WATCHER__INTERVAL_MS");
    }
}
