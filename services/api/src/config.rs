//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub advisory_api_key: Option<String>,
    pub advisory_api_base: Option<String>,
    pub advisory_model: String,
    /// How often the usage counters advance while connected.
    pub tick_interval: Duration,
    /// How often the receiver's display bandwidth is resampled.
    pub bandwidth_interval: Duration,
    /// Simulated duration of an explicit speed test.
    pub speed_test_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: Level::INFO,
            cors_origin: "http://localhost:5173".to_string(),
            advisory_api_key: None,
            advisory_api_base: None,
            advisory_model: "gemini-2.5-flash".to_string(),
            tick_interval: Duration::from_millis(5000),
            bandwidth_interval: Duration::from_millis(3000),
            speed_test_delay: Duration::from_millis(2500),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Load Server Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(s) => s.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        // --- Load Advisory Settings (key is optional) ---
        let advisory_api_key = lookup("ADVISORY_API_KEY").filter(|k| !k.trim().is_empty());
        let advisory_api_base = lookup("ADVISORY_API_BASE").filter(|b| !b.trim().is_empty());
        let advisory_model = lookup("ADVISORY_MODEL").unwrap_or(defaults.advisory_model);

        // --- Load Simulation Timings ---
        let tick_interval = millis(&lookup, "TICK_INTERVAL_MS", defaults.tick_interval)?;
        let bandwidth_interval =
            millis(&lookup, "BANDWIDTH_INTERVAL_MS", defaults.bandwidth_interval)?;
        let speed_test_delay =
            millis(&lookup, "SPEED_TEST_DELAY_MS", defaults.speed_test_delay)?;

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            advisory_api_key,
            advisory_api_base,
            advisory_model,
            tick_interval,
            bandwidth_interval,
            speed_test_delay,
        })
    }
}

/// Reads a positive millisecond count, falling back to `default` when unset.
fn millis<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(ConfigError::InvalidValue(key.to_string(), e.to_string())),
    }
}
