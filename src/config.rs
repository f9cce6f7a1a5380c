//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before any snapshot
//! is read. Command-line flags override the matching variables.
//!
//! ```bash
//! export SNAPSHOT_PATH="./rules.json"
//! export LOG_FORMAT="json"
//! ```
//!
//! ## Optional Variables
//!
//! - `SNAPSHOT_PATH` - Rules and settings document (default: `rules.json`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `VALIDATION_CONCURRENCY` - Batch validation workers (default: 4, range: 1-256)
//! - `VALIDATION_MAX_URLS` - URLs accepted per batch (default: 1000, max: 100000)

use anyhow::Result;
use std::env;

/// Tool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub snapshot_path: String,
    pub log_level: String,
    pub log_format: String,
    /// Blocking workers used to evaluate a validation batch.
    pub validation_concurrency: usize,
    /// Input beyond this many URLs is dropped (and reported as truncated).
    pub validation_max_urls: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: "rules.json".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            validation_concurrency: 4,
            validation_max_urls: 1000,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible for variables that become required.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let snapshot_path = env::var("SNAPSHOT_PATH").unwrap_or(defaults.snapshot_path);
        let log_level = env::var("RUST_LOG").unwrap_or(defaults.log_level);
        let log_format = env::var("LOG_FORMAT").unwrap_or(defaults.log_format);

        let validation_concurrency = env::var("VALIDATION_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.validation_concurrency);

        let validation_max_urls = env::var("VALIDATION_MAX_URLS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.validation_max_urls);

        Ok(Self {
            snapshot_path,
            log_level,
            log_format,
            validation_concurrency,
            validation_max_urls,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `snapshot_path` is empty
    /// - `log_format` is not `text` or `json`
    /// - `validation_concurrency` is outside 1-256
    /// - `validation_max_urls` is outside 1-100000
    pub fn validate(&self) -> Result<()> {
        if self.snapshot_path.trim().is_empty() {
            anyhow::bail!("SNAPSHOT_PATH must not be empty");
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if self.validation_concurrency == 0 || self.validation_concurrency > 256 {
            anyhow::bail!(
                "VALIDATION_CONCURRENCY must be between 1 and 256, got {}",
                self.validation_concurrency
            );
        }

        if self.validation_max_urls == 0 || self.validation_max_urls > 100_000 {
            anyhow::bail!(
                "VALIDATION_MAX_URLS must be between 1 and 100000, got {}",
                self.validation_max_urls
            );
        }

        Ok(())
    }

    pub fn is_json_logging(&self) -> bool {
        self.log_format == "json"
    }

    /// Logs the effective configuration.
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Snapshot: {}", self.snapshot_path);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!("  Validation workers: {}", self.validation_concurrency);
        tracing::info!("  Validation batch limit: {}", self.validation_max_urls);
    }
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
