//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `meshpair.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend selection.
    pub source: SourceConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Which backend the session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Canned demo data, no network.
    Simulated,
    /// The hub's management API.
    Remote,
}

/// Backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Backend to use.
    pub mode: Mode,
    /// Base URL of the hub's API (remote mode).
    pub base_url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `meshpair.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("meshpair.toml")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("MESHPAIR_MODE") {
            self.source.mode = match val.as_str() {
                "simulated" => Mode::Simulated,
                "remote" => Mode::Remote,
                other => {
                    return Err(ConfigError::Validation(format!(
                        "MESHPAIR_MODE must be 'simulated' or 'remote', got '{other}'"
                    )));
                }
            };
        }
        if let Ok(val) = std::env::var("MESHPAIR_BASE_URL") {
            self.source.base_url = val;
        }
        if let Ok(val) = std::env::var("MESHPAIR_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.source.mode == Mode::Remote && self.source.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "remote mode requires a base_url".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Simulated
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            base_url: "http://localhost:3001".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "meshpairctl=info,meshpair=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
