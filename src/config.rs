// Configuration loading and parsing (config/companion.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    Validation { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// The full companion configuration. Every section and field is optional in
/// the file; omitted values fall back to the defaults below, and a missing
/// file yields `Config::default()` entirely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub ddragon: DdragonConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Poll cadence of the session loop, in milliseconds.
    pub poll_interval_ms: u64,
    /// Backoff between credential-discovery attempts and after a session
    /// teardown, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Timeout for session-API requests. Exceeding it is a hard failure.
    pub request_timeout_ms: u64,
    /// Timeout for live-telemetry requests. Exceeding it means absence.
    pub live_timeout_ms: u64,
    /// Port of the local live client data API.
    pub live_port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            poll_interval_ms: 1000,
            reconnect_delay_ms: 1000,
            request_timeout_ms: 5000,
            live_timeout_ms: 3000,
            live_port: 2999,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DdragonConfig {
    /// Locale of the champion/item name tables.
    pub locale: String,
    /// Timeout for Data Dragon requests, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DdragonConfig {
    fn default() -> Self {
        DdragonConfig {
            locale: "ko_KR".into(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Minimum spacing between in-progress item/KDA detail emissions, in
    /// seconds. On-demand updates bypass this window.
    pub detail_interval_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        EventsConfig {
            detail_interval_secs: 60,
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.connection.poll_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.connection.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.connection.request_timeout_ms)
    }

    pub fn live_timeout(&self) -> Duration {
        Duration::from_millis(self.connection.live_timeout_ms)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_secs(self.events.detail_interval_secs)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from `config/companion.toml` under `base_dir`. A
/// missing file is not an error; it yields the built-in defaults.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("companion.toml");
    if !path.exists() {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }
    load_file(&path)
}

/// Load configuration. The working directory's `config/companion.toml` wins,
/// then the per-user config directory, then built-in defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
        path: PathBuf::from("."),
        source: e,
    })?;
    let local = cwd.join("config").join("companion.toml");
    if local.exists() {
        return load_file(&local);
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "lcu-companion") {
        let user = dirs.config_dir().join("companion.toml");
        if user.exists() {
            return load_file(&user);
        }
    }
    let config = Config::default();
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.connection.poll_interval_ms == 0 {
        return Err(ConfigError::Validation {
            field: "connection.poll_interval_ms".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.connection.reconnect_delay_ms == 0 {
        return Err(ConfigError::Validation {
            field: "connection.reconnect_delay_ms".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.events.detail_interval_secs == 0 {
        return Err(ConfigError::Validation {
            field: "events.detail_interval_secs".into(),
            message: "must be greater than zero".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
