//! TOML-based client configuration.
//!
//! Both client roles (sender and display) read the same file.  Every field is
//! optional; anything missing falls back to the built-in default, so an empty
//! file (or no file at all) is a valid configuration.
//!
//! ```toml
//! url = "ws://192.168.1.20:8080/ws"
//! reconnect_attempts = 5
//! reconnect_interval_ms = 1000
//!
//! sensitivity = 1.8
//! size = 20.0
//! tap_delay_ms = 150
//! tap_move_threshold = 5.0
//! ripple_duration_ms = 300
//!
//! viewport_width = 1920.0
//! viewport_height = 1080.0
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the return
//! value of `some_fn()` when absent.  Durations are stored as plain
//! millisecond integers so the file stays readable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use touch_core::domain::tracker::{
    DEFAULT_MARKER_SIZE, DEFAULT_RIPPLE_DURATION, DEFAULT_SENSITIVITY, DEFAULT_TAP_DELAY,
    DEFAULT_TAP_MOVE_THRESHOLD,
};
use touch_core::session::machine::{DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL};
use touch_core::{ReconnectPolicy, TrackerConfig, Viewport};

use crate::infrastructure::connection::ConnectionConfig;

/// Relay endpoint used when no URL is configured.
pub const DEFAULT_URL: &str = "ws://127.0.0.1:8080/ws";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but cannot be used.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

// ── Config schema ─────────────────────────────────────────────────────────────

/// Everything a client needs: where the relay is, how to reconnect, and how
/// to turn deltas into a marker position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// WebSocket URL of the relay.
    #[serde(default = "default_url")]
    pub url: String,
    /// Automatic reconnects before giving up with `Error`.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    /// Base backoff delay; retry k waits `interval * 2^(k-1)`.
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Marker diameter in pixels.
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default = "default_tap_delay_ms")]
    pub tap_delay_ms: u64,
    #[serde(default = "default_tap_move_threshold")]
    pub tap_move_threshold: f64,
    #[serde(default = "default_ripple_duration_ms")]
    pub ripple_duration_ms: u64,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_url() -> String {
    DEFAULT_URL.to_string()
}
fn default_reconnect_attempts() -> u32 {
    DEFAULT_RECONNECT_ATTEMPTS
}
fn default_reconnect_interval_ms() -> u64 {
    duration_ms(DEFAULT_RECONNECT_INTERVAL)
}
fn default_sensitivity() -> f64 {
    DEFAULT_SENSITIVITY
}
fn default_size() -> f64 {
    DEFAULT_MARKER_SIZE
}
fn default_tap_delay_ms() -> u64 {
    duration_ms(DEFAULT_TAP_DELAY)
}
fn default_tap_move_threshold() -> f64 {
    DEFAULT_TAP_MOVE_THRESHOLD
}
fn default_ripple_duration_ms() -> u64 {
    duration_ms(DEFAULT_RIPPLE_DURATION)
}
fn default_viewport_width() -> f64 {
    Viewport::default().width
}
fn default_viewport_height() -> f64 {
    Viewport::default().height
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            sensitivity: default_sensitivity(),
            size: default_size(),
            tap_delay_ms: default_tap_delay_ms(),
            tap_move_threshold: default_tap_move_threshold(),
            ripple_duration_ms: default_ripple_duration_ms(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl ClientConfig {
    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// for values the tracker or connection manager cannot use.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: ClientConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values that would make the tracker or backoff misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(invalid("url", "must not be empty"));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(invalid("reconnect_interval_ms", "must be positive"));
        }
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(invalid("sensitivity", "must be a positive number"));
        }
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(invalid("size", "must be a non-negative number"));
        }
        if !self.tap_move_threshold.is_finite() || self.tap_move_threshold < 0.0 {
            return Err(invalid("tap_move_threshold", "must be a non-negative number"));
        }
        if !self.viewport_width.is_finite() || self.viewport_width <= 0.0 {
            return Err(invalid("viewport_width", "must be positive"));
        }
        if !self.viewport_height.is_finite() || self.viewport_height <= 0.0 {
            return Err(invalid("viewport_height", "must be positive"));
        }
        Ok(())
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.reconnect_attempts,
            base_interval: Duration::from_millis(self.reconnect_interval_ms),
        }
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.url.clone(),
            policy: self.reconnect_policy(),
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            sensitivity: self.sensitivity,
            size: self.size,
            tap_delay: Duration::from_millis(self.tap_delay_ms),
            tap_move_threshold: self.tap_move_threshold,
            ripple_duration: Duration::from_millis(self.ripple_duration_ms),
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads the config at `path`, or the defaults when `path` is `None`.
///
/// An explicitly named file must exist; silently falling back to defaults
/// would hide a typo in `--config`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
/// errors of [`ClientConfig::from_toml_str`].
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ClientConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ClientConfig::from_toml_str(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
