//! Relay configuration types.
//!
//! [`RelayConfig`] is built once at startup from CLI arguments (see
//! `main.rs`) or from defaults in tests, then shared read-only by every peer
//! task.

use std::net::SocketAddr;

/// Default upgrade path accepted by the relay.
pub const DEFAULT_WS_PATH: &str = "/ws";

/// All runtime configuration for the relay server.
///
/// # Example
///
/// ```rust
/// use touch_relay::domain::RelayConfig;
///
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert_eq!(cfg.ws_path, "/ws");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Address the WebSocket listener binds to.
    ///
    /// Port 0 asks the OS for a free port; tests rely on this.
    pub bind_addr: SocketAddr,

    /// Request path on which WebSocket upgrades are accepted.  Upgrades on
    /// any other path are refused with `404 Not Found`.
    pub ws_path: String,
}

impl Default for RelayConfig {
    /// | Field     | Default        |
    /// |-----------|----------------|
    /// | bind_addr | `0.0.0.0:8080` |
    /// | ws_path   | `/ws`          |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ws_path: DEFAULT_WS_PATH.to_string(),
        }
    }
}

impl RelayConfig {
    /// Loopback config on an OS-assigned port.
    pub fn ephemeral() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Self::default()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
