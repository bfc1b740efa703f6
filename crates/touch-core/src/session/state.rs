//! Observable connection state.

use serde::{Deserialize, Serialize};

use crate::protocol::messages::GestureMessage;

/// Lifecycle state of one managed connection.
///
/// ```text
/// Disconnected ──connect──► Connecting ──open──► Connected
///      ▲                        │                    │
///      └──────── close ◄────────┴────────────────────┘
///      │
///      └── retry budget exhausted ──► Error (terminal until connect())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an observer can see about a connection at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    /// Most recent valid message, cleared by an explicit disconnect.
    pub last_message: Option<GestureMessage>,
    /// Number of automatic reconnects attempted since the last successful open.
    pub retry_count: u32,
}
