//! Infrastructure layer for the client.
//!
//! **Dependency rule**: this layer may depend on `touch_core`, but the
//! application layer only uses its event type, never the socket.
//!
//! # Sub-modules
//!
//! - **`connection`** – Tokio driver around `ConnectionMachine`: opens the
//!   WebSocket, feeds transport events into the machine, and runs the
//!   reconnect timer.
//!
//! - **`config`** – TOML client configuration with per-field defaults.

pub mod config;
pub mod connection;

pub use config::{load_config, ClientConfig, ConfigError};
pub use connection::{ConnectionConfig, ConnectionEvent, ConnectionManager};
