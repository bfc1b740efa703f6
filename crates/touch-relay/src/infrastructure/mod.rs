//! Infrastructure layer for touch-relay.
//!
//! - Binding the TCP listener
//! - Performing the WebSocket upgrade handshake (path-checked)
//! - Spawning a reader loop and a writer task per peer
//! - Stopping the accept loop when the shutdown flag is cleared

pub mod ws_server;

pub use ws_server::{run_server, RelayServer};
