//! touch-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does touch-client do? (for beginners)
//!
//! A client plays one of two roles against a relay:
//!
//! - **Sender**: turns pointer events (finger down, move, up) into
//!   `{phase, dx, dy}` messages and pushes them to the relay.
//! - **Display**: receives the same messages, moves a marker by the relayed
//!   deltas (scaled and clamped to the viewport), and flags taps.
//!
//! Both roles share one [`ConnectionManager`], which keeps the WebSocket to
//! the relay open and reconnects with exponential backoff when it drops.

/// Application layer: sender and display use cases.
pub mod application;

/// Infrastructure layer: WebSocket connection and configuration file.
pub mod infrastructure;

pub use application::{
    DisplayState, GestureListener, GestureSender, PointerEvent, PointerParseError, TouchDisplay,
};
pub use infrastructure::{
    load_config, ClientConfig, ConfigError, ConnectionConfig, ConnectionEvent, ConnectionManager,
};
