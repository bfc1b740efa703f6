//! touch-relay library crate.
//!
//! A WebSocket fan-out relay: every text frame received from one peer is
//! forwarded, unmodified, to every other connected peer.  The relay never
//! parses, stores, or reorders messages.
//!
//! # Architecture
//!
//! ```text
//! Sender  ─┐                         ┌─► Display A
//!          ├─► [touch-relay] ────────┼─► Display B
//! Display ─┘    (one /ws endpoint)   └─► ...
//! ```
//!
//! - `domain/`          `RelayConfig`
//! - `application/`     `PeerRegistry`: the set of open peers and fan-out
//! - `infrastructure/`  TCP accept loop and per-peer WebSocket tasks

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: peer bookkeeping and fan-out.
pub mod application;

/// Infrastructure layer: WebSocket server.
pub mod infrastructure;
