//! # touch-core
//!
//! Shared library for Touch Relay containing the gesture wire codec, the
//! connection lifecycle state machine, and the tap/drag position tracker.
//!
//! This crate is used by both the client and the relay.  It has no
//! dependencies on sockets, async runtimes, or UI frameworks.
//!
//! # Architecture overview
//!
//! A *sender* turns finger-down / move / finger-up into small JSON records
//! and pushes them through a relay.  A *display* receives the same records
//! and moves an on-screen marker by the relayed deltas.
//!
//! - **`protocol`** – The `{phase, dx, dy}` record and its strict JSON codec.
//!
//! - **`session`** – The connection state machine: connecting, connected,
//!   disconnected, error, with exponential-backoff reconnects.  Pure logic;
//!   the Tokio driver lives in `touch-client`.
//!
//! - **`domain`** – Viewport geometry and the `GestureTracker`, which turns
//!   relative deltas into a clamped absolute position and decides whether a
//!   gesture ended as a tap or a drag.

pub mod domain;
pub mod protocol;
pub mod session;

// Re-export the most-used types at the crate root.
pub use domain::geometry::{Position, Viewport};
pub use domain::tracker::{GestureOutcome, GestureTracker, TrackerConfig, TrackerState};
pub use protocol::codec::{decode, encode, encode_message, CodecError};
pub use protocol::messages::{GestureMessage, GesturePhase};
pub use session::{ConnectionMachine, ConnectionSnapshot, ConnectionState, ReconnectPolicy};
