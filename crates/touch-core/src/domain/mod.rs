//! Domain logic for Touch Relay.
//!
//! Pure types and rules with no I/O: viewport geometry and the gesture
//! tracker that turns relative deltas into a bounded marker position.
//!
//! Code in outer layers (the client's connection driver, the display loop)
//! depends on the domain, but the domain never depends on them.  Everything
//! here can be unit-tested without a runtime or a socket.

pub mod geometry;
pub mod tracker;

pub use geometry::{clamp, clamp_position, scale, Position, Viewport};
pub use tracker::{GestureOutcome, GestureTracker, TrackerConfig, TrackerState};
