//! Application layer use cases for the client.
//!
//! - **`send_gestures`** – Converts absolute pointer events into relative
//!   gesture messages (`start`, `move`, `tap`).
//!
//! - **`track_gestures`** – Feeds received messages through a
//!   `GestureTracker` and reports moves and taps to a `GestureListener`.
//!
//! Neither use case touches the network; the binary wires them to a
//! `ConnectionManager`.

pub mod send_gestures;
pub mod track_gestures;

pub use send_gestures::{GestureSender, PointerEvent, PointerParseError};
pub use track_gestures::{DisplayState, GestureListener, TouchDisplay};
