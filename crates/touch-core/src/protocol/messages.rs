//! Gesture message types carried on the relay channel.
//!
//! A gesture is described by a sequence of small records, one per pointer
//! event on the sender:
//!
//! ```text
//! finger down   →  {"phase":"start","dx":0,"dy":0}
//! finger moves  →  {"phase":"move","dx":3.5,"dy":-1}
//! finger up     →  {"phase":"tap","dx":0,"dy":0}
//! ```
//!
//! The protocol carries *relative* displacements only.  The receiving side
//! owns the absolute marker position and decides afterwards whether a
//! `start`…`tap` pair was a tap or the end of a drag.
//!
//! # Why are `dx`/`dy` sent for every phase?
//!
//! Keeping the schema uniform means the receiver can validate every message
//! with the same rule (three fields, finite numbers) regardless of phase.
//! The values are simply ignored for `start` and `tap`.

use serde::{Deserialize, Serialize};

/// The discrete stage of one continuous gesture.
///
/// Serialized in lowercase (`"start"`, `"move"`, `"tap"`).  Any other string
/// fails deserialization, which is how the codec enforces the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GesturePhase {
    /// Finger down: opens a new gesture session on the receiver.
    Start,
    /// Relative displacement since the previous pointer sample.
    Move,
    /// Finger up.  Classified by the receiver as a tap or a drag end.
    Tap,
}

impl GesturePhase {
    /// Returns the wire name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            GesturePhase::Start => "start",
            GesturePhase::Move => "move",
            GesturePhase::Tap => "tap",
        }
    }
}

impl std::fmt::Display for GesturePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One gesture record as it travels over the wire.
///
/// # Serde representation
///
/// ```json
/// {"phase":"move","dx":12.0,"dy":-4.5}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureMessage {
    /// Which stage of the gesture this record describes.
    pub phase: GesturePhase,
    /// Horizontal displacement in sender pixels (meaningful for `move` only).
    pub dx: f64,
    /// Vertical displacement in sender pixels (meaningful for `move` only).
    pub dy: f64,
}

impl GestureMessage {
    /// Creates a message from its three fields.
    pub fn new(phase: GesturePhase, dx: f64, dy: f64) -> Self {
        Self { phase, dx, dy }
    }

    /// A `start` record.  Displacement fields are zero.
    pub fn start() -> Self {
        Self::new(GesturePhase::Start, 0.0, 0.0)
    }

    /// A `move` record carrying the displacement `(dx, dy)`.
    pub fn moved(dx: f64, dy: f64) -> Self {
        Self::new(GesturePhase::Move, dx, dy)
    }

    /// A `tap` record.  Displacement fields are zero.
    pub fn tap() -> Self {
        Self::new(GesturePhase::Tap, 0.0, 0.0)
    }

    /// Returns `true` when both displacement fields are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
