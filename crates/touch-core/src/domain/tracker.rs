//! Gesture classifier and position tracker.
//!
//! [`GestureTracker`] consumes decoded [`GestureMessage`]s and maintains:
//!
//! - the absolute, clamped marker position,
//! - a transient "is tapping" flag (raised for `ripple_duration` after a tap),
//! - a sticky "initialized" latch (set by the first `start`).
//!
//! # Tap or drag?
//!
//! Both a tap and a drag begin with `start` and end with `tap`, so the phase
//! alone cannot tell them apart.  Classification is deferred until the `tap`
//! arrives and decided by two independent guards:
//!
//! ```text
//! start ──► move* ──► tap
//!   │          │        │
//!   │          │        ├─ elapsed since start ≥ tap_delay        (not jitter)
//!   │          │        └─ ‖Σ unscaled (dx, dy)‖ ≤ move threshold (not a drag)
//!   │          └─ ‖Σ‖ > threshold  ⇒  no longer a tap candidate
//!   └─ opens a GestureSession
//! ```
//!
//! Time is passed in explicitly (`*_at` methods take an [`Instant`]) so the
//! classifier is deterministic under test.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::geometry::{clamp_position, scale, Position, Viewport};
use crate::protocol::messages::{GestureMessage, GesturePhase};

/// Default multiplier applied to every `move` delta.
pub const DEFAULT_SENSITIVITY: f64 = 1.8;
/// Default marker diameter in pixels.
pub const DEFAULT_MARKER_SIZE: f64 = 20.0;
/// Default minimum time between `start` and `tap` for a genuine tap.
pub const DEFAULT_TAP_DELAY: Duration = Duration::from_millis(150);
/// Default maximum accumulated displacement (unscaled pixels) for a tap.
pub const DEFAULT_TAP_MOVE_THRESHOLD: f64 = 5.0;
/// Default duration the "is tapping" flag stays raised.
pub const DEFAULT_RIPPLE_DURATION: Duration = Duration::from_millis(300);

/// Tuning parameters for [`GestureTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Multiplier applied to `move` deltas before they are added to the position.
    pub sensitivity: f64,
    /// Marker diameter; half of it is the clamping inset.
    pub size: f64,
    /// Minimum elapsed time from `start` to `tap` for a tap classification.
    pub tap_delay: Duration,
    /// Maximum Euclidean norm of the accumulated unscaled displacement.
    pub tap_move_threshold: f64,
    /// How long [`GestureTracker::is_tapping_at`] stays `true` after a tap.
    pub ripple_duration: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            size: DEFAULT_MARKER_SIZE,
            tap_delay: DEFAULT_TAP_DELAY,
            tap_move_threshold: DEFAULT_TAP_MOVE_THRESHOLD,
            ripple_duration: DEFAULT_RIPPLE_DURATION,
        }
    }
}

/// Per-touch bookkeeping, alive from `start` until the next `tap` or `start`.
#[derive(Debug, Clone, Copy)]
struct GestureSession {
    started_at: Instant,
    accumulated_dx: f64,
    accumulated_dy: f64,
    tap_candidate: bool,
}

impl GestureSession {
    fn open(now: Instant) -> Self {
        Self {
            started_at: now,
            accumulated_dx: 0.0,
            accumulated_dy: 0.0,
            tap_candidate: true,
        }
    }

    fn displacement(&self) -> f64 {
        self.accumulated_dx.hypot(self.accumulated_dy)
    }
}

/// What a single message did to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// A `start` opened a new session.
    Started,
    /// A `move` updated the position to the contained clamped value.
    Moved(Position),
    /// A `tap` was classified as a genuine tap at the contained position.
    Tapped(Position),
    /// A `tap` closed a session that did not qualify as a tap.
    DragEnded,
    /// The message had no effect (tracker disabled, or `tap` with no session).
    Ignored,
}

/// Read-only view of the tracker at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerState {
    pub position: Position,
    pub is_tapping: bool,
    pub initialized: bool,
}

/// Turns a stream of relative gesture messages into an absolute marker state.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: TrackerConfig,
    viewport: Viewport,
    position: Position,
    session: Option<GestureSession>,
    initialized: bool,
    tapping_until: Option<Instant>,
    enabled: bool,
}

impl GestureTracker {
    /// Creates a tracker at the origin with no open session.
    pub fn new(config: TrackerConfig, viewport: Viewport) -> Self {
        Self {
            config,
            viewport,
            position: Position::default(),
            session: None,
            initialized: false,
            tapping_until: None,
            enabled: true,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replaces the clamping bounds.  Takes effect on the next `move`.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Enables or disables message processing.  A disabled tracker ignores
    /// every message and keeps its current state.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current clamped marker position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// `true` once any `start` has been seen.  Never resets.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// `true` while a gesture session is open.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// `true` for `ripple_duration` after the most recent classified tap.
    pub fn is_tapping_at(&self, now: Instant) -> bool {
        self.tapping_until.is_some_and(|until| now < until)
    }

    pub fn is_tapping(&self) -> bool {
        self.is_tapping_at(Instant::now())
    }

    pub fn state_at(&self, now: Instant) -> TrackerState {
        TrackerState {
            position: self.position,
            is_tapping: self.is_tapping_at(now),
            initialized: self.initialized,
        }
    }

    /// Applies `msg` using the current time.
    pub fn apply(&mut self, msg: &GestureMessage) -> GestureOutcome {
        self.apply_at(msg, Instant::now())
    }

    /// Applies `msg` as if it arrived at `now`.
    pub fn apply_at(&mut self, msg: &GestureMessage, now: Instant) -> GestureOutcome {
        if !self.enabled {
            return GestureOutcome::Ignored;
        }

        match msg.phase {
            GesturePhase::Start => self.on_start(now),
            GesturePhase::Move => self.on_move(msg.dx, msg.dy),
            GesturePhase::Tap => self.on_tap(now),
        }
    }

    fn on_start(&mut self, now: Instant) -> GestureOutcome {
        // A new start supersedes any session that never saw its tap.
        self.session = Some(GestureSession::open(now));
        self.initialized = true;
        GestureOutcome::Started
    }

    fn on_move(&mut self, dx: f64, dy: f64) -> GestureOutcome {
        let (sx, sy) = scale(dx, dy, self.config.sensitivity);
        let next = Position::new(self.position.x + sx, self.position.y + sy);
        self.position = clamp_position(next, self.viewport, self.config.size);

        if let Some(session) = self.session.as_mut() {
            session.accumulated_dx += dx;
            session.accumulated_dy += dy;
            if session.displacement() > self.config.tap_move_threshold {
                session.tap_candidate = false;
            }
        }

        GestureOutcome::Moved(self.position)
    }

    fn on_tap(&mut self, now: Instant) -> GestureOutcome {
        let Some(session) = self.session.take() else {
            return GestureOutcome::Ignored;
        };

        let elapsed = now.saturating_duration_since(session.started_at);
        let displacement = session.displacement();
        let is_tap = session.tap_candidate
            && elapsed >= self.config.tap_delay
            && displacement <= self.config.tap_move_threshold;

        trace!(
            ?elapsed,
            displacement,
            candidate = session.tap_candidate,
            is_tap,
            "classified gesture end"
        );

        if is_tap {
            self.tapping_until = Some(now + self.config.ripple_duration);
            GestureOutcome::Tapped(self.position)
        } else {
            GestureOutcome::DragEnded
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
