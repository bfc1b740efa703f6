//! Display use case: gesture messages in, marker state out.
//!
//! [`TouchDisplay`] owns a [`GestureTracker`] and forwards what the tracker
//! decides to a [`GestureListener`] (the marker renderer, a logger, or a test
//! mock).  Messages normally arrive as [`ConnectionEvent`]s from a
//! `ConnectionManager`, but [`TouchDisplay::apply_message`] also accepts
//! messages supplied directly by the embedding application.
//!
//! # Visibility
//!
//! The marker is visible only when the display is shown *and* there is
//! something to show: at least one message has arrived, or a touch has
//! started.

use std::time::Instant;

use touch_core::{
    ConnectionState, GestureMessage, GestureOutcome, GestureTracker, Position, Viewport,
};

use crate::infrastructure::connection::ConnectionEvent;

/// Receives the marker updates the tracker produces.
#[cfg_attr(test, mockall::automock)]
pub trait GestureListener: Send {
    /// Called after every effective `move` with the clamped position.
    fn on_move(&mut self, position: Position);

    /// Called when a gesture is classified as a tap.
    fn on_tap(&mut self, position: Position);
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayState {
    pub position: Position,
    pub connection_state: ConnectionState,
    pub is_tapping: bool,
    pub initialized: bool,
}

pub struct TouchDisplay<L: GestureListener> {
    tracker: GestureTracker,
    listener: L,
    connection_state: ConnectionState,
    message_seen: bool,
    shown: bool,
}

impl<L: GestureListener> TouchDisplay<L> {
    pub fn new(tracker: GestureTracker, listener: L) -> Self {
        Self {
            tracker,
            listener,
            connection_state: ConnectionState::Disconnected,
            message_seen: false,
            shown: true,
        }
    }

    /// Consumes one event from a connection manager.
    pub fn handle_event(&mut self, event: &ConnectionEvent) -> GestureOutcome {
        self.handle_event_at(event, Instant::now())
    }

    pub fn handle_event_at(&mut self, event: &ConnectionEvent, now: Instant) -> GestureOutcome {
        match event {
            ConnectionEvent::Connected => {
                self.connection_state = ConnectionState::Connected;
                GestureOutcome::Ignored
            }
            ConnectionEvent::Disconnected => {
                self.connection_state = ConnectionState::Disconnected;
                GestureOutcome::Ignored
            }
            // Errors do not change state; the following close does.
            ConnectionEvent::Error(_) => GestureOutcome::Ignored,
            ConnectionEvent::Message(msg) => self.apply_message_at(msg, now),
        }
    }

    /// Mirrors the manager's published state (needed for the terminal
    /// `Error` state, which has no event of its own).
    pub fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection_state = state;
    }

    /// Applies a message that did not come through a connection manager.
    pub fn apply_message(&mut self, msg: &GestureMessage) -> GestureOutcome {
        self.apply_message_at(msg, Instant::now())
    }

    pub fn apply_message_at(&mut self, msg: &GestureMessage, now: Instant) -> GestureOutcome {
        self.message_seen = true;
        let outcome = self.tracker.apply_at(msg, now);
        match outcome {
            GestureOutcome::Moved(position) => self.listener.on_move(position),
            GestureOutcome::Tapped(position) => self.listener.on_tap(position),
            GestureOutcome::Started | GestureOutcome::DragEnded | GestureOutcome::Ignored => {}
        }
        outcome
    }

    pub fn state(&self) -> DisplayState {
        self.state_at(Instant::now())
    }

    pub fn state_at(&self, now: Instant) -> DisplayState {
        let tracker = self.tracker.state_at(now);
        DisplayState {
            position: tracker.position,
            connection_state: self.connection_state,
            is_tapping: tracker.is_tapping,
            initialized: tracker.initialized,
        }
    }

    pub fn set_shown(&mut self, shown: bool) {
        self.shown = shown;
    }

    pub fn is_visible(&self) -> bool {
        self.shown && (self.message_seen || self.tracker.is_initialized())
    }

    /// A disabled display ignores every message.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.tracker.set_enabled(enabled);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.tracker.set_viewport(viewport);
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
