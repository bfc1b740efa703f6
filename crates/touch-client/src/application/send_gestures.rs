//! Sender use case: pointer events in, gesture messages out.
//!
//! A pointer surface reports absolute coordinates.  The wire carries only
//! relative displacement, so the sender remembers the last point of the
//! current touch and emits the difference on every move:
//!
//! | Pointer event   | Emitted message          | Remembered point |
//! |-----------------|--------------------------|------------------|
//! | `Down { x, y }` | `start(0, 0)`            | `(x, y)`         |
//! | `Move { x, y }` | `move(x - lx, y - ly)`   | `(x, y)`         |
//! | `Up` / `Cancel` | `tap(0, 0)`              | cleared          |
//!
//! A `Move` with no preceding `Down` is ignored.  Whether the final `tap`
//! was really a tap or the end of a drag is decided by the display.

use std::str::FromStr;

use thiserror::Error;
use touch_core::{GestureMessage, Position};

/// One event from a pointer/touch surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    Cancel,
}

/// Error returned when a text line is not a pointer event.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PointerParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown pointer event '{0}' (expected down, move, up, or cancel)")]
    UnknownKind(String),
    #[error("'{kind}' needs exactly two numeric coordinates")]
    BadCoordinates { kind: String },
    #[error("'{0}' takes no arguments")]
    UnexpectedArguments(String),
}

impl FromStr for PointerEvent {
    type Err = PointerParseError;

    /// Parses `down X Y`, `move X Y`, `up`, or `cancel` (case-insensitive,
    /// whitespace-separated).
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let kind = parts.next().ok_or(PointerParseError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        match kind.as_str() {
            "down" | "move" => {
                let (x, y) = parse_point(&args).ok_or_else(|| PointerParseError::BadCoordinates {
                    kind: kind.clone(),
                })?;
                Ok(if kind == "down" {
                    PointerEvent::Down { x, y }
                } else {
                    PointerEvent::Move { x, y }
                })
            }
            "up" | "cancel" => {
                if !args.is_empty() {
                    return Err(PointerParseError::UnexpectedArguments(kind));
                }
                Ok(if kind == "up" {
                    PointerEvent::Up
                } else {
                    PointerEvent::Cancel
                })
            }
            _ => Err(PointerParseError::UnknownKind(kind)),
        }
    }
}

fn parse_point(args: &[&str]) -> Option<(f64, f64)> {
    match args {
        [x, y] => {
            let x: f64 = x.parse().ok()?;
            let y: f64 = y.parse().ok()?;
            (x.is_finite() && y.is_finite()).then_some((x, y))
        }
        _ => None,
    }
}

/// Converts pointer events into gesture messages.
#[derive(Debug, Clone)]
pub struct GestureSender {
    last: Option<Position>,
    enabled: bool,
}

impl Default for GestureSender {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureSender {
    pub fn new() -> Self {
        Self {
            last: None,
            enabled: true,
        }
    }

    /// While disabled, every event produces nothing and the current touch is
    /// forgotten.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.last = None;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `true` between a `Down` and the matching `Up`/`Cancel`.
    pub fn is_touching(&self) -> bool {
        self.last.is_some()
    }

    /// Returns the message to send for `event`, if any.
    pub fn handle(&mut self, event: PointerEvent) -> Option<GestureMessage> {
        if !self.enabled {
            return None;
        }
        match event {
            PointerEvent::Down { x, y } => {
                self.last = Some(Position::new(x, y));
                Some(GestureMessage::start())
            }
            PointerEvent::Move { x, y } => {
                let last = self.last?;
                self.last = Some(Position::new(x, y));
                Some(GestureMessage::moved(x - last.x, y - last.y))
            }
            PointerEvent::Up | PointerEvent::Cancel => {
                self.last = None;
                Some(GestureMessage::tap())
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use touch_core::GesturePhase;

    use super::*;

    #[test]
    fn test_down_move_up_produces_start_deltas_tap() {
        // Arrange
        let mut sender = GestureSender::new();

        // Act
        let out: Vec<_> = [
            PointerEvent::Down { x: 100.0, y: 100.0 },
            PointerEvent::Move { x: 110.0, y: 95.0 },
            PointerEvent::Move { x: 112.0, y: 95.0 },
            PointerEvent::Up,
        ]
        .into_iter()
        .filter_map(|e| sender.handle(e))
        .collect();

        // Assert
        assert_eq!(
            out,
            vec![
                GestureMessage::start(),
                GestureMessage::moved(10.0, -5.0),
                GestureMessage::moved(2.0, 0.0),
                GestureMessage::tap(),
            ]
        );
        assert!(!sender.is_touching());
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut sender = GestureSender::new();
        assert_eq!(sender.handle(PointerEvent::Move { x: 5.0, y: 5.0 }), None);
    }

    #[test]
    fn test_cancel_ends_touch_with_tap() {
        let mut sender = GestureSender::new();
        sender.handle(PointerEvent::Down { x: 0.0, y: 0.0 });

        let msg = sender.handle(PointerEvent::Cancel).unwrap();

        assert_eq!(msg.phase, GesturePhase::Tap);
        assert_eq!(sender.handle(PointerEvent::Move { x: 1.0, y: 1.0 }), None);
    }

    #[test]
    fn test_disabled_sender_produces_nothing() {
        let mut sender = GestureSender::new();
        sender.set_enabled(false);

        assert_eq!(sender.handle(PointerEvent::Down { x: 0.0, y: 0.0 }), None);
        assert_eq!(sender.handle(PointerEvent::Up), None);
        assert!(!sender.is_enabled());
    }

    #[test]
    fn test_disabling_mid_touch_forgets_the_point() {
        let mut sender = GestureSender::new();
        sender.handle(PointerEvent::Down { x: 0.0, y: 0.0 });

        sender.set_enabled(false);
        sender.set_enabled(true);

        assert_eq!(sender.handle(PointerEvent::Move { x: 9.0, y: 9.0 }), None);
    }

    #[test]
    fn test_new_down_restarts_delta_origin() {
        let mut sender = GestureSender::new();
        sender.handle(PointerEvent::Down { x: 0.0, y: 0.0 });
        sender.handle(PointerEvent::Down { x: 50.0, y: 50.0 });

        let msg = sender.handle(PointerEvent::Move { x: 51.0, y: 52.0 }).unwrap();

        assert_eq!(msg, GestureMessage::moved(1.0, 2.0));
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_all_kinds() {
        assert_eq!(
            "down 1 2".parse::<PointerEvent>(),
            Ok(PointerEvent::Down { x: 1.0, y: 2.0 })
        );
        assert_eq!(
            "  MOVE  -3.5 4  ".parse::<PointerEvent>(),
            Ok(PointerEvent::Move { x: -3.5, y: 4.0 })
        );
        assert_eq!("up".parse::<PointerEvent>(), Ok(PointerEvent::Up));
        assert_eq!("cancel".parse::<PointerEvent>(), Ok(PointerEvent::Cancel));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<PointerEvent>(), Err(PointerParseError::Empty));
        assert!(matches!(
            "hover 1 2".parse::<PointerEvent>(),
            Err(PointerParseError::UnknownKind(_))
        ));
        assert!(matches!(
            "down 1".parse::<PointerEvent>(),
            Err(PointerParseError::BadCoordinates { .. })
        ));
        assert!(matches!(
            "move x y".parse::<PointerEvent>(),
            Err(PointerParseError::BadCoordinates { .. })
        ));
        assert!(matches!(
            "move NaN 0".parse::<PointerEvent>(),
            Err(PointerParseError::BadCoordinates { .. })
        ));
        assert!(matches!(
            "up 1 2".parse::<PointerEvent>(),
            Err(PointerParseError::UnexpectedArguments(_))
        ));
    }
}
