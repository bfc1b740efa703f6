//! End-to-end scenarios through the wire codec and the gesture tracker.
//!
//! Each scenario feeds wire text, exactly as it would arrive from the relay,
//! through `decode` and into a `GestureTracker`.

use std::time::{Duration, Instant};

use touch_core::{
    decode, GestureOutcome, GestureTracker, Position, TrackerConfig, Viewport,
};

fn tracker(sensitivity: f64) -> GestureTracker {
    GestureTracker::new(
        TrackerConfig {
            sensitivity,
            size: 20.0,
            ..TrackerConfig::default()
        },
        Viewport::new(1000.0, 800.0),
    )
}

/// Decodes each `(offset_ms, text)` pair and applies it at `t0 + offset`.
fn feed(tracker: &mut GestureTracker, t0: Instant, frames: &[(u64, &str)]) -> Vec<GestureOutcome> {
    frames
        .iter()
        .map(|(offset, text)| {
            let msg = decode(text).expect("scenario frames are valid");
            tracker.apply_at(&msg, t0 + Duration::from_millis(*offset))
        })
        .collect()
}

#[test]
fn test_drag_moves_marker_by_scaled_deltas() {
    // Arrange
    let mut t = tracker(2.0);
    let t0 = Instant::now();

    // Act
    let outcomes = feed(
        &mut t,
        t0,
        &[
            (0, r#"{"phase":"start","dx":0,"dy":0}"#),
            (10, r#"{"phase":"move","dx":10,"dy":0}"#),
        ],
    );

    // Assert: x = 0 + 10·2; y rises from 0 to the 10 px half-size inset.
    assert_eq!(outcomes[0], GestureOutcome::Started);
    assert_eq!(outcomes[1], GestureOutcome::Moved(Position::new(20.0, 10.0)));
}

#[test]
fn test_long_drag_ending_with_tap_phase_is_not_a_tap() {
    let mut t = tracker(1.8);
    let t0 = Instant::now();

    let outcomes = feed(
        &mut t,
        t0,
        &[
            (0, r#"{"phase":"start","dx":0,"dy":0}"#),
            (16, r#"{"phase":"move","dx":12,"dy":8}"#),
            (32, r#"{"phase":"move","dx":9,"dy":3}"#),
            (400, r#"{"phase":"tap","dx":0,"dy":0}"#),
        ],
    );

    assert_eq!(outcomes.last(), Some(&GestureOutcome::DragEnded));
    assert!(!t.is_tapping_at(t0 + Duration::from_millis(400)));
}

#[test]
fn test_tap_raises_indicator_for_ripple_duration_only() {
    let mut t = tracker(1.8);
    let t0 = Instant::now();

    let outcomes = feed(
        &mut t,
        t0,
        &[
            (0, r#"{"phase":"start","dx":0,"dy":0}"#),
            (180, r#"{"phase":"tap","dx":0,"dy":0}"#),
        ],
    );

    assert!(matches!(outcomes[1], GestureOutcome::Tapped(_)));
    assert!(t.is_tapping_at(t0 + Duration::from_millis(479)));
    assert!(!t.is_tapping_at(t0 + Duration::from_millis(480)));
}

#[test]
fn test_marker_pinned_to_corner_under_large_moves() {
    let mut t = tracker(1.0);
    let t0 = Instant::now();

    feed(
        &mut t,
        t0,
        &[
            (0, r#"{"phase":"start","dx":0,"dy":0}"#),
            (10, r#"{"phase":"move","dx":5000,"dy":5000}"#),
        ],
    );
    assert_eq!(t.position(), Position::new(990.0, 790.0));

    feed(&mut t, t0, &[(20, r#"{"phase":"move","dx":-9000,"dy":-9000}"#)]);
    assert_eq!(t.position(), Position::new(10.0, 10.0));
}
