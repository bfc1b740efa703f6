//! Viewport geometry: sensitivity scaling and marker clamping.

use serde::{Deserialize, Serialize};

/// A point in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Dimensions of the surface the marker is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

/// Multiplies a displacement by `sensitivity`.
///
/// Linear in every argument; negative and fractional sensitivities are
/// passed through unchanged.
pub fn scale(dx: f64, dy: f64, sensitivity: f64) -> (f64, f64) {
    (dx * sensitivity, dy * sensitivity)
}

/// Constrains `value` to `[min, max]`.
///
/// When the interval is empty (`min > max`, e.g. a viewport narrower than the
/// marker) the lower bound wins.  Unlike [`f64::clamp`] this never panics.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    min.max(value.min(max))
}

/// Keeps a marker of diameter `size` fully inside `viewport`.
///
/// Each axis is clamped into `[size/2, bound − size/2]`, so the marker's
/// visual footprint never crosses the viewport edge.
pub fn clamp_position(position: Position, viewport: Viewport, size: f64) -> Position {
    let half = size / 2.0;
    Position {
        x: clamp(position.x, half, viewport.width - half),
        y: clamp(position.y, half, viewport.height - half),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
    };

    #[test]
    fn test_scale_multiplies_both_axes() {
        assert_eq!(scale(10.0, 20.0, 2.0), (20.0, 40.0));
    }

    #[test]
    fn test_scale_with_unit_sensitivity_is_identity() {
        assert_eq!(scale(5.0, 10.0, 1.0), (5.0, 10.0));
    }

    #[test]
    fn test_scale_fractional_sensitivity() {
        assert_eq!(scale(10.0, 20.0, 0.5), (5.0, 10.0));
    }

    #[test]
    fn test_scale_negative_values() {
        assert_eq!(scale(-10.0, 20.0, 1.5), (-15.0, 30.0));
    }

    #[test]
    fn test_scale_negative_sensitivity_inverts_direction() {
        assert_eq!(scale(3.0, -4.0, -1.0), (-3.0, 4.0));
    }

    #[test]
    fn test_clamp_within_range_returns_value() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
    }

    #[test]
    fn test_clamp_below_range_returns_min() {
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_clamp_above_range_returns_max() {
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_clamp_empty_interval_returns_min_without_panicking() {
        assert_eq!(clamp(50.0, 10.0, 5.0), 10.0);
    }

    #[test]
    fn test_clamp_position_inside_bounds_is_unchanged() {
        let p = clamp_position(Position::new(100.0, 200.0), VIEWPORT, 20.0);
        assert_eq!(p, Position::new(100.0, 200.0));
    }

    #[test]
    fn test_clamp_position_left_edge() {
        let p = clamp_position(Position::new(5.0, 200.0), VIEWPORT, 20.0);
        assert_eq!(p, Position::new(10.0, 200.0));
    }

    #[test]
    fn test_clamp_position_right_edge() {
        let p = clamp_position(Position::new(995.0, 200.0), VIEWPORT, 20.0);
        assert_eq!(p, Position::new(990.0, 200.0));
    }

    #[test]
    fn test_clamp_position_top_and_bottom_edges() {
        let top = clamp_position(Position::new(100.0, -40.0), VIEWPORT, 20.0);
        let bottom = clamp_position(Position::new(100.0, 805.0), VIEWPORT, 20.0);
        assert_eq!(top.y, 10.0);
        assert_eq!(bottom.y, 790.0);
    }

    #[test]
    fn test_clamp_position_exactly_on_boundary_is_idempotent() {
        let edge = Position::new(10.0, 790.0);
        let once = clamp_position(edge, VIEWPORT, 20.0);
        let twice = clamp_position(once, VIEWPORT, 20.0);
        assert_eq!(once, edge);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_clamp_position_result_always_in_range() {
        // Sweep a grid well beyond the viewport on every side.
        for xi in -5..=15 {
            for yi in -5..=15 {
                let p = Position::new(xi as f64 * 100.0, yi as f64 * 80.0);
                let c = clamp_position(p, VIEWPORT, 20.0);
                assert!((10.0..=990.0).contains(&c.x), "x out of range: {c:?}");
                assert!((10.0..=790.0).contains(&c.y), "y out of range: {c:?}");
            }
        }
    }
}
