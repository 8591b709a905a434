//! Overlay placement, fit sizing and wheel zoom.
//!
//! Everything here is pure arithmetic on CSS pixels so the browser views can
//! stay dumb: they feed in pointer, natural size and viewport and write the
//! result into inline styles.

use serde::{Deserialize, Serialize};

use crate::config::HoverConfig;
use crate::constants::{FALLBACK_NATURAL_SIZE, OVERLAY_CHROME};

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both sides are positive and finite.
    pub fn is_known(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn scaled(&self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }
}

/// An axis-aligned box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether `self` lies inside `outer`, with a small tolerance for float noise.
    pub fn is_within(&self, outer: &Rect) -> bool {
        const TOLERANCE: f64 = 1e-6;
        self.left >= outer.left - TOLERANCE
            && self.top >= outer.top - TOLERANCE
            && self.right() <= outer.right() + TOLERANCE
            && self.bottom() <= outer.bottom() + TOLERANCE
    }
}

/// `value` clamped to `[min, max]`, with `min` winning when they cross.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Place a box of `size` next to the pointer.
///
/// The box starts at pointer + `offset` and flips to the other side of the
/// pointer on any axis where it would overflow. It is then clamped so it
/// stays `margin` away from every viewport edge. Boxes larger than the
/// margin rectangle are shrunk to fit it first.
pub fn place_overlay(pointer: Point, size: Size, viewport: Size, offset: f64, margin: f64) -> Rect {
    let width = size.width.min((viewport.width - 2.0 * margin).max(0.0)).max(0.0);
    let height = size.height.min((viewport.height - 2.0 * margin).max(0.0)).max(0.0);

    let left = place_axis(pointer.x, width, viewport.width, offset, margin);
    let top = place_axis(pointer.y, height, viewport.height, offset, margin);

    Rect::new(left, top, width, height)
}

fn place_axis(pointer: f64, extent: f64, viewport: f64, offset: f64, margin: f64) -> f64 {
    let mut start = pointer + offset;
    if start + extent + margin > viewport {
        start = pointer - offset - extent;
    }
    clamp(start, margin, (viewport - extent - margin).max(margin))
}

/// Displayed media size for a preview.
///
/// Scales the natural size (800x600 when unknown) to the largest size that
/// fits the configured fraction of the viewport, minus the overlay chrome.
/// Small media is scaled up as well. Each side is at least
/// `min_media_side`, or the available space when that is smaller.
pub fn fit_size(natural: Option<Size>, viewport: Size, config: &HoverConfig) -> Size {
    let natural = natural
        .filter(Size::is_known)
        .unwrap_or(Size::new(FALLBACK_NATURAL_SIZE.0, FALLBACK_NATURAL_SIZE.1));

    let max_box_w = (viewport.width * config.max_width_fraction).min(viewport.width - config.margin * 2.0);
    let max_box_h = (viewport.height * config.max_height_fraction).min(viewport.height - config.margin * 2.0);
    let max_w = (max_box_w - OVERLAY_CHROME).floor().max(1.0);
    let max_h = (max_box_h - OVERLAY_CHROME).floor().max(1.0);
    let min_w = config.min_media_side.min(max_w);
    let min_h = config.min_media_side.min(max_h);

    let scale = (max_w / natural.width).min(max_h / natural.height);
    Size::new(
        (natural.width * scale).floor().max(min_w),
        (natural.height * scale).floor().max(min_h),
    )
}

/// Outer overlay box for a fitted media size at the given zoom.
pub fn overlay_box(media: Size, zoom: f64) -> Size {
    let scaled = media.scaled(zoom);
    Size::new(scaled.width + OVERLAY_CHROME, scaled.height + OVERLAY_CHROME)
}

/// Wheel zoom factor for the hover preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    factor: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::identity()
    }
}

impl ZoomState {
    pub fn identity() -> Self {
        Self { factor: 1.0 }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn reset(&mut self) {
        self.factor = 1.0;
    }

    /// Apply one wheel step. Scrolling down (positive `delta_y`) zooms out.
    ///
    /// Returns `false` when the delta is zero or not finite and nothing
    /// changed.
    pub fn apply_wheel(&mut self, delta_y: f64, config: &HoverConfig) -> bool {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }
        let next = self.factor * (1.0 - delta_y.signum() * config.zoom_step);
        self.factor = clamp(next, config.zoom_min, config.zoom_max);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_place_below_right_of_pointer() {
        let rect = place_overlay(Point::new(100.0, 100.0), Size::new(200.0, 150.0), Size::new(1000.0, 800.0), 16.0, 8.0);
        assert_eq!(rect, Rect::new(116.0, 116.0, 200.0, 150.0));
    }

    #[test]
    fn test_place_flips_near_right_and_bottom_edges() {
        let rect = place_overlay(Point::new(900.0, 700.0), Size::new(200.0, 150.0), Size::new(1000.0, 800.0), 16.0, 8.0);
        assert_eq!(rect.left, 900.0 - 16.0 - 200.0);
        assert_eq!(rect.top, 700.0 - 16.0 - 150.0);
    }

    #[test]
    fn test_place_clamps_after_flip() {
        // Flipping left would leave the viewport, so the box is pinned to the margin.
        let rect = place_overlay(Point::new(150.0, 10.0), Size::new(500.0, 100.0), Size::new(600.0, 400.0), 16.0, 8.0);
        assert_eq!(rect.left, 8.0);
        assert_eq!(rect.top, 26.0);
    }

    #[test]
    fn test_place_shrinks_oversized_box() {
        let rect = place_overlay(Point::new(50.0, 50.0), Size::new(5000.0, 5000.0), Size::new(640.0, 480.0), 16.0, 8.0);
        assert_eq!(rect, Rect::new(8.0, 8.0, 624.0, 464.0));
    }

    #[test]
    fn test_fit_unknown_natural_uses_fallback_aspect() {
        let config = HoverConfig {
            max_width_fraction: 1.0,
            max_height_fraction: 1.0,
            ..HoverConfig::default()
        };
        // 438 - 2 * 8 margin - 22 chrome leaves 400 for an 800x600 fallback.
        let size = fit_size(None, Size::new(438.0, 1000.0), &config);
        assert_eq!(size, Size::new(400.0, 300.0));
    }

    #[test]
    fn test_fit_scales_small_media_up_and_respects_minimum() {
        let config = HoverConfig::default();
        let size = fit_size(Some(Size::new(10.0, 379.0)), Size::new(1000.0, 1000.0), &config);
        assert_eq!(size.width, 40.0);
        assert_eq!(size.height, 758.0);
    }

    #[test]
    fn test_fit_tiny_viewport_never_below_one() {
        let config = HoverConfig::default();
        let size = fit_size(Some(Size::new(800.0, 600.0)), Size::new(20.0, 20.0), &config);
        assert_eq!(size, Size::new(1.0, 1.0));
    }

    #[test]
    fn test_zoom_wheel_steps() {
        let config = HoverConfig::default();
        let mut zoom = ZoomState::identity();
        assert!(zoom.apply_wheel(-120.0, &config));
        assert!(approx_eq(zoom.factor(), 1.12));
        assert!(zoom.apply_wheel(3.0, &config));
        assert!(approx_eq(zoom.factor(), 1.12 * 0.88));
        assert!(!zoom.apply_wheel(0.0, &config));
        assert!(!zoom.apply_wheel(f64::NAN, &config));
        zoom.reset();
        assert_eq!(zoom.factor(), 1.0);
    }

    #[test]
    fn test_overlay_box_adds_chrome() {
        assert_eq!(overlay_box(Size::new(100.0, 50.0), 2.0), Size::new(222.0, 122.0));
    }

    proptest! {
        #[test]
        fn prop_zoom_stays_in_bounds(deltas in prop::collection::vec(-500.0f64..500.0, 0..200)) {
            let config = HoverConfig::default();
            let mut zoom = ZoomState::identity();
            for delta in deltas {
                zoom.apply_wheel(delta, &config);
                prop_assert!(zoom.factor() >= config.zoom_min - EPSILON);
                prop_assert!(zoom.factor() <= config.zoom_max + EPSILON);
            }
        }

        #[test]
        fn prop_placement_inside_margin_rect(
            px in -200.0f64..3000.0,
            py in -200.0f64..3000.0,
            w in 0.0f64..4000.0,
            h in 0.0f64..4000.0,
            vw in 16.0f64..2560.0,
            vh in 16.0f64..1600.0,
        ) {
            let margin = 8.0;
            let rect = place_overlay(Point::new(px, py), Size::new(w, h), Size::new(vw, vh), 16.0, margin);
            let bounds = Rect::new(margin, margin, vw - 2.0 * margin, vh - 2.0 * margin);
            prop_assert!(rect.is_within(&bounds), "{:?} not within {:?}", rect, bounds);
        }
    }
}
