//! Default tuning values for the hover overlay and the popout window.

/// Delay before a hovered element starts loading a preview.
pub const HOVER_DELAY_MS: u32 = 140;

/// Delay before the overlay hides after the pointer leaves the active element.
pub const HIDE_DELAY_MS: u32 = 60;

/// Distance between the pointer and the overlay corner.
pub const POINTER_OFFSET: f64 = 16.0;

/// Margin kept between the overlay and every viewport edge.
pub const VIEWPORT_MARGIN: f64 = 8.0;

/// Fraction of the viewport width the preview may cover.
pub const MAX_WIDTH_FRACTION: f64 = 0.70;

/// Fraction of the viewport height the preview may cover.
pub const MAX_HEIGHT_FRACTION: f64 = 0.78;

/// Smallest media side produced by fit sizing, unless the viewport is smaller.
pub const MIN_MEDIA_SIDE: f64 = 40.0;

/// Assumed natural size while the real one is still unknown.
pub const FALLBACK_NATURAL_SIZE: (f64, f64) = (800.0, 600.0);

/// Overlay padding plus border on both sides (10px padding, 1px border).
pub const OVERLAY_CHROME: f64 = 22.0;

/// Scale change per wheel notch.
pub const ZOOM_STEP: f64 = 0.12;
pub const ZOOM_MIN: f64 = 0.25;
pub const ZOOM_MAX: f64 = 5.0;

/// Elements smaller than this on either side never get a preview.
pub const MIN_TARGET_SIDE: f64 = 48.0;

/// Upper bound on descendants inspected when an anchor is searched for a
/// background image.
pub const DESCENDANT_SCAN_LIMIT: usize = 120;

/// Padding between the popout window and the viewport edges.
pub const POPOUT_PADDING: f64 = 12.0;
pub const POPOUT_MIN_WIDTH: f64 = 260.0;
pub const POPOUT_MIN_HEIGHT: f64 = 200.0;

pub const HOVER_TOAST_MS: u32 = 900;
pub const POPOUT_TOAST_MS: u32 = 1200;

/// localStorage key for the enabled/pinned flags.
pub const STORAGE_KEY: &str = "hoverzoom_state_v1";
