//! Shared numeric constants for the canvas crate.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height a rectangle or image may have after any transform.
pub const MIN_SHAPE_SIZE: f64 = 5.0;

/// Fewest vertices a polygon may have.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Degenerate bounds are widened to this extent before computing fit ratios.
pub const MIN_FIT_EXTENT: f64 = 1.0;

// ── Zoom ────────────────────────────────────────────────────────

/// Lower zoom bound for interactive zooming (wheel, keyboard).
pub const ZOOM_MIN: f64 = 0.3;

/// Upper zoom bound for interactive zooming.
pub const ZOOM_MAX: f64 = 5.0;

/// Lower zoom bound for zoom-to-fit.
pub const FIT_ZOOM_MIN: f64 = 0.1;

/// Upper zoom bound for zoom-to-fit.
pub const FIT_ZOOM_MAX: f64 = 3.0;

/// Fraction of each viewport axis kept free around fitted content.
pub const FIT_PADDING: f64 = 0.1;

/// Multiplicative zoom step per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

// ── Input ───────────────────────────────────────────────────────

/// Pointer travel in screen pixels before a press becomes a marquee drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Screen-space hit slop in pixels for polygon vertex and midpoint handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Arrow-key nudge distance in world units.
pub const NUDGE_STEP: f64 = 1.0;

/// Arrow-key nudge distance with shift held.
pub const NUDGE_STEP_LARGE: f64 = 10.0;

// ── History / persistence ───────────────────────────────────────

/// Default depth of each undo/redo stack.
pub const HISTORY_MAX_SIZE: usize = 50;

/// Current persisted map format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Default grid cell size in world units.
pub const GRID_SIZE: f64 = 20.0;
