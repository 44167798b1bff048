#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{FIT_ZOOM_MAX, FIT_ZOOM_MIN, MIN_FIT_EXTENT, ZOOM_MAX, ZOOM_MIN};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint of the segment from `self` to `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point { x: (self.x + other.x) * 0.5, y: (self.y + other.y) * 0.5 }
    }
}

/// Axis-aligned rectangle with a non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a normalized rectangle spanning two arbitrary corners.
    ///
    /// Dragging up or left yields a negative raw extent; the result always has
    /// its origin at the top-left corner.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Bounding box of a flat `[x0, y0, x1, y1, ...]` sequence. `None` when empty.
    #[must_use]
    pub fn from_flat_points(points: &[f64]) -> Option<Self> {
        let mut pairs = points.chunks_exact(2);
        let first = pairs.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first[0], first[1], first[0], first[1]);
        for pair in pairs {
            min_x = min_x.min(pair[0]);
            min_y = min_y.min(pair[1]);
            max_x = max_x.max(pair[0]);
            max_y = max_y.max(pair[1]);
        }
        Some(Self { x: min_x, y: min_y, width: max_x - min_x, height: max_y - min_y })
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point { x: self.x + self.width * 0.5, y: self.y + self.height * 0.5 }
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Inclusive overlap test; touching edges count as overlapping.
    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.right() && other.x <= self.right() && self.y <= other.bottom() && other.y <= self.bottom()
    }

    /// Smallest rectangle covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// Inclusive zoom clamp range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    /// Range used for wheel and keyboard zoom.
    pub const INTERACTIVE: ZoomRange = ZoomRange { min: ZOOM_MIN, max: ZOOM_MAX };
    /// Range used for zoom-to-fit.
    pub const FIT: ZoomRange = ZoomRange { min: FIT_ZOOM_MIN, max: FIT_ZOOM_MAX };

    #[must_use]
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Viewport state for pan/zoom on the map canvas.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Shift the pan offset by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply zoom by `factor`, keeping the world point under `screen_pt` fixed.
    pub fn zoom_at(&mut self, screen_pt: Point, factor: f64, range: ZoomRange) {
        let anchor = self.screen_to_world(screen_pt);
        self.zoom = range.clamp(self.zoom * factor);
        self.pan_x = screen_pt.x - anchor.x * self.zoom;
        self.pan_y = screen_pt.y - anchor.y * self.zoom;
    }

    /// The world-space rectangle visible in a viewport of the given CSS size.
    #[must_use]
    pub fn visible_world_bounds(&self, viewport_width: f64, viewport_height: f64) -> Bounds {
        let top_left = self.screen_to_world(Point::new(0.0, 0.0));
        let bottom_right = self.screen_to_world(Point::new(viewport_width, viewport_height));
        Bounds::from_corners(top_left, bottom_right)
    }
}

/// Free-function form of [`Camera::screen_to_world`].
#[must_use]
pub fn screen_to_world(screen: Point, camera: &Camera) -> Point {
    camera.screen_to_world(screen)
}

/// Free-function form of [`Camera::world_to_screen`].
#[must_use]
pub fn world_to_screen(world: Point, camera: &Camera) -> Point {
    camera.world_to_screen(world)
}

/// Compute a camera that fits `bounds` inside a viewport.
///
/// `padding` is the fraction of each viewport dimension left empty in total,
/// not a per-side margin: content fills `viewport * (1 - padding)`, so a
/// padding of `0.1` leaves 5% on each side of the limiting axis. The smaller of
/// the two axis zooms wins so content is never cropped. Zero-width or
/// zero-height bounds are treated as one unit wide. The bounds center lands on
/// the viewport center.
#[must_use]
pub fn fit_viewport(bounds: &Bounds, viewport_width: f64, viewport_height: f64, padding: f64, range: ZoomRange) -> Camera {
    let extent_w = bounds.width.max(MIN_FIT_EXTENT);
    let extent_h = bounds.height.max(MIN_FIT_EXTENT);
    let usable = (1.0 - padding).max(0.0);
    let zoom_x = viewport_width * usable / extent_w;
    let zoom_y = viewport_height * usable / extent_h;
    let zoom = range.clamp(zoom_x.min(zoom_y));

    let center = bounds.center();
    Camera {
        pan_x: viewport_width * 0.5 - center.x * zoom,
        pan_y: viewport_height * 0.5 - center.y * zoom,
        zoom,
    }
}
