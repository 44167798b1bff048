//! Geometry updates from end-of-gesture transforms and polygon vertex edits.
//!
//! Every function here takes a shape by reference and returns a new shape with
//! the same geometry variant. Only geometry and `metadata.modified_at` change;
//! id, category, style, and the rest of the metadata are carried over.
//! Rejected edits leave the input untouched and come back as
//! [`TransformError`].

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use crate::camera::{Bounds, Point};
use crate::consts::MIN_POLYGON_VERTICES;
use crate::doc::{Geometry, GeometryError, Shape};
use crate::error::ErrorCode;

/// A transform reported by the host's transform handles at gesture end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformDelta {
    /// Shift by a world-space offset.
    Translate { dx: f64, dy: f64 },
    /// Set the displayed bounding box.
    Resize { x: f64, y: f64, width: f64, height: f64 },
    /// Multiply the size about the shape origin. Negative factors are treated as flips of magnitude.
    ScaleBy { sx: f64, sy: f64 },
    /// Set the absolute rotation in degrees.
    Rotate { degrees: f64 },
}

impl TransformDelta {
    fn is_finite(&self) -> bool {
        match *self {
            Self::Translate { dx, dy } => dx.is_finite() && dy.is_finite(),
            Self::Resize { x, y, width, height } => [x, y, width, height].iter().all(|v| v.is_finite()),
            Self::ScaleBy { sx, sy } => sx.is_finite() && sy.is_finite(),
            Self::Rotate { degrees } => degrees.is_finite(),
        }
    }
}

/// Why a transform was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Removing the vertex would leave fewer than three.
    #[error("polygon must keep at least 3 vertices (has {count})")]
    VertexFloor { count: usize },

    /// The vertex or edge index does not exist.
    #[error("vertex index {index} out of range for {count} vertices")]
    VertexOutOfRange { index: usize, count: usize },

    /// A vertex operation was requested on a non-polygon shape.
    #[error("vertex edits require a polygon, got {kind}")]
    NotAPolygon { kind: &'static str },

    /// Transform inputs contained NaN or infinity.
    #[error("transform input is not finite")]
    NonFinite,

    /// The input shape already violated a geometry invariant.
    #[error("invalid geometry: {0}")]
    Invalid(#[from] GeometryError),
}

impl ErrorCode for TransformError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::VertexFloor { .. } => "E_VERTEX_FLOOR",
            Self::VertexOutOfRange { .. } => "E_VERTEX_OUT_OF_RANGE",
            Self::NotAPolygon { .. } => "E_NOT_A_POLYGON",
            Self::NonFinite => "E_NON_FINITE",
            Self::Invalid(e) => e.error_code(),
        }
    }
}

/// Apply a gesture transform, clamping boxes to `min_size` on both axes.
pub fn apply(shape: &Shape, delta: TransformDelta, now: i64, min_size: f64) -> Result<Shape, TransformError> {
    if !delta.is_finite() {
        return Err(TransformError::NonFinite);
    }
    let mut out = shape.clone();
    match delta {
        TransformDelta::Translate { dx, dy } => out.geometry.translate(dx, dy),
        TransformDelta::Resize { x, y, width, height } => {
            resize(&mut out.geometry, Bounds::new(x, y, width.abs(), height.abs()), min_size);
        }
        TransformDelta::ScaleBy { sx, sy } => {
            let b = out.geometry.bounds();
            let target = Bounds::new(b.x, b.y, b.width * sx.abs(), b.height * sy.abs());
            resize(&mut out.geometry, target, min_size);
        }
        TransformDelta::Rotate { degrees } => set_rotation(&mut out.geometry, degrees.rem_euclid(360.0)),
    }
    out.metadata.modified_at = now;
    Ok(out)
}

/// Round `value` to the nearest multiple of `grid_size`. A non-positive size disables snapping.
#[must_use]
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// Move polygon vertex `index` to `to`.
pub fn move_vertex(shape: &Shape, index: usize, to: Point, now: i64) -> Result<Shape, TransformError> {
    if !(to.x.is_finite() && to.y.is_finite()) {
        return Err(TransformError::NonFinite);
    }
    let mut out = shape.clone();
    let points = polygon_points_mut(&mut out.geometry)?;
    let count = points.len() / 2;
    if index >= count {
        return Err(TransformError::VertexOutOfRange { index, count });
    }
    points[index * 2] = to.x;
    points[index * 2 + 1] = to.y;
    out.metadata.modified_at = now;
    Ok(out)
}

/// Insert a vertex at the midpoint of the edge starting at `edge_start`.
///
/// The edge runs from vertex `edge_start` to the next vertex, wrapping from
/// the last vertex back to the first. The new vertex lands immediately after
/// `edge_start`; its index is returned alongside the shape.
pub fn insert_vertex_after(shape: &Shape, edge_start: usize, now: i64) -> Result<(Shape, usize), TransformError> {
    let mut out = shape.clone();
    let points = polygon_points_mut(&mut out.geometry)?;
    let count = points.len() / 2;
    if edge_start >= count {
        return Err(TransformError::VertexOutOfRange { index: edge_start, count });
    }
    let next = (edge_start + 1) % count;
    let a = Point::new(points[edge_start * 2], points[edge_start * 2 + 1]);
    let b = Point::new(points[next * 2], points[next * 2 + 1]);
    let mid = a.midpoint(b);
    let at = (edge_start + 1) * 2;
    points.splice(at..at, [mid.x, mid.y]);
    out.metadata.modified_at = now;
    Ok((out, edge_start + 1))
}

/// Remove polygon vertex `index`, refusing to drop below three vertices.
pub fn delete_vertex(shape: &Shape, index: usize, now: i64) -> Result<Shape, TransformError> {
    let mut out = shape.clone();
    let points = polygon_points_mut(&mut out.geometry)?;
    let count = points.len() / 2;
    if count <= MIN_POLYGON_VERTICES {
        tracing::warn!(shape_id = %shape.id, vertices = count, "refusing to delete vertex below polygon minimum");
        return Err(TransformError::VertexFloor { count });
    }
    if index >= count {
        return Err(TransformError::VertexOutOfRange { index, count });
    }
    points.drain(index * 2..index * 2 + 2);
    out.metadata.modified_at = now;
    Ok(out)
}

fn polygon_points_mut(geometry: &mut Geometry) -> Result<&mut Vec<f64>, TransformError> {
    match geometry {
        Geometry::Polygon { points, .. } => {
            if points.len() % 2 != 0 {
                return Err(GeometryError::OddPolygonPoints { len: points.len() }.into());
            }
            Ok(points)
        }
        other => Err(TransformError::NotAPolygon { kind: other.kind_name() }),
    }
}

fn set_rotation(geometry: &mut Geometry, degrees: f64) {
    match geometry {
        Geometry::Rectangle { rotation, .. } | Geometry::Polygon { rotation, .. } | Geometry::Image { rotation, .. } => {
            *rotation = Some(degrees);
        }
    }
}

/// Fit the geometry into `target`, widening either axis to `min_size`.
fn resize(geometry: &mut Geometry, target: Bounds, min_size: f64) {
    let target_w = target.width.max(min_size);
    let target_h = target.height.max(min_size);
    match geometry {
        Geometry::Rectangle { x, y, width, height, .. } => {
            *x = target.x;
            *y = target.y;
            *width = target_w;
            *height = target_h;
        }
        Geometry::Image { x, y, width, height, scale, .. } => {
            // Stored size is pre-scale; the displayed box is what the handles report.
            let k = scale.filter(|k| *k > 0.0).unwrap_or(1.0);
            *x = target.x;
            *y = target.y;
            *width = (target_w / k).max(min_size);
            *height = (target_h / k).max(min_size);
        }
        Geometry::Polygon { points, .. } => {
            let Some(old) = Bounds::from_flat_points(points) else {
                return;
            };
            let fx = if old.width > 0.0 { target_w / old.width } else { 1.0 };
            let fy = if old.height > 0.0 { target_h / old.height } else { 1.0 };
            for pair in points.chunks_exact_mut(2) {
                pair[0] = target.x + (pair[0] - old.x) * fx;
                pair[1] = target.y + (pair[1] - old.y) * fy;
            }
        }
    }
}
