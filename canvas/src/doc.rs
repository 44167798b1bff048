//! Document model: shapes, their geometry and style, and the in-memory list.
//!
//! This module defines what lives on the map canvas (`Shape`, `Geometry`,
//! `ShapeCategory`), the validation rules every shape must satisfy, and the
//! ordered store that owns all live shapes (`ShapeList`).
//!
//! Shapes arrive here from persisted snapshots and from the input engine.
//! The host's renderer reads from `ShapeList::iter` in draw order.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Bounds, Point};
use crate::consts::MIN_POLYGON_VERTICES;
use crate::error::ErrorCode;

/// Opaque shape identifier.
///
/// Shapes created here get a v4 UUID, but saved maps may carry any string,
/// so nothing may assume the UUID format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Mint a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ShapeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a shape means on the map. Drives default styling and area semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeCategory {
    /// An area players can interact with (portals, zones, triggers).
    Interactive,
    /// An area that blocks movement.
    Collision,
    /// A decorative or imported asset with no gameplay semantics.
    Asset,
}

/// Visual style, independent of geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Fill color as a CSS color string.
    pub fill: String,
    /// Stroke color as a CSS color string.
    pub stroke: String,
    /// Stroke width in world units.
    pub stroke_width: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl ShapeStyle {
    /// Default style for a category.
    #[must_use]
    pub fn for_category(category: ShapeCategory) -> Self {
        let (fill, stroke, stroke_width, opacity) = match category {
            ShapeCategory::Interactive => ("#4A90E2", "#2E5C8A", 2.0, 0.5),
            ShapeCategory::Collision => ("#E74C3C", "#C0392B", 2.0, 0.4),
            ShapeCategory::Asset => ("#FFFFFF", "#95A5A6", 1.0, 1.0),
        };
        Self { fill: fill.to_string(), stroke: stroke.to_string(), stroke_width, opacity }
    }
}

/// Shape geometry. Exactly one variant is populated per shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Geometry {
    /// Axis-aligned rectangle, optionally rotated (degrees) about its origin.
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rotation: Option<f64>,
    },
    /// Closed polygon as a flat `[x0, y0, x1, y1, ...]` sequence.
    Polygon {
        points: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rotation: Option<f64>,
    },
    /// Placed image asset. `image_data` is an opaque data URL or asset reference.
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image_data: String,
        file_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rotation: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<f64>,
    },
}

/// Why a geometry record was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Polygon point list has an odd number of coordinates.
    #[error("polygon has an odd number of coordinates ({len})")]
    OddPolygonPoints { len: usize },

    /// Polygon has fewer than the minimum number of vertices.
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    /// Rectangle or image is smaller than the minimum size.
    #[error("size {width}x{height} is below the minimum of {min}")]
    BelowMinSize { width: f64, height: f64, min: f64 },

    /// A coordinate is NaN or infinite.
    #[error("geometry contains a non-finite coordinate")]
    NonFinite,
}

impl ErrorCode for GeometryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::OddPolygonPoints { .. } => "E_POLYGON_ODD_POINTS",
            Self::TooFewVertices { .. } => "E_POLYGON_TOO_FEW_VERTICES",
            Self::BelowMinSize { .. } => "E_BELOW_MIN_SIZE",
            Self::NonFinite => "E_NON_FINITE",
        }
    }
}

impl Geometry {
    /// Short lowercase name of the variant.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Rectangle { .. } => "rectangle",
            Self::Polygon { .. } => "polygon",
            Self::Image { .. } => "image",
        }
    }

    /// Unrotated axis-aligned bounds. Image bounds include the display scale.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Rectangle { x, y, width, height, .. } => Bounds::new(*x, *y, *width, *height),
            Self::Image { x, y, width, height, scale, .. } => {
                let k = scale.unwrap_or(1.0);
                Bounds::new(*x, *y, *width * k, *height * k)
            }
            Self::Polygon { points, .. } => {
                Bounds::from_flat_points(points).unwrap_or_else(|| Bounds::new(0.0, 0.0, 0.0, 0.0))
            }
        }
    }

    /// Rotation in degrees; `0.0` when unset.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        match self {
            Self::Rectangle { rotation, .. } | Self::Polygon { rotation, .. } | Self::Image { rotation, .. } => {
                rotation.unwrap_or(0.0)
            }
        }
    }

    /// Number of polygon vertices, or 4 for box-shaped variants.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Polygon { points, .. } => points.len() / 2,
            Self::Rectangle { .. } | Self::Image { .. } => 4,
        }
    }

    /// Polygon vertices as points. Empty for box-shaped variants.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Self::Polygon { points, .. } => points.chunks_exact(2).map(|p| Point::new(p[0], p[1])).collect(),
            Self::Rectangle { .. } | Self::Image { .. } => Vec::new(),
        }
    }

    /// Shift every coordinate by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Self::Rectangle { x, y, .. } | Self::Image { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Self::Polygon { points, .. } => {
                for pair in points.chunks_exact_mut(2) {
                    pair[0] += dx;
                    pair[1] += dy;
                }
            }
        }
    }

    /// Check the shape invariants: finite coordinates, polygons with an even
    /// point list of at least three vertices, boxes at least `min_size` on
    /// both axes.
    pub fn validate(&self, min_size: f64) -> Result<(), GeometryError> {
        match self {
            Self::Rectangle { x, y, width, height, rotation } => {
                check_box(*x, *y, *width, *height, *rotation, None, min_size)
            }
            Self::Image { x, y, width, height, rotation, scale, .. } => {
                check_box(*x, *y, *width, *height, *rotation, *scale, min_size)
            }
            Self::Polygon { points, rotation } => {
                if points.len() % 2 != 0 {
                    return Err(GeometryError::OddPolygonPoints { len: points.len() });
                }
                if points.len() / 2 < MIN_POLYGON_VERTICES {
                    return Err(GeometryError::TooFewVertices { count: points.len() / 2 });
                }
                if !points.iter().copied().chain(*rotation).all(f64::is_finite) {
                    return Err(GeometryError::NonFinite);
                }
                Ok(())
            }
        }
    }
}

fn check_box(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rotation: Option<f64>,
    scale: Option<f64>,
    min_size: f64,
) -> Result<(), GeometryError> {
    let optional = [rotation, scale].into_iter().flatten();
    if ![x, y, width, height].into_iter().chain(optional).all(f64::is_finite) {
        return Err(GeometryError::NonFinite);
    }
    if width < min_size || height < min_size {
        return Err(GeometryError::BelowMinSize { width, height, min: min_size });
    }
    Ok(())
}

/// Bookkeeping fields carried alongside geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeMetadata {
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Last modification time, epoch milliseconds.
    pub modified_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Shared by every member of a group. A relation only; groups own nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// A drawable entity on the map canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub category: ShapeCategory,
    pub geometry: Geometry,
    pub style: ShapeStyle,
    pub metadata: ShapeMetadata,
}

impl Shape {
    /// New shape with a fresh id and the category's default style.
    #[must_use]
    pub fn new(category: ShapeCategory, geometry: Geometry, now: i64) -> Self {
        Self {
            id: ShapeId::generate(),
            category,
            geometry,
            style: ShapeStyle::for_category(category),
            metadata: ShapeMetadata { created_at: now, modified_at: now, name: None, description: None, group_id: None },
        }
    }

    #[must_use]
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.metadata.group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn group_id(&self) -> Option<&str> {
        self.metadata.group_id.as_deref()
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.geometry.bounds()
    }
}

/// Ordered in-memory store of shapes. Order is draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeList {
    shapes: Vec<Shape>,
}

impl ShapeList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Insert a shape at the top, or replace in place if its id already exists.
    pub fn insert(&mut self, shape: Shape) {
        match self.shapes.iter_mut().find(|s| s.id == shape.id) {
            Some(existing) => *existing = shape,
            None => self.shapes.push(shape),
        }
    }

    /// Remove a shape by id, returning it if it was present.
    pub fn remove(&mut self, id: &ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == *id)?;
        Some(self.shapes.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == *id)
    }

    pub fn get_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == *id)
    }

    #[must_use]
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// Replace all shapes.
    pub fn load(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
    }

    /// Iterate in draw order (bottom first).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Shape> {
        self.shapes.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Shape] {
        &self.shapes
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().map(|s| s.id.clone()).collect()
    }

    /// Ids of every shape carrying `group_id`.
    #[must_use]
    pub fn group_members(&self, group_id: &str) -> Vec<ShapeId> {
        self.shapes.iter().filter(|s| s.group_id() == Some(group_id)).map(|s| s.id.clone()).collect()
    }

    /// Union bounds of every shape. `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.shapes.iter().map(Shape::bounds).reduce(|a, b| a.union(&b))
    }

    /// Union bounds of the given shapes. Unknown ids are skipped.
    #[must_use]
    pub fn bounds_of<'a>(&self, ids: impl IntoIterator<Item = &'a ShapeId>) -> Option<Bounds> {
        ids.into_iter().filter_map(|id| self.get(id)).map(Shape::bounds).reduce(|a, b| a.union(&b))
    }

    /// Number of shapes currently in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the list contains no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
