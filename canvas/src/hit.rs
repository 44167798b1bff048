#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Bounds, Point};
use crate::doc::{Geometry, ShapeId, ShapeList};

/// Whether a shape's geometry intersects a normalized marquee rectangle.
///
/// Rectangles and images use an axis-aligned overlap test on their unrotated
/// bounds. Polygons count as intersecting when any single vertex lies inside
/// the marquee; edges crossing the marquee without a vertex inside do not.
#[must_use]
pub fn intersects_marquee(geometry: &Geometry, marquee: &Bounds) -> bool {
    match geometry {
        Geometry::Rectangle { .. } | Geometry::Image { .. } => geometry.bounds().intersects(marquee),
        Geometry::Polygon { points, .. } => points.chunks_exact(2).any(|p| marquee.contains(Point::new(p[0], p[1]))),
    }
}

/// Ids of every shape intersecting `marquee`, in draw order.
#[must_use]
pub fn marquee_hits(shapes: &ShapeList, marquee: &Bounds) -> Vec<ShapeId> {
    shapes.iter().filter(|s| intersects_marquee(&s.geometry, marquee)).map(|s| s.id.clone()).collect()
}

/// Whether `world_pt` lies inside the geometry.
///
/// Rectangles and images honour their rotation about the origin corner.
/// Polygons use an even-odd ray cast over the raw vertex list.
#[must_use]
pub fn contains_point(geometry: &Geometry, world_pt: Point) -> bool {
    match geometry {
        Geometry::Rectangle { x, y, rotation, .. } | Geometry::Image { x, y, rotation, .. } => {
            let bounds = geometry.bounds();
            let local = unrotate(world_pt, Point::new(*x, *y), rotation.unwrap_or(0.0));
            local.x >= 0.0 && local.x <= bounds.width && local.y >= 0.0 && local.y <= bounds.height
        }
        Geometry::Polygon { points, .. } => point_in_polygon(points, world_pt),
    }
}

/// Top-most shape under `world_pt`.
#[must_use]
pub fn hit_shape(shapes: &ShapeList, world_pt: Point) -> Option<ShapeId> {
    shapes.iter().rev().find(|s| contains_point(&s.geometry, world_pt)).map(|s| s.id.clone())
}

/// Index of the polygon vertex within `radius` of `world_pt`, nearest first.
#[must_use]
pub fn hit_vertex(points: &[f64], world_pt: Point, radius: f64) -> Option<usize> {
    points
        .chunks_exact(2)
        .enumerate()
        .map(|(i, p)| (i, Point::new(p[0], p[1]).distance(world_pt)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Start index of the polygon edge whose midpoint handle is within `radius`.
///
/// Edges wrap: the last vertex connects back to the first.
#[must_use]
pub fn hit_edge_midpoint(points: &[f64], world_pt: Point, radius: f64) -> Option<usize> {
    let vertices: Vec<Point> = points.chunks_exact(2).map(|p| Point::new(p[0], p[1])).collect();
    let n = vertices.len();
    if n < 2 {
        return None;
    }
    (0..n)
        .map(|i| (i, vertices[i].midpoint(vertices[(i + 1) % n]).distance(world_pt)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn unrotate(p: Point, origin: Point, degrees: f64) -> Point {
    let (sin, cos) = (-degrees.to_radians()).sin_cos();
    let dx = p.x - origin.x;
    let dy = p.y - origin.y;
    Point::new(dx * cos - dy * sin, dx * sin + dy * cos)
}

fn point_in_polygon(points: &[f64], p: Point) -> bool {
    let vertices: Vec<Point> = points.chunks_exact(2).map(|v| Point::new(v[0], v[1])).collect();
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
