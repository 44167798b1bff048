#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
    Shape::new(ShapeCategory::Interactive, Geometry::Rectangle { x, y, width: w, height: h, rotation: None }, 1_000)
}

fn triangle() -> Shape {
    Shape::new(
        ShapeCategory::Collision,
        Geometry::Polygon { points: vec![0.0, 0.0, 10.0, 0.0, 5.0, 10.0], rotation: None },
        1_000,
    )
}

fn image() -> Shape {
    Shape::new(
        ShapeCategory::Asset,
        Geometry::Image {
            x: 5.0,
            y: 5.0,
            width: 64.0,
            height: 32.0,
            image_data: "data:image/png;base64,AAAA".into(),
            file_name: "tree.png".into(),
            rotation: Some(15.0),
            scale: None,
        },
        1_000,
    )
}

// =============================================================
// ShapeCategory / style
// =============================================================

#[test]
fn category_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&ShapeCategory::Collision).unwrap(), "\"collision\"");
    let back: ShapeCategory = serde_json::from_str("\"interactive\"").unwrap();
    assert_eq!(back, ShapeCategory::Interactive);
}

#[test]
fn style_defaults_differ_per_category() {
    let a = ShapeStyle::for_category(ShapeCategory::Interactive);
    let b = ShapeStyle::for_category(ShapeCategory::Collision);
    let c = ShapeStyle::for_category(ShapeCategory::Asset);
    assert_ne!(a.fill, b.fill);
    assert_ne!(b.fill, c.fill);
    assert_eq!(c.opacity, 1.0);
}

#[test]
fn new_shape_takes_category_style_and_timestamps() {
    let s = triangle();
    assert_eq!(s.style, ShapeStyle::for_category(ShapeCategory::Collision));
    assert_eq!(s.metadata.created_at, 1_000);
    assert_eq!(s.metadata.modified_at, 1_000);
    assert!(s.group_id().is_none());
}

#[test]
fn new_shapes_get_distinct_ids() {
    assert_ne!(rect(0.0, 0.0, 10.0, 10.0).id, rect(0.0, 0.0, 10.0, 10.0).id);
}

// =============================================================
// Geometry serde
// =============================================================

#[test]
fn rectangle_json_is_tagged_and_omits_unset_rotation() {
    let g = Geometry::Rectangle { x: 1.0, y: 2.0, width: 3.0, height: 4.0, rotation: None };
    let v = serde_json::to_value(&g).unwrap();
    assert_eq!(v, json!({ "type": "rectangle", "x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0 }));
}

#[test]
fn image_json_uses_camel_case_fields() {
    let v = serde_json::to_value(&image().geometry).unwrap();
    assert_eq!(v["type"], "image");
    assert_eq!(v["fileName"], "tree.png");
    assert!(v.get("imageData").is_some());
    assert_eq!(v["rotation"], 15.0);
    assert!(v.get("scale").is_none());
}

#[test]
fn polygon_json_parses_without_rotation() {
    let g: Geometry = serde_json::from_value(json!({ "type": "polygon", "points": [0, 0, 4, 0, 2, 3] })).unwrap();
    assert_eq!(g.vertex_count(), 3);
    assert_eq!(g.rotation(), 0.0);
}

#[test]
fn shape_json_carries_group_id_in_metadata() {
    let s = rect(0.0, 0.0, 10.0, 10.0).with_group("g1").with_name("Spawn");
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["metadata"]["groupId"], "g1");
    assert_eq!(v["metadata"]["name"], "Spawn");
    assert_eq!(v["category"], "interactive");
    let back: Shape = serde_json::from_value(v).unwrap();
    assert_eq!(back, s);
}

// =============================================================
// Geometry queries
// =============================================================

#[test]
fn polygon_bounds_cover_vertices() {
    assert_eq!(triangle().bounds(), Bounds::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn image_bounds_ignore_rotation() {
    assert_eq!(image().bounds(), Bounds::new(5.0, 5.0, 64.0, 32.0));
}

#[test]
fn vertices_only_for_polygons() {
    assert_eq!(triangle().geometry.vertices().len(), 3);
    assert!(rect(0.0, 0.0, 10.0, 10.0).geometry.vertices().is_empty());
}

#[test]
fn translate_moves_every_variant() {
    let mut r = rect(0.0, 0.0, 10.0, 10.0).geometry;
    r.translate(5.0, -5.0);
    assert_eq!(r.bounds(), Bounds::new(5.0, -5.0, 10.0, 10.0));

    let mut p = triangle().geometry;
    p.translate(1.0, 2.0);
    assert_eq!(p.vertices()[2], Point::new(6.0, 12.0));
}

// =============================================================
// Geometry validation
// =============================================================

#[test]
fn validate_accepts_well_formed_shapes() {
    assert!(rect(0.0, 0.0, 10.0, 10.0).geometry.validate(5.0).is_ok());
    assert!(triangle().geometry.validate(5.0).is_ok());
    assert!(image().geometry.validate(5.0).is_ok());
}

#[test]
fn validate_rejects_odd_polygon() {
    let g = Geometry::Polygon { points: vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0], rotation: None };
    assert_eq!(g.validate(5.0), Err(GeometryError::OddPolygonPoints { len: 7 }));
}

#[test]
fn validate_rejects_two_vertex_polygon() {
    let g = Geometry::Polygon { points: vec![0.0, 0.0, 1.0, 1.0], rotation: None };
    let err = g.validate(5.0).unwrap_err();
    assert_eq!(err, GeometryError::TooFewVertices { count: 2 });
    assert_eq!(err.error_code(), "E_POLYGON_TOO_FEW_VERTICES");
}

#[test]
fn validate_rejects_small_rectangle() {
    let err = rect(0.0, 0.0, 4.0, 100.0).geometry.validate(5.0).unwrap_err();
    assert!(matches!(err, GeometryError::BelowMinSize { .. }));
}

#[test]
fn validate_rejects_nan() {
    let g = Geometry::Rectangle { x: f64::NAN, y: 0.0, width: 10.0, height: 10.0, rotation: None };
    assert_eq!(g.validate(5.0), Err(GeometryError::NonFinite));
}

#[test]
fn validate_rejects_non_finite_image_scale_and_rotation() {
    let mut bad_scale = image();
    if let Geometry::Image { scale, .. } = &mut bad_scale.geometry {
        *scale = Some(f64::NAN);
    }
    assert_eq!(bad_scale.geometry.validate(5.0), Err(GeometryError::NonFinite));

    let mut bad_rotation = image();
    if let Geometry::Image { rotation, .. } = &mut bad_rotation.geometry {
        *rotation = Some(f64::INFINITY);
    }
    assert_eq!(bad_rotation.geometry.validate(5.0), Err(GeometryError::NonFinite));
}

#[test]
fn validate_rejects_non_finite_rotation() {
    let g = Geometry::Rectangle { x: 0.0, y: 0.0, width: 10.0, height: 10.0, rotation: Some(f64::NAN) };
    assert_eq!(g.validate(5.0), Err(GeometryError::NonFinite));
    let p = Geometry::Polygon { points: vec![0.0, 0.0, 10.0, 0.0, 5.0, 10.0], rotation: Some(f64::NAN) };
    assert_eq!(p.validate(5.0), Err(GeometryError::NonFinite));
}

// =============================================================
// ShapeId
// =============================================================

#[test]
fn shape_id_is_any_string() {
    let id: ShapeId = serde_json::from_str("\"area-1\"").unwrap();
    assert_eq!(id.as_str(), "area-1");
    assert_eq!(id, ShapeId::from("area-1"));
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"area-1\"");
    assert_eq!(id.to_string(), "area-1");
}

#[test]
fn generated_ids_are_distinct_and_non_empty() {
    let a = ShapeId::generate();
    let b = ShapeId::generate();
    assert_ne!(a, b);
    assert!(!a.is_empty());
}

// =============================================================
// ShapeList
// =============================================================

#[test]
fn list_insert_appends_in_draw_order() {
    let mut list = ShapeList::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = triangle();
    list.insert(a.clone());
    list.insert(b.clone());
    assert_eq!(list.ids(), vec![a.id.clone(), b.id.clone()]);
    assert_eq!(list.len(), 2);
}

#[test]
fn list_insert_existing_replaces_in_place() {
    let mut list = ShapeList::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = triangle();
    list.insert(a.clone());
    list.insert(b.clone());
    let mut moved = a.clone();
    moved.geometry.translate(50.0, 0.0);
    list.insert(moved);
    assert_eq!(list.ids(), vec![a.id.clone(), b.id.clone()]);
    assert_eq!(list.get(&a.id).unwrap().bounds().x, 50.0);
}

#[test]
fn list_remove_returns_shape() {
    let mut list = ShapeList::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    list.insert(a.clone());
    assert_eq!(list.remove(&a.id).map(|s| s.id), Some(a.id.clone()));
    assert!(list.is_empty());
    assert!(list.remove(&a.id).is_none());
}

#[test]
fn list_group_members_match_shared_id() {
    let mut list = ShapeList::new();
    let a = rect(0.0, 0.0, 10.0, 10.0).with_group("g1");
    let b = rect(20.0, 0.0, 10.0, 10.0).with_group("g1");
    let c = rect(40.0, 0.0, 10.0, 10.0).with_group("g2");
    let d = rect(60.0, 0.0, 10.0, 10.0);
    for s in [&a, &b, &c, &d] {
        list.insert(s.clone());
    }
    assert_eq!(list.group_members("g1"), vec![a.id.clone(), b.id.clone()]);
    assert_eq!(list.group_members("g2"), vec![c.id]);
    assert!(list.group_members("nope").is_empty());
}

#[test]
fn list_bounds_union() {
    let mut list = ShapeList::new();
    assert!(list.bounds().is_none());
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(90.0, 40.0, 10.0, 10.0);
    list.insert(a.clone());
    list.insert(b.clone());
    assert_eq!(list.bounds(), Some(Bounds::new(0.0, 0.0, 100.0, 50.0)));
    assert_eq!(list.bounds_of([&b.id]), Some(Bounds::new(90.0, 40.0, 10.0, 10.0)));
}

#[test]
fn list_load_replaces_everything() {
    let mut list = ShapeList::new();
    list.insert(rect(0.0, 0.0, 10.0, 10.0));
    let t = triangle();
    list.load(vec![t.clone()]);
    assert_eq!(list.ids(), vec![t.id]);
}
