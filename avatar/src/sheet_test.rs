use super::*;

// =============================================================
// Helpers
// =============================================================

fn anim(name: &str, frames: &[u32], frame_rate: f64) -> AnimationDefinition {
    AnimationDefinition { name: name.into(), frames: frames.to_vec(), frame_rate, looping: true }
}

/// 256x128 image of 64x64 frames: 4 columns, 2 rows.
fn make_sheet() -> SpriteSheetDefinition {
    SpriteSheetDefinition {
        id: "hero".into(),
        source: "https://cdn.example/hero.png".into(),
        image_width: 256,
        image_height: 128,
        frame_width: 64,
        frame_height: 64,
        animations: vec![anim("idle", &[0, 1], 4.0), anim("walk", &[4, 5, 6, 7], 10.0)],
    }
}

fn make_character() -> CharacterDefinition {
    CharacterDefinition {
        id: "c1".into(),
        name: "Hero".into(),
        sheet: make_sheet(),
        default_animation: Some("walk".into()),
        created_at: 1,
        updated_at: 2,
    }
}

// =============================================================
// Grid geometry
// =============================================================

#[test]
fn grid_dimensions() {
    let s = make_sheet();
    assert_eq!(s.columns(), 4);
    assert_eq!(s.rows(), 2);
    assert_eq!(s.frame_count(), 8);
}

#[test]
fn partial_edge_cells_are_not_frames() {
    let s = SpriteSheetDefinition { image_width: 250, image_height: 100, ..make_sheet() };
    assert_eq!(s.columns(), 3);
    assert_eq!(s.rows(), 1);
}

#[test]
fn frame_rect_is_row_major() {
    let s = make_sheet();
    assert_eq!(s.frame_rect(0), Some(FrameRect { x: 0, y: 0, width: 64, height: 64 }));
    assert_eq!(s.frame_rect(3), Some(FrameRect { x: 192, y: 0, width: 64, height: 64 }));
    assert_eq!(s.frame_rect(5), Some(FrameRect { x: 64, y: 64, width: 64, height: 64 }));
    assert_eq!(s.frame_rect(8), None);
}

#[test]
fn zero_frame_size_has_no_frames() {
    let s = SpriteSheetDefinition { frame_width: 0, ..make_sheet() };
    assert_eq!(s.frame_count(), 0);
    assert_eq!(s.frame_rect(0), None);
}

#[test]
fn memory_estimate_is_rgba() {
    assert_eq!(make_sheet().memory_estimate(), 256 * 128 * 4);
}

#[test]
fn cache_key_is_sheet_id() {
    assert_eq!(make_sheet().cache_key(), "hero");
}

#[test]
fn frame_duration_from_rate() {
    assert!((anim("a", &[0], 10.0).frame_duration_ms() - 100.0).abs() < 1e-9);
}

// =============================================================
// validate
// =============================================================

#[test]
fn valid_sheet_passes() {
    assert!(make_sheet().validate().is_ok());
}

#[test]
fn empty_id_rejected() {
    let s = SpriteSheetDefinition { id: "  ".into(), ..make_sheet() };
    assert!(matches!(s.validate(), Err(SheetError::EmptyId)));
}

#[test]
fn zero_frame_rejected() {
    let s = SpriteSheetDefinition { frame_height: 0, ..make_sheet() };
    let err = s.validate().unwrap_err();
    assert!(matches!(err, SheetError::ZeroFrameSize { width: 64, height: 0 }));
    assert_eq!(err.error_code(), "E_SHEET_FRAME_SIZE");
}

#[test]
fn frame_larger_than_image_rejected() {
    let s = SpriteSheetDefinition { frame_width: 512, ..make_sheet() };
    assert!(matches!(s.validate(), Err(SheetError::FrameLargerThanImage { .. })));
}

#[test]
fn frame_beyond_grid_rejected() {
    let mut s = make_sheet();
    s.animations.push(anim("jump", &[2, 8], 8.0));
    let err = s.validate().unwrap_err();
    assert!(matches!(err, SheetError::FrameOutOfGrid { frame: 8, count: 8, .. }));
    assert!(err.to_string().contains("jump"));
}

#[test]
fn empty_animation_rejected() {
    let mut s = make_sheet();
    s.animations.push(anim("none", &[], 8.0));
    assert!(matches!(s.validate(), Err(SheetError::EmptyAnimation { .. })));
}

#[test]
fn non_positive_or_nan_rate_rejected() {
    for rate in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let mut s = make_sheet();
        s.animations.push(anim("bad", &[0], rate));
        assert!(matches!(s.validate(), Err(SheetError::BadFrameRate { .. })), "rate {rate}");
    }
}

#[test]
fn duplicate_animation_rejected() {
    let mut s = make_sheet();
    s.animations.push(anim("idle", &[2], 4.0));
    assert!(matches!(s.validate(), Err(SheetError::DuplicateAnimation { .. })));
}

// =============================================================
// CharacterDefinition
// =============================================================

#[test]
fn character_unknown_default_rejected() {
    let c = CharacterDefinition { default_animation: Some("dance".into()), ..make_character() };
    let err = c.validate().unwrap_err();
    assert_eq!(err.error_code(), "E_ANIMATION_UNKNOWN");
}

#[test]
fn initial_animation_prefers_default() {
    let c = make_character();
    assert_eq!(c.initial_animation().map(|a| a.name.as_str()), Some("walk"));
    let c = CharacterDefinition { default_animation: None, ..make_character() };
    assert_eq!(c.initial_animation().map(|a| a.name.as_str()), Some("idle"));
}

#[test]
fn from_json_parses_camel_case_and_defaults_looping() {
    let json = r#"{
        "id": "c9",
        "name": "Slime",
        "sheet": {
            "id": "slime",
            "source": "data:image/png;base64,AAAA",
            "imageWidth": 64,
            "imageHeight": 32,
            "frameWidth": 32,
            "frameHeight": 32,
            "animations": [{ "name": "bounce", "frames": [0, 1], "frameRate": 6 }]
        }
    }"#;
    let c = CharacterDefinition::from_json(json).unwrap();
    assert_eq!(c.sheet.frame_count(), 2);
    assert!(c.sheet.animations[0].looping);
    assert_eq!(c.created_at, 0);
}

#[test]
fn from_json_reports_malformed_and_invalid() {
    let err = CharacterDefinition::from_json("{").unwrap_err();
    assert_eq!(err.error_code(), "E_DEFINITION_MALFORMED");

    let mut c = make_character();
    c.sheet.frame_width = 0;
    let json = serde_json::to_string(&c).unwrap();
    assert!(matches!(CharacterDefinition::from_json(&json), Err(SheetError::ZeroFrameSize { .. })));
}
