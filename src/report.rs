//! Summaries printed by the CLI for saved maps and characters.

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use avatar::playback::{FramePlayer, FrameStep, PreviewLoop};
use avatar::renderer::{AnimationClip, AvatarError, AvatarRenderer, BackendError, RenderBackend, RendererConfig};
use avatar::sheet::{CharacterDefinition, SpriteSheetDefinition};
use canvas::camera::{Bounds, Camera, ZoomRange, fit_viewport};
use canvas::doc::{ShapeCategory, ShapeList};
use canvas::persist::{self, PersistError};

/// What a saved map contains.
#[derive(Debug, Clone, PartialEq)]
pub struct MapReport {
    pub version: u32,
    pub expected_version: u32,
    pub dropped_invalid: usize,
    pub shape_count: usize,
    pub by_category: BTreeMap<&'static str, usize>,
    pub groups: usize,
    pub selected: usize,
    pub bounds: Option<Bounds>,
}

impl MapReport {
    pub fn from_json(json: &str, expected_version: u32) -> Result<Self, PersistError> {
        let loaded = persist::decode(json, expected_version)?;
        let mut shapes = ShapeList::new();
        shapes.load(loaded.map.shapes);

        let mut by_category = BTreeMap::new();
        let mut groups = BTreeSet::new();
        for shape in shapes.iter() {
            *by_category.entry(category_name(shape.category)).or_insert(0) += 1;
            if let Some(group) = shape.group_id() {
                groups.insert(group.to_owned());
            }
        }

        Ok(Self {
            version: loaded.map.version,
            expected_version,
            dropped_invalid: loaded.dropped_invalid,
            shape_count: shapes.len(),
            by_category,
            groups: groups.len(),
            selected: loaded.map.selected_ids.len(),
            bounds: shapes.bounds(),
        })
    }

    #[must_use]
    pub fn version_mismatch(&self) -> bool {
        self.version != self.expected_version
    }
}

impl fmt::Display for MapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version   {}", self.version)?;
        if self.version_mismatch() {
            write!(f, " (expected {}; loaded without migration)", self.expected_version)?;
        }
        writeln!(f)?;
        writeln!(f, "shapes    {}", self.shape_count)?;
        for (category, count) in &self.by_category {
            writeln!(f, "  {category:<12}{count}")?;
        }
        if self.dropped_invalid > 0 {
            writeln!(f, "dropped   {} invalid", self.dropped_invalid)?;
        }
        writeln!(f, "groups    {}", self.groups)?;
        writeln!(f, "selected  {}", self.selected)?;
        match self.bounds {
            Some(b) => write!(f, "bounds    x={} y={} w={} h={}", b.x, b.y, b.width, b.height),
            None => write!(f, "bounds    (empty)"),
        }
    }
}

fn category_name(category: ShapeCategory) -> &'static str {
    match category {
        ShapeCategory::Interactive => "interactive",
        ShapeCategory::Collision => "collision",
        ShapeCategory::Asset => "asset",
    }
}

/// Camera that frames every shape in a saved map, or `None` for an empty map.
pub fn fit_map(json: &str, expected_version: u32, width: f64, height: f64, padding: f64) -> Result<Option<Camera>, PersistError> {
    let loaded = persist::decode(json, expected_version)?;
    let mut shapes = ShapeList::new();
    shapes.load(loaded.map.shapes);
    Ok(shapes.bounds().map(|b| fit_viewport(&b, width, height, padding, ZoomRange::FIT)))
}

/// Backend that decodes nothing and records what would be registered.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    pub registered: Vec<String>,
}

impl RenderBackend for DryRunBackend {
    type Texture = (u32, u32);

    fn decode_texture(&mut self, sheet: &SpriteSheetDefinition) -> Result<Self::Texture, BackendError> {
        Ok((sheet.image_width, sheet.image_height))
    }

    fn register_clip(&mut self, clip: &AnimationClip, _texture: &Self::Texture) -> Result<(), BackendError> {
        self.registered.push(clip.name.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSummary {
    pub name: String,
    pub frames: usize,
    pub frame_rate: f64,
    pub looping: bool,
}

/// What a character definition loads into.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarReport {
    pub character_id: String,
    pub name: String,
    pub sheet_id: String,
    pub columns: u32,
    pub rows: u32,
    pub memory_bytes: usize,
    pub animations: Vec<AnimationSummary>,
    pub registered: Vec<String>,
    pub initial_animation: Option<String>,
}

impl AvatarReport {
    /// Run the full load path against a [`DryRunBackend`].
    pub fn load(character: &CharacterDefinition) -> Result<Self, AvatarError> {
        let mut renderer = AvatarRenderer::new(DryRunBackend::default(), RendererConfig::default());
        let loaded = renderer.load_character(character)?;
        let sheet = &character.sheet;
        Ok(Self {
            character_id: loaded.character_id,
            name: character.name.clone(),
            sheet_id: loaded.sheet_id,
            columns: sheet.columns(),
            rows: sheet.rows(),
            memory_bytes: sheet.memory_estimate(),
            animations: sheet
                .animations
                .iter()
                .map(|a| AnimationSummary {
                    name: a.name.clone(),
                    frames: a.frames.len(),
                    frame_rate: a.frame_rate,
                    looping: a.looping,
                })
                .collect(),
            registered: renderer.backend().registered.clone(),
            initial_animation: loaded.initial_animation,
        })
    }
}

impl fmt::Display for AvatarReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "character {} ({})", self.name, self.character_id)?;
        writeln!(f, "sheet     {} ({}x{} frames)", self.sheet_id, self.columns, self.rows)?;
        #[allow(clippy::cast_precision_loss)]
        let mb = self.memory_bytes as f64 / (1024.0 * 1024.0);
        writeln!(f, "memory    {} bytes ({mb:.2} MB)", self.memory_bytes)?;
        for anim in &self.animations {
            let marker = if self.initial_animation.as_deref() == Some(anim.name.as_str()) { "*" } else { " " };
            let mode = if anim.looping { "loop" } else { "once" };
            writeln!(f, " {marker}{:<14}{} frames @ {} fps, {mode}", anim.name, anim.frames, anim.frame_rate)?;
        }
        write!(f, "clips     {} registered", self.registered.len())
    }
}

/// Sheet frames a preview of `animation` would show over `duration_ms` of callbacks every
/// `step_ms`. Consecutive repeats collapse into one entry.
///
/// Returns `None` when the character has no such animation.
#[must_use]
pub fn simulate_playback(character: &CharacterDefinition, animation: &str, duration_ms: f64, step_ms: f64) -> Option<Vec<u32>> {
    let anim = character.sheet.animation(animation)?;
    let (mut preview, _handle) = PreviewLoop::start(FramePlayer::from_animation(anim));
    let mut drawn = Vec::new();
    let step = step_ms.max(1.0);
    let mut now = 0.0;
    while now <= duration_ms {
        match preview.on_frame(now) {
            FrameStep::Continue { frame } => {
                if let Some(&index) = anim.frames.get(frame) {
                    if drawn.last() != Some(&index) {
                        drawn.push(index);
                    }
                }
            }
            FrameStep::Stop => break,
        }
        now += step;
    }
    Some(drawn)
}
