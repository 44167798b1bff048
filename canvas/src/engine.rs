//! Map editor orchestration.
//!
//! [`EngineCore`] owns the document, selection, camera, grid, active tool,
//! gesture state, the polygon draft, and the selection and history engines.
//! Host events come in through the `on_*` handlers and the data operations;
//! every call returns the [`Action`]s the host must carry out (persist a
//! shape, update chrome, redraw).
//!
//! Discrete actions (add, delete, transform, finish drawing, group, ungroup,
//! detail edits, nudges) capture the editor snapshot first, mutate, and push
//! that snapshot to history only once the mutation succeeded.
//!
//! [`Engine`] wraps the core with a [`Surface`], the host rendering
//! capability, and forwards redraw requests to it.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::Cell;
use std::mem;

use web_sys::HtmlCanvasElement;

use crate::camera::{Bounds, Camera, Point, fit_viewport};
use crate::consts::MIN_POLYGON_VERTICES;
use crate::context::{EditorContext, FLAG_GROUP_SELECTION, FLAG_MARQUEE_SELECTION, GridConfig};
use crate::doc::{Geometry, GeometryError, Shape, ShapeCategory, ShapeId, ShapeList};
use crate::error::ErrorCode;
use crate::history::{EditorSnapshot, HistoryEngine, HistoryStatus};
use crate::hit::{hit_edge_midpoint, hit_shape, hit_vertex};
use crate::input::{Button, InputState, Key, Modifiers, Tool, WheelDelta};
use crate::persist::{self, PersistError, PersistedMap};
use crate::select::{Selection, SelectionEngine};
use crate::transform::{self, TransformDelta, TransformError, snap_to_grid};

/// Actions returned from engine calls for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ShapeCreated(Shape),
    ShapesUpdated(Vec<Shape>),
    ShapesDeleted(Vec<ShapeId>),
    SelectionChanged(Vec<ShapeId>),
    HistoryChanged { can_undo: bool, can_redo: bool },
    SetCursor(String),
    RenderNeeded,
}

/// Why an engine operation was rejected.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("shape {0} not found")]
    UnknownShape(ShapeId),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl ErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownShape(_) => "E_UNKNOWN_SHAPE",
            Self::Geometry(e) => e.error_code(),
            Self::Transform(e) => e.error_code(),
            Self::Persist(e) => e.error_code(),
        }
    }
}

/// A polygon handle under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Handle {
    Vertex { id: ShapeId, index: usize },
    EdgeMidpoint { id: ShapeId, edge: usize },
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub ctx: EditorContext,
    pub shapes: ShapeList,
    pub camera: Camera,
    pub grid: GridConfig,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    tool: Tool,
    draw_category: ShapeCategory,
    selection: Selection,
    selector: SelectionEngine,
    history: HistoryEngine,
    draft: Vec<Point>,
    draft_cursor: Option<Point>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(EditorContext::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(ctx: EditorContext) -> Self {
        let mut selector = SelectionEngine::new(ctx.config.drag_threshold_px);
        selector.group_expansion = ctx.flags.is_enabled(FLAG_GROUP_SELECTION);
        selector.marquee_enabled = ctx.flags.is_enabled(FLAG_MARQUEE_SELECTION);
        let history = HistoryEngine::new(ctx.config.history_max_size);
        let grid = ctx.config.grid;
        Self {
            ctx,
            shapes: ShapeList::new(),
            camera: Camera::default(),
            grid,
            input: InputState::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            tool: Tool::default(),
            draw_category: ShapeCategory::Interactive,
            selection: Selection::new(),
            selector,
            history,
            draft: Vec::new(),
            draft_cursor: None,
        }
    }

    // --- Data inputs ---

    /// Replace the document with a persisted map. Clears history and any gesture.
    ///
    /// Shapes failing validation are dropped with a warning.
    pub fn load_map(&mut self, map: PersistedMap) -> Vec<Action> {
        let min_size = self.ctx.config.min_shape_size;
        let shapes: Vec<Shape> = map
            .shapes
            .into_iter()
            .filter(|s| match s.geometry.validate(min_size) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(shape_id = %s.id, code = e.error_code(), error = %e, "skipping invalid shape on load");
                    false
                }
            })
            .collect();
        self.shapes.load(shapes);
        self.selection = map.selected_ids.into_iter().filter(|id| self.shapes.contains(id)).collect();
        self.history.clear_history();
        self.reset_gestures();
        tracing::info!(shapes = self.shapes.len(), selected = self.selection.len(), "map loaded");
        vec![
            Action::SelectionChanged(self.selected_ids()),
            self.history_changed(),
            Action::RenderNeeded,
        ]
    }

    /// Decode a persisted map from JSON text and load it.
    pub fn load_map_json(&mut self, json: &str) -> Result<Vec<Action>, EngineError> {
        let config = &self.ctx.config;
        let loaded = persist::decode_with_min_size(json, config.snapshot_version, config.min_shape_size)?;
        Ok(self.load_map(loaded.map))
    }

    /// The document as it should be saved.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedMap {
        PersistedMap {
            shapes: self.shapes.as_slice().to_vec(),
            selected_ids: self.selection.clone(),
            version: self.ctx.config.snapshot_version,
            timestamp: self.ctx.now(),
        }
    }

    /// Add a host-built shape (e.g. an imported image). Does not change the selection.
    pub fn add_shape(&mut self, shape: Shape) -> Result<Vec<Action>, EngineError> {
        shape.geometry.validate(self.ctx.config.min_shape_size)?;
        Ok(self.commit_new_shape(shape, "add shape", false))
    }

    /// Set a shape's name and description.
    pub fn update_shape_details(
        &mut self,
        id: ShapeId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Vec<Action>, EngineError> {
        let mut updated = self.shapes.get(&id).cloned().ok_or(EngineError::UnknownShape(id))?;
        if updated.metadata.name == name && updated.metadata.description == description {
            return Ok(Vec::new());
        }
        let before = self.snapshot();
        updated.metadata.name = name;
        updated.metadata.description = description;
        updated.metadata.modified_at = self.ctx.now();
        self.shapes.insert(updated.clone());
        let mut actions = vec![Action::ShapesUpdated(vec![updated])];
        self.record(&before, "edit details", &mut actions);
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// Delete every selected shape.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        let before = self.snapshot();
        let deleted: Vec<ShapeId> =
            mem::take(&mut self.selection).into_iter().filter(|id| self.shapes.remove(id).is_some()).collect();
        tracing::debug!(count = deleted.len(), "shapes deleted");
        let mut actions = vec![Action::ShapesDeleted(deleted), Action::SelectionChanged(Vec::new())];
        self.record(&before, "delete shapes", &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Put every selected shape into one new group. Needs at least two shapes.
    pub fn group_selected(&mut self) -> Vec<Action> {
        if self.selection.len() < 2 {
            return Vec::new();
        }
        let before = self.snapshot();
        let group_id = ShapeId::generate().to_string();
        let now = self.ctx.now();
        let updated = self.edit_selected(|shape| {
            shape.metadata.group_id = Some(group_id.clone());
            shape.metadata.modified_at = now;
            true
        });
        tracing::debug!(group_id = %group_id, members = updated.len(), "shapes grouped");
        self.commit_updates(&before, updated, "group shapes")
    }

    /// Clear the group of every selected shape.
    pub fn ungroup_selected(&mut self) -> Vec<Action> {
        if !self.selection.iter().any(|id| self.shapes.get(id).is_some_and(|s| s.group_id().is_some())) {
            return Vec::new();
        }
        let before = self.snapshot();
        let now = self.ctx.now();
        let updated = self.edit_selected(|shape| {
            if shape.metadata.group_id.take().is_none() {
                return false;
            }
            shape.metadata.modified_at = now;
            true
        });
        self.commit_updates(&before, updated, "ungroup shapes")
    }

    /// Apply a transform reported by the host's transform handles.
    pub fn transform_shape(&mut self, id: ShapeId, delta: TransformDelta) -> Result<Vec<Action>, EngineError> {
        let shape = self.shapes.get(&id).ok_or(EngineError::UnknownShape(id))?;
        let updated = transform::apply(shape, delta, self.ctx.now(), self.ctx.config.min_shape_size)?;
        let before = self.snapshot();
        self.shapes.insert(updated.clone());
        let mut actions = vec![Action::ShapesUpdated(vec![updated])];
        self.record(&before, "transform shape", &mut actions);
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// Remove one vertex from a polygon.
    pub fn delete_vertex(&mut self, id: ShapeId, index: usize) -> Result<Vec<Action>, EngineError> {
        let shape = self.shapes.get(&id).ok_or(EngineError::UnknownShape(id))?;
        let updated = transform::delete_vertex(shape, index, self.ctx.now())?;
        let before = self.snapshot();
        self.shapes.insert(updated.clone());
        let mut actions = vec![Action::ShapesUpdated(vec![updated])];
        self.record(&before, "delete vertex", &mut actions);
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// Replace the grid configuration.
    pub fn set_grid(&mut self, grid: GridConfig) -> Vec<Action> {
        self.grid = grid;
        vec![Action::RenderNeeded]
    }

    // --- Tool / viewport ---

    /// Switch tools. Any gesture or polygon draft in progress is dropped.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        if tool == self.tool {
            return Vec::new();
        }
        self.reset_gestures();
        self.tool = tool;
        self.selector.enabled = tool == Tool::Select;
        vec![Action::SetCursor(cursor_for(tool).to_string()), Action::RenderNeeded]
    }

    /// Category given to newly drawn shapes.
    pub fn set_draw_category(&mut self, category: ShapeCategory) {
        self.draw_category = category;
    }

    /// Update viewport dimensions in CSS pixels.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64) -> Vec<Action> {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        vec![Action::RenderNeeded]
    }

    /// Fit every shape into the viewport. No-op on an empty map.
    pub fn zoom_to_fit(&mut self) -> Vec<Action> {
        match self.shapes.bounds() {
            Some(bounds) => self.fit_to(&bounds),
            None => Vec::new(),
        }
    }

    /// Fit the selected shapes into the viewport. No-op with nothing selected.
    pub fn zoom_to_selection(&mut self) -> Vec<Action> {
        match self.shapes.bounds_of(&self.selection) {
            Some(bounds) => self.fit_to(&bounds),
            None => Vec::new(),
        }
    }

    /// Multiply the zoom, anchored at the viewport center.
    pub fn zoom_by(&mut self, factor: f64) -> Vec<Action> {
        let center = Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5);
        self.zoom_by_at(factor, center)
    }

    /// Multiply the zoom, keeping the world point under `screen_pt` fixed.
    pub fn zoom_by_at(&mut self, factor: f64, screen_pt: Point) -> Vec<Action> {
        if !factor.is_finite() || factor <= 0.0 {
            return Vec::new();
        }
        self.camera.zoom_at(screen_pt, factor, self.ctx.config.interactive_zoom);
        vec![Action::RenderNeeded]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let world_pt = self.camera.screen_to_world(screen_pt);
        if button == Button::Middle || (button == Button::Primary && self.tool == Tool::Pan) {
            self.input = InputState::Panning { last_screen: screen_pt };
            return vec![Action::SetCursor("grabbing".to_string())];
        }
        if button != Button::Primary {
            return Vec::new();
        }
        match self.tool {
            Tool::Select => self.select_down(screen_pt, world_pt, modifiers),
            Tool::Rectangle => {
                let anchor = snap_point(world_pt, self.snap_size());
                self.input = InputState::DrawingRect { anchor_world: anchor, current_world: anchor };
                Vec::new()
            }
            Tool::Polygon => self.polygon_click(world_pt),
            Tool::Pan => Vec::new(),
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world_pt = self.camera.screen_to_world(screen_pt);
        let snap = self.snap_size();
        let threshold = self.ctx.config.drag_threshold_px;
        let now = self.ctx.now();

        match &mut self.input {
            InputState::Idle => {
                if self.tool == Tool::Polygon && !self.draft.is_empty() {
                    self.draft_cursor = Some(snap_point(world_pt, snap));
                    return vec![Action::RenderNeeded];
                }
                Vec::new()
            }
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                self.camera.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            InputState::Marquee => match self.selector.update_marquee(screen_pt, world_pt) {
                Some(_) => vec![Action::RenderNeeded],
                None => Vec::new(),
            },
            InputState::DraggingShapes { start_screen, start_world, applied, moved, .. } => {
                if !*moved {
                    if start_screen.distance(screen_pt) <= threshold {
                        return Vec::new();
                    }
                    *moved = true;
                }
                let raw = Point::new(world_pt.x - start_world.x, world_pt.y - start_world.y);
                let offset = snap_point(raw, snap);
                let (dx, dy) = (offset.x - applied.x, offset.y - applied.y);
                *applied = offset;
                if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
                    return Vec::new();
                }
                for id in &self.selection {
                    if let Some(shape) = self.shapes.get_mut(id) {
                        shape.geometry.translate(dx, dy);
                    }
                }
                vec![Action::RenderNeeded]
            }
            InputState::DrawingRect { current_world, .. } => {
                *current_world = snap_point(world_pt, snap);
                vec![Action::RenderNeeded]
            }
            InputState::DraggingVertex { id, index, .. } => {
                let Some(shape) = self.shapes.get(id) else {
                    return Vec::new();
                };
                match transform::move_vertex(shape, *index, snap_point(world_pt, snap), now) {
                    Ok(updated) => {
                        self.shapes.insert(updated);
                        vec![Action::RenderNeeded]
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "vertex drag step rejected");
                        Vec::new()
                    }
                }
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, modifiers: Modifiers) -> Vec<Action> {
        let world_pt = self.camera.screen_to_world(screen_pt);
        match mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } => vec![Action::SetCursor(cursor_for(self.tool).to_string())],
            InputState::Marquee => {
                self.selector.update_marquee(screen_pt, world_pt);
                let next = self.selector.end_marquee(&self.shapes, &self.selection);
                let mut actions = vec![Action::RenderNeeded];
                self.apply_selection(next, &mut actions);
                self.ctx.perf.record("selection_size", as_sample(self.selection.len()));
                finish(actions)
            }
            InputState::DraggingShapes { hit, moved, before, .. } => {
                let mut actions = Vec::new();
                if !moved {
                    // Press and release on a selected shape narrows the selection to it.
                    let next = self.selector.click(&self.shapes, &self.selection, Some(hit), modifiers);
                    self.apply_selection(next, &mut actions);
                    return finish(actions);
                }
                let net = before.shapes.iter().any(|old| {
                    self.selection.contains(&old.id)
                        && self.shapes.get(&old.id).is_some_and(|s| s.geometry != old.geometry)
                });
                if !net {
                    // Snapped back to the start: nothing to record.
                    return Vec::new();
                }
                let now = self.ctx.now();
                let updated = self.edit_selected(|shape| {
                    shape.metadata.modified_at = now;
                    true
                });
                self.commit_updates(&before, updated, "move shapes")
            }
            InputState::DrawingRect { anchor_world, .. } => {
                let current = snap_point(world_pt, self.snap_size());
                self.finish_rectangle(anchor_world, current)
            }
            InputState::DraggingVertex { id, before, .. } => {
                let Some(mut shape) = self.shapes.get(&id).cloned() else {
                    return Vec::new();
                };
                let unchanged = before.shapes.iter().any(|s| s.id == id && s.geometry == shape.geometry);
                if unchanged {
                    return Vec::new();
                }
                shape.metadata.modified_at = self.ctx.now();
                self.shapes.insert(shape.clone());
                let mut actions = vec![Action::ShapesUpdated(vec![shape])];
                self.record(&before, "move vertex", &mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
        }
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        if delta.dy.abs() < f64::EPSILON {
            if delta.dx.abs() < f64::EPSILON {
                return Vec::new();
            }
            self.camera.pan_by(-delta.dx, 0.0);
            return vec![Action::RenderNeeded];
        }
        let step = self.ctx.config.wheel_zoom_step;
        let factor = if delta.dy < 0.0 { step } else { 1.0 / step };
        self.zoom_by_at(factor, screen_pt)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        let idle = matches!(self.input, InputState::Idle);
        if modifiers.is_multi() {
            if key.is("z") && idle {
                return if modifiers.shift { self.redo() } else { self.undo() };
            }
            if key.is("y") && idle {
                return self.redo();
            }
            if key.is("a") {
                let next = self.selector.select_all(&self.shapes, &self.selection);
                let mut actions = Vec::new();
                self.apply_selection(next, &mut actions);
                return finish(actions);
            }
        }
        if key.is("Escape") {
            return self.escape();
        }
        if !idle {
            return Vec::new();
        }
        if key.is("Delete") || key.is("Backspace") {
            return self.delete_selected();
        }
        if key.is("Enter") && self.tool == Tool::Polygon {
            return self.finish_polygon();
        }
        let step = if modifiers.shift { self.ctx.config.nudge_step_large } else { self.ctx.config.nudge_step };
        let nudge = if key.is("ArrowLeft") {
            Some((-step, 0.0))
        } else if key.is("ArrowRight") {
            Some((step, 0.0))
        } else if key.is("ArrowUp") {
            Some((0.0, -step))
        } else if key.is("ArrowDown") {
            Some((0.0, step))
        } else {
            None
        };
        match nudge {
            Some((dx, dy)) => self.nudge_selected(dx, dy),
            None => Vec::new(),
        }
    }

    /// Close the polygon draft into a shape. Needs at least three vertices.
    pub fn finish_polygon(&mut self) -> Vec<Action> {
        if self.draft.len() < MIN_POLYGON_VERTICES {
            tracing::debug!(vertices = self.draft.len(), "polygon draft too short to close");
            return Vec::new();
        }
        let points: Vec<f64> = self.draft.iter().flat_map(|p| [p.x, p.y]).collect();
        self.draft.clear();
        self.draft_cursor = None;
        let shape = Shape::new(self.draw_category, Geometry::Polygon { points, rotation: None }, self.ctx.now());
        self.commit_new_shape(shape, "draw polygon", true)
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        let current = self.snapshot();
        match self.history.undo(&current) {
            Some(previous) => self.restore(previous),
            None => Vec::new(),
        }
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let current = self.snapshot();
        match self.history.redo(&current) {
            Some(next) => self.restore(next),
            None => Vec::new(),
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    /// Label of the action `undo` would revert.
    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn selected_ids(&self) -> Vec<ShapeId> {
        self.selection.iter().cloned().collect()
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Committed vertices of the polygon being drawn.
    #[must_use]
    pub fn polygon_draft(&self) -> &[Point] {
        &self.draft
    }

    /// Pointer position to preview the next polygon edge to.
    #[must_use]
    pub fn draft_cursor(&self) -> Option<Point> {
        self.draft_cursor
    }

    /// Marquee rectangle to draw, once the drag is past the threshold.
    #[must_use]
    pub fn marquee(&self) -> Option<Bounds> {
        self.selector.marquee()
    }

    /// Rectangle being drawn, in world coordinates.
    #[must_use]
    pub fn drawing_preview(&self) -> Option<Bounds> {
        match &self.input {
            InputState::DrawingRect { anchor_world, current_world } => {
                Some(Bounds::from_corners(*anchor_world, *current_world))
            }
            _ => None,
        }
    }

    /// Copy of everything undo/redo restores.
    #[must_use]
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            shapes: self.shapes.as_slice().to_vec(),
            selected_ids: self.selection.clone(),
            viewport: self.camera,
            grid: self.grid,
            tool: self.tool,
        }
    }

    // --- Internals ---

    fn select_down(&mut self, screen_pt: Point, world_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        if let Some(handle) = self.handle_at(world_pt) {
            return self.begin_handle_gesture(handle, modifiers);
        }
        let mut actions = Vec::new();
        match hit_shape(&self.shapes, world_pt) {
            Some(id) if modifiers.is_multi() => {
                let next = self.selector.click(&self.shapes, &self.selection, Some(id), modifiers);
                self.apply_selection(next, &mut actions);
            }
            Some(id) => {
                if !self.selection.contains(&id) {
                    let next = self.selector.click(&self.shapes, &self.selection, Some(id.clone()), modifiers);
                    self.apply_selection(next, &mut actions);
                }
                self.input = InputState::DraggingShapes {
                    hit: id,
                    start_screen: screen_pt,
                    start_world: world_pt,
                    applied: Point::new(0.0, 0.0),
                    moved: false,
                    before: Box::new(self.snapshot()),
                };
            }
            None if self.selector.marquee_enabled => {
                self.selector.begin_marquee(screen_pt, world_pt, modifiers);
                self.input = InputState::Marquee;
            }
            None => {
                let next = self.selector.click(&self.shapes, &self.selection, None, modifiers);
                self.apply_selection(next, &mut actions);
            }
        }
        finish(actions)
    }

    /// Vertex or edge-midpoint handle of the single selected polygon under `world_pt`.
    fn handle_at(&self, world_pt: Point) -> Option<Handle> {
        if self.selection.len() != 1 {
            return None;
        }
        let id = self.selection.first()?.clone();
        let Geometry::Polygon { points, .. } = &self.shapes.get(&id)?.geometry else {
            return None;
        };
        let radius = self.camera.screen_dist_to_world(self.ctx.config.handle_radius_px);
        if let Some(index) = hit_vertex(points, world_pt, radius) {
            return Some(Handle::Vertex { id, index });
        }
        hit_edge_midpoint(points, world_pt, radius).map(|edge| Handle::EdgeMidpoint { id, edge })
    }

    fn begin_handle_gesture(&mut self, handle: Handle, modifiers: Modifiers) -> Vec<Action> {
        match handle {
            Handle::Vertex { id, index } if modifiers.alt => match self.delete_vertex(id, index) {
                Ok(actions) => actions,
                Err(e) => {
                    tracing::debug!(code = e.error_code(), error = %e, "vertex delete rejected");
                    Vec::new()
                }
            },
            Handle::Vertex { id, index } => {
                self.input = InputState::DraggingVertex { id, index, before: Box::new(self.snapshot()) };
                vec![Action::SetCursor("move".to_string())]
            }
            Handle::EdgeMidpoint { id, edge } => {
                let Some(shape) = self.shapes.get(&id) else {
                    return Vec::new();
                };
                let (updated, index) = match transform::insert_vertex_after(shape, edge, self.ctx.now()) {
                    Ok(inserted) => inserted,
                    Err(e) => {
                        tracing::debug!(code = e.error_code(), error = %e, "vertex insert rejected");
                        return Vec::new();
                    }
                };
                let before = self.snapshot();
                self.shapes.insert(updated.clone());
                let mut actions = vec![Action::ShapesUpdated(vec![updated])];
                self.record(&before, "insert vertex", &mut actions);
                self.input = InputState::DraggingVertex { id, index, before: Box::new(self.snapshot()) };
                actions.push(Action::SetCursor("move".to_string()));
                actions.push(Action::RenderNeeded);
                actions
            }
        }
    }

    fn polygon_click(&mut self, world_pt: Point) -> Vec<Action> {
        let radius = self.camera.screen_dist_to_world(self.ctx.config.handle_radius_px);
        let closes = self.draft.len() >= MIN_POLYGON_VERTICES && self.draft[0].distance(world_pt) <= radius;
        if closes {
            return self.finish_polygon();
        }
        let vertex = snap_point(world_pt, self.snap_size());
        self.draft.push(vertex);
        vec![Action::RenderNeeded]
    }

    fn finish_rectangle(&mut self, anchor: Point, current: Point) -> Vec<Action> {
        let b = Bounds::from_corners(anchor, current);
        let min_size = self.ctx.config.min_shape_size;
        if b.width < min_size && b.height < min_size {
            tracing::debug!(width = b.width, height = b.height, "rectangle too small, nothing drawn");
            return vec![Action::RenderNeeded];
        }
        let geometry = Geometry::Rectangle {
            x: b.x,
            y: b.y,
            width: b.width.max(min_size),
            height: b.height.max(min_size),
            rotation: None,
        };
        let shape = Shape::new(self.draw_category, geometry, self.ctx.now());
        self.commit_new_shape(shape, "draw rectangle", true)
    }

    fn commit_new_shape(&mut self, shape: Shape, description: &str, select: bool) -> Vec<Action> {
        if let Err(e) = shape.geometry.validate(self.ctx.config.min_shape_size) {
            tracing::warn!(code = e.error_code(), error = %e, "new shape rejected");
            return vec![Action::RenderNeeded];
        }
        let before = self.snapshot();
        let id = shape.id.clone();
        tracing::debug!(shape_id = %id, kind = shape.geometry.kind_name(), description, "shape created");
        self.shapes.insert(shape.clone());
        let mut actions = vec![Action::ShapeCreated(shape)];
        if select {
            self.selection = std::iter::once(id.clone()).collect();
            actions.push(Action::SelectionChanged(vec![id]));
        }
        self.record(&before, description, &mut actions);
        self.ctx.perf.record("shape_count", as_sample(self.shapes.len()));
        actions.push(Action::RenderNeeded);
        actions
    }

    fn nudge_selected(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        let before = self.snapshot();
        let now = self.ctx.now();
        let updated = self.edit_selected(|shape| {
            shape.geometry.translate(dx, dy);
            shape.metadata.modified_at = now;
            true
        });
        self.commit_updates(&before, updated, "nudge shapes")
    }

    /// Run `edit` on each selected shape; collect the ones it reports as changed.
    fn edit_selected(&mut self, mut edit: impl FnMut(&mut Shape) -> bool) -> Vec<Shape> {
        let mut updated = Vec::new();
        for id in &self.selection {
            if let Some(shape) = self.shapes.get_mut(id) {
                if edit(shape) {
                    updated.push(shape.clone());
                }
            }
        }
        updated
    }

    fn commit_updates(&mut self, before: &EditorSnapshot, updated: Vec<Shape>, description: &str) -> Vec<Action> {
        if updated.is_empty() {
            return Vec::new();
        }
        let mut actions = vec![Action::ShapesUpdated(updated)];
        self.record(before, description, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    fn escape(&mut self) -> Vec<Action> {
        if !self.draft.is_empty() {
            self.draft.clear();
            self.draft_cursor = None;
            return vec![Action::RenderNeeded];
        }
        match mem::take(&mut self.input) {
            InputState::DraggingShapes { before, .. } | InputState::DraggingVertex { before, .. } => {
                let mut actions = diff_shapes(self.shapes.as_slice(), &before.shapes);
                self.shapes.load(before.shapes);
                self.selection = before.selected_ids;
                actions.push(Action::SetCursor(cursor_for(self.tool).to_string()));
                actions.push(Action::RenderNeeded);
                actions
            }
            InputState::Marquee => {
                self.selector.cancel_marquee();
                vec![Action::RenderNeeded]
            }
            InputState::DrawingRect { .. } => vec![Action::RenderNeeded],
            InputState::Panning { .. } => vec![Action::SetCursor(cursor_for(self.tool).to_string())],
            InputState::Idle => {
                let next = self.selector.clear_selection(&self.selection);
                let mut actions = Vec::new();
                self.apply_selection(next, &mut actions);
                finish(actions)
            }
        }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) -> Vec<Action> {
        self.history.begin_restore();
        let mut actions = diff_shapes(self.shapes.as_slice(), &snapshot.shapes);
        self.shapes.load(snapshot.shapes);
        if self.selection != snapshot.selected_ids {
            self.selection = snapshot.selected_ids;
            actions.push(Action::SelectionChanged(self.selected_ids()));
        }
        self.camera = snapshot.viewport;
        self.grid = snapshot.grid;
        if self.tool != snapshot.tool {
            self.tool = snapshot.tool;
            self.selector.enabled = self.tool == Tool::Select;
            actions.push(Action::SetCursor(cursor_for(self.tool).to_string()));
        }
        self.reset_gestures();
        self.history.end_restore();
        actions.push(self.history_changed());
        actions.push(Action::RenderNeeded);
        actions
    }

    fn record(&mut self, before: &EditorSnapshot, description: &str, actions: &mut Vec<Action>) {
        if self.history.push_state(before, Some(description)) {
            actions.push(self.history_changed());
        }
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() }
    }

    fn apply_selection(&mut self, next: Option<Selection>, actions: &mut Vec<Action>) {
        let Some(next) = next else {
            return;
        };
        if next == self.selection {
            return;
        }
        self.selection = next;
        actions.push(Action::SelectionChanged(self.selected_ids()));
        actions.push(Action::RenderNeeded);
    }

    fn fit_to(&mut self, bounds: &Bounds) -> Vec<Action> {
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            tracing::debug!("fit skipped: viewport size unknown");
            return Vec::new();
        }
        let config = &self.ctx.config;
        self.camera =
            fit_viewport(bounds, self.viewport_width, self.viewport_height, config.fit_padding, config.fit_zoom);
        vec![Action::RenderNeeded]
    }

    fn snap_size(&self) -> Option<f64> {
        self.grid.snap.then_some(self.grid.size)
    }

    fn reset_gestures(&mut self) {
        self.input = InputState::Idle;
        self.selector.cancel_marquee();
        self.draft.clear();
        self.draft_cursor = None;
    }
}

fn cursor_for(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "default",
        Tool::Pan => "grab",
        Tool::Rectangle | Tool::Polygon => "crosshair",
    }
}

fn snap_point(p: Point, grid_size: Option<f64>) -> Point {
    match grid_size {
        Some(size) => Point::new(snap_to_grid(p.x, size), snap_to_grid(p.y, size)),
        None => p,
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_sample(n: usize) -> f64 {
    n as f64
}

/// Collapse repeated redraw requests into a single trailing one.
fn finish(mut actions: Vec<Action>) -> Vec<Action> {
    let len = actions.len();
    actions.retain(|a| !matches!(a, Action::RenderNeeded));
    if actions.len() != len {
        actions.push(Action::RenderNeeded);
    }
    actions
}

/// Actions that take the host from `from` to `to`.
fn diff_shapes(from: &[Shape], to: &[Shape]) -> Vec<Action> {
    let mut actions = Vec::new();
    let deleted: Vec<ShapeId> = from.iter().filter(|s| !to.iter().any(|t| t.id == s.id)).map(|s| s.id.clone()).collect();
    if !deleted.is_empty() {
        actions.push(Action::ShapesDeleted(deleted));
    }
    let mut updated = Vec::new();
    for shape in to {
        match from.iter().find(|s| s.id == shape.id) {
            None => actions.push(Action::ShapeCreated(shape.clone())),
            Some(old) if old != shape => updated.push(shape.clone()),
            Some(_) => {}
        }
    }
    if !updated.is_empty() {
        actions.push(Action::ShapesUpdated(updated));
    }
    actions
}

/// Rendering capability provided by the host.
pub trait Surface {
    /// Last pointer position in canvas CSS pixels, if the pointer is over the canvas.
    fn pointer_position(&self) -> Option<Point>;

    /// Map a canvas point to world coordinates.
    fn invert_transform(&self, point: Point, camera: &Camera) -> Point {
        camera.screen_to_world(point)
    }

    /// Ask the host to redraw on its next frame.
    fn request_redraw(&self);

    /// The canvas was resized to `width_css` x `height_css` at device pixel ratio `dpr`.
    fn resize(&self, _width_css: f64, _height_css: f64, _dpr: f64) {}
}

/// The full editor engine. Wraps `EngineCore` and a host [`Surface`].
pub struct Engine<S: Surface> {
    surface: S,
    pub core: EngineCore,
}

impl<S: Surface> Engine<S> {
    #[must_use]
    pub fn new(surface: S, ctx: EditorContext) -> Self {
        Self { surface, core: EngineCore::new(ctx) }
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn dispatch(&self, actions: Vec<Action>) -> Vec<Action> {
        if actions.iter().any(|a| matches!(a, Action::RenderNeeded)) {
            self.surface.request_redraw();
        }
        actions
    }

    fn dispatch_result(&self, result: Result<Vec<Action>, EngineError>) -> Result<Vec<Action>, EngineError> {
        result.map(|actions| self.dispatch(actions))
    }

    /// World position under the pointer, if the pointer is over the canvas.
    #[must_use]
    pub fn pointer_world(&self) -> Option<Point> {
        self.surface.pointer_position().map(|p| self.surface.invert_transform(p, &self.core.camera))
    }

    // --- Delegated data inputs ---

    pub fn load_map(&mut self, map: PersistedMap) -> Vec<Action> {
        let actions = self.core.load_map(map);
        self.dispatch(actions)
    }

    pub fn load_map_json(&mut self, json: &str) -> Result<Vec<Action>, EngineError> {
        let result = self.core.load_map_json(json);
        self.dispatch_result(result)
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedMap {
        self.core.to_persisted()
    }

    pub fn add_shape(&mut self, shape: Shape) -> Result<Vec<Action>, EngineError> {
        let result = self.core.add_shape(shape);
        self.dispatch_result(result)
    }

    pub fn update_shape_details(
        &mut self,
        id: ShapeId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Vec<Action>, EngineError> {
        let result = self.core.update_shape_details(id, name, description);
        self.dispatch_result(result)
    }

    pub fn transform_shape(&mut self, id: ShapeId, delta: TransformDelta) -> Result<Vec<Action>, EngineError> {
        let result = self.core.transform_shape(id, delta);
        self.dispatch_result(result)
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        let actions = self.core.delete_selected();
        self.dispatch(actions)
    }

    pub fn group_selected(&mut self) -> Vec<Action> {
        let actions = self.core.group_selected();
        self.dispatch(actions)
    }

    pub fn ungroup_selected(&mut self) -> Vec<Action> {
        let actions = self.core.ungroup_selected();
        self.dispatch(actions)
    }

    pub fn set_grid(&mut self, grid: GridConfig) -> Vec<Action> {
        let actions = self.core.set_grid(grid);
        self.dispatch(actions)
    }

    // --- Tool / viewport ---

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let actions = self.core.set_tool(tool);
        self.dispatch(actions)
    }

    /// Resize the viewport (CSS pixels) and the surface backing store.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.surface.resize(width_css, height_css, dpr);
        let actions = self.core.set_viewport(width_css, height_css);
        self.dispatch(actions)
    }

    pub fn zoom_to_fit(&mut self) -> Vec<Action> {
        let actions = self.core.zoom_to_fit();
        self.dispatch(actions)
    }

    pub fn zoom_to_selection(&mut self) -> Vec<Action> {
        let actions = self.core.zoom_to_selection();
        self.dispatch(actions)
    }

    /// Zoom anchored at the pointer when it is over the canvas, else at the viewport center.
    pub fn zoom_by(&mut self, factor: f64) -> Vec<Action> {
        let actions = match self.surface.pointer_position() {
            Some(p) => self.core.zoom_by_at(factor, p),
            None => self.core.zoom_by(factor),
        };
        self.dispatch(actions)
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_down(screen_pt, button, modifiers);
        self.dispatch(actions)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_move(screen_pt, modifiers);
        self.dispatch(actions)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_up(screen_pt, button, modifiers);
        self.dispatch(actions)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_wheel(screen_pt, delta, modifiers);
        self.dispatch(actions)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_key_down(key, modifiers);
        self.dispatch(actions)
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        let actions = self.core.undo();
        self.dispatch(actions)
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let actions = self.core.redo();
        self.dispatch(actions)
    }

    #[must_use]
    pub fn history_status(&self) -> HistoryStatus {
        self.core.history_status()
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> &Selection {
        self.core.selection()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.core.camera()
    }

    #[must_use]
    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.core.shape(id)
    }
}

/// [`Surface`] over a browser canvas element.
///
/// The host feeds pointer positions in through [`WebSurface::track_pointer`]
/// and polls [`WebSurface::take_redraw`] from its animation frame callback.
pub struct WebSurface {
    canvas: HtmlCanvasElement,
    pointer: Cell<Option<Point>>,
    redraw: Cell<bool>,
}

impl WebSurface {
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, pointer: Cell::new(None), redraw: Cell::new(false) }
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Convert page client coordinates to canvas CSS pixels and remember them.
    pub fn track_pointer(&self, client_x: f64, client_y: f64) -> Point {
        let rect = self.canvas.get_bounding_client_rect();
        let p = Point::new(client_x - rect.left(), client_y - rect.top());
        self.pointer.set(Some(p));
        p
    }

    /// The pointer left the canvas.
    pub fn clear_pointer(&self) {
        self.pointer.set(None);
    }

    /// Canvas size in CSS pixels.
    #[must_use]
    pub fn css_size(&self) -> (f64, f64) {
        (f64::from(self.canvas.client_width()), f64::from(self.canvas.client_height()))
    }

    /// Whether a redraw was requested since the last call. Resets the flag.
    pub fn take_redraw(&self) -> bool {
        self.redraw.replace(false)
    }
}

impl Surface for WebSurface {
    fn pointer_position(&self) -> Option<Point> {
        self.pointer.get()
    }

    fn request_redraw(&self) {
        self.redraw.set(true);
    }

    /// Size the backing store in device pixels so drawing stays sharp on high-DPI screens.
    fn resize(&self, width_css: f64, height_css: f64, dpr: f64) {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.canvas.set_width(device_pixels(width_css, dpr));
        self.canvas.set_height(device_pixels(height_css, dpr));
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_pixels(css: f64, dpr: f64) -> u32 {
    (css * dpr).round().clamp(0.0, f64::from(u32::MAX)) as u32
}
