//! Editor tools, raw input values, and the pointer gesture state.
//!
//! Drags that mutate shapes carry the pre-gesture [`EditorSnapshot`] so the
//! release can record a single history entry, and Escape can put it back.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::doc::ShapeId;
use crate::history::EditorSnapshot;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    /// Drag pans the viewport.
    Pan,
    /// Drag draws a rectangle.
    Rectangle,
    /// Clicks place polygon vertices.
    Polygon,
}

impl Tool {
    /// Whether this tool creates shapes.
    #[must_use]
    pub fn is_drawing(self) -> bool {
        matches!(self, Self::Rectangle | Self::Polygon)
    }
}

/// Modifier keys held when the event fired.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Alt on Windows/Linux, Option on macOS. Alt-click deletes a polygon vertex.
    pub alt: bool,
    /// Command on macOS.
    pub meta: bool,
}

impl Modifiers {
    /// Toggle-select and shortcut modifier: ctrl, or cmd on macOS.
    #[must_use]
    pub fn is_multi(self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    /// Always pans, whatever the tool.
    Middle,
    Secondary,
}

/// Browser `KeyboardEvent.key` value, e.g. `"Escape"`, `"ArrowLeft"`, `"z"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel delta in pixels; positive `dy` scrolls down (zooms out).
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the viewport.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
    },
    /// A drag-to-select gesture; the rectangle itself lives in the selection engine.
    Marquee,
    /// The user is moving the selected shapes.
    DraggingShapes {
        /// Shape under the pointer at press time.
        hit: ShapeId,
        /// Screen-space press position; the drag threshold is measured from here.
        start_screen: Point,
        /// World-space press position.
        start_world: Point,
        /// Offset already applied to the shapes, so each move applies only the remainder.
        applied: Point,
        /// Set once the pointer has travelled past the drag threshold.
        moved: bool,
        /// Editor state before the drag, recorded into history on release.
        before: Box<EditorSnapshot>,
    },
    /// The user is drawing a rectangle from an anchor corner.
    DrawingRect {
        /// World-space corner where the drag started.
        anchor_world: Point,
        /// World-space position of the latest move.
        current_world: Point,
    },
    /// The user is dragging a single polygon vertex.
    DraggingVertex {
        /// Polygon being edited.
        id: ShapeId,
        /// Vertex index in the polygon.
        index: usize,
        /// Editor state before the drag, recorded into history on release.
        before: Box<EditorSnapshot>,
    },
}
