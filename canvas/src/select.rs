//! Selection engine: click, toggle, select-all, and marquee selection.
//!
//! The selection itself is owned by the caller (the engine core). Every
//! operation here takes the current selection and returns the selection that
//! should replace it, or `None` when nothing changes. The only state kept
//! between calls is the in-progress marquee gesture.
//!
//! Group membership is transparent: whenever a shape with a `group_id` is
//! picked, by click or by marquee, every shape sharing that id is picked with
//! it.

#[cfg(test)]
#[path = "select_test.rs"]
mod select_test;

use std::collections::BTreeSet;

use crate::camera::{Bounds, Point};
use crate::doc::{ShapeId, ShapeList};
use crate::hit::marquee_hits;
use crate::input::Modifiers;

/// The set of selected shape ids. Order carries no meaning.
pub type Selection = BTreeSet<ShapeId>;

/// An in-progress drag-to-select gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct MarqueeDrag {
    /// Screen-space press position; the drag threshold is measured from here.
    pub start_screen: Point,
    /// World-space press position; one corner of the marquee.
    pub start_world: Point,
    /// World-space position of the latest pointer move.
    pub current_world: Point,
    /// Set once the pointer has travelled past the threshold.
    pub active: bool,
    /// Whether ctrl/cmd was held at press time. Captured once; later
    /// modifier changes do not matter.
    pub additive: bool,
}

impl MarqueeDrag {
    /// Normalized world-space marquee rectangle.
    #[must_use]
    pub fn rect(&self) -> Bounds {
        Bounds::from_corners(self.start_world, self.current_world)
    }
}

/// Selection gesture state and selection transforms.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    /// When false (select tool not active) every operation is a no-op.
    pub enabled: bool,
    /// Expand picks through shared `group_id`.
    pub group_expansion: bool,
    /// Allow drag-to-select gestures.
    pub marquee_enabled: bool,
    drag_threshold_px: f64,
    drag: Option<MarqueeDrag>,
}

impl SelectionEngine {
    #[must_use]
    pub fn new(drag_threshold_px: f64) -> Self {
        Self { enabled: true, group_expansion: true, marquee_enabled: true, drag_threshold_px, drag: None }
    }

    // --- Direct operations ---

    /// Replace the selection with exactly `id`. Unknown ids change nothing.
    #[must_use]
    pub fn select_shape(&self, shapes: &ShapeList, current: &Selection, id: ShapeId) -> Option<Selection> {
        if !self.enabled || !shapes.contains(&id) {
            return None;
        }
        let next: Selection = std::iter::once(id).collect();
        changed(current, next)
    }

    /// Add `id` if absent, remove it if present. Unknown ids change nothing.
    #[must_use]
    pub fn toggle_shape(&self, shapes: &ShapeList, current: &Selection, id: ShapeId) -> Option<Selection> {
        if !self.enabled || !shapes.contains(&id) {
            return None;
        }
        let mut next = current.clone();
        if !next.remove(&id) {
            next.insert(id);
        }
        Some(next)
    }

    /// Select every shape in the list.
    #[must_use]
    pub fn select_all(&self, shapes: &ShapeList, current: &Selection) -> Option<Selection> {
        if !self.enabled {
            return None;
        }
        changed(current, shapes.ids().into_iter().collect())
    }

    /// Empty the selection.
    #[must_use]
    pub fn clear_selection(&self, current: &Selection) -> Option<Selection> {
        if !self.enabled {
            return None;
        }
        changed(current, Selection::new())
    }

    /// Expand ids through group membership.
    ///
    /// Ids that are not in `shapes` are dropped.
    #[must_use]
    pub fn expand_groups(&self, shapes: &ShapeList, ids: impl IntoIterator<Item = ShapeId>) -> Selection {
        let mut out = Selection::new();
        for id in ids {
            let Some(shape) = shapes.get(&id) else {
                continue;
            };
            match shape.group_id().filter(|_| self.group_expansion) {
                Some(group) => out.extend(shapes.group_members(group)),
                None => {
                    out.insert(id);
                }
            }
        }
        out
    }

    // --- Click ---

    /// Resolve a click.
    ///
    /// `hit` is the shape under the pointer, if any. A plain click selects the
    /// shape (and its group); ctrl/cmd toggles it (and its group) as a unit. A
    /// plain click on empty canvas clears the selection; a modified click on
    /// empty canvas leaves it alone. Unknown ids are ignored.
    #[must_use]
    pub fn click(
        &self,
        shapes: &ShapeList,
        current: &Selection,
        hit: Option<ShapeId>,
        modifiers: Modifiers,
    ) -> Option<Selection> {
        if !self.enabled {
            return None;
        }
        let Some(id) = hit.filter(|id| shapes.contains(id)) else {
            return if modifiers.is_multi() { None } else { self.clear_selection(current) };
        };
        let unit = self.expand_groups(shapes, [id]);
        if modifiers.is_multi() {
            let mut next = current.clone();
            if unit.iter().all(|m| current.contains(m)) {
                for m in &unit {
                    next.remove(m);
                }
            } else {
                next.extend(unit);
            }
            changed(current, next)
        } else {
            changed(current, unit)
        }
    }

    // --- Marquee ---

    /// Start tracking a press on empty canvas.
    pub fn begin_marquee(&mut self, screen: Point, world: Point, modifiers: Modifiers) {
        if !self.enabled || !self.marquee_enabled {
            return;
        }
        self.drag = Some(MarqueeDrag {
            start_screen: screen,
            start_world: world,
            current_world: world,
            active: false,
            additive: modifiers.is_multi(),
        });
    }

    /// Track pointer movement. Returns the marquee rectangle once the drag is
    /// past the threshold, `None` before that or when no drag is in progress.
    pub fn update_marquee(&mut self, screen: Point, world: Point) -> Option<Bounds> {
        if !self.enabled {
            return None;
        }
        let threshold = self.drag_threshold_px;
        let drag = self.drag.as_mut()?;
        if !drag.active && drag.start_screen.distance(screen) > threshold {
            drag.active = true;
        }
        drag.current_world = world;
        drag.active.then(|| drag.rect())
    }

    /// Finish the gesture.
    ///
    /// An active marquee selects every intersecting shape, expanded through
    /// groups, unioned with `current` when the drag started with ctrl/cmd held
    /// and replacing it otherwise. A press that never crossed the threshold is
    /// treated as a click on empty canvas.
    pub fn end_marquee(&mut self, shapes: &ShapeList, current: &Selection) -> Option<Selection> {
        let drag = self.drag.take()?;
        if !self.enabled {
            return None;
        }
        if !drag.active {
            return if drag.additive { None } else { self.clear_selection(current) };
        }
        let rect = drag.rect();
        let hits = self.expand_groups(shapes, marquee_hits(shapes, &rect));
        tracing::debug!(hits = hits.len(), additive = drag.additive, "marquee resolved");
        let next = if drag.additive { current.union(&hits).cloned().collect() } else { hits };
        changed(current, next)
    }

    /// Drop any in-progress gesture without changing the selection.
    pub fn cancel_marquee(&mut self) {
        self.drag = None;
    }

    /// The in-progress gesture, if any.
    #[must_use]
    pub fn drag(&self) -> Option<&MarqueeDrag> {
        self.drag.as_ref()
    }

    /// The marquee rectangle to draw, once the drag is active.
    #[must_use]
    pub fn marquee(&self) -> Option<Bounds> {
        self.drag.as_ref().filter(|d| d.active).map(MarqueeDrag::rect)
    }
}

fn changed(current: &Selection, next: Selection) -> Option<Selection> {
    (next != *current).then_some(next)
}
