//! Undo/redo over whole-editor snapshots.
//!
//! DESIGN
//! ======
//! Each discrete action (add, delete, transform, finish drawing) records a
//! checkpoint: the [`EditorSnapshot`] from just before the action. The engine
//! core captures the snapshot, applies the mutation, and pushes the snapshot
//! only when the mutation succeeded, so the push always happens after the
//! change and rejected edits never create entries.
//!
//! `undo` pops the newest checkpoint, stashes the present state on the redo
//! stack, and hands the checkpoint back for restoration. `redo` mirrors it.
//! While a restore is being applied the engine is marked as restoring and
//! `push_state` is ignored, so restoration can never record itself.
//!
//! Consecutive pushes of a textually identical snapshot collapse into one.
//! Undo and redo reset that comparison: the first action after stepping
//! through history always records.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::context::GridConfig;
use crate::doc::Shape;
use crate::input::Tool;
use crate::select::Selection;

/// Immutable point-in-time copy of everything undo/redo restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub shapes: Vec<Shape>,
    pub selected_ids: Selection,
    pub viewport: Camera,
    pub grid: GridConfig,
    pub tool: Tool,
}

/// One recorded checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: EditorSnapshot,
    /// Human-readable label for the action that followed this checkpoint.
    pub description: Option<String>,
}

/// Flags the chrome needs to render undo/redo controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

/// Two bounded stacks of snapshots.
#[derive(Debug, Clone)]
pub struct HistoryEngine {
    past: VecDeque<HistoryEntry>,
    future: VecDeque<HistoryEntry>,
    max_size: usize,
    last_pushed: Option<String>,
    restoring: bool,
}

impl HistoryEngine {
    /// Create empty stacks holding at most `max_size` entries each.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            max_size: max_size.max(1),
            last_pushed: None,
            restoring: false,
        }
    }

    /// Record a checkpoint.
    ///
    /// Returns `false` without touching either stack when the snapshot matches
    /// the previous push textually or when a restore is in progress. Otherwise
    /// appends to the undo stack (dropping the oldest entry on overflow) and
    /// discards the redo stack.
    pub fn push_state(&mut self, snapshot: &EditorSnapshot, description: Option<&str>) -> bool {
        if self.restoring {
            tracing::debug!("history push ignored during restore");
            return false;
        }
        let serialized = match serde_json::to_string(snapshot) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error = %e, "history snapshot serialization failed; skipping dedup");
                None
            }
        };
        if serialized.is_some() && serialized == self.last_pushed {
            return false;
        }

        let entry = HistoryEntry { snapshot: snapshot.clone(), description: description.map(str::to_string) };
        push_bounded(&mut self.past, entry, self.max_size);
        self.future.clear();
        self.last_pushed = serialized;
        tracing::debug!(depth = self.past.len(), description, "history push");
        true
    }

    /// Step back. Returns the snapshot to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &EditorSnapshot) -> Option<EditorSnapshot> {
        let entry = self.past.pop_back()?;
        self.last_pushed = None;
        let redo = HistoryEntry { snapshot: current.clone(), description: entry.description.clone() };
        push_bounded(&mut self.future, redo, self.max_size);
        tracing::debug!(undo_depth = self.past.len(), redo_depth = self.future.len(), "history undo");
        Some(entry.snapshot)
    }

    /// Step forward. Returns the snapshot to restore, or `None` when there is nothing to redo.
    pub fn redo(&mut self, current: &EditorSnapshot) -> Option<EditorSnapshot> {
        let entry = self.future.pop_back()?;
        self.last_pushed = None;
        let undo = HistoryEntry { snapshot: current.clone(), description: entry.description.clone() };
        push_bounded(&mut self.past, undo, self.max_size);
        tracing::debug!(undo_depth = self.past.len(), redo_depth = self.future.len(), "history redo");
        Some(entry.snapshot)
    }

    /// Mark the start of applying a snapshot returned by `undo`/`redo`.
    pub fn begin_restore(&mut self) {
        self.restoring = true;
    }

    /// Mark the end of a restore. Pushes are accepted again.
    pub fn end_restore(&mut self) {
        self.restoring = false;
    }

    #[must_use]
    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Empty both stacks and forget the last pushed snapshot.
    pub fn clear_history(&mut self) {
        self.past.clear();
        self.future.clear();
        self.last_pushed = None;
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_depth: self.past.len(),
            redo_depth: self.future.len(),
        }
    }

    /// Label of the action `undo` would revert.
    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.past.back().and_then(|e| e.description.as_deref())
    }

    /// Label of the action `redo` would reapply.
    #[must_use]
    pub fn redo_description(&self) -> Option<&str> {
        self.future.back().and_then(|e| e.description.as_deref())
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

fn push_bounded(stack: &mut VecDeque<HistoryEntry>, entry: HistoryEntry, max_size: usize) {
    stack.push_back(entry);
    while stack.len() > max_size {
        stack.pop_front();
    }
}
