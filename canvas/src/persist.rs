//! Persisted map snapshot codec.
//!
//! The host saves the editor's document as a JSON object with camelCase keys:
//! `{ shapes, selectedIds, version, timestamp }`. Decoding is lenient at the
//! shape level: a shape that fails to parse or violates a geometry invariant
//! is dropped with a warning instead of failing the whole load, as is a shape
//! whose id is empty or repeats an earlier one. `selectedIds` entries that are
//! not strings, or that no longer name a surviving shape, are dropped too.
//!
//! A version other than the expected one is reported on [`LoadedMap`] and
//! logged, and the payload is used as-is.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_SHAPE_SIZE;
use crate::doc::{Shape, ShapeId};
use crate::error::ErrorCode;
use crate::select::Selection;

/// Saved editor document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMap {
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub selected_ids: Selection,
    pub version: u32,
    /// Save time, epoch milliseconds.
    pub timestamp: i64,
}

/// Result of decoding a persisted map.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMap {
    pub map: PersistedMap,
    /// The payload's version differed from the expected one.
    pub version_mismatch: bool,
    /// Number of shapes dropped for failing to parse or validate.
    pub dropped_invalid: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("malformed map snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ErrorCode for PersistError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_SNAPSHOT_MALFORMED",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMap {
    #[serde(default)]
    shapes: Vec<serde_json::Value>,
    #[serde(default)]
    selected_ids: Vec<serde_json::Value>,
    version: u32,
    #[serde(default)]
    timestamp: i64,
}

/// Serialize a map snapshot to JSON text.
pub fn encode(map: &PersistedMap) -> Result<String, PersistError> {
    Ok(serde_json::to_string(map)?)
}

/// Decode JSON text, validating boxes against the default minimum shape size.
pub fn decode(json: &str, expected_version: u32) -> Result<LoadedMap, PersistError> {
    decode_with_min_size(json, expected_version, MIN_SHAPE_SIZE)
}

/// Decode JSON text, validating boxes against `min_size`.
///
/// Fails only when the envelope itself is malformed.
pub fn decode_with_min_size(json: &str, expected_version: u32, min_size: f64) -> Result<LoadedMap, PersistError> {
    let raw: RawMap = serde_json::from_str(json)?;

    let version_mismatch = raw.version != expected_version;
    if version_mismatch {
        tracing::warn!(found = raw.version, expected = expected_version, "map snapshot version mismatch; loading as-is");
    }

    let mut dropped_invalid = 0;
    let mut seen = HashSet::new();
    let mut shapes = Vec::with_capacity(raw.shapes.len());
    for value in raw.shapes {
        let shape: Shape = match serde_json::from_value(value) {
            Ok(shape) => shape,
            Err(e) => {
                tracing::warn!(error = %e, "dropping unparseable shape");
                dropped_invalid += 1;
                continue;
            }
        };
        if let Err(e) = shape.geometry.validate(min_size) {
            tracing::warn!(shape_id = %shape.id, code = e.error_code(), error = %e, "dropping invalid shape");
            dropped_invalid += 1;
            continue;
        }
        if shape.id.is_empty() || !seen.insert(shape.id.clone()) {
            tracing::warn!(shape_id = %shape.id, "dropping shape with empty or duplicate id");
            dropped_invalid += 1;
            continue;
        }
        shapes.push(shape);
    }

    let mut selected_ids = Selection::new();
    for value in raw.selected_ids {
        match value {
            serde_json::Value::String(id) if shapes.iter().any(|s| s.id.as_str() == id) => {
                selected_ids.insert(ShapeId::from(id));
            }
            other => tracing::warn!(selected_id = %other, "dropping stale selected id"),
        }
    }

    tracing::debug!(shapes = shapes.len(), dropped_invalid, version = raw.version, "map snapshot decoded");
    Ok(LoadedMap {
        map: PersistedMap { shapes, selected_ids, version: raw.version, timestamp: raw.timestamp },
        version_mismatch,
        dropped_invalid,
    })
}
