//! Sprite-sheet, animation, and character definitions.
//!
//! A sheet is a single image cut into a regular grid of equally sized frames,
//! numbered row-major from the top-left. Partial cells on the right or bottom
//! edge are not frames. Animations reference frames by index.

#[cfg(test)]
#[path = "sheet_test.rs"]
mod sheet_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Bytes per decoded RGBA pixel.
const BYTES_PER_PIXEL: usize = 4;

/// Why a definition was rejected.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("sprite sheet id must not be empty")]
    EmptyId,

    #[error("frame size must be positive, got {width}x{height}")]
    ZeroFrameSize { width: u32, height: u32 },

    #[error("frame {frame_width}x{frame_height} does not fit image {image_width}x{image_height}")]
    FrameLargerThanImage { frame_width: u32, frame_height: u32, image_width: u32, image_height: u32 },

    #[error("animation {animation:?} has no frames")]
    EmptyAnimation { animation: String },

    #[error("animation {animation:?} references frame {frame} but the sheet has {count}")]
    FrameOutOfGrid { animation: String, frame: u32, count: u32 },

    #[error("animation {animation:?} frame rate must be positive and finite, got {rate}")]
    BadFrameRate { animation: String, rate: f64 },

    #[error("animation {animation:?} is defined more than once")]
    DuplicateAnimation { animation: String },

    #[error("default animation {animation:?} is not defined on the sheet")]
    UnknownAnimation { animation: String },

    #[error("malformed definition: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ErrorCode for SheetError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyId => "E_SHEET_EMPTY_ID",
            Self::ZeroFrameSize { .. } => "E_SHEET_FRAME_SIZE",
            Self::FrameLargerThanImage { .. } => "E_SHEET_FRAME_TOO_LARGE",
            Self::EmptyAnimation { .. } => "E_ANIMATION_EMPTY",
            Self::FrameOutOfGrid { .. } => "E_ANIMATION_FRAME_RANGE",
            Self::BadFrameRate { .. } => "E_ANIMATION_FRAME_RATE",
            Self::DuplicateAnimation { .. } => "E_ANIMATION_DUPLICATE",
            Self::UnknownAnimation { .. } => "E_ANIMATION_UNKNOWN",
            Self::Malformed(_) => "E_DEFINITION_MALFORMED",
        }
    }
}

/// Pixel rectangle of one frame inside the sheet image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn default_looping() -> bool {
    true
}

/// A named run of frames played at a fixed rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDefinition {
    pub name: String,
    pub frames: Vec<u32>,
    /// Frames per second.
    pub frame_rate: f64,
    #[serde(default = "default_looping")]
    pub looping: bool,
}

impl AnimationDefinition {
    /// Milliseconds each frame stays on screen.
    #[must_use]
    pub fn frame_duration_ms(&self) -> f64 {
        1000.0 / self.frame_rate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSheetDefinition {
    pub id: String,
    /// Image location (URL or data URI). Opaque to this crate.
    pub source: String,
    pub image_width: u32,
    pub image_height: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub animations: Vec<AnimationDefinition>,
}

impl SpriteSheetDefinition {
    /// Check grid geometry and every animation against it.
    pub fn validate(&self) -> Result<(), SheetError> {
        if self.id.trim().is_empty() {
            return Err(SheetError::EmptyId);
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(SheetError::ZeroFrameSize { width: self.frame_width, height: self.frame_height });
        }
        if self.frame_width > self.image_width || self.frame_height > self.image_height {
            return Err(SheetError::FrameLargerThanImage {
                frame_width: self.frame_width,
                frame_height: self.frame_height,
                image_width: self.image_width,
                image_height: self.image_height,
            });
        }

        let count = self.frame_count();
        let mut seen = HashSet::new();
        for anim in &self.animations {
            if !seen.insert(anim.name.as_str()) {
                return Err(SheetError::DuplicateAnimation { animation: anim.name.clone() });
            }
            if anim.frames.is_empty() {
                return Err(SheetError::EmptyAnimation { animation: anim.name.clone() });
            }
            if !(anim.frame_rate.is_finite() && anim.frame_rate > 0.0) {
                return Err(SheetError::BadFrameRate { animation: anim.name.clone(), rate: anim.frame_rate });
            }
            if let Some(&frame) = anim.frames.iter().find(|&&f| f >= count) {
                return Err(SheetError::FrameOutOfGrid { animation: anim.name.clone(), frame, count });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> u32 {
        self.image_width.checked_div(self.frame_width).unwrap_or(0)
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.image_height.checked_div(self.frame_height).unwrap_or(0)
    }

    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.columns().saturating_mul(self.rows())
    }

    /// Source rectangle of frame `index`, or `None` past the end of the grid.
    #[must_use]
    pub fn frame_rect(&self, index: u32) -> Option<FrameRect> {
        if index >= self.frame_count() {
            return None;
        }
        let cols = self.columns();
        Some(FrameRect {
            x: (index % cols) * self.frame_width,
            y: (index / cols) * self.frame_height,
            width: self.frame_width,
            height: self.frame_height,
        })
    }

    /// Decoded size in bytes, assuming RGBA.
    #[must_use]
    pub fn memory_estimate(&self) -> usize {
        (self.image_width as usize)
            .saturating_mul(self.image_height as usize)
            .saturating_mul(BYTES_PER_PIXEL)
    }

    /// Identity under which the decoded texture is cached.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&AnimationDefinition> {
        self.animations.iter().find(|a| a.name == name)
    }
}

/// A user-created character: a sheet plus display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDefinition {
    pub id: String,
    pub name: String,
    pub sheet: SpriteSheetDefinition,
    #[serde(default)]
    pub default_animation: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl CharacterDefinition {
    /// Parse and validate a character from JSON.
    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        let character: Self = serde_json::from_str(json)?;
        character.validate()?;
        Ok(character)
    }

    /// Validate the sheet and the default animation reference.
    pub fn validate(&self) -> Result<(), SheetError> {
        self.sheet.validate()?;
        if let Some(name) = &self.default_animation {
            if self.sheet.animation(name).is_none() {
                return Err(SheetError::UnknownAnimation { animation: name.clone() });
            }
        }
        Ok(())
    }

    /// The animation to show first: the configured default, else the first defined.
    #[must_use]
    pub fn initial_animation(&self) -> Option<&AnimationDefinition> {
        match &self.default_animation {
            Some(name) => self.sheet.animation(name),
            None => self.sheet.animations.first(),
        }
    }
}
