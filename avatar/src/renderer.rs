//! Loading characters into the host's rendering library.
//!
//! The renderer sits between character definitions and a [`RenderBackend`]:
//! it validates the sheet, refuses images the GPU cannot hold, serves decoded
//! textures from a [`BoundedCache`] keyed by sheet id, and registers one
//! [`AnimationClip`] per animation. Decoding only happens on a cache miss.
//!
//! A definition edited in place under the same sheet id keeps hitting the old
//! texture until [`AvatarRenderer::invalidate`] is called for that id.

#[cfg(test)]
#[path = "renderer_test.rs"]
mod renderer_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cache::{BoundedCache, CacheConfig, CacheStats};
use crate::error::ErrorCode;
use crate::sheet::{CharacterDefinition, FrameRect, SheetError, SpriteSheetDefinition};

/// Largest texture edge most WebGL contexts accept.
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Failure reported by the rendering library. The message is opaque.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        "E_BACKEND"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("invalid sprite sheet: {0}")]
    Sheet(#[from] SheetError),

    #[error("image {width}x{height} exceeds the {max}px texture limit")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("failed to decode sheet {sheet_id}: {source}")]
    Decode { sheet_id: String, source: BackendError },

    #[error("failed to register clip {clip}: {source}")]
    Register { clip: String, source: BackendError },
}

impl ErrorCode for AvatarError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Sheet(e) => e.error_code(),
            Self::TooLarge { .. } => "E_TEXTURE_TOO_LARGE",
            Self::Decode { .. } => "E_TEXTURE_DECODE",
            Self::Register { .. } => "E_CLIP_REGISTER",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Register { .. })
    }
}

/// The rendering library's texture and clip primitives.
pub trait RenderBackend {
    /// Renderer-resident handle for a decoded image.
    type Texture: Clone;

    fn decode_texture(&mut self, sheet: &SpriteSheetDefinition) -> Result<Self::Texture, BackendError>;

    fn register_clip(&mut self, clip: &AnimationClip, texture: &Self::Texture) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererConfig {
    pub max_texture_dimension: u32,
    pub cache: CacheConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { max_texture_dimension: DEFAULT_MAX_TEXTURE_DIMENSION, cache: CacheConfig::default() }
    }
}

/// A playable animation resolved to source rectangles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationClip {
    pub sheet_id: String,
    pub name: String,
    pub frames: Vec<FrameRect>,
    pub frame_duration_ms: f64,
    pub looping: bool,
}

/// Result of a successful [`AvatarRenderer::load_character`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAvatar<T> {
    pub character_id: String,
    pub sheet_id: String,
    pub texture: T,
    /// Registered clip names, in definition order.
    pub clips: Vec<String>,
    pub initial_animation: Option<String>,
    pub from_cache: bool,
}

pub struct AvatarRenderer<B: RenderBackend> {
    backend: B,
    config: RendererConfig,
    textures: BoundedCache<B::Texture>,
    clips: HashMap<String, Vec<AnimationClip>>,
}

impl<B: RenderBackend> AvatarRenderer<B> {
    pub fn new(backend: B, config: RendererConfig) -> Self {
        Self { backend, config, textures: BoundedCache::new(config.cache), clips: HashMap::new() }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Validate, fetch or decode the texture, and register every animation.
    pub fn load_character(&mut self, character: &CharacterDefinition) -> Result<LoadedAvatar<B::Texture>, AvatarError> {
        character.validate()?;
        let sheet = &character.sheet;
        let (texture, from_cache) = self.texture_for(sheet)?;

        let clips = build_clips(sheet);
        for clip in &clips {
            self.backend
                .register_clip(clip, &texture)
                .map_err(|source| AvatarError::Register { clip: clip.name.clone(), source })?;
        }
        let names = clips.iter().map(|c| c.name.clone()).collect();
        self.clips.insert(sheet.id.clone(), clips);

        tracing::debug!(character_id = %character.id, sheet_id = %sheet.id, from_cache, "character loaded");
        Ok(LoadedAvatar {
            character_id: character.id.clone(),
            sheet_id: sheet.id.clone(),
            texture,
            clips: names,
            initial_animation: character.initial_animation().map(|a| a.name.clone()),
            from_cache,
        })
    }

    /// Decode `sheet` into the cache ahead of use. Returns whether it was already cached.
    pub fn preload(&mut self, sheet: &SpriteSheetDefinition) -> Result<bool, AvatarError> {
        sheet.validate()?;
        let (_, from_cache) = self.texture_for(sheet)?;
        Ok(from_cache)
    }

    /// Forget the texture and clips for `sheet_id`. Returns whether a texture was cached.
    pub fn invalidate(&mut self, sheet_id: &str) -> bool {
        self.clips.remove(sheet_id);
        self.textures.delete(sheet_id)
    }

    pub fn clear_cache(&mut self) {
        self.textures.clear();
        self.clips.clear();
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.textures.stats()
    }

    /// A clip registered by the last load of `sheet_id`.
    #[must_use]
    pub fn clip(&self, sheet_id: &str, name: &str) -> Option<&AnimationClip> {
        self.clips.get(sheet_id)?.iter().find(|c| c.name == name)
    }

    fn texture_for(&mut self, sheet: &SpriteSheetDefinition) -> Result<(B::Texture, bool), AvatarError> {
        let max = self.config.max_texture_dimension;
        if sheet.image_width > max || sheet.image_height > max {
            tracing::warn!(sheet_id = %sheet.id, width = sheet.image_width, height = sheet.image_height, max, "sprite sheet exceeds texture limit");
            return Err(AvatarError::TooLarge { width: sheet.image_width, height: sheet.image_height, max });
        }

        let key = sheet.cache_key();
        if let Some(texture) = self.textures.get(key) {
            return Ok((texture.clone(), true));
        }

        let texture = self
            .backend
            .decode_texture(sheet)
            .map_err(|source| AvatarError::Decode { sheet_id: sheet.id.clone(), source })?;
        let bytes = sheet.memory_estimate();
        tracing::debug!(sheet_id = %sheet.id, bytes, "texture decoded");
        self.textures.set(key, texture.clone(), bytes);
        Ok((texture, false))
    }
}

fn build_clips(sheet: &SpriteSheetDefinition) -> Vec<AnimationClip> {
    sheet
        .animations
        .iter()
        .map(|anim| AnimationClip {
            sheet_id: sheet.id.clone(),
            name: anim.name.clone(),
            frames: anim.frames.iter().filter_map(|&i| sheet.frame_rect(i)).collect(),
            frame_duration_ms: anim.frame_duration_ms(),
            looping: anim.looping,
        })
        .collect()
}
