//! Avatar sprite-sheet runtime for the Oasis virtual-world platform.
//!
//! Characters are drawn from sprite sheets: one image sliced into a regular
//! grid of frames, plus named animations that walk a list of frame indices at
//! a fixed rate. This crate validates those definitions, keeps decoded
//! textures in a memory-bounded LRU cache so switching between characters
//! does not decode the same sheet twice, hands playable clips to the host's
//! rendering library, and drives the preview loop that steps frames on each
//! animation-frame callback.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`cache`] | LRU cache bounded by entry count and memory budget |
//! | [`sheet`] | Sprite-sheet, animation, and character definitions |
//! | [`renderer`] | Texture loading and clip registration against a [`renderer::RenderBackend`] |
//! | [`playback`] | Frame stepping and the cancellable preview loop |
//! | [`error`] | Stable error codes for host-facing errors |

pub mod cache;
pub mod error;
pub mod playback;
pub mod renderer;
pub mod sheet;
