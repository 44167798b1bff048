//! Map editor core for the Oasis virtual-world platform.
//!
//! This crate is compiled to WebAssembly and runs in the browser beneath the
//! area/map editor. It owns everything with real algorithmic content in the
//! editor: the shape model, viewport-to-world coordinate mapping, click and
//! marquee selection, geometry transforms, and the snapshot-based undo/redo
//! history. Pixel rendering stays in the host's scene-graph library; the host
//! wires DOM events into the engine and persists the resulting
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Shape model and the ordered in-memory shape list |
//! | [`camera`] | Viewport, bounds, and coordinate conversions |
//! | [`select`] | Click, toggle, and marquee selection |
//! | [`history`] | Snapshot undo/redo stacks |
//! | [`transform`] | Gesture-driven geometry updates |
//! | [`hit`] | Point and marquee hit-testing against shapes |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`persist`] | Persisted map snapshot codec |
//! | [`error`] | Stable error codes for host-facing errors |
//! | [`context`] | Per-session configuration, feature flags, clock, and counters |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, etc.) |

pub mod camera;
pub mod consts;
pub mod context;
pub mod doc;
pub mod engine;
pub mod error;
pub mod history;
pub mod hit;
pub mod input;
pub mod persist;
pub mod select;
pub mod transform;
