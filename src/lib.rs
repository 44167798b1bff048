//! Native host for the Oasis editors.
//!
//! The browser crates ([`canvas`] and [`avatar`]) run the editors; this crate
//! persists what they produce and gives operators a CLI over saved files.
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Local-first document store with fire-and-forget remote sync |
//! | [`config`] | Environment configuration |
//! | [`report`] | Map and character summaries for the CLI |
//! | [`error`] | Stable error codes |

pub mod config;
pub mod error;
pub mod report;
pub mod store;
