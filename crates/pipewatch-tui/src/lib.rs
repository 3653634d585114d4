//! # pipewatch-tui
//!
//! Terminal renderer and poll loop for PipeWatch.
//!
//! The display is a fixed multi-row layout updated in place: each poll
//! cycle computes per-entity display records, diffs them against what is
//! already on screen, and emits only the cursor-addressed writes needed to
//! bring the terminal up to date. No alternate screen, no full redraws
//! after the first cycle.
//!
//! Modules, leaf to root:
//! - [`theme`] / [`record`] - semantic color tags and display records
//! - [`terminal`] - the cursor-addressing seam, real and recording
//! - [`layout`] - fixed row assignment per entity
//! - [`format`] - snapshots into display records
//! - [`diff`] - minimal-write rendering against the previous cycle
//! - [`app`] - the poll loop tying it together

pub mod app;
pub mod diff;
pub mod format;
pub mod layout;
pub mod record;
pub mod terminal;
pub mod theme;

// Re-export main types for convenience
pub use app::{CycleOutcome, SessionState, WatchSession};
pub use diff::DiffRenderer;
pub use format::{EffectiveStatus, SnapshotFormatter};
pub use layout::{HEADER_ROWS, LINES_PER_ENTITY, Layout, LayoutSlot};
pub use record::{DisplayRecord, StyledLine};
pub use terminal::{AnsiTerminal, RecordingTerminal, Terminal};
pub use theme::ColorTag;
