//! Audio playback: engine seam, production engine, and the controller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 PlaybackController                       │
//! │   load_source / toggle_play / seek_to_ratio / skip /     │
//! │   toggle_mute / progress_ratio                           │
//! │          │ commands              ▲ EngineEvents          │
//! │          ▼                       │                       │
//! │                AudioEngine (trait)                       │
//! │        ├─ RodioEngine (dedicated audio thread)           │
//! │        └─ NullEngine  (no output device)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod controller;
pub mod engine;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use controller::{format_time, PlaybackController, PlaybackState};
pub use engine::{AudioEngine, EngineError, EngineEvent, NullEngine, RodioEngine};
