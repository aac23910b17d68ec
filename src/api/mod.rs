//! Service boundary: wire types, HTTP client and the request orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              RequestOrchestrator                        │
//! │   build_generation_request()   (pure)                   │
//! │   submit_generation()        ──┐                        │
//! │   submit_audio_regeneration()──┤  single-flight slot    │
//! │                                ▼                        │
//! │         BulletinService (trait)                         │
//! │         └─ HttpBulletinService (reqwest)                │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Responses are parsed into the typed entities of [`types`] at this
//! boundary; malformed payloads surface as errors, never as raw JSON
//! escaping upward.

pub mod client;
pub mod orchestrator;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiError, BulletinService, HttpBulletinService};
pub use orchestrator::{OrchestratorError, RequestOrchestrator};
pub use types::{
    audio_url, AudioRef, BulletinArtifact, ConfigUpdateBody, GenerateBulletinBody,
    GenerateBulletinResponse, GenerationRequest, RegenerateAudioBody, RegenerateAudioResponse,
    RemoteConfig,
};
