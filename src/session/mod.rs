//! The bulletin session: state machine and event-loop runner.
//!
//! [`BoletimSession`] is the pure state machine — transitions, the
//! text/audio-consistency invariant, and the stale-response guards.
//! [`SessionRunner`] is the cooperative event loop that composes it with the
//! orchestrator and the playback controller.

pub mod machine;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use machine::{BoletimSession, SessionError, SessionState};
pub use runner::SessionRunner;
