//! Playback controller — the normalized progress model over an engine.
//!
//! [`PlaybackController`] drives an [`AudioEngine`] and mirrors its
//! callbacks into [`PlaybackState`]. The state is never authoritative on its
//! own: position and duration come from engine events, and `toggle_play`
//! queries the engine's own paused flag rather than assuming the last
//! command took effect. Engine events are accepted at any time — playback of
//! a loaded bulletin continues while the operator edits text.

use crate::player::engine::{AudioEngine, EngineEvent};

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// Mirror of the engine's playback status, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Current position in seconds.
    pub position_secs: f64,
    /// Total duration in seconds; `NaN` until metadata arrives.
    pub duration_secs: f64,
    pub muted: bool,
    pub playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            position_secs: 0.0,
            duration_secs: f64::NAN,
            muted: false,
            playing: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

pub struct PlaybackController {
    engine: Box<dyn AudioEngine>,
    state: PlaybackState,
}

impl PlaybackController {
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        Self {
            engine,
            state: PlaybackState::default(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Replace the current source. Prior playback state is invalidated
    /// (duration unknown again, position zero, not playing); the muted flag
    /// survives source changes. Does not block waiting for metadata.
    pub fn load_source(&mut self, uri: &str) {
        log::debug!("player: loading source {uri}");
        self.state.position_secs = 0.0;
        self.state.duration_secs = f64::NAN;
        self.state.playing = false;
        self.engine.load(uri);
        self.engine.set_muted(self.state.muted);
    }

    /// Resume when the engine reports paused, pause otherwise.
    pub fn toggle_play(&mut self) {
        if self.engine.is_paused() {
            self.engine.play();
            self.state.playing = true;
        } else {
            self.engine.pause();
            self.state.playing = false;
        }
    }

    /// Seek to a normalized position (e.g. a click at a horizontal fraction
    /// of the progress bar). A no-op until the duration is known.
    pub fn seek_to_ratio(&mut self, ratio: f64) {
        if !self.state.duration_secs.is_finite() {
            return;
        }
        let target = ratio.clamp(0.0, 1.0) * self.state.duration_secs;
        self.engine.seek(target);
        self.state.position_secs = target;
    }

    /// Jump `delta_secs` forward or backward, clamped to `[0, duration]`.
    /// A no-op until the duration is known.
    pub fn skip(&mut self, delta_secs: f64) {
        if !self.state.duration_secs.is_finite() {
            return;
        }
        let target = (self.state.position_secs + delta_secs).clamp(0.0, self.state.duration_secs);
        self.engine.seek(target);
        self.state.position_secs = target;
    }

    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        self.engine.set_muted(self.state.muted);
    }

    /// Playback progress in `[0, 1]` for the progress bar. The divisor is
    /// floored at 1 s so the ratio is well-defined before metadata arrives.
    pub fn progress_ratio(&self) -> f64 {
        self.state.position_secs / self.state.duration_secs.max(1.0)
    }

    /// Mirror an engine event into the state.
    ///
    /// `Ended` resets `playing` and the *visual* position; the engine's own
    /// final position may differ marginally, which is fine — only the
    /// indicator is reset. `Failed` is the embedding UI's to present; the
    /// controller does not interpret it.
    pub fn handle_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::MetadataLoaded { duration_secs } => {
                self.state.duration_secs = *duration_secs;
            }
            EngineEvent::TimeUpdate { position_secs } => {
                self.state.position_secs = *position_secs;
            }
            EngineEvent::Ended => {
                self.state.playing = false;
                self.state.position_secs = 0.0;
            }
            EngineEvent::Failed { message } => {
                log::error!("player: engine reported: {message}");
            }
        }
    }
}

/// `m:ss` clock display; `0:00` while the value is unknown.
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00".into();
    }
    let total = secs as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
