//! The bulletin session state machine.
//!
//! [`BoletimSession`] holds the one invariant that matters in this client:
//! a presented audio reference always narrates the currently displayed
//! text. [`BoletimSession::presented_audio`] is the only way the audio
//! surfaces, and it yields `None` the moment the text is mutated outside a
//! successful regeneration.
//!
//! The state machine transitions are:
//!
//! ```text
//! Idle ────begin_generation───▶ Generating
//!                               ──success──▶ Displayed
//!                               ──failure──▶ Idle
//! Displayed ──begin_generation─▶ Generating   (previous artifact discarded)
//!           ──enter_edit───────▶ Editing
//! Editing ──cancel_edit────────▶ Displayed    (buffer discarded)
//!         ──save_text_only────▶ Displayed    (audio now hidden/stale)
//!         ──begin_audio_regeneration─▶ RegeneratingAudio
//!                               ──success──▶ Displayed  (consistent again)
//!                               ──failure──▶ Editing    (buffer preserved)
//! ```
//!
//! The machine performs no I/O. Network results are fed back through the
//! `apply_*` methods, which ignore-and-log results arriving in any state
//! other than the one that issued the request (stale-response guard).

use std::collections::BTreeSet;

use thiserror::Error;

use crate::api::types::{audio_url, AudioRef, BulletinArtifact};
use crate::api::OrchestratorError;
use crate::categories::{CategorySelector, SelectionError};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// States of the bulletin session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No bulletin yet (or the last generation failed).
    Idle,

    /// A generation request is in flight.
    Generating,

    /// A bulletin is on screen.
    Displayed,

    /// The operator is editing the bulletin text.
    Editing,

    /// An audio-regeneration request is in flight for the edited text.
    RegeneratingAudio,
}

impl SessionState {
    /// Returns `true` while a request is in flight.
    ///
    /// The UI uses this to disable the generate/save controls while busy.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::Generating | SessionState::RegeneratingAudio
        )
    }

    /// A short human-readable label suitable for the status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Generating => "Generating",
            SessionState::Displayed => "Displayed",
            SessionState::Editing => "Editing",
            SessionState::RegeneratingAudio => "Regenerating audio",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Errors from session operations. All local; all leave the session in a
/// valid state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The operation is not legal in the current state.
    #[error("cannot {operation} while {from:?}")]
    InvalidTransition {
        from: SessionState,
        operation: &'static str,
    },

    /// The edit buffer was empty or whitespace-only on save/regenerate.
    #[error("text must not be empty")]
    EmptyText,

    /// Category toggling failed.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

// ---------------------------------------------------------------------------
// BoletimSession
// ---------------------------------------------------------------------------

/// The aggregate session: selection, artifact, state and the text/audio
/// consistency flag. Created once per run; cycles indefinitely — there is
/// no terminal state.
pub struct BoletimSession {
    selector: CategorySelector,
    state: SessionState,
    artifact: Option<BulletinArtifact>,
    edit_buffer: Option<String>,
    /// True only while `artifact.text` is known to match `artifact.audio`.
    consistent: bool,
    /// Bumped on every ingested artifact; feeds the `?t=` cache-busting
    /// query parameter so repeated filenames never replay stale audio.
    cache_token: u64,
    last_error: Option<String>,
}

impl BoletimSession {
    pub fn new() -> Self {
        Self {
            selector: CategorySelector::new(),
            state: SessionState::Idle,
            artifact: None,
            edit_buffer: None,
            consistent: false,
            cache_token: 0,
            last_error: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn artifact(&self) -> Option<&BulletinArtifact> {
        self.artifact.as_ref()
    }

    /// The bulletin text currently on display, if any.
    pub fn display_text(&self) -> Option<&str> {
        self.artifact.as_ref().map(|a| a.text.as_str())
    }

    pub fn edit_buffer(&self) -> Option<&str> {
        self.edit_buffer.as_deref()
    }

    pub fn text_audio_consistent(&self) -> bool {
        self.consistent
    }

    pub fn cache_token(&self) -> u64 {
        self.cache_token
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The audio reference that may be presented to the operator.
    ///
    /// `Some` only when the artifact carries audio AND that audio is known
    /// to narrate the displayed text. This is the enforcement point of the
    /// session's core invariant: a stale reference stays in the artifact but
    /// never comes out of here.
    pub fn presented_audio(&self) -> Option<&AudioRef> {
        if !self.consistent {
            return None;
        }
        self.artifact.as_ref().and_then(|a| a.audio.as_ref())
    }

    /// Fetchable URL for the presented audio, with the cache-busting token.
    pub fn presented_audio_url(&self, base_url: &str) -> Option<String> {
        self.presented_audio()
            .map(|audio| audio_url(base_url, audio, self.cache_token))
    }

    // -----------------------------------------------------------------------
    // Category selection
    // -----------------------------------------------------------------------

    pub fn toggle_category(&mut self, id: &str) -> Result<(), SelectionError> {
        self.selector.toggle(id)
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        self.selector.selection()
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Enter `Generating`. Legal from `Idle` and `Displayed`; the previous
    /// artifact (if any) is discarded as the view resets for the new
    /// bulletin. The selector guarantees a non-empty selection.
    pub fn begin_generation(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Displayed => {
                log::debug!("session: {:?} → Generating", self.state);
                self.artifact = None;
                self.edit_buffer = None;
                self.consistent = false;
                self.last_error = None;
                self.state = SessionState::Generating;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                operation: "generate",
            }),
        }
    }

    /// Ingest a generation outcome. Returns `false` when the session is no
    /// longer in `Generating` — the result is stale and ignored.
    pub fn apply_generation_result(
        &mut self,
        result: Result<BulletinArtifact, OrchestratorError>,
    ) -> bool {
        if self.state != SessionState::Generating {
            log::warn!(
                "session: ignoring generation result in state {:?}",
                self.state
            );
            return false;
        }

        match result {
            Ok(artifact) => {
                self.consistent = artifact.has_audio();
                self.cache_token += 1;
                self.artifact = Some(artifact);
                self.state = SessionState::Displayed;
                log::debug!(
                    "session: Generating → Displayed (audio: {}, token {})",
                    self.consistent,
                    self.cache_token
                );
            }
            Err(e) => {
                log::error!("session: generation failed: {e}");
                self.last_error = Some(e.to_string());
                self.state = SessionState::Idle;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Enter `Editing`, seeding the buffer from the displayed text.
    pub fn enter_edit(&mut self) -> Result<(), SessionError> {
        let text = match (self.state, self.artifact.as_ref()) {
            (SessionState::Displayed, Some(artifact)) => artifact.text.clone(),
            _ => {
                return Err(SessionError::InvalidTransition {
                    from: self.state,
                    operation: "edit",
                })
            }
        };
        self.edit_buffer = Some(text);
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Replace the edit buffer. Legal only while `Editing`.
    pub fn set_edit_buffer(&mut self, text: String) -> Result<(), SessionError> {
        if self.state != SessionState::Editing {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                operation: "update the edit buffer",
            });
        }
        self.edit_buffer = Some(text);
        Ok(())
    }

    /// Leave `Editing` without saving. The buffer is discarded; the artifact
    /// and the consistency flag are untouched.
    pub fn cancel_edit(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Editing {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                operation: "cancel editing",
            });
        }
        self.edit_buffer = None;
        self.state = SessionState::Displayed;
        Ok(())
    }

    /// Save the edited text without touching audio.
    ///
    /// The old audio stays in the artifact but is stale from here on:
    /// `text_audio_consistent` drops to false and [`presented_audio`]
    /// hides it.
    ///
    /// [`presented_audio`]: Self::presented_audio
    pub fn save_text_only(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Editing {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                operation: "save text",
            });
        }

        let text = self.edit_buffer.clone().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(SessionError::EmptyText);
        }

        let Some(artifact) = self.artifact.as_mut() else {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                operation: "save text",
            });
        };

        artifact.text = text;
        self.consistent = false;
        self.edit_buffer = None;
        self.state = SessionState::Displayed;
        log::debug!("session: text saved; audio reference is now stale");
        Ok(())
    }

    /// Enter `RegeneratingAudio` and hand back the text to narrate.
    ///
    /// The buffer is kept: a failed regeneration returns to `Editing` with
    /// the operator's text intact.
    pub fn begin_audio_regeneration(&mut self) -> Result<String, SessionError> {
        if self.state != SessionState::Editing {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                operation: "regenerate audio",
            });
        }

        let text = self.edit_buffer.clone().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(SessionError::EmptyText);
        }

        self.state = SessionState::RegeneratingAudio;
        log::debug!("session: Editing → RegeneratingAudio");
        Ok(text)
    }

    /// Ingest a regeneration outcome. Returns `false` when the session is no
    /// longer in `RegeneratingAudio` — the result is stale and ignored.
    pub fn apply_regeneration_result(
        &mut self,
        result: Result<BulletinArtifact, OrchestratorError>,
    ) -> bool {
        if self.state != SessionState::RegeneratingAudio {
            log::warn!(
                "session: ignoring regeneration result in state {:?}",
                self.state
            );
            return false;
        }

        match result {
            Ok(artifact) => {
                self.cache_token += 1;
                self.artifact = Some(artifact);
                self.consistent = true;
                self.edit_buffer = None;
                self.state = SessionState::Displayed;
                log::debug!(
                    "session: RegeneratingAudio → Displayed (token {})",
                    self.cache_token
                );
            }
            Err(e) => {
                log::error!("session: regeneration failed: {e}");
                self.last_error = Some(e.to_string());
                self.state = SessionState::Editing;
            }
        }
        true
    }
}

impl Default for BoletimSession {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
