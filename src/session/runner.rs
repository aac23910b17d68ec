//! Session runner — the event loop that composes the whole client.
//!
//! [`SessionRunner`] owns the [`BoletimSession`], the
//! [`RequestOrchestrator`] and the [`PlaybackController`], and responds to
//! [`SessionCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Event flow
//!
//! ```text
//! SessionCommand::Generate
//!   └─▶ session.begin_generation() ──▶ tokio::spawn(submit_generation)
//!         └─▶ RunnerEvent::GenerationDone ──▶ session.apply_generation_result
//!               └─▶ BulletinReady notice + player.load_source(audio url)
//!
//! SessionCommand::SaveAndRegenerate
//!   └─▶ session.begin_audio_regeneration() ──▶ spawn(submit_audio_regeneration)
//!         └─▶ RunnerEvent::RegenerationDone ──▶ session.apply_regeneration_result
//!
//! EngineEvent (any time, any session state) ──▶ player.handle_event
//! ```
//!
//! Network submissions run on spawned tasks so the loop keeps servicing
//! commands while a request is in flight — a second attempt fails fast on
//! the session/orchestrator guards instead of queueing. Blocking side
//! effects (clipboard, file writes) go through `spawn_blocking` /
//! `tokio::fs` so the loop never stalls.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::types::audio_url;
use crate::api::{OrchestratorError, RequestOrchestrator};
use crate::app::{SessionCommand, SessionNotice, StatusSnapshot};
use crate::config::{AppConfig, AppPaths};
use crate::player::{EngineEvent, PlaybackController};
use crate::session::machine::{BoletimSession, SessionState};

// ---------------------------------------------------------------------------
// RunnerEvent
// ---------------------------------------------------------------------------

/// Completions of work the runner spawned.
#[derive(Debug)]
enum RunnerEvent {
    GenerationDone(Result<crate::api::BulletinArtifact, OrchestratorError>),
    RegenerationDone(Result<crate::api::BulletinArtifact, OrchestratorError>),
    DownloadDone(Result<PathBuf, String>),
}

// ---------------------------------------------------------------------------
// SessionRunner
// ---------------------------------------------------------------------------

/// Drives the complete bulletin session.
///
/// Create with [`SessionRunner::new`], then call [`run`](Self::run) inside a
/// tokio task. The runner is the sole mutator of the session and the
/// playback controller.
pub struct SessionRunner {
    session: BoletimSession,
    orchestrator: Arc<RequestOrchestrator>,
    player: PlaybackController,
    config: AppConfig,
    downloads_dir: PathBuf,
    notices: mpsc::Sender<SessionNotice>,
    events_tx: mpsc::Sender<RunnerEvent>,
    events_rx: Option<mpsc::Receiver<RunnerEvent>>,
}

impl SessionRunner {
    pub fn new(
        orchestrator: Arc<RequestOrchestrator>,
        player: PlaybackController,
        config: AppConfig,
        notices: mpsc::Sender<SessionNotice>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(16);
        Self {
            session: BoletimSession::new(),
            orchestrator,
            player,
            config,
            downloads_dir: AppPaths::new().downloads_dir,
            notices,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Override where downloaded audio lands (useful for tests).
    pub fn with_downloads_dir(mut self, dir: PathBuf) -> Self {
        self.downloads_dir = dir;
        self
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the session until `commands` is closed.
    ///
    /// `engine_rx` carries the audio engine's events; they are accepted at
    /// any time, in any session state — playback of a loaded bulletin
    /// continues while the operator edits text.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut engine_rx: mpsc::Receiver<EngineEvent>,
    ) {
        let mut events_rx = match self.events_rx.take() {
            Some(rx) => rx,
            None => return,
        };
        let mut engine_open = true;

        loop {
            tokio::select! {
                maybe_command = commands.recv() => match maybe_command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = events_rx.recv() => {
                    self.handle_runner_event(event).await;
                }
                maybe_engine = engine_rx.recv(), if engine_open => match maybe_engine {
                    Some(event) => self.handle_engine_event(event).await,
                    None => engine_open = false,
                },
            }
        }

        log::info!("session: command channel closed, runner shutting down");
    }

    async fn notify(&self, notice: SessionNotice) {
        let _ = self.notices.send(notice).await;
    }

    async fn notify_error(&self, message: impl std::fmt::Display) {
        self.notify(SessionNotice::Error(message.to_string())).await;
    }

    // -----------------------------------------------------------------------
    // Command handling
    // -----------------------------------------------------------------------

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::ToggleCategory(id) => match self.session.toggle_category(&id) {
                Ok(()) => {
                    let ids = self.session.selection().iter().cloned().collect();
                    self.notify(SessionNotice::SelectionChanged(ids)).await;
                }
                Err(e) => self.notify_error(e).await,
            },

            SessionCommand::Generate {
                articles_per_category,
            } => self.start_generation(articles_per_category).await,

            SessionCommand::EnterEdit => match self.session.enter_edit() {
                Ok(()) => {
                    let buffer = self.session.edit_buffer().unwrap_or("").to_string();
                    self.notify(SessionNotice::EditStarted { buffer }).await;
                }
                Err(e) => self.notify_error(e).await,
            },

            SessionCommand::UpdateBuffer(text) => {
                if let Err(e) = self.session.set_edit_buffer(text) {
                    self.notify_error(e).await;
                }
            }

            SessionCommand::CancelEdit => match self.session.cancel_edit() {
                Ok(()) => self.notify(SessionNotice::EditCancelled).await,
                Err(e) => self.notify_error(e).await,
            },

            SessionCommand::SaveTextOnly => {
                let audio_was_presented = self.session.presented_audio().is_some();
                match self.session.save_text_only() {
                    Ok(()) => {
                        // The old narration no longer matches the text; with
                        // the control hidden it could never be stopped, so
                        // stop it here.
                        if audio_was_presented && self.player.state().playing {
                            self.player.toggle_play();
                        }
                        let text = self.session.display_text().unwrap_or("").to_string();
                        self.notify(SessionNotice::TextSaved {
                            text,
                            audio_hidden: audio_was_presented,
                        })
                        .await;
                    }
                    Err(e) => self.notify_error(e).await,
                }
            }

            SessionCommand::SaveAndRegenerate => self.start_regeneration().await,

            SessionCommand::TogglePlay => {
                if self.ensure_presentable_audio().await {
                    self.player.toggle_play();
                }
            }
            SessionCommand::SeekRatio(ratio) => {
                if self.ensure_presentable_audio().await {
                    self.player.seek_to_ratio(ratio);
                }
            }
            SessionCommand::Skip(delta) => {
                if self.ensure_presentable_audio().await {
                    self.player.skip(delta);
                }
            }
            SessionCommand::ToggleMute => {
                if self.ensure_presentable_audio().await {
                    self.player.toggle_mute();
                }
            }

            SessionCommand::CopyText => self.copy_text().await,
            SessionCommand::DownloadAudio => self.start_download().await,

            SessionCommand::ShowStatus => {
                let playback = self.player.state();
                self.notify(SessionNotice::Status(StatusSnapshot {
                    state_label: self.session.state().label(),
                    selection: self.session.selection().iter().cloned().collect(),
                    text_audio_consistent: self.session.text_audio_consistent(),
                    audio_available: self.session.presented_audio().is_some(),
                    playing: playback.playing,
                    muted: playback.muted,
                    position_secs: playback.position_secs,
                    duration_secs: playback.duration_secs,
                }))
                .await;
            }
        }
    }

    /// Playback commands only make sense while audio may be presented; the
    /// player is never driven against a hidden/stale reference.
    async fn ensure_presentable_audio(&self) -> bool {
        if self.session.presented_audio().is_some() {
            true
        } else {
            self.notify_error("nenhum áudio apresentável").await;
            false
        }
    }

    async fn start_generation(&mut self, articles_per_category: Option<i64>) {
        if let Err(e) = self.session.begin_generation() {
            self.notify_error(e).await;
            return;
        }
        self.notify(SessionNotice::GenerationStarted).await;

        // Operator input wins; absent input uses the configured per-category
        // count (the builder still floors bad values at the fixed fallback).
        let per_category = articles_per_category
            .or(Some(i64::from(self.config.bulletin.articles_per_category)));
        let request = self
            .orchestrator
            .build_generation_request(self.session.selection(), per_category);
        let orchestrator = Arc::clone(&self.orchestrator);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = orchestrator.submit_generation(&request).await;
            let _ = events.send(RunnerEvent::GenerationDone(result)).await;
        });
    }

    async fn start_regeneration(&mut self) {
        let text = match self.session.begin_audio_regeneration() {
            Ok(text) => text,
            Err(e) => {
                self.notify_error(e).await;
                return;
            }
        };
        self.notify(SessionNotice::RegenerationStarted).await;

        let orchestrator = Arc::clone(&self.orchestrator);
        let events = self.events_tx.clone();
        let tts_engine = self.config.tts.engine;
        let voice_id = self.config.tts.voice_id.clone();
        tokio::spawn(async move {
            let result = orchestrator
                .submit_audio_regeneration(&text, tts_engine, &voice_id)
                .await;
            let _ = events.send(RunnerEvent::RegenerationDone(result)).await;
        });
    }

    async fn copy_text(&self) {
        let Some(text) = self.session.display_text().map(str::to_string) else {
            self.notify_error("nenhum texto para copiar").await;
            return;
        };

        let result = tokio::task::spawn_blocking(move || copy_to_clipboard(&text)).await;
        match result {
            Ok(Ok(())) => self.notify(SessionNotice::TextCopied).await,
            Ok(Err(e)) => self.notify_error(e).await,
            Err(e) => self.notify_error(e).await,
        }
    }

    async fn start_download(&self) {
        let (url, filename) = match self.session.presented_audio() {
            Some(audio) => (
                audio_url(
                    &self.config.api.base_url,
                    audio,
                    self.session.cache_token(),
                ),
                audio.filename().to_string(),
            ),
            None => {
                self.notify_error("nenhum áudio apresentável").await;
                return;
            }
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let events = self.events_tx.clone();
        let dir = self.downloads_dir.clone();
        tokio::spawn(async move {
            let result = async {
                let bytes = orchestrator
                    .fetch_audio_bytes(&url)
                    .await
                    .map_err(|e| e.to_string())?;
                tokio::fs::create_dir_all(&dir)
                    .await
                    .map_err(|e| e.to_string())?;
                let dest = dir.join(&filename);
                tokio::fs::write(&dest, &bytes)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>(dest)
            }
            .await;
            let _ = events.send(RunnerEvent::DownloadDone(result)).await;
        });
    }

    // -----------------------------------------------------------------------
    // Completion handling
    // -----------------------------------------------------------------------

    async fn handle_runner_event(&mut self, event: RunnerEvent) {
        match event {
            RunnerEvent::GenerationDone(result) => {
                if !self.session.apply_generation_result(result) {
                    return;
                }
                match self.session.state() {
                    SessionState::Displayed => {
                        let text = self.session.display_text().unwrap_or("").to_string();
                        let url = self.session.presented_audio_url(&self.config.api.base_url);
                        if let Some(url) = &url {
                            self.player.load_source(url);
                        }
                        self.notify(SessionNotice::BulletinReady {
                            text,
                            has_audio: url.is_some(),
                        })
                        .await;
                    }
                    _ => {
                        let message = self.session.last_error().unwrap_or("falha").to_string();
                        self.notify_error(message).await;
                    }
                }
            }

            RunnerEvent::RegenerationDone(result) => {
                if !self.session.apply_regeneration_result(result) {
                    return;
                }
                match self.session.state() {
                    SessionState::Displayed => {
                        let text = self.session.display_text().unwrap_or("").to_string();
                        if let Some(url) =
                            self.session.presented_audio_url(&self.config.api.base_url)
                        {
                            self.player.load_source(&url);
                        }
                        self.notify(SessionNotice::AudioRefreshed { text }).await;
                    }
                    _ => {
                        // Back in Editing; the buffer survived and the save
                        // control is usable again.
                        let message = self.session.last_error().unwrap_or("falha").to_string();
                        self.notify_error(message).await;
                    }
                }
            }

            RunnerEvent::DownloadDone(result) => match result {
                Ok(path) => self.notify(SessionNotice::AudioDownloaded(path)).await,
                Err(message) => self.notify_error(message).await,
            },
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        self.player.handle_event(&event);
        match event {
            EngineEvent::Ended => self.notify(SessionNotice::PlaybackEnded).await,
            EngineEvent::Failed { message } => {
                // Forwarded as-is; the engine's wording is all we know.
                self.notify_error(format!("áudio: {message}")).await;
            }
            _ => {}
        }
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(text.to_string()).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{ApiError, BulletinService};
    use crate::api::types::{AudioRef, BulletinArtifact, GenerationRequest};
    use crate::config::TtsEngine;
    use crate::player::AudioEngine;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Service with pre-scripted outcomes. `None` scripts a 500 failure.
    struct ScriptedService {
        generation: Option<BulletinArtifact>,
        regeneration: Option<&'static str>,
    }

    #[async_trait]
    impl BulletinService for ScriptedService {
        async fn generate_bulletin(
            &self,
            _request: &GenerationRequest,
        ) -> Result<BulletinArtifact, ApiError> {
            self.generation.clone().ok_or(ApiError::Status {
                status: 500,
                detail: "Nenhuma notícia encontrada".into(),
            })
        }

        async fn regenerate_audio(
            &self,
            _text: &str,
            _tts_engine: TtsEngine,
            _tts_voice_id: &str,
        ) -> Result<AudioRef, ApiError> {
            self.regeneration
                .and_then(AudioRef::recognize)
                .ok_or(ApiError::Timeout)
        }

        async fn download_audio(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
            Ok(vec![0xff, 0xfb, 0x90])
        }
    }

    /// Thread-safe recording engine.
    #[derive(Clone, Default)]
    struct RecordingEngine {
        loads: Arc<Mutex<Vec<String>>>,
        paused: Arc<Mutex<bool>>,
    }

    impl RecordingEngine {
        fn new() -> Self {
            Self {
                loads: Arc::new(Mutex::new(Vec::new())),
                paused: Arc::new(Mutex::new(true)),
            }
        }

        fn loaded(&self) -> Vec<String> {
            self.loads.lock().unwrap().clone()
        }
    }

    impl AudioEngine for RecordingEngine {
        fn load(&mut self, uri: &str) {
            self.loads.lock().unwrap().push(uri.to_string());
        }

        fn play(&mut self) {
            *self.paused.lock().unwrap() = false;
        }

        fn pause(&mut self) {
            *self.paused.lock().unwrap() = true;
        }

        fn seek(&mut self, _position_secs: f64) {}

        fn set_muted(&mut self, _muted: bool) {}

        fn is_paused(&self) -> bool {
            *self.paused.lock().unwrap()
        }
    }

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    struct Harness {
        commands: mpsc::Sender<SessionCommand>,
        notices: mpsc::Receiver<SessionNotice>,
        engine_tx: mpsc::Sender<EngineEvent>,
        engine: RecordingEngine,
    }

    impl Harness {
        fn start(service: ScriptedService) -> Self {
            Self::start_in(service, std::env::temp_dir())
        }

        fn start_in(service: ScriptedService, downloads_dir: PathBuf) -> Self {
            let orchestrator = Arc::new(RequestOrchestrator::new(
                Arc::new(service),
                AppConfig::default(),
            ));
            let engine = RecordingEngine::new();
            let player = PlaybackController::new(Box::new(engine.clone()));

            let (command_tx, command_rx) = mpsc::channel(16);
            let (notice_tx, notice_rx) = mpsc::channel(64);
            let (engine_tx, engine_rx) = mpsc::channel(16);

            let runner = SessionRunner::new(
                orchestrator,
                player,
                AppConfig::default(),
                notice_tx,
            )
            .with_downloads_dir(downloads_dir);
            tokio::spawn(runner.run(command_rx, engine_rx));

            Self {
                commands: command_tx,
                notices: notice_rx,
                engine_tx,
                engine,
            }
        }

        async fn send(&self, command: SessionCommand) {
            self.commands.send(command).await.expect("runner alive");
        }

        async fn next_notice(&mut self) -> SessionNotice {
            tokio::time::timeout(Duration::from_secs(5), self.notices.recv())
                .await
                .expect("notice within timeout")
                .expect("notice channel open")
        }

        /// Generate a bulletin and wait for `BulletinReady`.
        async fn generate(&mut self) -> SessionNotice {
            self.send(SessionCommand::Generate {
                articles_per_category: None,
            })
            .await;
            assert_eq!(self.next_notice().await, SessionNotice::GenerationStarted);
            self.next_notice().await
        }
    }

    fn artifact(text: &str, audio: Option<&str>) -> BulletinArtifact {
        BulletinArtifact {
            text: text.to_string(),
            audio: audio.and_then(AudioRef::recognize),
        }
    }

    fn audio_service() -> ScriptedService {
        ScriptedService {
            generation: Some(artifact("A. B.", Some("x.mp3"))),
            regeneration: Some("novo.mp3"),
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    /// The happy path end to end: selection {geral}, success response with
    /// `x.mp3` → Displayed, player loads `…/audio/x.mp3?t=<token>`.
    #[tokio::test]
    async fn generation_loads_player_with_cache_busted_url() {
        let mut h = Harness::start(audio_service());

        let notice = h.generate().await;
        assert_eq!(
            notice,
            SessionNotice::BulletinReady {
                text: "A. B.".into(),
                has_audio: true,
            }
        );

        let loads = h.engine.loaded();
        assert_eq!(loads.len(), 1);
        assert!(
            loads[0].starts_with("http://localhost:8000/audio/x.mp3?t="),
            "unexpected url: {}",
            loads[0]
        );
    }

    #[tokio::test]
    async fn generation_failure_surfaces_error_and_returns_to_idle() {
        let mut h = Harness::start(ScriptedService {
            generation: None,
            regeneration: None,
        });

        let notice = h.generate().await;
        assert!(matches!(notice, SessionNotice::Error(ref m) if m.contains("Nenhuma notícia")));

        h.send(SessionCommand::ShowStatus).await;
        match h.next_notice().await {
            SessionNotice::Status(s) => assert_eq!(s.state_label, "Idle"),
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_only_generation_does_not_touch_the_player() {
        let mut h = Harness::start(ScriptedService {
            generation: Some(artifact("so texto", None)),
            regeneration: None,
        });

        let notice = h.generate().await;
        assert_eq!(
            notice,
            SessionNotice::BulletinReady {
                text: "so texto".into(),
                has_audio: false,
            }
        );
        assert!(h.engine.loaded().is_empty());

        // Playback commands are rejected while nothing is presentable.
        h.send(SessionCommand::TogglePlay).await;
        assert!(matches!(h.next_notice().await, SessionNotice::Error(_)));
    }

    #[tokio::test]
    async fn save_text_only_hides_audio_from_playback_commands() {
        let mut h = Harness::start(audio_service());
        h.generate().await;

        h.send(SessionCommand::EnterEdit).await;
        assert!(matches!(h.next_notice().await, SessionNotice::EditStarted { .. }));

        h.send(SessionCommand::UpdateBuffer("Texto novo.".into())).await;
        h.send(SessionCommand::SaveTextOnly).await;
        assert_eq!(
            h.next_notice().await,
            SessionNotice::TextSaved {
                text: "Texto novo.".into(),
                audio_hidden: true,
            }
        );

        // The stale reference must not be playable.
        h.send(SessionCommand::TogglePlay).await;
        assert!(matches!(h.next_notice().await, SessionNotice::Error(_)));
    }

    #[tokio::test]
    async fn regeneration_refreshes_audio_and_reloads_player() {
        let mut h = Harness::start(audio_service());
        h.generate().await;

        h.send(SessionCommand::EnterEdit).await;
        h.next_notice().await;
        h.send(SessionCommand::UpdateBuffer("Texto editado.".into()))
            .await;
        h.send(SessionCommand::SaveAndRegenerate).await;
        assert_eq!(h.next_notice().await, SessionNotice::RegenerationStarted);
        assert_eq!(
            h.next_notice().await,
            SessionNotice::AudioRefreshed {
                text: "Texto editado.".into(),
            }
        );

        let loads = h.engine.loaded();
        assert_eq!(loads.len(), 2);
        assert!(loads[1].contains("/audio/novo.mp3?t="));
        // Token moved on, so even an identical filename would re-fetch.
        assert_ne!(loads[0], loads[1]);
    }

    #[tokio::test]
    async fn regeneration_failure_keeps_editing_with_buffer() {
        let mut h = Harness::start(ScriptedService {
            generation: Some(artifact("A. B.", Some("x.mp3"))),
            regeneration: None,
        });
        h.generate().await;

        h.send(SessionCommand::EnterEdit).await;
        h.next_notice().await;
        h.send(SessionCommand::UpdateBuffer("Texto editado.".into()))
            .await;
        h.send(SessionCommand::SaveAndRegenerate).await;
        assert_eq!(h.next_notice().await, SessionNotice::RegenerationStarted);
        assert!(matches!(h.next_notice().await, SessionNotice::Error(_)));

        h.send(SessionCommand::ShowStatus).await;
        match h.next_notice().await {
            SessionNotice::Status(s) => {
                assert_eq!(s.state_label, "Editing");
                // The pre-edit bulletin is still consistent and presentable.
                assert!(s.audio_available);
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn whitespace_buffer_save_is_rejected_in_place() {
        let mut h = Harness::start(audio_service());
        h.generate().await;

        h.send(SessionCommand::EnterEdit).await;
        h.next_notice().await;
        h.send(SessionCommand::UpdateBuffer("   ".into())).await;
        h.send(SessionCommand::SaveTextOnly).await;
        assert!(matches!(h.next_notice().await, SessionNotice::Error(_)));

        h.send(SessionCommand::ShowStatus).await;
        match h.next_notice().await {
            SessionNotice::Status(s) => assert_eq!(s.state_label, "Editing"),
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn category_toggle_round_trips_through_the_runner() {
        let mut h = Harness::start(audio_service());

        h.send(SessionCommand::ToggleCategory("esportes".into()))
            .await;
        assert_eq!(
            h.next_notice().await,
            SessionNotice::SelectionChanged(vec!["esportes".into()])
        );

        // Deactivating the last category is refused.
        h.send(SessionCommand::ToggleCategory("esportes".into()))
            .await;
        assert!(matches!(h.next_notice().await, SessionNotice::Error(_)));
    }

    #[tokio::test]
    async fn engine_events_flow_through_while_editing() {
        let mut h = Harness::start(audio_service());
        h.generate().await;

        h.send(SessionCommand::EnterEdit).await;
        h.next_notice().await;

        // The media pipeline keeps reporting during the edit.
        h.engine_tx
            .send(EngineEvent::MetadataLoaded { duration_secs: 90.0 })
            .await
            .unwrap();
        h.engine_tx.send(EngineEvent::Ended).await.unwrap();
        assert_eq!(h.next_notice().await, SessionNotice::PlaybackEnded);

        h.send(SessionCommand::ShowStatus).await;
        match h.next_notice().await {
            SessionNotice::Status(s) => {
                assert_eq!(s.state_label, "Editing");
                assert_eq!(s.duration_secs, 90.0);
                assert!(!s.playing);
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn engine_failure_is_forwarded_verbatim() {
        let mut h = Harness::start(audio_service());
        h.engine_tx
            .send(EngineEvent::Failed {
                message: "HTTP 404 fetching audio".into(),
            })
            .await
            .unwrap();
        assert!(
            matches!(h.next_notice().await, SessionNotice::Error(ref m) if m.contains("HTTP 404"))
        );
    }

    #[tokio::test]
    async fn download_writes_presented_audio_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::start_in(audio_service(), dir.path().to_path_buf());
        h.generate().await;

        h.send(SessionCommand::DownloadAudio).await;
        match h.next_notice().await {
            SessionNotice::AudioDownloaded(path) => {
                assert_eq!(path, dir.path().join("x.mp3"));
                assert_eq!(std::fs::read(&path).unwrap(), vec![0xff, 0xfb, 0x90]);
            }
            other => panic!("expected AudioDownloaded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn download_without_presentable_audio_is_rejected() {
        let mut h = Harness::start(audio_service());
        h.send(SessionCommand::DownloadAudio).await;
        assert!(matches!(h.next_notice().await, SessionNotice::Error(_)));
    }
}
