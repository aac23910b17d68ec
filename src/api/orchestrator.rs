//! Request building and submission with a single-flight busy guard.
//!
//! [`RequestOrchestrator`] is the only path through which the session talks
//! to the service. One request may be in flight at a time — generation and
//! audio regeneration share the slot. A second attempt while the slot is
//! taken fails immediately with [`OrchestratorError::Busy`]; nothing is
//! queued and nothing is cancelled. Each submission is a single attempt:
//! failures surface to the caller, who decides whether to re-invoke.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::api::client::{ApiError, BulletinService};
use crate::api::types::{BulletinArtifact, GenerationRequest};
use crate::config::{AppConfig, TtsEngine};

// ---------------------------------------------------------------------------
// OrchestratorError
// ---------------------------------------------------------------------------

/// Errors surfaced by request submission.
///
/// `Busy` and `EmptyText` are local and never touch the network; the other
/// two carry whatever the remote call produced (`status` is `None` when the
/// transport failed before an HTTP status existed).
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// Another generation/regeneration is already in flight.
    #[error("a request is already in flight")]
    Busy,

    /// Regeneration text was empty or whitespace-only.
    #[error("text must not be empty")]
    EmptyText,

    /// Bulletin generation failed remotely.
    #[error("generation failed: {detail}")]
    Generation {
        status: Option<u16>,
        detail: String,
    },

    /// Audio regeneration failed remotely.
    #[error("audio regeneration failed: {detail}")]
    Regeneration {
        status: Option<u16>,
        detail: String,
    },
}

fn split_api_error(e: ApiError) -> (Option<u16>, String) {
    match e {
        ApiError::Status { status, detail } => (Some(status), detail),
        other => (None, other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Flight slot
// ---------------------------------------------------------------------------

/// RAII hold on the single-flight slot; releases on drop so the slot frees
/// on every exit path, including panics inside the service call.
struct FlightSlot<'a>(&'a AtomicBool);

impl<'a> FlightSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, OrchestratorError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| OrchestratorError::Busy)
    }
}

impl Drop for FlightSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// RequestOrchestrator
// ---------------------------------------------------------------------------

/// Builds and submits service requests, one at a time.
pub struct RequestOrchestrator {
    service: Arc<dyn BulletinService>,
    config: AppConfig,
    in_flight: AtomicBool,
}

impl RequestOrchestrator {
    pub fn new(service: Arc<dyn BulletinService>, config: AppConfig) -> Self {
        Self {
            service,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether the single-flight slot is currently taken.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Assemble a generation request from the active selection.
    ///
    /// Pure — no I/O, no state change. `articles_per_category` overrides the
    /// configured default; `None` or a non-positive value falls back to 3.
    pub fn build_generation_request(
        &self,
        selection: &BTreeSet<String>,
        articles_per_category: Option<i64>,
    ) -> GenerationRequest {
        GenerationRequest::new(selection.clone(), articles_per_category, &self.config)
    }

    /// Submit a generation request. Single attempt, no retries.
    pub async fn submit_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<BulletinArtifact, OrchestratorError> {
        let _slot = FlightSlot::acquire(&self.in_flight)?;

        log::debug!(
            "orchestrator: generating for {:?} ({} articles total)",
            request.categories,
            request.total_articles()
        );

        self.service
            .generate_bulletin(request)
            .await
            .map_err(|e| {
                let (status, detail) = split_api_error(e);
                log::error!("orchestrator: generation failed ({detail})");
                OrchestratorError::Generation { status, detail }
            })
    }

    /// Submit an audio regeneration for `text`.
    ///
    /// Empty/whitespace-only text is rejected locally — no network call is
    /// issued and the flight slot is not claimed.
    pub async fn submit_audio_regeneration(
        &self,
        text: &str,
        tts_engine: TtsEngine,
        tts_voice_id: &str,
    ) -> Result<BulletinArtifact, OrchestratorError> {
        if text.trim().is_empty() {
            return Err(OrchestratorError::EmptyText);
        }

        let _slot = FlightSlot::acquire(&self.in_flight)?;

        log::debug!(
            "orchestrator: regenerating audio ({} chars, engine {})",
            text.len(),
            tts_engine.as_str()
        );

        let audio = self
            .service
            .regenerate_audio(text, tts_engine, tts_voice_id)
            .await
            .map_err(|e| {
                let (status, detail) = split_api_error(e);
                log::error!("orchestrator: regeneration failed ({detail})");
                OrchestratorError::Regeneration { status, detail }
            })?;

        Ok(BulletinArtifact {
            text: text.to_string(),
            audio: Some(audio),
        })
    }

    /// Fetch the bytes behind an audio URL (used by the download action).
    /// Not single-flight guarded — downloads are read-only and may overlap
    /// a generation.
    pub async fn fetch_audio_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.service.download_audio(url).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::AudioRef;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Mock service that parks every call until released, counting calls.
    struct GatedService {
        release: Notify,
        calls: AtomicUsize,
    }

    impl GatedService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                release: Notify::new(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl BulletinService for GatedService {
        async fn generate_bulletin(
            &self,
            _request: &GenerationRequest,
        ) -> Result<BulletinArtifact, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(BulletinArtifact {
                text: "Bom dia.".into(),
                audio: AudioRef::recognize("x.mp3"),
            })
        }

        async fn regenerate_audio(
            &self,
            text: &str,
            _tts_engine: TtsEngine,
            _tts_voice_id: &str,
        ) -> Result<AudioRef, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            let _ = text;
            Ok(AudioRef::recognize("novo.mp3").unwrap())
        }

        async fn download_audio(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
            Ok(vec![0xff, 0xfb])
        }
    }

    /// Mock service that fails every call with a given status/detail.
    struct FailingService;

    #[async_trait]
    impl BulletinService for FailingService {
        async fn generate_bulletin(
            &self,
            _request: &GenerationRequest,
        ) -> Result<BulletinArtifact, ApiError> {
            Err(ApiError::Status {
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
            Err(ApiError::Timeout)
        }

        async fn download_audio(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
            Err(ApiError::Request("connection refused".into()))
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn selection(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn orchestrator(service: Arc<dyn BulletinService>) -> Arc<RequestOrchestrator> {
        Arc::new(RequestOrchestrator::new(service, AppConfig::default()))
    }

    async fn wait_for_call(service: &GatedService) {
        while service.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    }

    // -----------------------------------------------------------------------
    // build_generation_request
    // -----------------------------------------------------------------------

    #[test]
    fn build_request_uses_config_defaults() {
        let orch = RequestOrchestrator::new(GatedService::new(), AppConfig::default());
        let req = orch.build_generation_request(&selection(&["geral"]), None);
        assert_eq!(req.articles_per_category, 3);
        assert_eq!(req.total_articles(), 3);
        assert!(req.include_intro);
    }

    #[test]
    fn build_request_rejects_non_positive_override() {
        let orch = RequestOrchestrator::new(GatedService::new(), AppConfig::default());
        let req = orch.build_generation_request(&selection(&["esportes", "tecnologia"]), Some(-1));
        assert_eq!(req.articles_per_category, 3);
        assert_eq!(req.total_articles(), 6);
    }

    // -----------------------------------------------------------------------
    // Busy guard
    // -----------------------------------------------------------------------

    /// A second submission while one is parked in flight must fail fast with
    /// `Busy` and never reach the service.
    #[tokio::test]
    async fn second_generation_while_in_flight_is_busy() {
        let service = GatedService::new();
        let orch = orchestrator(service.clone());

        let req = orch.build_generation_request(&selection(&["geral"]), None);
        let first = {
            let orch = Arc::clone(&orch);
            let req = req.clone();
            tokio::spawn(async move { orch.submit_generation(&req).await })
        };
        wait_for_call(&service).await;
        assert!(orch.is_busy());

        let err = orch.submit_generation(&req).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Busy));
        // The parked call is the only one that reached the service.
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        service.release.notify_one();
        let artifact = first.await.unwrap().unwrap();
        assert!(artifact.has_audio());
        assert!(!orch.is_busy());
    }

    /// Generation and regeneration share the single-flight slot.
    #[tokio::test]
    async fn regeneration_while_generation_in_flight_is_busy() {
        let service = GatedService::new();
        let orch = orchestrator(service.clone());

        let req = orch.build_generation_request(&selection(&["geral"]), None);
        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.submit_generation(&req).await })
        };
        wait_for_call(&service).await;

        let err = orch
            .submit_audio_regeneration("novo texto", TtsEngine::Gtts, "voz")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Busy));

        service.release.notify_one();
        first.await.unwrap().unwrap();
    }

    /// The slot frees after completion, so the next attempt goes through.
    #[tokio::test]
    async fn slot_frees_after_completion() {
        let service = GatedService::new();
        let orch = orchestrator(service.clone());
        let req = orch.build_generation_request(&selection(&["geral"]), None);

        // Pre-arm the gate so the call completes immediately.
        service.release.notify_one();
        orch.submit_generation(&req).await.unwrap();

        service.release.notify_one();
        orch.submit_generation(&req).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    /// The slot frees after a failure too.
    #[tokio::test]
    async fn slot_frees_after_failure() {
        let orch = orchestrator(Arc::new(FailingService));
        let req = orch.build_generation_request(&selection(&["geral"]), None);

        let err = orch.submit_generation(&req).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Generation {
                status: Some(500),
                ..
            }
        ));

        // Not Busy — the second attempt reaches the service again.
        let err = orch.submit_generation(&req).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Generation { .. }));
    }

    // -----------------------------------------------------------------------
    // Regeneration validation
    // -----------------------------------------------------------------------

    /// Whitespace-only text is rejected locally — the service is never
    /// called and the flight slot stays free.
    #[tokio::test]
    async fn whitespace_text_is_rejected_without_network() {
        let service = GatedService::new();
        let orch = orchestrator(service.clone());

        let err = orch
            .submit_audio_regeneration("   \n\t", TtsEngine::Gtts, "voz")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::EmptyText));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert!(!orch.is_busy());
    }

    /// A successful regeneration yields an artifact pairing the submitted
    /// text with the new audio reference.
    #[tokio::test]
    async fn regeneration_pairs_text_with_new_audio() {
        let service = GatedService::new();
        let orch = orchestrator(service.clone());

        service.release.notify_one();
        let artifact = orch
            .submit_audio_regeneration("Texto editado.", TtsEngine::Gtts, "voz")
            .await
            .unwrap();

        assert_eq!(artifact.text, "Texto editado.");
        assert_eq!(artifact.audio.unwrap().filename(), "novo.mp3");
    }

    /// Remote regeneration failures map to `Regeneration` with no status for
    /// transport-level errors.
    #[tokio::test]
    async fn regeneration_transport_failure_has_no_status() {
        let orch = orchestrator(Arc::new(FailingService));
        let err = orch
            .submit_audio_regeneration("texto", TtsEngine::Gtts, "voz")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Regeneration { status: None, .. }
        ));
    }
}
