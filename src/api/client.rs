//! The `BulletinService` seam and its HTTP implementation.
//!
//! [`BulletinService`] is the async trait the orchestrator talks to;
//! [`HttpBulletinService`] is the production implementation backed by
//! `reqwest`. All connection details come from [`ApiConfig`]; nothing is
//! hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::types::{
    AudioRef, BulletinArtifact, ConfigUpdateBody, ErrorBody, GenerateBulletinResponse,
    GenerationRequest, RegenerateAudioBody, RegenerateAudioResponse, RemoteConfig,
};
use crate::config::{ApiConfig, TtsEngine};

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from talking to the bulletin service.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body could not be parsed as the expected JSON shape.
    #[error("failed to parse service response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

impl ApiError {
    /// HTTP status carried by the error, when the failure got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Build a [`ApiError::Status`] from a response body, preferring the
/// service's own `{"detail": …}` message over the raw body.
fn status_error(status: u16, body: &str) -> ApiError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });
    ApiError::Status { status, detail }
}

// ---------------------------------------------------------------------------
// BulletinService trait
// ---------------------------------------------------------------------------

/// Async interface to the remote generation service.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// behind an `Arc<dyn BulletinService>`.
#[async_trait]
pub trait BulletinService: Send + Sync {
    /// Run the full collect → summarize → narrate flow.
    async fn generate_bulletin(
        &self,
        request: &GenerationRequest,
    ) -> Result<BulletinArtifact, ApiError>;

    /// Narrate `text` with the given TTS backend/voice.
    async fn regenerate_audio(
        &self,
        text: &str,
        tts_engine: TtsEngine,
        tts_voice_id: &str,
    ) -> Result<AudioRef, ApiError>;

    /// Fetch the bytes behind a previously presented audio URL.
    async fn download_audio(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

// Compile-time assertion: Box<dyn BulletinService> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn BulletinService>) {}
};

// ---------------------------------------------------------------------------
// HttpBulletinService
// ---------------------------------------------------------------------------

/// Production service client.
///
/// The HTTP client is pre-configured with the per-request timeout from
/// `config.timeout_secs`. A default (no-timeout) client is used as a
/// last-resort fallback if the builder fails (should never happen in
/// practice).
pub struct HttpBulletinService {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpBulletinService {
    /// Build a service client from connection settings.
    pub fn from_config(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST `body` to `path` and parse a JSON response of type `T`.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed)
    }

    /// `GET /api/config` — remote defaults, with stored keys masked.
    pub async fn fetch_config(&self) -> Result<RemoteConfig, ApiError> {
        let response = self.client.get(self.endpoint("/api/config")).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        response
            .json::<RemoteConfig>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// `POST /api/config` — push operator settings to the service.
    pub async fn save_config(&self, update: &ConfigUpdateBody) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint("/api/config"))
            .json(update)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }
        Ok(())
    }
}

#[async_trait]
impl BulletinService for HttpBulletinService {
    async fn generate_bulletin(
        &self,
        request: &GenerationRequest,
    ) -> Result<BulletinArtifact, ApiError> {
        let response: GenerateBulletinResponse = self
            .post_json("/api/generate-boletim", &request.wire_body())
            .await?;
        Ok(response.into_artifact())
    }

    async fn regenerate_audio(
        &self,
        text: &str,
        tts_engine: TtsEngine,
        tts_voice_id: &str,
    ) -> Result<AudioRef, ApiError> {
        let body = RegenerateAudioBody {
            text: text.to_string(),
            tts_engine: tts_engine.as_str().to_string(),
            tts_voice_id: tts_voice_id.to_string(),
        };

        let response: RegenerateAudioResponse =
            self.post_json("/api/generate-audio", &body).await?;

        AudioRef::recognize(&response.audio_filename).ok_or_else(|| {
            ApiError::Parse(format!(
                "regeneration returned a non-audio filename: {}",
                response.audio_filename
            ))
        })
    }

    async fn download_audio(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> ApiConfig {
        ApiConfig {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _service = HttpBulletinService::from_config(&make_config());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let mut config = make_config();
        config.base_url = "http://localhost:8000/".into();
        let service = HttpBulletinService::from_config(&config);
        assert_eq!(
            service.endpoint("/api/config"),
            "http://localhost:8000/api/config"
        );
    }

    /// Verify that `HttpBulletinService` is usable as `dyn BulletinService`.
    #[test]
    fn service_is_object_safe() {
        let service: Box<dyn BulletinService> =
            Box::new(HttpBulletinService::from_config(&make_config()));
        drop(service);
    }

    // ---- status_error ----

    #[test]
    fn status_error_prefers_detail_field() {
        let err = status_error(500, r#"{"detail":"Nenhuma notícia encontrada"}"#);
        match err {
            ApiError::Status { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "Nenhuma notícia encontrada");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn status_error_falls_back_to_raw_body() {
        let err = status_error(502, "Bad Gateway");
        match err {
            ApiError::Status { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, "Bad Gateway");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn status_error_empty_body_reports_http_code() {
        let err = status_error(404, "");
        match err {
            ApiError::Status { detail, .. } => assert_eq!(detail, "HTTP 404"),
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn api_error_status_accessor() {
        assert_eq!(status_error(500, "x").status(), Some(500));
        assert_eq!(ApiError::Timeout.status(), None);
    }
}
