//! Typed wire contracts for the bulletin service.
//!
//! Response payloads are validated and parsed into these types at the
//! network boundary; nothing downstream ever touches raw JSON. A response
//! that does not match the expected shape is a generation/regeneration
//! error, not a panic.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, BulletinStyle, SummaryMode, TtsEngine};

/// Filename suffixes that signal a playable narration. The service emits
/// `.mp3`; a `.txt` filename means text-only generation.
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".ogg"];

// ---------------------------------------------------------------------------
// AudioRef
// ---------------------------------------------------------------------------

/// A server-side audio filename that passed the extension check.
///
/// Constructing one is only possible through [`AudioRef::recognize`], so a
/// held `AudioRef` is always something the player can be pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRef(String);

impl AudioRef {
    /// Accept `filename` only when it ends in a recognized audio extension
    /// (case-insensitive).
    pub fn recognize(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        AUDIO_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(*ext))
            .then(|| Self(filename.to_string()))
    }

    pub fn filename(&self) -> &str {
        &self.0
    }
}

/// Fetchable URI for an audio file: `{base}/audio/{filename}?t={token}`.
///
/// The `t` token is mandatory — filenames repeat across distinct artifacts,
/// and without it a caching client would replay the previous narration for
/// a colliding name.
pub fn audio_url(base_url: &str, audio: &AudioRef, cache_token: u64) -> String {
    format!(
        "{}/audio/{}?t={}",
        base_url.trim_end_matches('/'),
        audio.filename(),
        cache_token
    )
}

// ---------------------------------------------------------------------------
// BulletinArtifact
// ---------------------------------------------------------------------------

/// A generated bulletin: the script text plus, when narration was produced,
/// a reference to the audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletinArtifact {
    pub text: String,
    pub audio: Option<AudioRef>,
}

impl BulletinArtifact {
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

// ---------------------------------------------------------------------------
// GenerationRequest (domain) + wire bodies
// ---------------------------------------------------------------------------

/// A fully specified bulletin-generation request.
///
/// `total_articles` is derived from the per-category count and the selection
/// size — it is never stored, so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub categories: BTreeSet<String>,
    pub articles_per_category: u32,
    pub style: BulletinStyle,
    pub include_intro: bool,
    pub include_outro: bool,
    pub summary_mode: SummaryMode,
    pub tts_engine: TtsEngine,
}

impl GenerationRequest {
    /// Build a request from the active selection and config defaults.
    ///
    /// `articles_per_category` is the operator's override; `None` or a
    /// non-positive value falls back to 3.
    pub fn new(
        categories: BTreeSet<String>,
        articles_per_category: Option<i64>,
        config: &AppConfig,
    ) -> Self {
        let per_category = match articles_per_category {
            Some(n) if n > 0 => n as u32,
            _ => 3,
        };

        Self {
            categories,
            articles_per_category: per_category,
            style: config.bulletin.style,
            include_intro: config.bulletin.include_intro,
            include_outro: config.bulletin.include_outro,
            summary_mode: config.bulletin.summary_mode,
            tts_engine: config.tts.engine,
        }
    }

    /// `articles_per_category * |categories|` — the limit the service sees.
    pub fn total_articles(&self) -> u32 {
        self.articles_per_category * self.categories.len() as u32
    }

    /// The JSON body for `POST /api/generate-boletim`.
    pub fn wire_body(&self) -> GenerateBulletinBody {
        GenerateBulletinBody {
            categories: self.categories.iter().cloned().collect(),
            num_articles: self.total_articles(),
            style: self.style.as_str().to_string(),
            include_intro: self.include_intro,
            include_outro: self.include_outro,
            summary_mode: self.summary_mode.as_str().to_string(),
            tts_engine: self.tts_engine.as_str().to_string(),
        }
    }
}

/// Wire body for `POST /api/generate-boletim`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateBulletinBody {
    pub categories: Vec<String>,
    pub num_articles: u32,
    pub style: String,
    pub include_intro: bool,
    pub include_outro: bool,
    pub summary_mode: String,
    pub tts_engine: String,
}

/// Wire response for `POST /api/generate-boletim`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateBulletinResponse {
    pub summary_text: String,
    #[serde(default)]
    pub audio_filename: Option<String>,
}

impl GenerateBulletinResponse {
    /// Parse into the domain artifact. A missing filename or one without a
    /// recognized audio extension yields a text-only artifact.
    pub fn into_artifact(self) -> BulletinArtifact {
        let audio = self
            .audio_filename
            .as_deref()
            .and_then(AudioRef::recognize);
        BulletinArtifact {
            text: self.summary_text,
            audio,
        }
    }
}

// ---------------------------------------------------------------------------
// Audio regeneration wire types
// ---------------------------------------------------------------------------

/// Wire body for `POST /api/generate-audio`.
#[derive(Debug, Clone, Serialize)]
pub struct RegenerateAudioBody {
    pub text: String,
    pub tts_engine: String,
    pub tts_voice_id: String,
}

/// Wire response for `POST /api/generate-audio`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateAudioResponse {
    pub audio_filename: String,
}

// ---------------------------------------------------------------------------
// Remote config wire types
// ---------------------------------------------------------------------------

/// Wire response for `GET /api/config`. The service reports env-style upper
/// snake keys and masks stored API keys, so key fields are read-only hints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteConfig {
    #[serde(rename = "AI_SUMMARY_MODE", default)]
    pub ai_summary_mode: Option<String>,
    #[serde(rename = "TTS_ENGINE", default)]
    pub tts_engine: Option<String>,
}

/// Wire body for `POST /api/config`. `None` keys are serialised as `null`,
/// which the service treats as "keep the current value".
#[derive(Debug, Clone, Serialize)]
pub struct ConfigUpdateBody {
    pub ai_summary_mode: String,
    pub tts_engine: String,
    pub groq_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub gnews_api_key: Option<String>,
}

impl ConfigUpdateBody {
    /// Assemble an update from local settings.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ai_summary_mode: config.bulletin.summary_mode.as_str().to_string(),
            tts_engine: config.tts.engine.as_str().to_string(),
            groq_api_key: config.keys.groq_api_key.clone(),
            elevenlabs_api_key: config.keys.elevenlabs_api_key.clone(),
            gnews_api_key: config.keys.gnews_api_key.clone(),
        }
    }
}

/// Error body the service attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
