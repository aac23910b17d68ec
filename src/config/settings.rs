//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// BulletinStyle
// ---------------------------------------------------------------------------

/// Narration style requested from the summarizer.
///
/// Serialized with the wire spelling the service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletinStyle {
    /// News-desk register: short declarative sentences.
    #[serde(rename = "jornalistico")]
    Jornalistico,
    /// Looser, radio-host register.
    #[serde(rename = "conversacional")]
    Conversacional,
}

impl BulletinStyle {
    /// Wire spelling sent in request payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            BulletinStyle::Jornalistico => "jornalistico",
            BulletinStyle::Conversacional => "conversacional",
        }
    }
}

impl Default for BulletinStyle {
    fn default() -> Self {
        Self::Jornalistico
    }
}

// ---------------------------------------------------------------------------
// SummaryMode
// ---------------------------------------------------------------------------

/// Which summarizer backend the service should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryMode {
    /// Groq cloud summarization (the service's default).
    #[serde(rename = "groq")]
    Groq,
    /// AI summarization off; the service falls back to plain extracts.
    #[serde(rename = "none")]
    Disabled,
}

impl SummaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::Groq => "groq",
            SummaryMode::Disabled => "none",
        }
    }

    /// Parse the wire spelling; unknown values fall back to the default so a
    /// remote config read can never poison local settings.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "none" => SummaryMode::Disabled,
            _ => SummaryMode::Groq,
        }
    }
}

impl Default for SummaryMode {
    fn default() -> Self {
        Self::Groq
    }
}

// ---------------------------------------------------------------------------
// TtsEngine
// ---------------------------------------------------------------------------

/// Which text-to-speech backend narrates the bulletin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtsEngine {
    /// Google TTS — no API key required.
    #[serde(rename = "gtts")]
    Gtts,
    /// ElevenLabs — requires an API key and a voice id.
    #[serde(rename = "elevenlabs")]
    ElevenLabs,
}

impl TtsEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsEngine::Gtts => "gtts",
            TtsEngine::ElevenLabs => "elevenlabs",
        }
    }

    /// Parse the wire spelling; unknown values fall back to the default.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "elevenlabs" => TtsEngine::ElevenLabs,
            _ => TtsEngine::Gtts,
        }
    }
}

impl Default for TtsEngine {
    fn default() -> Self {
        Self::Gtts
    }
}

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Connection settings for the bulletin-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,
    /// Maximum seconds to wait for a generation/regeneration response.
    ///
    /// Generation collects, summarizes and narrates articles server-side,
    /// so this is much longer than a typical API timeout.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// BulletinConfig
// ---------------------------------------------------------------------------

/// Defaults for bulletin generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletinConfig {
    /// Articles requested per active category (the request carries the
    /// derived total).
    pub articles_per_category: u32,
    /// Narration style.
    pub style: BulletinStyle,
    /// Ask for an opening line.
    pub include_intro: bool,
    /// Ask for a sign-off line.
    pub include_outro: bool,
    /// Summarizer backend.
    pub summary_mode: SummaryMode,
}

impl Default for BulletinConfig {
    fn default() -> Self {
        Self {
            articles_per_category: 3,
            style: BulletinStyle::default(),
            include_intro: true,
            include_outro: true,
            summary_mode: SummaryMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Text-to-speech settings used for audio regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// TTS backend.
    pub engine: TtsEngine,
    /// Voice id passed to the TTS backend (meaningful for ElevenLabs).
    pub voice_id: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: TtsEngine::default(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ApiKeys
// ---------------------------------------------------------------------------

/// Provider API keys pushed to the service's config endpoint.
///
/// `None` means "leave the server-side value untouched". The service masks
/// stored keys on read, so values that come back from a config fetch are
/// never written into this struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    pub groq_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub gnews_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use boletim::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Service connection settings.
    pub api: ApiConfig,
    /// Generation defaults.
    pub bulletin: BulletinConfig,
    /// Text-to-speech settings.
    pub tts: TtsConfig,
    /// Provider API keys (optional, write-only towards the service).
    pub keys: ApiKeys,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
