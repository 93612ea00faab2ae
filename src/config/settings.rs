//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files. Every field carries a
//! serde default so a partial `settings.toml` still loads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

/// Settings for the generative-AI backend that runs the flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    ///
    /// - Gemini default: `https://generativelanguage.googleapis.com/v1beta/openai`
    /// - OpenAI: `https://api.openai.com/v1`
    pub base_url: String,
    /// API key. When `None`, the variable named by `api_key_env` is consulted.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Multimodal model identifier (e.g. `"gemini-2.0-flash"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a flow response before timing out.
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".into(),
            model: "gemini-2.0-flash".into(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

impl AiConfig {
    /// The API key to send, if any: the configured key, else the value of
    /// the `api_key_env` variable. Empty strings count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the text-to-speech engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Set to `false` to run without narration (the capability is reported
    /// as unsupported).
    pub enabled: bool,
    /// TTS program invoked with the utterance text as its last argument.
    pub program: String,
    /// Extra arguments placed before the text (voice, rate, …).
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let program = if cfg!(target_os = "macos") {
            "say"
        } else {
            "espeak-ng"
        };
        Self {
            enabled: true,
            program: program.into(),
            args: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// FileConfig
// ---------------------------------------------------------------------------

/// Limits applied when reading user files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Largest file, in bytes, that will be encoded and sent inline.
    pub max_bytes: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use doc_studio::config::AppConfig;
///
/// // Load, writing the defaults on first run
/// let config = AppConfig::load_or_init().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// AI backend settings.
    pub ai: AiConfig,
    /// Speech engine settings.
    pub speech: SpeechConfig,
    /// File handling limits.
    pub files: FileConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// On first run the file does not exist yet; the defaults are written
    /// there so the user has a file to edit, and returned.
    pub fn load_or_init() -> Result<Self> {
        Self::load_or_init_at(&AppPaths::new().settings_file)
    }

    /// [`load_or_init`](Self::load_or_init) for an explicit path.
    pub fn load_or_init_at(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        config.save_to(path)?;
        log::info!("wrote default settings to {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
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
