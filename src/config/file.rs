//! TOML configuration file loading
//!
//! Supports `~/.config/chatvoice/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ChatVoiceConfigFile {
    /// Live stream (video) identifier to follow
    #[serde(default)]
    pub stream_id: Option<String>,

    /// Seconds to sleep between polls
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    /// Chat feed configuration
    #[serde(default)]
    pub feed: FeedFileConfig,

    /// Reply generation configuration
    #[serde(default)]
    pub reply: ReplyFileConfig,

    /// Speech synthesis and playback configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Chat feed configuration
#[derive(Debug, Default, Deserialize)]
pub struct FeedFileConfig {
    /// YouTube Data API base URL
    pub base_url: Option<String>,
}

/// Reply generation configuration
#[derive(Debug, Default, Deserialize)]
pub struct ReplyFileConfig {
    /// Backend name ("gemini" or "openai")
    pub backend: Option<String>,

    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: Option<String>,

    /// Override for the backend's API base URL
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// VOICEVOX engine URL
    pub voicevox_url: Option<String>,

    /// VOICEVOX speaker (style) id
    pub speaker: Option<u32>,

    /// Where the synthesized audio is written each cycle
    pub artifact_path: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub youtube: Option<String>,
    pub gemini: Option<String>,
    pub openai: Option<String>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> crate::Result<ChatVoiceConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `ChatVoiceConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> ChatVoiceConfigFile {
    let Some(path) = config_file_path() else {
        return ChatVoiceConfigFile::default();
    };

    if !path.exists() {
        return ChatVoiceConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ChatVoiceConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ChatVoiceConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/chatvoice/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("chatvoice").join("config.toml"))
}
