//! Configuration management for the chat voice pipeline
//!
//! Precedence, lowest to highest: built-in defaults, the TOML config file,
//! environment variables (a `.env` file is loaded first if present), and
//! finally CLI flags applied by the binary.

pub mod file;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

use self::file::ChatVoiceConfigFile;

/// Default pause between poll cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default YouTube Data API v3 base URL
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Default local VOICEVOX engine URL
pub const DEFAULT_VOICEVOX_URL: &str = "http://127.0.0.1:50021";

/// Default VOICEVOX speaker (style) id
pub const DEFAULT_SPEAKER: u32 = 3;

/// Default artifact location, relative to the working directory
pub const DEFAULT_ARTIFACT_PATH: &str = "material/aituber-voice.wav";

/// Default timeout for reply generation requests
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Live stream (video) identifier whose chat is followed
    pub stream_id: Option<String>,

    /// Pause between poll cycles
    pub poll_interval: Duration,

    /// API keys
    pub api_keys: ApiKeys,

    /// Chat feed configuration
    pub feed: FeedConfig,

    /// Reply generation configuration
    pub reply: ReplyConfig,

    /// Speech synthesis and playback configuration
    pub speech: SpeechConfig,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// YouTube Data API key
    pub youtube: Option<String>,

    /// Google Gemini API key
    pub gemini: Option<String>,

    /// `OpenAI` API key
    pub openai: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "***");
        f.debug_struct("ApiKeys")
            .field("youtube", &mask(&self.youtube))
            .field("gemini", &mask(&self.gemini))
            .field("openai", &mask(&self.openai))
            .finish()
    }
}

/// Chat feed configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// YouTube Data API base URL
    pub base_url: String,
}

/// Reply generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyBackend {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,
    /// `OpenAI` chat completions
    OpenAi,
}

impl ReplyBackend {
    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAi => "gpt-3.5-turbo",
        }
    }

    /// Backend name as used in configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

impl FromStr for ReplyBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "gpt" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!(
                "unknown reply backend \"{other}\" (expected \"gemini\" or \"openai\")"
            ))),
        }
    }
}

/// Reply generation configuration
#[derive(Debug, Clone)]
pub struct ReplyConfig {
    /// Selected backend
    pub backend: ReplyBackend,

    /// Model identifier
    pub model: String,

    /// Override for the backend's API base URL
    pub base_url: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// VOICEVOX engine URL
    pub voicevox_url: String,

    /// VOICEVOX speaker (style) id
    pub speaker: u32,

    /// Fixed path the synthesized audio is written to every cycle
    pub artifact_path: PathBuf,
}

impl Config {
    /// Load configuration from `.env`, the config file and the environment
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "failed to load .env"),
        }

        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// Environment values win over file values.
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn from_sources<F>(fc: ChatVoiceConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_keys = ApiKeys {
            youtube: env("YOUTUBE_API_KEY").or(fc.api_keys.youtube),
            gemini: env("GEMINI_API_KEY").or(fc.api_keys.gemini),
            openai: env("OPENAI_API_KEY")
                .or_else(|| env("OPEN_API_KEY"))
                .or(fc.api_keys.openai),
        };

        let poll_interval = match env("CHATVOICE_POLL_INTERVAL") {
            Some(v) => Duration::from_secs(parse_number(&v, "CHATVOICE_POLL_INTERVAL")?),
            None => fc
                .poll_interval_secs
                .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs),
        };

        let feed = FeedConfig {
            base_url: env("YOUTUBE_API_URL")
                .or(fc.feed.base_url)
                .unwrap_or_else(|| DEFAULT_YOUTUBE_BASE_URL.to_string()),
        };

        let backend = env("CHATVOICE_REPLY_BACKEND")
            .or(fc.reply.backend)
            .map(|b| b.parse::<ReplyBackend>())
            .transpose()?
            .unwrap_or_default();

        let reply_timeout = match env("CHATVOICE_REPLY_TIMEOUT") {
            Some(v) => Duration::from_secs(parse_number(&v, "CHATVOICE_REPLY_TIMEOUT")?),
            None => fc
                .reply
                .timeout_secs
                .map_or(DEFAULT_REPLY_TIMEOUT, Duration::from_secs),
        };

        let reply = ReplyConfig {
            backend,
            model: env("CHATVOICE_REPLY_MODEL")
                .or(fc.reply.model)
                .unwrap_or_else(|| backend.default_model().to_string()),
            base_url: env("CHATVOICE_REPLY_URL").or(fc.reply.base_url),
            timeout: reply_timeout,
        };

        let speaker = match env("VOICEVOX_SPEAKER") {
            Some(v) => parse_number(&v, "VOICEVOX_SPEAKER")?,
            None => fc.speech.speaker.unwrap_or(DEFAULT_SPEAKER),
        };

        let speech = SpeechConfig {
            voicevox_url: env("VOICEVOX_URL")
                .or(fc.speech.voicevox_url)
                .unwrap_or_else(|| DEFAULT_VOICEVOX_URL.to_string()),
            speaker,
            artifact_path: env("CHATVOICE_ARTIFACT_PATH")
                .or(fc.speech.artifact_path)
                .map_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_PATH), PathBuf::from),
        };

        Ok(Self {
            stream_id: env("CHATVOICE_STREAM_ID").or(fc.stream_id),
            poll_interval,
            api_keys,
            feed,
            reply,
            speech,
        })
    }

    /// API key for the selected reply backend
    ///
    /// # Errors
    ///
    /// Returns error if the key is not configured
    pub fn reply_api_key(&self) -> Result<&str> {
        let (key, var) = match self.reply.backend {
            ReplyBackend::Gemini => (&self.api_keys.gemini, "GEMINI_API_KEY"),
            ReplyBackend::OpenAi => (&self.api_keys.openai, "OPENAI_API_KEY"),
        };
        key.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "{var} required for the {} reply backend",
                self.reply.backend.as_str()
            ))
        })
    }

    /// YouTube Data API key
    ///
    /// # Errors
    ///
    /// Returns error if the key is not configured
    pub fn youtube_api_key(&self) -> Result<&str> {
        self.api_keys
            .youtube
            .as_deref()
            .ok_or_else(|| Error::Config("YOUTUBE_API_KEY required".to_string()))
    }

    /// Stream identifier to follow
    ///
    /// # Errors
    ///
    /// Returns error if no stream was configured
    pub fn stream_id(&self) -> Result<&str> {
        self.stream_id.as_deref().ok_or_else(|| {
            Error::Config("stream id required (--stream-id or CHATVOICE_STREAM_ID)".to_string())
        })
    }
}

fn parse_number<T: FromStr>(value: &str, var: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{var} must be a non-negative integer, got \"{value}\"")))
}
