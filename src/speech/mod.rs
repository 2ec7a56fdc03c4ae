//! Speech synthesis and playback
//!
//! Each cycle the synthesized audio is written to one fixed artifact path,
//! read back, and played to completion before control returns.

mod artifact;
mod playback;
mod voicevox;

pub use artifact::{read_artifact, write_artifact};
pub use playback::{AudioPlayback, DecodedAudio, decode_wav};
pub use voicevox::VoicevoxSynthesizer;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

/// Turns text into encoded audio (WAV bytes)
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text`
    ///
    /// # Errors
    ///
    /// Returns error if the synthesis backend fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Plays encoded audio, returning once playback has finished
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play WAV bytes to completion
    ///
    /// # Errors
    ///
    /// Returns error if decoding or the output device fails
    async fn play(&self, wav: &[u8]) -> Result<()>;
}

/// Synthesizes comment + reply, persists the artifact and plays it
pub struct SpeechPlayback {
    synthesizer: Box<dyn Synthesizer>,
    sink: Box<dyn AudioSink>,
    artifact_path: PathBuf,
}

impl SpeechPlayback {
    #[must_use]
    pub fn new(
        synthesizer: Box<dyn Synthesizer>,
        sink: Box<dyn AudioSink>,
        artifact_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            synthesizer,
            sink,
            artifact_path: artifact_path.into(),
        }
    }

    /// Where the artifact is written
    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Speak the comment followed by the reply
    ///
    /// The artifact is only touched once synthesis has fully succeeded.
    ///
    /// # Errors
    ///
    /// Returns `Error::SynthesisFailed` if synthesis, artifact I/O or playback fails
    pub async fn synthesize_and_play(&self, comment: &str, reply: &str) -> Result<()> {
        let text = speech_text(comment, reply);

        let audio = self
            .synthesizer
            .synthesize(&text)
            .await
            .map_err(into_synthesis_failed)?;

        write_artifact(&self.artifact_path, &audio)
            .await
            .map_err(into_synthesis_failed)?;

        let wav = read_artifact(&self.artifact_path)
            .await
            .map_err(into_synthesis_failed)?;

        tracing::debug!(
            path = %self.artifact_path.display(),
            bytes = wav.len(),
            "playing artifact"
        );

        self.sink.play(&wav).await.map_err(into_synthesis_failed)
    }
}

/// Text handed to the synthesizer
#[must_use]
pub fn speech_text(comment: &str, reply: &str) -> String {
    format!("{comment} {reply}")
}

fn into_synthesis_failed(e: Error) -> Error {
    match e {
        Error::SynthesisFailed(_) => e,
        other => Error::SynthesisFailed(other.to_string()),
    }
}
