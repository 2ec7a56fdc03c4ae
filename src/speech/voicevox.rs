//! VOICEVOX engine client
//!
//! Synthesis is two chained calls: `POST /audio_query` builds the synthesis
//! parameters for a text and speaker, `POST /synthesis` renders them to WAV.

use async_trait::async_trait;

use super::Synthesizer;
use crate::error::http_failure;
use crate::{Error, Result};

/// Synthesizer backed by a local VOICEVOX engine
pub struct VoicevoxSynthesizer {
    client: reqwest::Client,
    base_url: String,
    speaker: u32,
}

impl VoicevoxSynthesizer {
    #[must_use]
    pub fn new(base_url: impl Into<String>, speaker: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            speaker,
        }
    }

    /// Build the synthesis parameter set for `text`
    async fn audio_query(&self, text: &str) -> Result<serde_json::Value> {
        let speaker = self.speaker.to_string();

        let response = self
            .client
            .post(format!("{}/audio_query", self.base_url))
            .query(&[("text", text), ("speaker", speaker.as_str())])
            .send()
            .await
            .map_err(|e| Error::SynthesisFailed(http_failure("VOICEVOX audio_query failed", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SynthesisFailed(format!(
                "VOICEVOX audio_query error {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            Error::SynthesisFailed(http_failure("malformed VOICEVOX audio query", e))
        })
    }

    /// Render a parameter set to WAV bytes
    async fn synthesis(&self, query: &serde_json::Value) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(format!("{}/synthesis", self.base_url))
            .query(&[("speaker", self.speaker)])
            .json(query)
            .send()
            .await
            .map_err(|e| Error::SynthesisFailed(http_failure("VOICEVOX synthesis failed", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SynthesisFailed(format!(
                "VOICEVOX synthesis error {status}: {body}"
            )));
        }

        let audio = response.bytes().await.map_err(|e| {
            Error::SynthesisFailed(http_failure("failed to read VOICEVOX audio", e))
        })?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl Synthesizer for VoicevoxSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let query = self.audio_query(text).await?;
        let audio = self.synthesis(&query).await?;

        if audio.is_empty() {
            return Err(Error::SynthesisFailed(
                "VOICEVOX returned empty audio".to_string(),
            ));
        }

        tracing::debug!(speaker = self.speaker, bytes = audio.len(), "synthesized speech");
        Ok(audio)
    }
}
