//! Reply generation
//!
//! A comment's text is sent as the whole prompt; no history, no system prompt.

mod gemini;
mod openai;

pub use gemini::GeminiReplyGenerator;
pub use openai::OpenAiReplyGenerator;

use async_trait::async_trait;

use crate::Result;
use crate::config::{Config, ReplyBackend};

/// Produces reply text for a chat comment
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate a reply to `comment`
    ///
    /// # Errors
    ///
    /// Returns `Error::GenerationFailed` on any backend failure
    async fn generate_reply(&self, comment: &str) -> Result<String>;
}

/// Build the reply generator selected by configuration
///
/// # Errors
///
/// Returns error if the backend's API key is missing
pub fn from_config(config: &Config) -> Result<Box<dyn ReplyGenerator>> {
    let api_key = config.reply_api_key()?.to_string();
    let reply = &config.reply;

    tracing::debug!(
        backend = reply.backend.as_str(),
        model = %reply.model,
        "using reply backend"
    );

    Ok(match reply.backend {
        ReplyBackend::Gemini => {
            let mut generator =
                GeminiReplyGenerator::new(api_key, reply.model.clone(), reply.timeout)?;
            if let Some(url) = &reply.base_url {
                generator = generator.with_base_url(url);
            }
            Box::new(generator)
        }
        ReplyBackend::OpenAi => {
            let mut generator =
                OpenAiReplyGenerator::new(api_key, reply.model.clone(), reply.timeout)?;
            if let Some(url) = &reply.base_url {
                generator = generator.with_base_url(url);
            }
            Box::new(generator)
        }
    })
}
