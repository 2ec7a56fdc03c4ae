//! Polling orchestrator
//!
//! Drives fetch → generate → synthesize/play → sleep, one cycle at a time.
//! Stages never overlap: playback blocks the cycle, so the next poll cannot
//! start while a reply is still being spoken.

mod state;

pub use state::{CycleOutcome, PipelineState};

use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::feed::{ChatFeed, FeedHandle, PageCursor, StreamId, YouTubeChatClient};
use crate::reply::{self, ReplyGenerator};
use crate::speech::{AudioPlayback, SpeechPlayback, VoicevoxSynthesizer};
use crate::{Error, Result};

/// Owns the feed handle, the page cursor and the loop timing
pub struct Orchestrator {
    stream: StreamId,
    feed: Box<dyn ChatFeed>,
    generator: Box<dyn ReplyGenerator>,
    speech: SpeechPlayback,
    poll_interval: Duration,
    state: PipelineState,
    feed_handle: Option<FeedHandle>,
    cursor: Option<PageCursor>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        stream: StreamId,
        feed: Box<dyn ChatFeed>,
        generator: Box<dyn ReplyGenerator>,
        speech: SpeechPlayback,
        poll_interval: Duration,
    ) -> Self {
        Self {
            stream,
            feed,
            generator,
            speech,
            poll_interval,
            state: PipelineState::Initializing,
            feed_handle: None,
            cursor: None,
        }
    }

    /// Wire up the YouTube feed, configured reply backend, VOICEVOX and speakers
    ///
    /// # Errors
    ///
    /// Returns error if a required key or the stream id is missing, or there is
    /// no audio output device
    pub fn from_config(config: &Config) -> Result<Self> {
        let stream = StreamId::new(config.stream_id()?);
        let feed = YouTubeChatClient::new(
            config.youtube_api_key()?.to_string(),
            config.feed.base_url.clone(),
        )?;
        let generator = reply::from_config(config)?;
        let speech = SpeechPlayback::new(
            Box::new(VoicevoxSynthesizer::new(
                config.speech.voicevox_url.clone(),
                config.speech.speaker,
            )),
            Box::new(AudioPlayback::new()?),
            config.speech.artifact_path.clone(),
        );

        Ok(Self::new(
            stream,
            Box::new(feed),
            generator,
            speech,
            config.poll_interval,
        ))
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// Cursor the next fetch will use
    #[must_use]
    pub const fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    /// Resolved chat feed, once initialized
    #[must_use]
    pub const fn feed_handle(&self) -> Option<&FeedHandle> {
        self.feed_handle.as_ref()
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {next}",
            self.state
        );
        tracing::trace!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
    }

    /// Resolve the chat feed once
    ///
    /// Later calls return the handle already resolved. On failure the
    /// orchestrator enters `Failed` and never polls.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedUnavailable` if the stream has no active chat
    pub async fn initialize(&mut self) -> Result<FeedHandle> {
        if let Some(handle) = &self.feed_handle {
            return Ok(handle.clone());
        }
        if self.state == PipelineState::Failed {
            return Err(Error::FeedUnavailable(format!(
                "stream {} has no live chat",
                self.stream
            )));
        }

        match self.feed.resolve_feed(&self.stream).await {
            Ok(handle) => {
                tracing::info!(stream = %self.stream, chat_id = %handle, "live chat resolved");
                self.feed_handle = Some(handle.clone());
                self.cursor = None;
                self.transition(PipelineState::Polling);
                Ok(handle)
            }
            Err(e) => {
                tracing::error!(stream = %self.stream, error = %e, "could not resolve live chat");
                self.transition(PipelineState::Failed);
                Err(match e {
                    Error::FeedUnavailable(_) => e,
                    other => Error::FeedUnavailable(other.to_string()),
                })
            }
        }
    }

    /// Run one poll cycle, ending in `Sleeping`
    ///
    /// Transient failures are logged and reported through the outcome.
    ///
    /// # Errors
    ///
    /// Returns error only if the feed was never resolved
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let Some(feed_handle) = self.feed_handle.clone() else {
            return Err(Error::FeedUnavailable("chat feed not resolved".to_string()));
        };

        if self.state == PipelineState::Sleeping {
            self.transition(PipelineState::Polling);
        }

        let outcome = self.poll(&feed_handle).await;
        self.transition(PipelineState::Sleeping);
        Ok(outcome)
    }

    async fn poll(&mut self, feed_handle: &FeedHandle) -> CycleOutcome {
        let page = match self
            .feed
            .fetch_latest(feed_handle, self.cursor.as_ref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch chat messages");
                return CycleOutcome::FetchFailed;
            }
        };

        // A page without a token keeps the current cursor
        if let Some(next) = page.cursor {
            self.cursor = Some(next);
        }

        let Some(comment) = page.comment else {
            return CycleOutcome::Idle;
        };
        let comment = comment.text;
        tracing::info!(%comment, "new comment");

        self.transition(PipelineState::Generating);
        let reply = match self.generator.generate_reply(&comment).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(%comment, error = %e, "failed to generate reply");
                return CycleOutcome::GenerationFailed { comment };
            }
        };
        tracing::info!(%reply, "generated reply");

        self.transition(PipelineState::Synthesizing);
        match self.speech.synthesize_and_play(&comment, &reply).await {
            Ok(()) => CycleOutcome::Spoke { comment, reply },
            Err(e) => {
                tracing::warn!(error = %e, "failed to speak reply");
                CycleOutcome::SynthesisFailed { comment, reply }
            }
        }
    }

    /// Run until the process is interrupted
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedUnavailable` if the chat feed cannot be resolved
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` completes
    ///
    /// `shutdown` is only observed while sleeping between cycles; a cycle in
    /// progress always runs to completion.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedUnavailable` if the chat feed cannot be resolved
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.initialize().await?;

        tokio::pin!(shutdown);

        loop {
            let outcome = self.run_cycle().await?;
            tracing::debug!(?outcome, cursor = ?self.cursor, "cycle complete");

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
