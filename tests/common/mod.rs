//! Shared test utilities
//!
//! Deterministic stand-ins for the chat feed, reply backend, synthesizer
//! and speakers. Each fake is `Clone` and shares its recorded calls, so a
//! test can box one copy into the orchestrator and inspect the other.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatvoice::{
    AudioSink, ChatFeed, Comment, Error, FeedHandle, FetchedPage, Orchestrator, PageCursor,
    ReplyGenerator, Result, SpeechPlayback, StreamId, Synthesizer,
};
use tokio::sync::Notify;

/// Build a page with an optional comment and cursor
pub fn page(comment: Option<&str>, cursor: Option<&str>) -> FetchedPage {
    FetchedPage {
        comment: comment.map(Comment::new),
        cursor: cursor.map(PageCursor::new),
    }
}

/// Chat feed that replays a script of fetch results
#[derive(Clone)]
pub struct ScriptedFeed {
    chat_id: Option<String>,
    script: Arc<Mutex<VecDeque<Result<FetchedPage>>>>,
    pub resolve_calls: Arc<Mutex<u32>>,
    pub cursors_seen: Arc<Mutex<Vec<Option<PageCursor>>>>,
    pub exhausted: Arc<Notify>,
}

impl ScriptedFeed {
    /// Feed whose stream resolves to `chat_id`
    pub fn live(chat_id: &str, script: Vec<Result<FetchedPage>>) -> Self {
        Self {
            chat_id: Some(chat_id.to_string()),
            script: Arc::new(Mutex::new(script.into())),
            resolve_calls: Arc::new(Mutex::new(0)),
            cursors_seen: Arc::new(Mutex::new(Vec::new())),
            exhausted: Arc::new(Notify::new()),
        }
    }

    /// Feed whose stream has no active chat
    pub fn offline() -> Self {
        Self {
            chat_id: None,
            ..Self::live("", Vec::new())
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.cursors_seen.lock().unwrap().len()
    }

    pub fn cursors_seen(&self) -> Vec<Option<PageCursor>> {
        self.cursors_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatFeed for ScriptedFeed {
    async fn resolve_feed(&self, _stream: &StreamId) -> Result<FeedHandle> {
        *self.resolve_calls.lock().unwrap() += 1;
        self.chat_id
            .as_ref()
            .map(FeedHandle::new)
            .ok_or_else(|| Error::FeedUnavailable("stream has no active live chat".to_string()))
    }

    async fn fetch_latest(
        &self,
        _feed: &FeedHandle,
        cursor: Option<&PageCursor>,
    ) -> Result<FetchedPage> {
        self.cursors_seen.lock().unwrap().push(cursor.cloned());

        let next = {
            let mut script = self.script.lock().unwrap();
            let next = script.pop_front();
            if script.is_empty() {
                self.exhausted.notify_one();
            }
            next
        };

        // Past the end of the script the chat is quiet
        next.unwrap_or_else(|| {
            Ok(FetchedPage {
                comment: None,
                cursor: cursor.cloned(),
            })
        })
    }
}

/// Reply backend that echoes or fails on demand
#[derive(Clone, Default)]
pub struct RecordingGenerator {
    failures: Arc<Mutex<VecDeque<String>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingGenerator {
    /// Fail the next call with `GenerationFailed(message)`
    pub fn fail_next(&self, message: &str) {
        self.failures.lock().unwrap().push_back(message.to_string());
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

/// Reply the recording generator produces for `comment`
pub fn reply_to(comment: &str) -> String {
    format!("reply to {comment}")
}

#[async_trait]
impl ReplyGenerator for RecordingGenerator {
    async fn generate_reply(&self, comment: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(comment.to_string());
        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(Error::GenerationFailed(message));
        }
        Ok(reply_to(comment))
    }
}

/// Synthesizer returning the text's bytes wrapped in a marker, or failing
#[derive(Clone, Default)]
pub struct FakeSynthesizer {
    fail: Arc<Mutex<bool>>,
    pub texts: Arc<Mutex<Vec<String>>>,
}

impl FakeSynthesizer {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

/// Audio the fake synthesizer produces for `text`
pub fn audio_for(text: &str) -> Vec<u8> {
    format!("WAV:{text}").into_bytes()
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.texts.lock().unwrap().push(text.to_string());
        if *self.fail.lock().unwrap() {
            return Err(Error::SynthesisFailed("synthesis returned 500".to_string()));
        }
        Ok(audio_for(text))
    }
}

/// Speaker that records what it was asked to play
///
/// When `artifact` is set, the file's content at play time is captured too.
/// Each clip takes `playback` to play; a clip is recorded once it finishes.
#[derive(Clone, Default)]
pub struct RecordingSink {
    artifact: Option<PathBuf>,
    playback: Duration,
    pub played: Arc<Mutex<Vec<Vec<u8>>>>,
    pub artifact_at_play: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingSink {
    pub fn watching(artifact: PathBuf) -> Self {
        Self {
            artifact: Some(artifact),
            ..Self::default()
        }
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().unwrap().clone()
    }

    pub fn artifact_at_play(&self) -> Vec<Vec<u8>> {
        self.artifact_at_play.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, wav: &[u8]) -> Result<()> {
        if !self.playback.is_zero() {
            tokio::time::sleep(self.playback).await;
        }
        if let Some(path) = &self.artifact {
            let on_disk = std::fs::read(path)?;
            self.artifact_at_play.lock().unwrap().push(on_disk);
        }
        self.played.lock().unwrap().push(wav.to_vec());
        Ok(())
    }
}

/// Fakes wired into an orchestrator, with handles for inspection
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub feed: ScriptedFeed,
    pub generator: RecordingGenerator,
    pub synthesizer: FakeSynthesizer,
    pub sink: RecordingSink,
    pub artifact: PathBuf,
    _dir: tempfile::TempDir,
}

impl Harness {
    /// No wait between polls and instant playback
    pub fn new(feed: ScriptedFeed) -> Self {
        Self::with_timing(feed, Duration::ZERO, Duration::ZERO)
    }

    /// Poll every `interval`; each clip takes `playback` to play
    pub fn with_timing(feed: ScriptedFeed, interval: Duration, playback: Duration) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let artifact = dir.path().join("material").join("voice.wav");

        let generator = RecordingGenerator::default();
        let synthesizer = FakeSynthesizer::default();
        let sink = RecordingSink {
            playback,
            ..RecordingSink::watching(artifact.clone())
        };

        let speech = SpeechPlayback::new(
            Box::new(synthesizer.clone()),
            Box::new(sink.clone()),
            artifact.clone(),
        );

        let orchestrator = Orchestrator::new(
            StreamId::new("QfUlYtbZPkY"),
            Box::new(feed.clone()),
            Box::new(generator.clone()),
            speech,
            interval,
        );

        Self {
            orchestrator,
            feed,
            generator,
            synthesizer,
            sink,
            artifact,
            _dir: dir,
        }
    }

    /// Current artifact content, if written
    pub fn artifact_bytes(&self) -> Option<Vec<u8>> {
        std::fs::read(&self.artifact).ok()
    }
}
