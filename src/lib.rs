//! Chatvoice - reads live stream chat aloud with generated replies
//!
//! Polls a YouTube live chat for the newest audience comment, asks a text
//! generation backend for a reply, and speaks comment and reply through a
//! local VOICEVOX engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Orchestrator                       │
//! │   poll → generate → synthesize/play → sleep → ...    │
//! └──────┬──────────────────┬───────────────────┬────────┘
//!        │                  │                   │
//! ┌──────▼──────┐   ┌───────▼───────┐   ┌───────▼────────┐
//! │  ChatFeed   │   │ReplyGenerator │   │ SpeechPlayback │
//! │  (YouTube)  │   │(Gemini/OpenAI)│   │ (VOICEVOX+cpal)│
//! └─────────────┘   └───────────────┘   └────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod reply;
pub mod speech;

pub use config::Config;
pub use error::{Error, Result};
pub use feed::{ChatFeed, Comment, FeedHandle, FetchedPage, PageCursor, StreamId};
pub use pipeline::{CycleOutcome, Orchestrator, PipelineState};
pub use reply::ReplyGenerator;
pub use speech::{AudioSink, SpeechPlayback, Synthesizer};
