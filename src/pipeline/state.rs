//! Pipeline state and per-cycle outcomes

use std::fmt;

/// Where the orchestrator is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Resolving the chat feed
    Initializing,
    /// Fetching the newest comment
    Polling,
    /// Waiting on the reply backend
    Generating,
    /// Synthesizing and playing speech
    Synthesizing,
    /// Pausing before the next poll
    Sleeping,
    /// Feed could not be resolved; terminal
    Failed,
}

impl PipelineState {
    /// Whether the state machine may move from `self` to `next`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use PipelineState::{Failed, Generating, Initializing, Polling, Sleeping, Synthesizing};

        matches!(
            (self, next),
            (Initializing, Polling | Failed)
                | (Polling, Generating | Sleeping)
                | (Generating, Synthesizing | Sleeping)
                | (Synthesizing, Sleeping)
                | (Sleeping, Polling)
        )
    }

    /// Whether the loop has stopped for good
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Polling => "polling",
            Self::Generating => "generating",
            Self::Synthesizing => "synthesizing",
            Self::Sleeping => "sleeping",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a single poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No new comment
    Idle,
    /// Fetch failed; the previous cursor was kept
    FetchFailed,
    /// Reply backend failed; nothing was synthesized
    GenerationFailed { comment: String },
    /// Synthesis, artifact I/O or playback failed
    SynthesisFailed { comment: String, reply: String },
    /// Reply was spoken
    Spoke { comment: String, reply: String },
}

impl CycleOutcome {
    /// Comment picked up this cycle, if any
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Idle | Self::FetchFailed => None,
            Self::GenerationFailed { comment }
            | Self::SynthesisFailed { comment, .. }
            | Self::Spoke { comment, .. } => Some(comment),
        }
    }
}
