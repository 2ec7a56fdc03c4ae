//! Live chat feed
//!
//! Resolves a stream to its chat feed and pages through new messages.
//! Only the newest message of each page is surfaced; a burst of comments
//! within one poll interval loses all but the last one.

mod youtube;

pub use youtube::{MAX_RESULTS, YouTubeChatClient};

use std::fmt;

use async_trait::async_trait;

use crate::Result;

macro_rules! opaque_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw token
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Raw token value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_token!(
    /// Identifier of a live stream (the video id)
    StreamId
);

opaque_token!(
    /// Handle of an active chat feed, valid for the whole run
    FeedHandle
);

opaque_token!(
    /// Continuation token for the next page of chat messages
    PageCursor
);

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Message text
    pub text: String,
}

impl Comment {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Result of one fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    /// Newest message of the page, if the page held any
    pub comment: Option<Comment>,

    /// Cursor for the next fetch
    ///
    /// Equals the input cursor when the service did not return a new one.
    pub cursor: Option<PageCursor>,
}

/// Source of live chat messages
#[async_trait]
pub trait ChatFeed: Send + Sync {
    /// Look up the active chat feed of a stream
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedUnavailable` if the stream has no active chat
    async fn resolve_feed(&self, stream: &StreamId) -> Result<FeedHandle>;

    /// Fetch the newest message after `cursor`
    ///
    /// # Errors
    ///
    /// Returns `Error::FetchFailed` on transport or malformed responses
    async fn fetch_latest(
        &self,
        feed: &FeedHandle,
        cursor: Option<&PageCursor>,
    ) -> Result<FetchedPage>;
}
