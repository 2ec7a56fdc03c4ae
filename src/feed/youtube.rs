//! YouTube Data API v3 live chat client

use async_trait::async_trait;
use serde::Deserialize;

use super::{ChatFeed, Comment, FeedHandle, FetchedPage, PageCursor, StreamId};
use crate::error::http_failure;
use crate::{Error, Result};

/// Messages requested per fetch; only the newest one is kept
pub const MAX_RESULTS: u32 = 2;

/// Response of `GET /videos?part=liveStreamingDetails`
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    active_live_chat_id: Option<String>,
}

/// Response of `GET /liveChat/messages`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatMessageListResponse {
    #[serde(default)]
    items: Vec<LiveChatMessage>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LiveChatMessage {
    snippet: Option<MessageSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageSnippet {
    display_message: Option<String>,
    text_message_details: Option<TextMessageDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextMessageDetails {
    message_text: String,
}

impl LiveChatMessage {
    fn text(&self) -> Option<&str> {
        let snippet = self.snippet.as_ref()?;
        snippet
            .text_message_details
            .as_ref()
            .map(|d| d.message_text.as_str())
            .or(snippet.display_message.as_deref())
    }
}

/// Chat feed backed by the YouTube Data API
pub struct YouTubeChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeChatClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, base_url: impl Into<String>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("YouTube API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// GET a JSON endpoint and return its body, wrapping every failure with `wrap`
    async fn get_text(
        &self,
        path: &str,
        query: &[(&str, &str)],
        wrap: fn(String) -> Error,
    ) -> Result<String> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await
            .map_err(|e| wrap(http_failure("YouTube request failed", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| wrap(http_failure("failed to read YouTube response", e)))?;
        if !status.is_success() {
            return Err(wrap(format!("YouTube API error {status}: {body}")));
        }

        Ok(body)
    }
}

#[async_trait]
impl ChatFeed for YouTubeChatClient {
    async fn resolve_feed(&self, stream: &StreamId) -> Result<FeedHandle> {
        let body = self
            .get_text(
                "/videos",
                &[
                    ("key", self.api_key.as_str()),
                    ("part", "liveStreamingDetails"),
                    ("id", stream.as_str()),
                ],
                Error::FeedUnavailable,
            )
            .await?;

        let handle = parse_chat_id(&body)?;
        tracing::debug!(stream = %stream, chat_id = %handle, "resolved live chat");
        Ok(handle)
    }

    async fn fetch_latest(
        &self,
        feed: &FeedHandle,
        cursor: Option<&PageCursor>,
    ) -> Result<FetchedPage> {
        let max_results = MAX_RESULTS.to_string();
        let mut query = vec![
            ("key", self.api_key.as_str()),
            ("part", "snippet"),
            ("liveChatId", feed.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(c) = cursor {
            query.push(("pageToken", c.as_str()));
        }

        let body = self
            .get_text("/liveChat/messages", &query, Error::FetchFailed)
            .await?;

        parse_messages(&body, cursor)
    }
}

/// Extract `items[0].liveStreamingDetails.activeLiveChatId`
fn parse_chat_id(body: &str) -> Result<FeedHandle> {
    let response: VideoListResponse = serde_json::from_str(body)
        .map_err(|e| Error::FeedUnavailable(format!("malformed video metadata: {e}")))?;

    let item = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| Error::FeedUnavailable("stream not found".to_string()))?;

    item.live_streaming_details
        .and_then(|d| d.active_live_chat_id)
        .filter(|id| !id.is_empty())
        .map(FeedHandle::new)
        .ok_or_else(|| Error::FeedUnavailable("stream has no active live chat".to_string()))
}

/// Keep the newest message of a page and pick the next cursor
fn parse_messages(body: &str, cursor: Option<&PageCursor>) -> Result<FetchedPage> {
    let response: LiveChatMessageListResponse = serde_json::from_str(body)
        .map_err(|e| Error::FetchFailed(format!("malformed chat messages: {e}")))?;

    // Items arrive oldest first
    let comment = response
        .items
        .iter()
        .rev()
        .find_map(LiveChatMessage::text)
        .map(Comment::new);

    let cursor = response
        .next_page_token
        .map(PageCursor::new)
        .or_else(|| cursor.cloned());

    Ok(FetchedPage { comment, cursor })
}
