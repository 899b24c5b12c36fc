//! YouTube Data API request and response types
//!
//! Data structures for the `subscriptions.insert` call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kind identifying a channel in a subscription snippet.
pub const CHANNEL_RESOURCE_KIND: &str = "youtube#channel";

/// Trimmed, non-empty channel identifier.
///
/// ```
/// use provider_youtube::ChannelId;
///
/// assert_eq!(ChannelId::parse("  UC123 ").unwrap().as_str(), "UC123");
/// assert!(ChannelId::parse("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// Trim surrounding whitespace; `None` if nothing remains.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /subscriptions?part=snippet`
///
/// See: https://developers.google.com/youtube/v3/docs/subscriptions/insert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionInsertRequest {
    pub snippet: SubscriptionSnippet,
}

impl SubscriptionInsertRequest {
    pub fn for_channel(channel_id: &ChannelId) -> Self {
        Self {
            snippet: SubscriptionSnippet {
                resource_id: ResourceId {
                    kind: CHANNEL_RESOURCE_KIND.to_string(),
                    channel_id: channel_id.as_str().to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnippet {
    pub resource_id: ResourceId,
}

/// Target resource of a subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    /// Always `youtube#channel` for channel subscriptions
    pub kind: String,
    pub channel_id: String,
}

/// Subscription resource returned on success.
///
/// Only read for logging; a success status counts regardless of the body.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionResource {
    #[serde(default)]
    pub id: Option<String>,
}

/// Error envelope returned by Google APIs
///
/// See: https://developers.google.com/youtube/v3/docs/errors
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorResponse {
    /// Parse an error body and return its message if it is non-empty.
    pub fn message_from(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ApiErrorResponse>(body)
            .ok()
            .and_then(|response| response.error.message)
            .filter(|message| !message.trim().is_empty())
    }
}
