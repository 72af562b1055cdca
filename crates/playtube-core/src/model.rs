//! Data model shared across the client: raw provider shapes, the canonical
//! video record, and user-scoped state types.
//!
//! The provider returns two known item shapes (a search result with a nested
//! id object, and a plain resource with a flat string id). Both are resolved
//! into [`RawItem`] exactly once at the deserialization boundary; everything
//! downstream works with the canonical [`VideoRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical video shape used throughout the client.
///
/// Immutable once constructed; identity is the `id` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Provider video id.
    pub id: String,
    /// Video title.
    pub title: String,
    /// Channel display name.
    pub channel_name: String,
    /// Channel id (empty when the provider omitted it).
    #[serde(default)]
    pub channel_id: String,
    /// Resolved thumbnail URL (highest available resolution, or placeholder).
    pub thumbnail_url: String,
    /// Human-readable view count ("500", "1.5 rb", "1.5 jt").
    pub view_count_display: String,
    /// Coarse relative age ("baru saja", "1 jam yang lalu", ...).
    pub relative_time: String,
    /// Whether the channel is marked verified by the provider.
    #[serde(default)]
    pub verified: bool,
    /// Video description.
    #[serde(default)]
    pub description: String,
}

/// A channel the user is subscribed to, unique by `channel_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRef {
    /// Channel id.
    pub channel_id: String,
    /// Channel display name.
    pub channel_name: String,
}

/// One rendered comment on a video.
///
/// Local (optimistic) comments are prepended ahead of remote comments and
/// never merged by content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    /// Comment author display name.
    pub author: String,
    /// Comment text.
    pub text: String,
    /// Display timestamp ("Baru saja", "1 jam yang lalu", ...).
    pub timestamp: String,
    /// Avatar color derived from the author name.
    pub color: String,
}

/// An authenticated user session.
///
/// Created on sign-in, destroyed on sign-out. Sign-in triggers a one-shot
/// pull-then-overwrite sync from the remote store into the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Remote store user id.
    pub user_id: String,
    /// Display name shown in the UI.
    pub display_name: String,
    /// Account email.
    pub email: String,
}

/// One raw item from the remote data source.
///
/// Two known shapes exist; they are told apart by the type of the `id`
/// field. Resolved once here, no duck typing downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItem {
    /// Search-result shape: the id is a nested object.
    Search(SearchShapeItem),
    /// Resource shape: the id is a flat string.
    Resource(ResourceShapeItem),
}

impl RawItem {
    /// Extract the video id regardless of shape.
    ///
    /// Search results may reference channels or playlists instead of videos,
    /// in which case there is no video id.
    #[must_use]
    pub fn video_id(&self) -> Option<&str> {
        match self {
            Self::Search(item) => item.id.video_id.as_deref(),
            Self::Resource(item) => Some(&item.id),
        }
    }

    /// The snippet carried by either shape.
    #[must_use]
    pub const fn snippet(&self) -> &RawSnippet {
        match self {
            Self::Search(item) => &item.snippet,
            Self::Resource(item) => &item.snippet,
        }
    }

    /// Provider statistics, only present on the resource shape.
    #[must_use]
    pub const fn statistics(&self) -> Option<&RawStatistics> {
        match self {
            Self::Search(_) => None,
            Self::Resource(item) => item.statistics.as_ref(),
        }
    }
}

/// Search-result shape with a nested id object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchShapeItem {
    /// Nested id object.
    pub id: SearchShapeId,
    /// Item snippet.
    pub snippet: RawSnippet,
}

/// The nested id object of the search-result shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchShapeId {
    /// Video id, absent for channel/playlist results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// Resource shape with a flat string id and optional statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceShapeItem {
    /// Flat video id.
    pub id: String,
    /// Item snippet.
    pub snippet: RawSnippet,
    /// Provider statistics, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<RawStatistics>,
}

/// Snippet fields common to both raw shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnippet {
    /// Video title (required by the normalization contract).
    pub title: String,
    /// Channel display name (required by the normalization contract).
    pub channel_title: String,
    /// Channel id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Video description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Thumbnails by resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<RawThumbnails>,
    /// Absolute publish timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Provider-specific verified flag.
    #[serde(default)]
    pub verified: bool,
}

/// Thumbnails keyed by resolution; resolution falls back high, then medium,
/// then default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawThumbnails {
    /// High resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<RawThumbnail>,
    /// Medium resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<RawThumbnail>,
    /// Default resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<RawThumbnail>,
}

/// A single thumbnail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawThumbnail {
    /// Thumbnail URL.
    pub url: String,
}

/// Provider-specific statistics for a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatistics {
    /// View count; the provider serializes it as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
}

/// One page of raw items from a list endpoint.
///
/// `next_page_token` is an opaque continuation handle owned by the provider;
/// the client never parses or regenerates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    /// Raw items in provider order.
    #[serde(default)]
    pub items: Vec<RawItem>,
    /// Opaque pagination cursor for the next page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Structured error payload ("Query kosong" for an empty search).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One remote comment as served by the comments endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    /// Author display name.
    pub author: String,
    /// Comment text.
    pub text: String,
    /// Display timestamp.
    pub time: String,
}
