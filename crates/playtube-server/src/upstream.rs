//! Upstream client for the YouTube Data API v3.
//!
//! The proxy forwards list requests here when an API key is configured.
//! Responses deserialize straight into the shared raw page model; comment
//! threads are flattened into the simple `{author, text, time}` shape the
//! client renders.

use chrono::{DateTime, Utc};
use playtube_core::{Error, PAGE_SIZE, RawComment, Result, VideoPage, format_relative_time};
use serde::Deserialize;
use tracing::debug;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Region the trending chart is scoped to.
const REGION_CODE: &str = "ID";

/// Client for the `search`, `videos` and `commentThreads` endpoints.
#[derive(Debug, Clone)]
pub struct YouTubeUpstream {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: TopLevelCommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopLevelCommentSnippet {
    author_display_name: String,
    text_display: String,
    published_at: Option<DateTime<Utc>>,
}

impl YouTubeUpstream {
    /// Create an upstream client with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{API_BASE}/{endpoint}");
        debug!("Upstream request: {} with {} params", url, params.len());

        let max_results = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("maxResults", max_results.as_str()), ("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))
    }

    /// Search for videos matching a query.
    pub async fn search(&self, query: &str, page_token: Option<&str>) -> Result<VideoPage> {
        let mut params = vec![("part", "snippet"), ("q", query), ("type", "video")];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_json("search", &params).await
    }

    /// The most-popular chart for the configured region.
    pub async fn trending(&self, page_token: Option<&str>) -> Result<VideoPage> {
        let mut params = vec![
            ("part", "snippet,statistics"),
            ("chart", "mostPopular"),
            ("regionCode", REGION_CODE),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_json("videos", &params).await
    }

    /// The most-popular chart filtered to one video category.
    pub async fn category(&self, category_id: &str, page_token: Option<&str>) -> Result<VideoPage> {
        let mut params = vec![
            ("part", "snippet,statistics"),
            ("chart", "mostPopular"),
            ("regionCode", REGION_CODE),
            ("videoCategoryId", category_id),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_json("videos", &params).await
    }

    /// Top-level comments for one video, flattened for rendering.
    pub async fn comments(&self, video_id: &str) -> Result<Vec<RawComment>> {
        let params = [("part", "snippet"), ("videoId", video_id)];
        let response: CommentThreadsResponse = self.get_json("commentThreads", &params).await?;

        let now = Utc::now();
        Ok(response
            .items
            .into_iter()
            .map(|thread| {
                let snippet = thread.snippet.top_level_comment.snippet;
                let time = snippet
                    .published_at
                    .map_or_else(|| "baru saja".to_string(), |at| format_relative_time(at, now));
                RawComment {
                    author: snippet.author_display_name,
                    text: snippet.text_display,
                    time,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_thread_deserializes() {
        let json = serde_json::json!({
            "items": [{
                "snippet": {
                    "topLevelComment": {
                        "snippet": {
                            "authorDisplayName": "Andi Pratama",
                            "textDisplay": "Mantap!",
                            "publishedAt": "2024-01-01T00:00:00Z"
                        }
                    }
                }
            }]
        });
        let response: CommentThreadsResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.items.len(), 1);
        let snippet = &response.items[0].snippet.top_level_comment.snippet;
        assert_eq!(snippet.author_display_name, "Andi Pratama");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_maps_to_provider_unavailable() {
        // An empty key still builds a client; the error here comes from the
        // request layer, which is all this test pins down.
        let upstream = YouTubeUpstream::new("");
        let result = upstream.search("rust", None).await;
        // Without network access or a key this must be a typed error,
        // never a panic.
        if let Err(e) = result {
            assert!(matches!(
                e,
                Error::ProviderUnavailable(_) | Error::EmptyQuery
            ));
        }
    }
}
