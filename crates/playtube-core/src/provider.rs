//! Remote data source seam: the [`VideoProvider`] trait and its HTTP
//! implementation against the Playtube proxy.
//!
//! The trait exists so the view-state controller can be tested against a
//! mock provider; the HTTP implementation treats every page token as an
//! opaque continuation handle and never inspects it.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{RawComment, VideoPage};

/// Paginated video/comment source consumed by the view-state controller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Search for videos matching a query.
    async fn search<'a>(&self, query: &str, page_token: Option<&'a str>) -> Result<VideoPage>;

    /// Provider-sorted popular videos.
    async fn trending<'a>(&self, page_token: Option<&'a str>) -> Result<VideoPage>;

    /// Videos filtered by a provider category id.
    async fn category<'a>(
        &self,
        category_id: &str,
        page_token: Option<&'a str>,
    ) -> Result<VideoPage>;

    /// Comment thread for one video.
    async fn comments(&self, video_id: &str) -> Result<Vec<RawComment>>;
}

#[derive(Debug, Default, Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    items: Vec<RawComment>,
}

/// HTTP implementation of [`VideoProvider`] against the proxy's `/api`
/// surface.
#[derive(Debug, Clone)]
pub struct HttpVideoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVideoProvider {
    /// Create a provider for the given proxy base URL
    /// (e.g. `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url.trim_end_matches('/'))
    }

    async fn get_page(&self, path: &str, query: &[(&str, &str)]) -> Result<VideoPage> {
        let url = self.endpoint(path);
        debug!("Fetching {} with {} params", url, query.len());

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        let page: VideoPage = response
            .json()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        if let Some(error) = &page.error {
            // The one structured error the proxy surfaces is an empty query.
            if error == "Query kosong" {
                return Err(Error::EmptyQuery);
            }
            return Err(Error::ProviderUnavailable(error.clone()));
        }
        Ok(page)
    }
}

#[async_trait]
impl VideoProvider for HttpVideoProvider {
    async fn search<'a>(&self, query: &str, page_token: Option<&'a str>) -> Result<VideoPage> {
        let mut params = vec![("q", query)];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_page("search", &params).await
    }

    async fn trending<'a>(&self, page_token: Option<&'a str>) -> Result<VideoPage> {
        let mut params = Vec::new();
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_page("trending", &params).await
    }

    async fn category<'a>(
        &self,
        category_id: &str,
        page_token: Option<&'a str>,
    ) -> Result<VideoPage> {
        let mut params = vec![("id", category_id)];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_page("category", &params).await
    }

    async fn comments(&self, video_id: &str) -> Result<Vec<RawComment>> {
        let url = self.endpoint("comments");
        let response = self
            .client
            .get(&url)
            .query(&[("videoId", video_id)])
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        let body: CommentsResponse = response
            .json()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;
        Ok(body.items)
    }
}
