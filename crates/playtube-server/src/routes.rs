//! The `/api` surface of the proxy.
//!
//! List endpoints forward to the upstream when an API key is configured and
//! fall back to the deterministic mock catalog on any upstream failure, so
//! they never answer with a 5xx. Mock pages carry `mock-{offset}` page
//! tokens and are served without touching the upstream at all.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use playtube_core::{Error, PAGE_SIZE, RawComment, VideoPage, mock_comments, mock_raw_items};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::fs;
use tracing::{info, warn};

use crate::upstream::YouTubeUpstream;

/// Shared server state.
pub struct AppState {
    /// Upstream client; absent when no API key is configured.
    pub upstream: Option<YouTubeUpstream>,
    /// Directory uploaded videos are stored in.
    pub uploads_dir: PathBuf,
    /// Remote store base URL handed to clients.
    pub remote_store_url: Option<String>,
    /// Remote store API key handed to clients.
    pub remote_store_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(rename = "pageToken")]
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(rename = "pageToken")]
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryParams {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "pageToken")]
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoIdParams {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_store_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_store_key: Option<String>,
}

/// Build a deterministic mock page continuing at `offset`.
fn mock_page(offset: usize) -> VideoPage {
    VideoPage {
        items: mock_raw_items(offset, PAGE_SIZE),
        next_page_token: Some(format!("mock-{}", offset + PAGE_SIZE)),
        error: None,
    }
}

/// Offset encoded in a `mock-{offset}` page token, if this is one.
fn mock_offset(page_token: Option<&str>) -> Option<usize> {
    page_token?.strip_prefix("mock-")?.parse().ok()
}

/// Catalog offset for a fallback page.
///
/// A failure on the first request starts the catalog at zero. A failure
/// mid-list (real upstream token) hashes the token into a non-zero offset,
/// so the substituted ids stay disjoint from a first-page fallback the
/// client may already be rendering. Stable per token, so a retried request
/// gets the same page.
fn fallback_offset(page_token: Option<&str>) -> usize {
    match page_token {
        None => 0,
        Some(token) => {
            let hash = token
                .bytes()
                .fold(0u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(u64::from(byte)));
            let slot = usize::try_from(hash % 4096).unwrap_or(0);
            (slot + 1) * PAGE_SIZE
        }
    }
}

/// Run an upstream fetch, substituting a mock page on any failure.
///
/// A client paginating a mock page stays on mock pages; the upstream never
/// sees its tokens.
async fn list_with_fallback<F, Fut>(page_token: Option<&str>, fetch: F) -> Json<VideoPage>
where
    F: FnOnce() -> Option<Fut>,
    Fut: Future<Output = playtube_core::Result<VideoPage>>,
{
    if let Some(offset) = mock_offset(page_token) {
        return Json(mock_page(offset));
    }

    match fetch() {
        Some(future) => match future.await {
            Ok(page) => Json(page),
            Err(e) => {
                warn!("Upstream fetch failed, serving mock catalog: {}", e);
                Json(mock_page(fallback_offset(page_token)))
            }
        },
        None => Json(mock_page(fallback_offset(page_token))),
    }
}

/// `GET /api/search?q&pageToken`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(query) = params.q.filter(|q| !q.trim().is_empty()) else {
        return Json(json!({ "error": "Query kosong" })).into_response();
    };

    let token = params.page_token.as_deref();
    list_with_fallback(token, || {
        state
            .upstream
            .as_ref()
            .map(|upstream| async move { upstream.search(&query, token).await })
    })
    .await
    .into_response()
}

/// `GET /api/trending?pageToken`
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Json<VideoPage> {
    let token = params.page_token.as_deref();
    list_with_fallback(token, || {
        state
            .upstream
            .as_ref()
            .map(|upstream| async move { upstream.trending(token).await })
    })
    .await
}

/// `GET /api/category?id&pageToken`
pub async fn category(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoryParams>,
) -> Json<VideoPage> {
    let token = params.page_token.as_deref();
    let category_id = params.id.unwrap_or_default();
    list_with_fallback(token, || {
        state
            .upstream
            .as_ref()
            .map(|upstream| async move { upstream.category(&category_id, token).await })
    })
    .await
}

/// `GET /api/comments?videoId`
pub async fn comments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VideoIdParams>,
) -> Json<serde_json::Value> {
    let items: Vec<RawComment> = match &state.upstream {
        Some(upstream) => match upstream.comments(&params.video_id).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Comment fetch failed, serving mock thread: {}", e);
                mock_comments()
            }
        },
        None => mock_comments(),
    };
    Json(json!({ "items": items }))
}

/// `GET /api/download?videoId`
///
/// Serves a previously uploaded video back as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VideoIdParams>,
) -> Response {
    match find_upload(&state.uploads_dir, &params.video_id).await {
        Some(path) => match fs::read(&path).await {
            Ok(bytes) => {
                let file_name = path
                    .file_name()
                    .map_or_else(|| params.video_id.clone(), |n| n.to_string_lossy().into_owned());
                (
                    [
                        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                        (
                            header::CONTENT_DISPOSITION,
                            format!("attachment; filename=\"{file_name}\""),
                        ),
                    ],
                    bytes,
                )
                    .into_response()
            }
            Err(e) => {
                warn!("Failed to read upload {}: {}", path.display(), e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Gagal membaca video" })),
                )
                    .into_response()
            }
        },
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Video tidak ditemukan" })),
        )
            .into_response(),
    }
}

/// `POST /api/upload` (multipart: file, title, description)
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Json<UploadResponse>) {
    match save_upload(&state.uploads_dir, multipart).await {
        Ok((video_id, title, description)) => {
            info!("Stored upload {} ({})", video_id, title);
            (
                StatusCode::OK,
                Json(UploadResponse {
                    success: true,
                    message: "Video berhasil diupload".to_string(),
                    video_url: Some(format!("/api/download?videoId={video_id}")),
                    title: Some(title),
                    description: Some(description),
                }),
            )
        }
        Err(e) => {
            warn!("Upload failed: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(UploadResponse {
                    success: false,
                    message: e.to_string(),
                    video_url: None,
                    title: None,
                    description: None,
                }),
            )
        }
    }
}

/// `GET /api/config`
pub async fn config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        remote_store_url: state.remote_store_url.clone(),
        remote_store_key: state.remote_store_key.clone(),
    })
}

/// Locate an uploaded file by its video id (the file stem).
async fn find_upload(uploads_dir: &Path, video_id: &str) -> Option<PathBuf> {
    // Ids are server-generated; anything with a path separator is rejected
    // before touching the filesystem.
    if video_id.is_empty() || video_id.contains(['/', '\\', '.']) {
        return None;
    }

    let mut entries = fs::read_dir(uploads_dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.file_stem().is_some_and(|stem| stem == video_id) {
            return Some(path);
        }
    }
    None
}

async fn save_upload(
    uploads_dir: &Path,
    mut multipart: Multipart,
) -> playtube_core::Result<(String, String, String)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut title = String::new();
    let mut description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::UploadFailed(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("video.mp4").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::UploadFailed(e.to_string()))?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|e| Error::UploadFailed(e.to_string()))?;
            }
            Some("description") => {
                description = field
                    .text()
                    .await
                    .map_err(|e| Error::UploadFailed(e.to_string()))?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| {
        Error::UploadFailed("Tidak ada file video di permintaan".to_string())
    })?;
    if title.trim().is_empty() {
        return Err(Error::UploadFailed("Judul video kosong".to_string()));
    }

    fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| Error::UploadFailed(e.to_string()))?;

    let video_id = new_video_id();
    let extension = Path::new(&file_name)
        .extension()
        .map_or_else(|| "mp4".to_string(), |e| e.to_string_lossy().into_owned());
    let path = uploads_dir.join(format!("{video_id}.{extension}"));
    fs::write(&path, &bytes)
        .await
        .map_err(|e| Error::UploadFailed(e.to_string()))?;

    Ok((video_id, title, description))
}

/// Server-generated upload id, unique per millisecond.
fn new_video_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("up{millis}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::extract::FromRequest;
    use axum::http::Request;

    fn empty_state(uploads_dir: &Path) -> Arc<AppState> {
        Arc::new(AppState {
            upstream: None,
            uploads_dir: uploads_dir.to_path_buf(),
            remote_store_url: None,
            remote_store_key: None,
        })
    }

    /// Build a multipart extractor from raw form parts; a part with a file
    /// name becomes a file field.
    async fn multipart_of(parts: &[(&str, Option<&str>, &[u8])]) -> Multipart {
        const BOUNDARY: &str = "playtube-test";
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match file_name {
                Some(f) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: video/mp4\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_mock_offset_parses_mock_tokens_only() {
        assert_eq!(mock_offset(Some("mock-8")), Some(8));
        assert_eq!(mock_offset(Some("mock-0")), Some(0));
        assert_eq!(mock_offset(Some("CAUQAA")), None);
        assert_eq!(mock_offset(Some("mock-abc")), None);
        assert_eq!(mock_offset(None), None);
    }

    #[test]
    fn test_mock_page_chains_tokens() {
        let page = mock_page(0);
        assert_eq!(page.items.len(), PAGE_SIZE);
        assert_eq!(page.next_page_token.as_deref(), Some("mock-8"));

        let next = mock_page(8);
        assert_eq!(next.next_page_token.as_deref(), Some("mock-16"));
    }

    #[tokio::test]
    async fn test_find_upload_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("up1.mp4"), b"data")
            .await
            .unwrap();

        assert!(find_upload(dir.path(), "up1").await.is_some());
        assert!(find_upload(dir.path(), "../up1").await.is_none());
        assert!(find_upload(dir.path(), "up1.mp4").await.is_none());
        assert!(find_upload(dir.path(), "").await.is_none());
    }

    #[tokio::test]
    async fn test_find_upload_missing_id() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_upload(dir.path(), "nope").await.is_none());
    }

    #[tokio::test]
    async fn test_list_with_fallback_serves_mocks_without_upstream() {
        let Json(page) = list_with_fallback(None, || {
            None::<std::future::Ready<playtube_core::Result<VideoPage>>>
        })
        .await;
        assert_eq!(page.items.len(), PAGE_SIZE);
        assert!(page.error.is_none());
    }

    #[tokio::test]
    async fn test_list_with_fallback_stays_on_mock_pages() {
        // A mock token short-circuits before the upstream closure runs.
        let Json(page) = list_with_fallback(Some("mock-16"), || {
            Some(std::future::ready(Err(Error::ProviderUnavailable(
                "must not be called".to_string(),
            ))))
        })
        .await;
        assert_eq!(page.next_page_token.as_deref(), Some("mock-24"));
    }

    #[tokio::test]
    async fn test_list_with_fallback_recovers_from_upstream_error() {
        let Json(page) = list_with_fallback(None, || {
            Some(std::future::ready(Err(Error::ProviderUnavailable(
                "quota exceeded".to_string(),
            ))))
        })
        .await;
        assert_eq!(page.items.len(), PAGE_SIZE);
    }

    #[test]
    fn test_fallback_offset_first_page_starts_at_zero() {
        assert_eq!(fallback_offset(None), 0);
    }

    #[test]
    fn test_fallback_offset_mid_list_is_disjoint_from_first_page() {
        let offset = fallback_offset(Some("CAUQAA"));
        assert_eq!(offset, fallback_offset(Some("CAUQAA")));
        assert!(offset >= PAGE_SIZE);
        assert_eq!(offset % PAGE_SIZE, 0);

        // A client that already rendered a first-page fallback appends ids
        // it has never seen.
        let first_ids: Vec<String> = mock_page(0)
            .items
            .iter()
            .filter_map(|item| item.video_id().map(str::to_string))
            .collect();
        for item in &mock_page(offset).items {
            let id = item.video_id().unwrap();
            assert!(first_ids.iter().all(|existing| existing != id));
        }
    }

    #[tokio::test]
    async fn test_search_without_query_returns_structured_error() {
        let dir = tempfile::tempdir().unwrap();
        let response = search(
            State(empty_state(dir.path())),
            Query(SearchParams {
                q: None,
                page_token: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "error": "Query kosong" }));
    }

    #[tokio::test]
    async fn test_search_with_whitespace_query_returns_structured_error() {
        let dir = tempfile::tempdir().unwrap();
        let response = search(
            State(empty_state(dir.path())),
            Query(SearchParams {
                q: Some("   ".to_string()),
                page_token: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "error": "Query kosong" }));
    }

    #[tokio::test]
    async fn test_save_upload_stores_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let multipart = multipart_of(&[
            ("file", Some("video.mp4"), b"fake mp4 bytes"),
            ("title", None, b"Video Pertama Saya"),
            ("description", None, b"Deskripsi singkat"),
        ])
        .await;

        let (video_id, title, description) = save_upload(dir.path(), multipart).await.unwrap();
        assert_eq!(title, "Video Pertama Saya");
        assert_eq!(description, "Deskripsi singkat");

        let path = find_upload(dir.path(), &video_id).await.unwrap();
        assert_eq!(path.extension().unwrap(), "mp4");
        assert_eq!(fs::read(&path).await.unwrap(), b"fake mp4 bytes");
    }

    #[tokio::test]
    async fn test_save_upload_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let multipart = multipart_of(&[("title", None, b"Tanpa file")]).await;

        let err = save_upload(dir.path(), multipart).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UploadFailed(reason) if reason == "Tidak ada file video di permintaan"
        ));
    }

    #[tokio::test]
    async fn test_save_upload_with_blank_title_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let multipart = multipart_of(&[
            ("file", Some("video.mp4"), b"data"),
            ("title", None, b"   "),
        ])
        .await;

        let err = save_upload(dir.path(), multipart).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UploadFailed(reason) if reason == "Judul video kosong"
        ));
    }

    #[tokio::test]
    async fn test_upload_handler_success_response_shape() {
        let dir = tempfile::tempdir().unwrap();
        let multipart = multipart_of(&[
            ("file", Some("video.mp4"), b"data"),
            ("title", None, b"Judul"),
            ("description", None, b"Deskripsi"),
        ])
        .await;

        let (status, Json(response)) = upload(State(empty_state(dir.path())), multipart).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.success);
        assert_eq!(response.message, "Video berhasil diupload");
        assert!(
            response
                .video_url
                .as_deref()
                .unwrap()
                .starts_with("/api/download?videoId=")
        );
        assert_eq!(response.title.as_deref(), Some("Judul"));
        assert_eq!(response.description.as_deref(), Some("Deskripsi"));
    }

    #[tokio::test]
    async fn test_upload_handler_surfaces_failure_reason() {
        let dir = tempfile::tempdir().unwrap();
        let multipart = multipart_of(&[("title", None, b"Tanpa file")]).await;

        let (status, Json(response)) = upload(State(empty_state(dir.path())), multipart).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!response.success);
        assert!(response.message.contains("Tidak ada file video di permintaan"));
        assert!(response.video_url.is_none());
    }
}
