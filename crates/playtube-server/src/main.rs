//! Thin proxy server for Playtube.
//!
//! Fronts the YouTube Data API for the client, serves uploaded videos back,
//! and hands out the remote store configuration. Every list endpoint falls
//! back to the deterministic mock catalog when the upstream is missing or
//! failing, so the client always has something to render.

mod routes;
mod upstream;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::routes::AppState;
use crate::upstream::YouTubeUpstream;

const DEFAULT_PORT: u16 = 3000;

fn state_from_env() -> AppState {
    let upstream = match std::env::var("YOUTUBE_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Some(YouTubeUpstream::new(key)),
        _ => {
            warn!("YOUTUBE_API_KEY not set, list endpoints serve the mock catalog");
            None
        }
    };

    let uploads_dir = std::env::var("PLAYTUBE_UPLOAD_DIR")
        .map_or_else(|_| PathBuf::from("uploads"), PathBuf::from);

    AppState {
        upstream,
        uploads_dir,
        remote_store_url: std::env::var("REMOTE_STORE_URL").ok(),
        remote_store_key: std::env::var("REMOTE_STORE_KEY").ok(),
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/search", get(routes::search))
        .route("/api/trending", get(routes::trending))
        .route("/api/category", get(routes::category))
        .route("/api/comments", get(routes::comments))
        .route("/api/download", get(routes::download))
        .route("/api/upload", post(routes::upload))
        .route("/api/config", get(routes::config))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = Arc::new(state_from_env());
    let app = router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    // Bind all interfaces so container deployments work unchanged.
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_router_builds_with_empty_state() {
        let state = Arc::new(AppState {
            upstream: None,
            uploads_dir: PathBuf::from("uploads"),
            remote_store_url: None,
            remote_store_key: None,
        });
        let _app = router(state);
    }
}
