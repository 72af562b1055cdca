//! Error types for Playtube core operations.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Playtube core operations.
///
/// Nothing in this taxonomy is fatal to the process: provider failures are
/// recovered with mock data, thumbnail gaps with a placeholder, and remote
/// sync failures are logged while the local cache stays authoritative.
#[derive(Debug, Error)]
pub enum Error {
    /// Search was issued without a query term.
    #[error("Query kosong")]
    EmptyQuery,

    /// The remote data source could not be reached or answered with an error.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A raw item carried no usable thumbnail at any resolution.
    #[error("No thumbnail for video: {0}")]
    MissingThumbnail(String),

    /// A raw item carried no video id.
    #[error("Item has no video id")]
    MissingVideoId,

    /// A push or pull against the remote backing store failed.
    #[error("Remote sync failed: {0}")]
    RemoteSyncFailure(String),

    /// An upload could not be completed; the reason is surfaced to the user.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
