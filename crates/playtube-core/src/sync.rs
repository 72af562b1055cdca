//! Remote sync service: mirrors the local persistent cache against a
//! per-user remote store while a session exists.
//!
//! The remote is treated as authoritative once a session exists: `pull_all`
//! overwrites local collections wholesale instead of attempting a
//! three-way merge. Pushes are the opposite - the local cache mutation has
//! already been applied optimistically, so a push is enqueued on a
//! background worker and delivered best-effort. A failed push is logged and
//! not retried; durability over the wire is an explicit non-goal.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{ChannelRef, VideoRecord};
use crate::store::{CollectionKey, LocalStore};

/// The user collections mirrored by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCollection {
    /// Watch history.
    History,
    /// Liked videos.
    Likes,
    /// Saved videos.
    Saved,
}

impl SyncCollection {
    /// Remote path segment for this collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Likes => "likes",
            Self::Saved => "saved",
        }
    }

    /// The local cache key this collection mirrors.
    #[must_use]
    pub const fn local_key(self) -> CollectionKey {
        match self {
            Self::History => CollectionKey::History,
            Self::Likes => CollectionKey::LikedVideos,
            Self::Saved => CollectionKey::SavedVideos,
        }
    }
}

/// Authoritated per-user backing store.
///
/// Upserts and deletes are idempotently keyed by `(user_id, entity_id)`, so
/// repeated delivery of the same mutation is harmless. Within one entity
/// key, last-write-wins by the client-issued timestamp.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch one video collection for a user.
    async fn fetch_videos(
        &self,
        user_id: &str,
        collection: SyncCollection,
    ) -> Result<Vec<VideoRecord>>;

    /// Fetch the subscription set for a user.
    async fn fetch_subscriptions(&self, user_id: &str) -> Result<Vec<ChannelRef>>;

    /// Upsert one video into a collection.
    async fn upsert_video(
        &self,
        user_id: &str,
        collection: SyncCollection,
        record: &VideoRecord,
        issued_at_ms: u64,
    ) -> Result<()>;

    /// Delete one video from a collection.
    async fn delete_video(
        &self,
        user_id: &str,
        collection: SyncCollection,
        video_id: &str,
    ) -> Result<()>;

    /// Upsert one subscription.
    async fn upsert_subscription(
        &self,
        user_id: &str,
        channel: &ChannelRef,
        issued_at_ms: u64,
    ) -> Result<()>;

    /// Delete one subscription.
    async fn delete_subscription(&self, user_id: &str, channel_id: &str) -> Result<()>;
}

/// One optimistic mutation to mirror against the remote store.
#[derive(Debug, Clone)]
pub enum SyncMutation {
    /// A video was added to the watch history.
    HistoryAdd(VideoRecord),
    /// A video was liked.
    Like(VideoRecord),
    /// A like was removed.
    Unlike(String),
    /// A video was saved.
    Save(VideoRecord),
    /// A saved video was removed.
    Unsave(String),
    /// A channel was subscribed.
    Subscribe(ChannelRef),
    /// A channel was unsubscribed.
    Unsubscribe(String),
}

impl SyncMutation {
    /// Mutation kind, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::HistoryAdd(_) => "historyAdd",
            Self::Like(_) => "like",
            Self::Unlike(_) => "unlike",
            Self::Save(_) => "save",
            Self::Unsave(_) => "unsave",
            Self::Subscribe(_) => "subscribe",
            Self::Unsubscribe(_) => "unsubscribe",
        }
    }

    /// The entity id this mutation is keyed by.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::HistoryAdd(record) | Self::Like(record) | Self::Save(record) => &record.id,
            Self::Unlike(id) | Self::Unsave(id) | Self::Unsubscribe(id) => id,
            Self::Subscribe(channel) => &channel.channel_id,
        }
    }
}

#[derive(Debug)]
struct QueuedMutation {
    user_id: String,
    mutation: SyncMutation,
    issued_at_ms: u64,
}

/// Best-effort mirror of the local cache against a [`RemoteStore`].
///
/// Presence is gated by configuration: callers construct one only when a
/// remote store URL is configured.
pub struct SyncService {
    remote: Arc<dyn RemoteStore>,
    tx: mpsc::UnboundedSender<QueuedMutation>,
    queue_depth: Arc<AtomicUsize>,
}

impl SyncService {
    /// Create a sync service and spawn its background push worker.
    ///
    /// The worker drains the mutation queue for the lifetime of the service;
    /// it exits when the service is dropped.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedMutation>();
        let queue_depth = Arc::new(AtomicUsize::new(0));

        let worker_remote = Arc::clone(&remote);
        let worker_depth = Arc::clone(&queue_depth);
        tokio::spawn(async move {
            while let Some(queued) = rx.recv().await {
                if let Err(e) = deliver(worker_remote.as_ref(), &queued).await {
                    // The local cache already holds the user-visible truth;
                    // the missed remote write is not retried.
                    warn!(
                        "Dropping failed sync push (kind={}, entity={}): {}",
                        queued.mutation.kind(),
                        queued.mutation.entity_id(),
                        e
                    );
                }
                worker_depth.fetch_sub(1, Ordering::SeqCst);
            }
            debug!("Sync push worker stopped");
        });

        Self {
            remote,
            tx,
            queue_depth,
        }
    }

    /// Fetch every remote collection for `user_id` and **overwrite** the
    /// corresponding local cache entries.
    ///
    /// The remote is authoritative once a session exists; purely-local edits
    /// made while offline and never pushed are lost here by design. All
    /// fetches complete before any local write, so a failed pull never
    /// leaves a partial overwrite.
    pub async fn pull_all(&self, store: &LocalStore, user_id: &str) -> Result<()> {
        let history = self
            .remote
            .fetch_videos(user_id, SyncCollection::History)
            .await?;
        let likes = self
            .remote
            .fetch_videos(user_id, SyncCollection::Likes)
            .await?;
        let saved = self
            .remote
            .fetch_videos(user_id, SyncCollection::Saved)
            .await?;
        let subscriptions = self.remote.fetch_subscriptions(user_id).await?;

        store.save(CollectionKey::History, &history)?;
        store.save(CollectionKey::LikedVideos, &likes)?;
        store.save(CollectionKey::SavedVideos, &saved)?;
        store.save_subscriptions(&subscriptions)?;

        info!(
            "Pulled remote state for {}: {} history, {} likes, {} saved, {} subscriptions",
            user_id,
            history.len(),
            likes.len(),
            saved.len(),
            subscriptions.len()
        );
        Ok(())
    }

    /// Enqueue one mutation for best-effort delivery.
    ///
    /// Returns immediately; the caller has already applied the mutation to
    /// the local cache. There is no ordering guarantee across different
    /// mutation kinds.
    pub fn push_mutation(&self, user_id: &str, mutation: SyncMutation) {
        debug!(
            "Enqueueing sync push (kind={}, entity={})",
            mutation.kind(),
            mutation.entity_id()
        );
        self.queue_depth.fetch_add(1, Ordering::SeqCst);
        let queued = QueuedMutation {
            user_id: user_id.to_string(),
            mutation,
            issued_at_ms: now_millis(),
        };
        if self.tx.send(queued).is_err() {
            self.queue_depth.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Number of mutations enqueued but not yet attempted, for
    /// observability.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("queue_depth", &self.queue_depth())
            .finish_non_exhaustive()
    }
}

async fn deliver(remote: &dyn RemoteStore, queued: &QueuedMutation) -> Result<()> {
    let user = queued.user_id.as_str();
    let at = queued.issued_at_ms;
    match &queued.mutation {
        SyncMutation::HistoryAdd(record) => {
            remote
                .upsert_video(user, SyncCollection::History, record, at)
                .await
        }
        SyncMutation::Like(record) => {
            remote
                .upsert_video(user, SyncCollection::Likes, record, at)
                .await
        }
        SyncMutation::Unlike(video_id) => {
            remote
                .delete_video(user, SyncCollection::Likes, video_id)
                .await
        }
        SyncMutation::Save(record) => {
            remote
                .upsert_video(user, SyncCollection::Saved, record, at)
                .await
        }
        SyncMutation::Unsave(video_id) => {
            remote
                .delete_video(user, SyncCollection::Saved, video_id)
                .await
        }
        SyncMutation::Subscribe(channel) => {
            remote.upsert_subscription(user, channel, at).await
        }
        SyncMutation::Unsubscribe(channel_id) => {
            remote.delete_subscription(user, channel_id).await
        }
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertVideoBody<'a> {
    record: &'a VideoRecord,
    issued_at_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertSubscriptionBody<'a> {
    channel: &'a ChannelRef,
    issued_at_ms: u64,
}

/// HTTP implementation of [`RemoteStore`] against a REST backing store.
///
/// Entities live at `users/{userId}/{collection}/{entityId}`, which makes
/// upsert and delete idempotent by construction.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRemoteStore {
    /// Create a remote store client for the configured URL and key.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn url(&self, user_id: &str, tail: &str) -> String {
        format!(
            "{}/users/{user_id}/{tail}",
            self.base_url.trim_end_matches('/')
        )
    }

    fn apply_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self
            .apply_key(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::RemoteSyncFailure(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::RemoteSyncFailure(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| Error::RemoteSyncFailure(e.to_string()))
    }

    async fn send_checked(&self, request: reqwest::RequestBuilder) -> Result<()> {
        self.apply_key(request)
            .send()
            .await
            .map_err(|e| Error::RemoteSyncFailure(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::RemoteSyncFailure(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_videos(
        &self,
        user_id: &str,
        collection: SyncCollection,
    ) -> Result<Vec<VideoRecord>> {
        self.get_json(self.url(user_id, collection.as_str())).await
    }

    async fn fetch_subscriptions(&self, user_id: &str) -> Result<Vec<ChannelRef>> {
        self.get_json(self.url(user_id, "subscriptions")).await
    }

    async fn upsert_video(
        &self,
        user_id: &str,
        collection: SyncCollection,
        record: &VideoRecord,
        issued_at_ms: u64,
    ) -> Result<()> {
        let url = self.url(user_id, &format!("{}/{}", collection.as_str(), record.id));
        let body = UpsertVideoBody {
            record,
            issued_at_ms,
        };
        self.send_checked(self.client.put(&url).json(&body)).await
    }

    async fn delete_video(
        &self,
        user_id: &str,
        collection: SyncCollection,
        video_id: &str,
    ) -> Result<()> {
        let url = self.url(user_id, &format!("{}/{video_id}", collection.as_str()));
        self.send_checked(self.client.delete(&url)).await
    }

    async fn upsert_subscription(
        &self,
        user_id: &str,
        channel: &ChannelRef,
        issued_at_ms: u64,
    ) -> Result<()> {
        let url = self.url(user_id, &format!("subscriptions/{}", channel.channel_id));
        let body = UpsertSubscriptionBody {
            channel,
            issued_at_ms,
        };
        self.send_checked(self.client.put(&url).json(&body)).await
    }

    async fn delete_subscription(&self, user_id: &str, channel_id: &str) -> Result<()> {
        let url = self.url(user_id, &format!("subscriptions/{channel_id}"));
        self.send_checked(self.client.delete(&url)).await
    }
}
