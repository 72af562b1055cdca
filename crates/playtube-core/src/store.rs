//! Local persistent cache: durable, synchronous key-value storage for the
//! user-scoped collections (history, likes, saved videos, subscriptions,
//! comments, accent color, session).
//!
//! Every mutating operation is immediately followed by a full
//! serialize-and-persist; there is no write buffering, so a crash loses at
//! most the in-flight action, never previously committed state. Reads are
//! liberal: a corrupt or absent blob yields the type's empty default, since
//! this store is a cache, not a source of truth.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{ChannelRef, CommentEntry, Session, VideoRecord};

/// Maximum number of entries kept in the watch history.
pub const HISTORY_CAP: usize = 50;

/// The video collections managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKey {
    /// Watch history, most recent first, capped at [`HISTORY_CAP`].
    History,
    /// Liked videos.
    LikedVideos,
    /// Saved ("Simpan") videos.
    SavedVideos,
}

impl CollectionKey {
    /// All video collections, in sync order.
    pub const ALL: [Self; 3] = [Self::History, Self::LikedVideos, Self::SavedVideos];

    /// Logical key name, also used as the persisted file stem.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::History => "history",
            Self::LikedVideos => "likedVideos",
            Self::SavedVideos => "savedVideos",
        }
    }

    /// Bounded length for this collection, if any.
    const fn cap(self) -> Option<usize> {
        match self {
            Self::History => Some(HISTORY_CAP),
            Self::LikedVideos | Self::SavedVideos => None,
        }
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const SUBSCRIPTIONS_KEY: &str = "subscriptions";
const COMMENTS_KEY: &str = "commentsByVideo";
const ACCENT_COLOR_KEY: &str = "accentColor";
const SESSION_KEY: &str = "sessionUser";

/// File-per-key JSON store scoped to one state directory.
///
/// All mutations run as mutually exclusive read-modify-write steps behind a
/// mutex, so partial writes never interleave even with multi-threaded
/// callers.
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    guard: Mutex<()>,
}

impl LocalStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Opened local store at {}", dir.display());
        Ok(Self {
            dir,
            guard: Mutex::new(()),
        })
    }

    /// The state directory backing this store.
    #[must_use]
    pub fn directory(&self) -> &std::path::Path {
        &self.dir
    }

    // ---- video collections ----

    /// Load a video collection; absent or corrupt data yields an empty list.
    #[must_use]
    pub fn load(&self, key: CollectionKey) -> Vec<VideoRecord> {
        self.read_json(key.as_str())
    }

    /// Replace a video collection wholesale and persist it.
    pub fn save(&self, key: CollectionKey, records: &[VideoRecord]) -> Result<()> {
        let _guard = self.lock();
        self.write_json(key.as_str(), &records)
    }

    /// Front-insert a record, de-duplicating by id and enforcing the
    /// collection cap.
    ///
    /// Re-adding an existing id moves it to the front rather than
    /// duplicating it; when the cap is exceeded the oldest entry is evicted.
    pub fn append(&self, key: CollectionKey, record: VideoRecord) -> Result<()> {
        let _guard = self.lock();
        let mut records: Vec<VideoRecord> = self.read_json(key.as_str());
        records.retain(|existing| existing.id != record.id);
        records.insert(0, record);
        if let Some(cap) = key.cap()
            && records.len() > cap
        {
            records.truncate(cap);
        }
        self.write_json(key.as_str(), &records)
    }

    /// Remove a record by id. Returns true if an entry was removed.
    pub fn remove(&self, key: CollectionKey, video_id: &str) -> Result<bool> {
        let _guard = self.lock();
        let mut records: Vec<VideoRecord> = self.read_json(key.as_str());
        let before = records.len();
        records.retain(|existing| existing.id != video_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_json(key.as_str(), &records)?;
        Ok(true)
    }

    /// Whether a collection contains the given video id.
    #[must_use]
    pub fn contains(&self, key: CollectionKey, video_id: &str) -> bool {
        self.load(key).iter().any(|record| record.id == video_id)
    }

    // ---- subscriptions ----

    /// Load the subscription set; most recent first.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<ChannelRef> {
        self.read_json(SUBSCRIPTIONS_KEY)
    }

    /// Replace the subscription set wholesale and persist it.
    pub fn save_subscriptions(&self, channels: &[ChannelRef]) -> Result<()> {
        let _guard = self.lock();
        self.write_json(SUBSCRIPTIONS_KEY, &channels)
    }

    /// Subscribe to a channel. Returns false if already subscribed.
    pub fn subscribe(&self, channel: ChannelRef) -> Result<bool> {
        let _guard = self.lock();
        let mut channels: Vec<ChannelRef> = self.read_json(SUBSCRIPTIONS_KEY);
        if channels
            .iter()
            .any(|existing| existing.channel_id == channel.channel_id)
        {
            return Ok(false);
        }
        channels.insert(0, channel);
        self.write_json(SUBSCRIPTIONS_KEY, &channels)?;
        Ok(true)
    }

    /// Unsubscribe from a channel. Returns true if an entry was removed.
    pub fn unsubscribe(&self, channel_id: &str) -> Result<bool> {
        let _guard = self.lock();
        let mut channels: Vec<ChannelRef> = self.read_json(SUBSCRIPTIONS_KEY);
        let before = channels.len();
        channels.retain(|existing| existing.channel_id != channel_id);
        if channels.len() == before {
            return Ok(false);
        }
        self.write_json(SUBSCRIPTIONS_KEY, &channels)?;
        Ok(true)
    }

    /// Whether the user is subscribed to the given channel.
    #[must_use]
    pub fn is_subscribed(&self, channel_id: &str) -> bool {
        self.subscriptions()
            .iter()
            .any(|existing| existing.channel_id == channel_id)
    }

    // ---- comments ----

    /// Locally added comments for one video, newest first.
    #[must_use]
    pub fn comments_for(&self, video_id: &str) -> Vec<CommentEntry> {
        let threads: HashMap<String, Vec<CommentEntry>> = self.read_json(COMMENTS_KEY);
        threads.get(video_id).cloned().unwrap_or_default()
    }

    /// Prepend a locally added comment to a video's thread and persist it.
    pub fn prepend_comment(&self, video_id: &str, entry: CommentEntry) -> Result<()> {
        let _guard = self.lock();
        let mut threads: HashMap<String, Vec<CommentEntry>> = self.read_json(COMMENTS_KEY);
        threads
            .entry(video_id.to_string())
            .or_default()
            .insert(0, entry);
        self.write_json(COMMENTS_KEY, &threads)
    }

    // ---- scalar keys ----

    /// The persisted accent color, if one was chosen.
    #[must_use]
    pub fn accent_color(&self) -> Option<String> {
        self.read_json(ACCENT_COLOR_KEY)
    }

    /// Persist the accent color.
    pub fn set_accent_color(&self, color: &str) -> Result<()> {
        let _guard = self.lock();
        self.write_json(ACCENT_COLOR_KEY, &Some(color.to_string()))
    }

    /// The persisted session, if the user is signed in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.read_json(SESSION_KEY)
    }

    /// Persist or clear the session.
    pub fn set_session(&self, session: Option<&Session>) -> Result<()> {
        let _guard = self.lock();
        self.write_json(SESSION_KEY, &session)
    }

    // ---- plumbing ----

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Liberal read: absent file, unreadable file, or corrupt JSON all yield
    /// the default value.
    fn read_json<T: Default + DeserializeOwned>(&self, key: &str) -> T {
        let path = self.file_path(key);
        let Ok(content) = fs::read_to_string(&path) else {
            return T::default();
        };
        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding corrupt blob for key '{}': {}", key, e);
                T::default()
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string(value)?;
        fs::write(self.file_path(key), content)?;
        Ok(())
    }
}
