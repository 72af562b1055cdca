//! View-state controller: pagination, fetch orchestration, and the
//! optimistic social actions.
//!
//! One controller instance owns one rendered collection. It serializes its
//! own fetches (at most one outstanding fetch at a time) and stamps every
//! fetch with a generation counter so a superseded fetch's result is
//! discarded instead of clobbering a newer query. Independent controllers
//! do not serialize against each other; they touch disjoint cache keys.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::mock;
use crate::model::{ChannelRef, VideoPage, VideoRecord};
use crate::normalize;
use crate::provider::VideoProvider;
use crate::store::{CollectionKey, LocalStore};
use crate::sync::{SyncMutation, SyncService};

/// Number of items requested per page, and substituted on fetch failure.
pub const PAGE_SIZE: usize = 8;

/// Lifecycle of the rendered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    /// Nothing fetched yet.
    #[default]
    Idle,
    /// First fetch for the current query is in flight.
    Loading,
    /// The collection is rendered and stable.
    Loaded,
    /// A pagination fetch is in flight.
    Appending,
}

/// What the controller is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedQuery {
    /// Provider-sorted popular videos.
    #[default]
    Trending,
    /// Free-text search.
    Search(String),
    /// Provider category feed.
    Category(String),
}

/// How a fetch result is folded into the rendered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Replace,
    Append,
}

/// A fetch the controller has committed to.
///
/// Carries the generation it was issued under; results are applied only if
/// the controller's generation still matches.
#[derive(Debug)]
pub struct FetchIntent {
    generation: u64,
    query: FeedQuery,
    cursor: Option<String>,
    mode: FetchMode,
}

impl FetchIntent {
    /// The opaque cursor this fetch should be issued with.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

/// State machine over `{idle, loading, loaded, appending}` for one video
/// feed.
#[derive(Debug, Default)]
pub struct FeedController {
    phase: FeedPhase,
    query: FeedQuery,
    cursor: Option<String>,
    records: Vec<VideoRecord>,
    generation: u64,
}

impl FeedController {
    /// Create an idle controller showing the trending feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> FeedPhase {
        self.phase
    }

    /// Current query.
    #[must_use]
    pub const fn query(&self) -> &FeedQuery {
        &self.query
    }

    /// The rendered collection, in display order.
    #[must_use]
    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    /// Begin a fresh query: reset the cursor, clear the rendered
    /// collection, and commit to the first fetch.
    ///
    /// Starting a new query supersedes any fetch still in flight; the old
    /// fetch's result will fail the generation check and be discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQuery`] for a blank search term, leaving the
    /// controller untouched.
    pub fn start_query(&mut self, query: FeedQuery) -> Result<FetchIntent> {
        if let FeedQuery::Search(term) = &query
            && term.trim().is_empty()
        {
            return Err(Error::EmptyQuery);
        }

        self.generation += 1;
        self.query = query.clone();
        self.cursor = None;
        self.records.clear();
        self.phase = FeedPhase::Loading;
        debug!("Starting query {:?} (generation {})", query, self.generation);

        Ok(FetchIntent {
            generation: self.generation,
            query,
            cursor: None,
            mode: FetchMode::Replace,
        })
    }

    /// Commit to a pagination fetch with the current cursor.
    ///
    /// Returns `None` while a fetch is already outstanding (phase is
    /// `Loading` or `Appending`) so at most one fetch is in flight per
    /// controller, and `None` once the feed is exhausted (a loaded page left
    /// no continuation cursor). Re-issuing a fetch without a cursor would
    /// fetch the first page again and duplicate its items.
    pub fn load_more(&mut self) -> Option<FetchIntent> {
        match self.phase {
            FeedPhase::Loading | FeedPhase::Appending => {
                debug!("load_more ignored: fetch already in flight");
                None
            }
            FeedPhase::Loaded if self.cursor.is_none() => {
                debug!("load_more ignored: end of feed");
                None
            }
            FeedPhase::Idle | FeedPhase::Loaded => {
                self.phase = FeedPhase::Appending;
                Some(FetchIntent {
                    generation: self.generation,
                    query: self.query.clone(),
                    cursor: self.cursor.clone(),
                    mode: FetchMode::Append,
                })
            }
        }
    }

    /// Fold a successful fetch into the rendered collection.
    ///
    /// Items are normalized with the lossy page policy (placeholder
    /// thumbnails, id-less items dropped). Returns false when the result is
    /// stale and was discarded.
    pub fn apply_success(&mut self, intent: &FetchIntent, page: &VideoPage) -> bool {
        if intent.generation != self.generation {
            debug!(
                "Discarding stale fetch result (generation {} != {})",
                intent.generation, self.generation
            );
            return false;
        }

        let now = Utc::now();
        let normalized: Vec<VideoRecord> = page
            .items
            .iter()
            .filter_map(|item| normalize::normalize_lossy(item, now))
            .collect();

        match intent.mode {
            FetchMode::Replace => self.records = normalized,
            FetchMode::Append => self.records.extend(normalized),
        }
        self.cursor = page.next_page_token.clone();
        self.phase = FeedPhase::Loaded;
        true
    }

    /// Recover a failed fetch by substituting deterministic mock records of
    /// the requested count, so the view never shows an empty state due to a
    /// transient provider failure. Returns false when the result is stale.
    ///
    /// The cursor is cleared: the substituted records do not correspond to
    /// the cursor's page, so retrying the same token later would append that
    /// page's items on top of the mocks. The feed ends here instead.
    pub fn apply_failure(&mut self, intent: &FetchIntent) -> bool {
        if intent.generation != self.generation {
            debug!(
                "Discarding stale fetch failure (generation {} != {})",
                intent.generation, self.generation
            );
            return false;
        }

        let offset = match intent.mode {
            FetchMode::Replace => 0,
            FetchMode::Append => self.records.len(),
        };
        let substitutes = mock::mock_videos(offset, PAGE_SIZE);
        match intent.mode {
            FetchMode::Replace => self.records = substitutes,
            FetchMode::Append => self.records.extend(substitutes),
        }
        self.cursor = None;
        self.phase = FeedPhase::Loaded;
        true
    }

    /// Execute a committed fetch against the provider and fold in the
    /// outcome. Provider failures are recovered with mock records, never
    /// surfaced.
    pub async fn run<P: VideoProvider>(&mut self, provider: &P, intent: FetchIntent) {
        let cursor = intent.cursor();
        let outcome = match &intent.query {
            FeedQuery::Trending => provider.trending(cursor).await,
            FeedQuery::Search(term) => provider.search(term, cursor).await,
            FeedQuery::Category(id) => provider.category(id, cursor).await,
        };

        match outcome {
            Ok(page) => {
                self.apply_success(&intent, &page);
            }
            Err(e) => {
                warn!("Fetch failed, substituting mock records: {}", e);
                self.apply_failure(&intent);
            }
        }
    }

    /// Convenience: start a query and drive it to completion.
    pub async fn refresh<P: VideoProvider>(
        &mut self,
        provider: &P,
        query: FeedQuery,
    ) -> Result<()> {
        let intent = self.start_query(query)?;
        self.run(provider, intent).await;
        Ok(())
    }

    /// Convenience: paginate and drive the fetch to completion. Returns
    /// false if a fetch was already in flight.
    pub async fn fetch_more<P: VideoProvider>(&mut self, provider: &P) -> bool {
        match self.load_more() {
            Some(intent) => {
                self.run(provider, intent).await;
                true
            }
            None => false,
        }
    }
}

/// Optimistic social actions: the local cache is mutated synchronously and
/// the remote push is dispatched without blocking.
///
/// There is no rollback path if the remote write later fails; the design
/// favors UI responsiveness over strict remote consistency.
pub struct UserActions {
    store: Arc<LocalStore>,
    sync: Option<Arc<SyncService>>,
}

impl UserActions {
    /// Create an action dispatcher over the local store and the optional
    /// sync service.
    #[must_use]
    pub const fn new(store: Arc<LocalStore>, sync: Option<Arc<SyncService>>) -> Self {
        Self { store, sync }
    }

    /// Record a watched video in the history.
    pub fn record_watch(&self, record: &VideoRecord) -> Result<()> {
        self.store.append(CollectionKey::History, record.clone())?;
        self.push(SyncMutation::HistoryAdd(record.clone()));
        Ok(())
    }

    /// Toggle a like. Returns the new state (true = liked).
    pub fn toggle_like(&self, record: &VideoRecord) -> Result<bool> {
        if self.store.contains(CollectionKey::LikedVideos, &record.id) {
            self.store.remove(CollectionKey::LikedVideos, &record.id)?;
            self.push(SyncMutation::Unlike(record.id.clone()));
            Ok(false)
        } else {
            self.store
                .append(CollectionKey::LikedVideos, record.clone())?;
            self.push(SyncMutation::Like(record.clone()));
            Ok(true)
        }
    }

    /// Toggle a saved video. Returns the new state (true = saved).
    pub fn toggle_save(&self, record: &VideoRecord) -> Result<bool> {
        if self.store.contains(CollectionKey::SavedVideos, &record.id) {
            self.store.remove(CollectionKey::SavedVideos, &record.id)?;
            self.push(SyncMutation::Unsave(record.id.clone()));
            Ok(false)
        } else {
            self.store
                .append(CollectionKey::SavedVideos, record.clone())?;
            self.push(SyncMutation::Save(record.clone()));
            Ok(true)
        }
    }

    /// Toggle a subscription. Returns the new state (true = subscribed).
    pub fn toggle_subscribe(&self, channel: &ChannelRef) -> Result<bool> {
        if self.store.is_subscribed(&channel.channel_id) {
            self.store.unsubscribe(&channel.channel_id)?;
            self.push(SyncMutation::Unsubscribe(channel.channel_id.clone()));
            Ok(false)
        } else {
            self.store.subscribe(channel.clone())?;
            self.push(SyncMutation::Subscribe(channel.clone()));
            Ok(true)
        }
    }

    /// Dispatch one mutation to the sync queue when a session exists and a
    /// remote store is configured.
    fn push(&self, mutation: SyncMutation) {
        if let Some(sync) = &self.sync
            && let Some(session) = self.store.session()
        {
            sync.push_mutation(&session.user_id, mutation);
        }
    }
}

impl std::fmt::Debug for UserActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserActions").finish_non_exhaustive()
    }
}
