//! Session lifecycle: sign-in, sign-out, and the one-shot
//! pull-then-overwrite sync that accompanies sign-in.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::model::Session;
use crate::store::LocalStore;
use crate::sync::SyncService;

/// Owns the optional session and wires sign-in to the remote sync pull.
///
/// The sync service is absent when no remote store is configured; sessions
/// then stay purely local.
pub struct SessionManager {
    store: Arc<LocalStore>,
    sync: Option<Arc<SyncService>>,
}

impl SessionManager {
    /// Create a session manager over the local store and the optional sync
    /// service.
    #[must_use]
    pub const fn new(store: Arc<LocalStore>, sync: Option<Arc<SyncService>>) -> Self {
        Self { store, sync }
    }

    /// The current session, if the user is signed in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.store.session()
    }

    /// Establish a session and pull the remote state into the local cache.
    ///
    /// The pull overwrites local collections (remote is authoritative once a
    /// session exists). A failed pull is logged and does not block sign-in;
    /// the local cache stays authoritative for the session.
    pub async fn sign_in(&self, session: Session) -> Result<()> {
        self.store.set_session(Some(&session))?;
        info!("Signed in as {}", session.user_id);

        if let Some(sync) = &self.sync
            && let Err(e) = sync.pull_all(&self.store, &session.user_id).await
        {
            warn!("Initial pull failed, keeping local state: {}", e);
        }
        Ok(())
    }

    /// Destroy the session.
    ///
    /// Local collections are kept; the store is a cache, not per-account
    /// storage.
    pub fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.store.session() {
            info!("Signed out {}", session.user_id);
        }
        self.store.set_session(None)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("signed_in", &self.current().is_some())
            .finish_non_exhaustive()
    }
}
