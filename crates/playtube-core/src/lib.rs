//! Playtube Core Library
//!
//! This crate provides the client-side core of the Playtube application:
//! - Normalization of raw provider payloads into display-ready records
//! - A persistent local cache for history, likes, saves, and subscriptions
//! - Remote sync (pull-then-overwrite on sign-in, fire-and-forget pushes)
//! - The view-state controller driving feeds, pagination, and optimistic
//!   social actions
//!
//! # Error Handling
//!
//! This crate uses typed errors throughout. See the [`error`] module for
//! details.
//!
//! ```rust,ignore
//! use playtube_core::{Error, Result};
//!
//! fn do_something() -> Result<()> {
//!     // Your code here
//!     Ok(())
//! }
//! ```

pub mod comments;
pub mod config;
pub mod error;
pub mod mock;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod session;
pub mod store;
pub mod sync;
pub mod view;

pub use comments::{JUST_NOW, add_comment, author_color, merged_comments};
pub use config::{AppConfig, default_state_directory};
pub use error::{Error, Result};
pub use mock::{MOCK_CHANNELS, MOCK_TITLES, mock_comments, mock_raw_items, mock_videos};
pub use model::{
    ChannelRef, CommentEntry, RawComment, RawItem, Session, VideoPage, VideoRecord,
};
pub use normalize::{
    channel_initial, format_relative_time, format_view_count, meta_line, normalize,
    normalize_lossy,
};
pub use provider::{HttpVideoProvider, VideoProvider};
pub use session::SessionManager;
pub use store::{HISTORY_CAP, CollectionKey, LocalStore};
pub use sync::{HttpRemoteStore, RemoteStore, SyncCollection, SyncMutation, SyncService};
pub use view::{FeedController, FeedPhase, FeedQuery, FetchIntent, PAGE_SIZE, UserActions};
