//! Comment threads: local optimistic comments layered over remote ones.
//!
//! Local comments are prepended ahead of whatever the provider returned and
//! never merged by content; the avatar color is a deterministic hash of the
//! author name, carried over from the original client so colors stay stable
//! across sessions.

use crate::error::Result;
use crate::model::{CommentEntry, RawComment};
use crate::store::LocalStore;

/// Display timestamp given to a just-submitted comment.
pub const JUST_NOW: &str = "Baru saja";

/// Deterministic avatar color for an author name, as "#RRGGBB".
#[must_use]
pub fn author_color(author: &str) -> String {
    let mut hash: i32 = 0;
    for c in author.chars() {
        hash = (c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    format!("#{:06X}", hash & 0x00FF_FFFF)
}

/// Add an optimistic local comment to a video's thread.
///
/// The entry is persisted immediately (write-through) and returned for
/// rendering; it will sit ahead of remote comments in [`merged_comments`].
pub fn add_comment(
    store: &LocalStore,
    video_id: &str,
    author: &str,
    text: &str,
) -> Result<CommentEntry> {
    let entry = CommentEntry {
        author: author.to_string(),
        text: text.to_string(),
        timestamp: JUST_NOW.to_string(),
        color: author_color(author),
    };
    store.prepend_comment(video_id, entry.clone())?;
    Ok(entry)
}

/// Full thread for one video: local comments newest-first, then remote
/// comments in provider order.
#[must_use]
pub fn merged_comments(
    store: &LocalStore,
    video_id: &str,
    remote: &[RawComment],
) -> Vec<CommentEntry> {
    let mut thread = store.comments_for(video_id);
    thread.extend(remote.iter().map(|comment| CommentEntry {
        author: comment.author.clone(),
        text: comment.text.clone(),
        timestamp: comment.time.clone(),
        color: author_color(&comment.author),
    }));
    thread
}
