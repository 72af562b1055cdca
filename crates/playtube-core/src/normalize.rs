//! Normalization layer: converts heterogeneous provider item shapes into the
//! canonical [`VideoRecord`].
//!
//! Everything here is a pure transform of its inputs (the caller supplies
//! `now` for relative-time buckets), so the functions are safe to unit test
//! exhaustively.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{RawItem, RawSnippet, VideoRecord};

/// Convert one raw provider item into a canonical [`VideoRecord`].
///
/// Thumbnail resolution falls back high, then medium, then default; if none is
/// present the item fails with [`Error::MissingThumbnail`] and the caller is
/// expected to substitute a placeholder rather than abort the page (see
/// [`normalize_lossy`]).
///
/// # Errors
///
/// Returns [`Error::MissingVideoId`] for search results that reference a
/// channel or playlist, and [`Error::MissingThumbnail`] when no resolution
/// is available.
pub fn normalize(item: &RawItem, now: DateTime<Utc>) -> Result<VideoRecord> {
    let id = item.video_id().ok_or(Error::MissingVideoId)?.to_string();
    let thumbnail_url =
        resolve_thumbnail(item.snippet()).ok_or_else(|| Error::MissingThumbnail(id.clone()))?;
    build_record(item, id, thumbnail_url, now)
}

/// Page-level normalization policy: substitute a deterministic placeholder
/// thumbnail instead of failing the item, and drop items without a video id
/// (channel and playlist search results).
#[must_use]
pub fn normalize_lossy(item: &RawItem, now: DateTime<Utc>) -> Option<VideoRecord> {
    let id = item.video_id()?.to_string();
    let thumbnail_url =
        resolve_thumbnail(item.snippet()).unwrap_or_else(|| placeholder_thumbnail(&id));
    build_record(item, id, thumbnail_url, now).ok()
}

fn build_record(
    item: &RawItem,
    id: String,
    thumbnail_url: String,
    now: DateTime<Utc>,
) -> Result<VideoRecord> {
    let snippet = item.snippet();

    let view_count = item
        .statistics()
        .and_then(|stats| stats.view_count.as_deref())
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or_else(|| fallback_view_count(&id));

    let relative_time = snippet
        .published_at
        .map_or_else(|| "baru saja".to_string(), |at| format_relative_time(at, now));

    let description = snippet.description.clone().unwrap_or_else(|| {
        format!(
            "Video menarik dari {}. Tonton sekarang di Playtube.",
            snippet.channel_title
        )
    });

    Ok(VideoRecord {
        id,
        title: snippet.title.clone(),
        channel_name: snippet.channel_title.clone(),
        channel_id: snippet.channel_id.clone().unwrap_or_default(),
        thumbnail_url,
        view_count_display: format_view_count(view_count),
        relative_time,
        verified: snippet.verified,
        description,
    })
}

/// Pick the best available thumbnail, falling back high, then medium, then
/// default.
fn resolve_thumbnail(snippet: &RawSnippet) -> Option<String> {
    let thumbnails = snippet.thumbnails.as_ref()?;
    thumbnails
        .high
        .as_ref()
        .or(thumbnails.medium.as_ref())
        .or(thumbnails.default.as_ref())
        .map(|thumb| thumb.url.clone())
}

/// Deterministic placeholder thumbnail for items without one.
#[must_use]
pub fn placeholder_thumbnail(video_id: &str) -> String {
    format!("https://picsum.photos/seed/{video_id}/480/270")
}

/// Format a numeric view count into a human-readable magnitude bucket.
///
/// Values below 1.000 render as-is; thousands use "rb" and millions "jt",
/// with one decimal digit and a trimmed trailing `.0` ("1.5 jt", "2 jt").
#[must_use]
pub fn format_view_count(count: u64) -> String {
    if count < 1_000 {
        count.to_string()
    } else if count < 1_000_000 {
        format_scaled(count, 1_000.0, "rb")
    } else {
        format_scaled(count, 1_000_000.0, "jt")
    }
}

fn format_scaled(count: u64, divisor: f64, unit: &str) -> String {
    // Truncate, not round: 1.99 jt stays 1.9 jt until 2.0 is reached.
    let tenths = (count as f64 / divisor * 10.0).floor();
    let scaled = tenths / 10.0;
    if tenths % 10.0 == 0.0 {
        format!("{scaled:.0} {unit}")
    } else {
        format!("{scaled:.1} {unit}")
    }
}

/// Bucket an absolute timestamp into a coarse Indonesian relative-time
/// string, using integer division rather than calendar-aware rounding.
///
/// Ties go to the larger unit once the threshold is crossed: exactly 60
/// seconds is "1 menit yang lalu".
#[must_use]
pub fn format_relative_time(published_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - published_at).num_seconds().max(0);
    let minutes = secs / 60;
    let hours = secs / 3600;
    let days = secs / 86_400;

    if secs < 60 {
        "baru saja".to_string()
    } else if minutes < 60 {
        format!("{minutes} menit yang lalu")
    } else if hours < 24 {
        format!("{hours} jam yang lalu")
    } else if days < 30 {
        format!("{days} hari yang lalu")
    } else if days < 365 {
        format!("{} bulan yang lalu", days / 30)
    } else {
        format!("{} tahun yang lalu", days / 365)
    }
}

/// Compose the meta line rendered under a video title.
#[must_use]
pub fn meta_line(record: &VideoRecord) -> String {
    format!(
        "{} x ditonton • {}",
        record.view_count_display, record.relative_time
    )
}

/// First letter of the channel name, uppercased, for the avatar badge.
#[must_use]
pub fn channel_initial(channel_name: &str) -> String {
    channel_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default()
}

/// Deterministic pseudo view count for items the provider returned without
/// statistics. Stable per video id so repeated renders agree.
fn fallback_view_count(video_id: &str) -> u64 {
    let hash = video_id
        .bytes()
        .fold(0u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(u64::from(byte)));
    (hash % 1_000 + 1) * 1_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn search_item(video_id: &str, published_secs_ago: i64, now: DateTime<Utc>) -> RawItem {
        let published = now - Duration::seconds(published_secs_ago);
        serde_json::from_value(serde_json::json!({
            "id": {"videoId": video_id},
            "snippet": {
                "title": "T",
                "channelTitle": "C",
                "thumbnails": {"high": {"url": "u"}},
                "publishedAt": published.to_rfc3339(),
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_search_shape_one_hour_ago() {
        let now = Utc::now();
        let item = search_item("abc", 3600, now);

        let record = normalize(&item, now).unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.title, "T");
        assert_eq!(record.channel_name, "C");
        assert_eq!(record.thumbnail_url, "u");
        assert_eq!(record.relative_time, "1 jam yang lalu");
    }

    #[test]
    fn test_normalize_is_pure() {
        let now = Utc::now();
        let item = search_item("abc", 7200, now);
        let first = normalize(&item, now).unwrap();
        let second = normalize(&item, now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_resource_shape_with_statistics() {
        let item: RawItem = serde_json::from_value(serde_json::json!({
            "id": "xyz",
            "snippet": {
                "title": "Judul",
                "channelTitle": "Kanal",
                "channelId": "ch1",
                "thumbnails": {"medium": {"url": "m"}},
            },
            "statistics": {"viewCount": "1500000"}
        }))
        .unwrap();

        let record = normalize(&item, Utc::now()).unwrap();
        assert_eq!(record.thumbnail_url, "m");
        assert_eq!(record.channel_id, "ch1");
        assert_eq!(record.view_count_display, "1.5 jt");
    }

    #[test]
    fn test_thumbnail_fallback_order() {
        let item: RawItem = serde_json::from_value(serde_json::json!({
            "id": "v",
            "snippet": {
                "title": "T",
                "channelTitle": "C",
                "thumbnails": {
                    "default": {"url": "d"},
                    "medium": {"url": "m"},
                    "high": {"url": "h"},
                },
            }
        }))
        .unwrap();
        assert_eq!(normalize(&item, Utc::now()).unwrap().thumbnail_url, "h");

        let item: RawItem = serde_json::from_value(serde_json::json!({
            "id": "v",
            "snippet": {
                "title": "T",
                "channelTitle": "C",
                "thumbnails": {"default": {"url": "d"}},
            }
        }))
        .unwrap();
        assert_eq!(normalize(&item, Utc::now()).unwrap().thumbnail_url, "d");
    }

    #[test]
    fn test_missing_thumbnail_errors_strict_but_lossy_substitutes() {
        let item: RawItem = serde_json::from_value(serde_json::json!({
            "id": "v1",
            "snippet": {"title": "T", "channelTitle": "C"}
        }))
        .unwrap();

        let err = normalize(&item, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::MissingThumbnail(id) if id == "v1"));

        let record = normalize_lossy(&item, Utc::now()).unwrap();
        assert_eq!(record.thumbnail_url, "https://picsum.photos/seed/v1/480/270");
    }

    #[test]
    fn test_lossy_drops_items_without_video_id() {
        let item: RawItem = serde_json::from_value(serde_json::json!({
            "id": {"kind": "youtube#channel"},
            "snippet": {"title": "T", "channelTitle": "C"}
        }))
        .unwrap();
        assert!(normalize_lossy(&item, Utc::now()).is_none());
    }

    #[test]
    fn test_format_view_count_buckets() {
        assert_eq!(format_view_count(500), "500");
        assert_eq!(format_view_count(999), "999");
        assert_eq!(format_view_count(1_000), "1 rb");
        assert_eq!(format_view_count(1_500), "1.5 rb");
        assert_eq!(format_view_count(999_999), "999.9 rb");
        assert_eq!(format_view_count(1_500_000), "1.5 jt");
        assert_eq!(format_view_count(2_000_000), "2 jt");
        assert_eq!(format_view_count(12_300_000), "12.3 jt");
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        let ago = |secs: i64| format_relative_time(now - Duration::seconds(secs), now);

        assert_eq!(ago(0), "baru saja");
        assert_eq!(ago(59), "baru saja");
        // Ties go to the larger unit once the threshold is crossed.
        assert_eq!(ago(60), "1 menit yang lalu");
        assert_eq!(ago(59 * 60), "59 menit yang lalu");
        assert_eq!(ago(3600), "1 jam yang lalu");
        assert_eq!(ago(23 * 3600), "23 jam yang lalu");
        assert_eq!(ago(24 * 3600), "1 hari yang lalu");
        assert_eq!(ago(29 * 86_400), "29 hari yang lalu");
        assert_eq!(ago(30 * 86_400), "1 bulan yang lalu");
        assert_eq!(ago(364 * 86_400), "12 bulan yang lalu");
        assert_eq!(ago(365 * 86_400), "1 tahun yang lalu");
        assert_eq!(ago(800 * 86_400), "2 tahun yang lalu");
    }

    #[test]
    fn test_relative_time_future_timestamp_clamps() {
        let now = Utc::now();
        assert_eq!(
            format_relative_time(now + Duration::seconds(120), now),
            "baru saja"
        );
    }

    #[test]
    fn test_meta_line_and_channel_initial() {
        let now = Utc::now();
        let item = search_item("abc", 3600, now);
        let record = normalize(&item, now).unwrap();
        assert!(meta_line(&record).ends_with(" x ditonton • 1 jam yang lalu"));
        assert_eq!(channel_initial("indo Tech"), "I");
        assert_eq!(channel_initial(""), "");
    }
}
