//! Deterministic mock catalog used when the remote data source is
//! unavailable.
//!
//! Titles, channels and comment seeds are carried over from the original
//! Playtube catalog so a provider outage degrades to a familiar, populated
//! page instead of an empty state. Everything here is deterministic: the
//! same offset and count always produce the same records.

use chrono::Utc;

use crate::model::{
    RawComment, RawItem, RawSnippet, RawThumbnail, RawThumbnails, ResourceShapeItem, VideoRecord,
};
use crate::normalize;

/// Mock video titles, cycled by index.
pub const MOCK_TITLES: [&str; 10] = [
    "Cara Cepat Belajar Coding untuk Pemula",
    "Misteri Raccoon City! | Resident Evil Trailer 4",
    "AKU JUALAN MIE AYAM DI SIDOARJO TAPI ADA YANG...",
    "Lagu Malaysia Menyentuh Terbaik | Lagu Slow Rock",
    "RAHASIA ANEH DI GAMEPLAY TRAILER KINI TERUNGKAP",
    "Yuta Mio Panik! CCTV Merekam Keranjang...",
    "Jacson Zeran - Meski Harus Deng Dia (feat. Glenn)",
    "Tips Menabung untuk Pelajar agar Cepat Kaya",
    "Review iPhone 16 Pro Max - Apakah Worth It?",
    "Traveling Keliling Dunia dengan Budget Minim",
];

/// Mock channel names, cycled by index.
pub const MOCK_CHANNELS: [&str; 7] = [
    "Indo Tech",
    "Gamer Pro",
    "Misteri Channel",
    "Music ID",
    "Reviewer",
    "Daily Vlog",
    "News Update",
];

/// Build `count` mock raw items starting at `offset`, in the provider's
/// resource shape. Used by the proxy server as its fallback payload.
#[must_use]
pub fn mock_raw_items(offset: usize, count: usize) -> Vec<RawItem> {
    (offset..offset + count)
        .map(|index| {
            let title = MOCK_TITLES[index % MOCK_TITLES.len()];
            let channel = MOCK_CHANNELS[index % MOCK_CHANNELS.len()];
            RawItem::Resource(ResourceShapeItem {
                id: format!("mock{index}"),
                snippet: RawSnippet {
                    title: title.to_string(),
                    channel_title: channel.to_string(),
                    channel_id: Some(format!("mock-channel-{}", index % MOCK_CHANNELS.len())),
                    description: Some(format!(
                        "Video baru tentang {title} dari channel {channel}. \
                         Jangan lupa like, comment, dan subscribe untuk video seru lainnya!"
                    )),
                    thumbnails: Some(RawThumbnails {
                        high: Some(RawThumbnail {
                            url: format!("https://picsum.photos/seed/ptv{index}/480/270"),
                        }),
                        medium: None,
                        default: None,
                    }),
                    published_at: None,
                    verified: false,
                },
                statistics: None,
            })
        })
        .collect()
}

/// Build `count` normalized mock records starting at `offset`.
///
/// Used by the view-state controller when a fetch fails, so the view never
/// shows an empty state due to a transient provider failure.
#[must_use]
pub fn mock_videos(offset: usize, count: usize) -> Vec<VideoRecord> {
    let now = Utc::now();
    mock_raw_items(offset, count)
        .iter()
        .filter_map(|item| normalize::normalize_lossy(item, now))
        .collect()
}

/// Deterministic mock comments shown when the comments endpoint has no
/// upstream data for a video.
#[must_use]
pub fn mock_comments() -> Vec<RawComment> {
    vec![
        RawComment {
            author: "Andi Pratama".to_string(),
            text: "Keren banget bang tutorialnya!".to_string(),
            time: "1 jam yang lalu".to_string(),
        },
        RawComment {
            author: "Siti Aminah".to_string(),
            text: "Sangat membantu buat tugas kuliah saya.".to_string(),
            time: "3 jam yang lalu".to_string(),
        },
        RawComment {
            author: "Budi Santoso".to_string(),
            text: "Ditunggu part 2-nya ya bang.".to_string(),
            time: "5 jam yang lalu".to_string(),
        },
    ]
}
