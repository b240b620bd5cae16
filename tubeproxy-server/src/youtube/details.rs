use serde::{Deserialize, Serialize};

use super::urls::{default_thumbnail, watch_url};

/// One entry of the download menu offered by the preview endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferedFormat {
    pub quality: String,
    pub format: String,
    pub url: String,
}

/// Preview metadata for a single video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: String,
    pub author: String,
    pub view_count: String,
    pub formats: Vec<OfferedFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistDetails {
    pub id: String,
    pub title: String,
    pub videos: Vec<VideoDetails>,
}

const OFFERED_VIDEO_QUALITIES: [&str; 4] = ["1080p", "720p", "480p", "360p"];

pub fn offered_formats(video_id: &str) -> Vec<OfferedFormat> {
    let url = watch_url(video_id);
    let mut formats: Vec<OfferedFormat> = OFFERED_VIDEO_QUALITIES
        .iter()
        .map(|quality| OfferedFormat {
            quality: quality.to_string(),
            format: "mp4".to_string(),
            url: url.clone(),
        })
        .collect();
    formats.push(OfferedFormat {
        quality: "audio".to_string(),
        format: "mp3".to_string(),
        url,
    });
    formats
}

impl VideoDetails {
    /// Entry returned when neither the tool nor the Data API could describe
    /// the video.
    pub fn placeholder(video_id: &str) -> Self {
        Self {
            id: video_id.to_string(),
            title: format!("YouTube Video {}", video_id),
            thumbnail: default_thumbnail(video_id),
            duration: "0:00".to_string(),
            author: "Unknown".to_string(),
            view_count: "0".to_string(),
            formats: offered_formats(video_id),
        }
    }
}
