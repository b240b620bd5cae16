use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_VIDEO_QUALITY: &str = "720p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Accepts both the kind names and the container names the browser UI
    /// sends (`mp4`, `mp3`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" | "mp4" => Some(MediaKind::Video),
            "audio" | "mp3" => Some(MediaKind::Audio),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Video => "video/mp4",
            MediaKind::Audio => "audio/mpeg",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => f.write_str("video"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

/// What the tool is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    /// MP4 capped at `max_height` lines; `None` picks the best MP4.
    Video { max_height: Option<u32> },
    /// Best audio converted to MP3.
    Audio,
}

impl MediaFormat {
    pub fn new(kind: MediaKind, quality: Option<&str>) -> Self {
        match kind {
            MediaKind::Audio => MediaFormat::Audio,
            MediaKind::Video => MediaFormat::Video {
                max_height: parse_height(quality.unwrap_or(DEFAULT_VIDEO_QUALITY)),
            },
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaFormat::Video { .. } => MediaKind::Video,
            MediaFormat::Audio => MediaKind::Audio,
        }
    }
}

/// `"480p"` and `"480"` both mean 480 lines; anything else is unknown.
pub fn parse_height(quality: &str) -> Option<u32> {
    let quality = quality.trim();
    let digits = quality
        .strip_suffix('p')
        .or_else(|| quality.strip_suffix('P'))
        .unwrap_or(quality);
    digits.parse::<u32>().ok().filter(|h| *h > 0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub video_id: String,
    pub format: MediaFormat,
}
