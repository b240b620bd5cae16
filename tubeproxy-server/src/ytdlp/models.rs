//! The subset of the tool's JSON dumps this crate reads.

use serde::{Deserialize, Deserializer, Serialize};

use crate::search::models::VideoSummary;
use crate::youtube::details::{offered_formats, VideoDetails};
use crate::youtube::format::{format_duration, format_view_count};
use crate::youtube::urls::default_thumbnail;

// The tool writes `null` for anything it could not extract, and
// `#[serde(default)]` only covers keys that are absent.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A list that may itself be `null` or hold `null` items.
fn present_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items.into_iter().flatten().flatten().collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchDump {
    #[serde(deserialize_with = "present_items")]
    pub entries: Vec<SearchEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(deserialize_with = "present_items")]
    pub thumbnails: Vec<ThumbnailEntry>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThumbnailEntry {
    pub url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl SearchEntry {
    /// Entries without an id cannot be downloaded and are dropped.
    pub fn into_summary(self) -> Option<VideoSummary> {
        let id = non_empty(self.id)?;
        let mut video = VideoSummary::with_defaults(&id);
        if let Some(title) = non_empty(self.title) {
            video.title = title;
        }
        let listed_thumbnail = self.thumbnails.into_iter().rev().find_map(|t| non_empty(t.url));
        if let Some(thumbnail) = non_empty(self.thumbnail).or(listed_thumbnail) {
            video.thumbnail = thumbnail;
        }
        if let Some(duration) = self.duration {
            video.duration = format_duration(duration);
        }
        if let Some(uploader) = non_empty(self.uploader).or(non_empty(self.channel)) {
            video.uploader = uploader;
        }
        video.view_count = self.view_count.unwrap_or(0);
        video.upload_date = self.upload_date.unwrap_or_default();
        if let Some(webpage_url) = non_empty(self.webpage_url) {
            video.webpage_url = webpage_url;
        }
        // Flat entries carry the watch URL in `url`; anything else keeps the default.
        if let Some(url) = non_empty(self.url).filter(|u| u.starts_with("http")) {
            video.url = url;
        }
        Some(video)
    }
}

pub fn summaries_from_dump(dump: SearchDump, max_results: usize) -> Vec<VideoSummary> {
    dump.entries
        .into_iter()
        .filter_map(SearchEntry::into_summary)
        .take(max_results)
        .collect()
}

/// Single video metadata dump.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VideoDump {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub view_count: Option<u64>,
    #[serde(deserialize_with = "present_items")]
    pub formats: Vec<FormatEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FormatEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub format_id: String,
    pub ext: Option<String>,
    pub resolution: Option<String>,
    pub height: Option<u32>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
    pub format_note: Option<String>,
}

/// A downloadable format as reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    pub has_audio: bool,
    pub has_video: bool,
    pub note: String,
}

fn codec_present(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if !c.is_empty() && c != "none")
}

impl FormatEntry {
    pub fn into_info(self) -> FormatInfo {
        let has_audio = codec_present(&self.acodec);
        let has_video = codec_present(&self.vcodec);
        let resolution = self
            .resolution
            .or_else(|| self.height.map(|h| format!("{}p", h)))
            .unwrap_or_else(|| "unknown".to_string());
        FormatInfo {
            format_id: self.format_id,
            ext: self.ext.unwrap_or_default(),
            resolution,
            has_audio,
            has_video,
            note: self.format_note.unwrap_or_default(),
        }
    }
}

impl VideoDump {
    pub fn into_details(self) -> VideoDetails {
        VideoDetails {
            title: self.title.unwrap_or_else(|| "Unknown Title".to_string()),
            thumbnail: self
                .thumbnail
                .unwrap_or_else(|| default_thumbnail(&self.id)),
            duration: format_duration(self.duration.unwrap_or(0.0)),
            author: self
                .uploader
                .or(self.channel)
                .unwrap_or_else(|| "Unknown".to_string()),
            view_count: format_view_count(self.view_count.unwrap_or(0)),
            formats: offered_formats(&self.id),
            id: self.id,
        }
    }

    /// Combined audio+video formats plus audio-only ones, in the tool's order.
    pub fn into_format_infos(self) -> Vec<FormatInfo> {
        self.formats
            .into_iter()
            .map(FormatEntry::into_info)
            .filter(|f| f.has_audio)
            .collect()
    }
}
