//! Typed view of the search results document YouTube embeds in its results
//! page (`ytInitialData`) and returns from its internal search API.
//!
//! Every level is optional: YouTube changes this layout regularly and a
//! missing branch should yield fewer results rather than a parse error.

use serde::Deserialize;

use crate::search::models::VideoSummary;
use crate::youtube::format::parse_view_count;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchDocument {
    contents: DocumentContents,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DocumentContents {
    two_column_search_results_renderer: Option<TwoColumnResults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TwoColumnResults {
    primary_contents: PrimaryContents,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PrimaryContents {
    section_list_renderer: SectionList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SectionList {
    contents: Vec<SectionItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SectionItem {
    item_section_renderer: Option<ItemSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ItemSection {
    contents: Vec<ItemContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ItemContent {
    video_renderer: Option<VideoRenderer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoRenderer {
    video_id: Option<String>,
    title: Text,
    thumbnail: Thumbnails,
    length_text: Text,
    owner_text: Text,
    view_count_text: Text,
    published_time_text: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Text {
    runs: Vec<TextRun>,
    simple_text: Option<String>,
}

impl Text {
    fn as_str(&self) -> Option<&str> {
        self.runs
            .first()
            .map(|run| run.text.as_str())
            .or(self.simple_text.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextRun {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
    thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnail {
    url: String,
}

impl SearchDocument {
    /// Whether the document has the results branch at all.
    pub fn has_results_section(&self) -> bool {
        self.contents.two_column_search_results_renderer.is_some()
    }

    /// Collects up to `max_results` videos across all item sections, skipping
    /// shelves, channels, ads and anything without a video id.
    pub fn into_videos(self, max_results: usize) -> Vec<VideoSummary> {
        let Some(results) = self.contents.two_column_search_results_renderer else {
            return Vec::new();
        };
        results
            .primary_contents
            .section_list_renderer
            .contents
            .into_iter()
            .filter_map(|section| section.item_section_renderer)
            .flat_map(|section| section.contents)
            .filter_map(|item| item.video_renderer)
            .filter_map(VideoRenderer::into_summary)
            .take(max_results)
            .collect()
    }
}

impl VideoRenderer {
    fn into_summary(self) -> Option<VideoSummary> {
        let id = self.video_id.filter(|id| !id.is_empty())?;
        let mut video = VideoSummary::with_defaults(&id);
        if let Some(title) = self.title.as_str() {
            video.title = title.to_string();
        }
        if let Some(thumbnail) = self.thumbnail.thumbnails.first() {
            if !thumbnail.url.is_empty() {
                video.thumbnail = thumbnail.url.clone();
            }
        }
        if let Some(length) = self.length_text.as_str() {
            video.duration = length.to_string();
        }
        if let Some(owner) = self.owner_text.as_str() {
            video.uploader = owner.to_string();
        }
        video.view_count = self
            .view_count_text
            .as_str()
            .map(parse_view_count)
            .unwrap_or(0);
        if let Some(published) = self.published_time_text.as_str() {
            video.upload_date = published.to_string();
        }
        Some(video)
    }
}
