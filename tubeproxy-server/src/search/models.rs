use serde::{Deserialize, Serialize};
use std::fmt;

use crate::youtube::urls::{default_thumbnail, watch_url};

pub const DEFAULT_MAX_RESULTS: usize = 20;
pub const MAX_RESULTS_LIMIT: usize = 50;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_UPLOADER: &str = "Unknown";
pub const UNKNOWN_DURATION: &str = "0:00";

/// A validated search request. The cache key only depends on the normalized
/// text and the result count; the original text is what goes upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    normalized: String,
    max_results: usize,
}

impl SearchQuery {
    /// Returns `None` when the query is blank.
    pub fn new(raw: &str, max_results: Option<u64>) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let max_results = max_results
            .map(|n| n.clamp(1, MAX_RESULTS_LIMIT as u64) as usize)
            .unwrap_or(DEFAULT_MAX_RESULTS);
        Some(Self {
            text: text.to_string(),
            normalized: text.to_lowercase(),
            max_results,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.normalized, self.max_results)
    }
}

/// Where a list of results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultSource {
    Tool,
    InternalApi,
    Scrape,
    Trending,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Tool => "yt-dlp",
            ResultSource::InternalApi => "internal_api",
            ResultSource::Scrape => "scrape",
            ResultSource::Trending => "trending_fallback",
        }
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized search hit. Every strategy produces this exact shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: String,
    pub uploader: String,
    pub view_count: u64,
    pub upload_date: String,
    pub url: String,
    pub webpage_url: String,
}

impl VideoSummary {
    /// A summary for `id` with every other field at its documented default.
    pub fn with_defaults(id: &str) -> Self {
        let url = watch_url(id);
        Self {
            id: id.to_string(),
            title: UNKNOWN_TITLE.to_string(),
            thumbnail: default_thumbnail(id),
            duration: UNKNOWN_DURATION.to_string(),
            uploader: UNKNOWN_UPLOADER.to_string(),
            view_count: 0,
            upload_date: String::new(),
            webpage_url: url.clone(),
            url,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// What the search endpoint returns on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub videos: Vec<VideoSummary>,
    pub source: String,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub rate_limited: bool,
}

impl SearchOutcome {
    pub fn fresh(videos: Vec<VideoSummary>, source: ResultSource) -> Self {
        Self {
            videos,
            source: source.as_str().to_string(),
            cached: false,
            rate_limited: false,
        }
    }

    pub fn cached(videos: Vec<VideoSummary>, source: ResultSource) -> Self {
        Self {
            videos,
            source: format!("cached_{}", source),
            cached: true,
            rate_limited: false,
        }
    }

    pub fn rate_limited_cache(videos: Vec<VideoSummary>, source: ResultSource) -> Self {
        Self {
            videos,
            source: format!("rate_limited_cache_{}", source),
            cached: true,
            rate_limited: true,
        }
    }
}
