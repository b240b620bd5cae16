//! Optional YouTube Data API v3 client, enabled by an API key.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::details::{offered_formats, PlaylistDetails, VideoDetails};
use super::format::{format_duration, format_view_count, parse_iso8601_duration};

pub const DEFAULT_DATA_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const MAX_PLAYLIST_ITEMS: u32 = 50;

#[derive(Debug, Error)]
pub enum DataApiError {
    #[error("YouTube Data API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("YouTube Data API error: {0}")]
    Status(reqwest::StatusCode),
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListResponse<T> {
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoResource {
    id: String,
    snippet: VideoSnippet,
    content_details: ContentDetails,
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoSnippet {
    title: String,
    channel_title: String,
    thumbnails: ThumbnailSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThumbnailSet {
    high: Option<ThumbnailRef>,
    medium: Option<ThumbnailRef>,
    default: Option<ThumbnailRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThumbnailRef {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    view_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlaylistResource {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlaylistSnippet {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlaylistItemResource {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlaylistItemSnippet {
    resource_id: ResourceId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResourceId {
    video_id: Option<String>,
}

impl VideoResource {
    fn into_details(self, prefer_large_thumbnail: bool) -> VideoDetails {
        let thumbnails = &self.snippet.thumbnails;
        let preferred = if prefer_large_thumbnail {
            thumbnails.high.as_ref()
        } else {
            thumbnails.medium.as_ref()
        };
        let thumbnail = preferred
            .or(thumbnails.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default();
        let seconds = parse_iso8601_duration(&self.content_details.duration).unwrap_or(0);
        let views = self
            .statistics
            .view_count
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        VideoDetails {
            formats: offered_formats(&self.id),
            title: self.snippet.title,
            thumbnail,
            duration: format_duration(seconds as f64),
            author: self.snippet.channel_title,
            view_count: format_view_count(views),
            id: self.id,
        }
    }
}

pub struct DataApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DataApiClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn list<T>(&self, resource: &str, query: &[(&str, &str)]) -> Result<Vec<T>, DataApiError>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        let url = format!("{}/{}", self.base_url, resource);
        debug!("Data API request: {} {:?}", resource, query);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DataApiError::Status(response.status()));
        }
        let body: ListResponse<T> = response.json().await?;
        Ok(body.items)
    }

    /// `Ok(None)` when the API knows no such video.
    pub async fn video(&self, video_id: &str) -> Result<Option<VideoDetails>, DataApiError> {
        let items: Vec<VideoResource> = self
            .list(
                "videos",
                &[("part", "snippet,contentDetails,statistics"), ("id", video_id)],
            )
            .await?;
        Ok(items.into_iter().next().map(|video| video.into_details(true)))
    }

    pub async fn playlist(&self, playlist_id: &str) -> Result<PlaylistDetails, DataApiError> {
        let playlists: Vec<PlaylistResource> = self
            .list("playlists", &[("part", "snippet"), ("id", playlist_id)])
            .await?;
        let playlist = playlists
            .into_iter()
            .next()
            .ok_or_else(|| DataApiError::PlaylistNotFound(playlist_id.to_string()))?;

        let max_items = MAX_PLAYLIST_ITEMS.to_string();
        let items: Vec<PlaylistItemResource> = self
            .list(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("maxResults", max_items.as_str()),
                    ("playlistId", playlist_id),
                ],
            )
            .await?;
        let ids: Vec<String> = items
            .into_iter()
            .filter_map(|item| item.snippet.resource_id.video_id)
            .collect();

        let videos = if ids.is_empty() {
            Vec::new()
        } else {
            let joined = ids.join(",");
            let resources: Vec<VideoResource> = self
                .list(
                    "videos",
                    &[("part", "snippet,contentDetails,statistics"), ("id", joined.as_str())],
                )
                .await?;
            resources
                .into_iter()
                .map(|video| video.into_details(false))
                .collect()
        };

        Ok(PlaylistDetails {
            id: playlist_id.to_string(),
            title: playlist.snippet.title,
            videos,
        })
    }
}
