//! Helpers and clients for YouTube's own web endpoints.

pub mod data_api;
pub mod details;
pub mod format;
pub mod renderer;
pub mod suggestions;
pub mod urls;

pub use data_api::{DataApiClient, DataApiError, DEFAULT_DATA_API_BASE_URL};
pub use details::{OfferedFormat, PlaylistDetails, VideoDetails};
pub use suggestions::{SuggestionClient, Suggestions, DEFAULT_SUGGESTIONS_BASE_URL};
pub use urls::{extract_playlist_id, extract_video_id, is_valid_video_id};

pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// Desktop browser identity used for requests against the web endpoints.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
