//! Metadata and status routes

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::api_error::ApiError;
use super::state::{OptionalDataApiClient, ServerState};
use crate::youtube::{extract_playlist_id, extract_video_id, DataApiError, VideoDetails};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UrlBody {
    url: Option<String>,
}

fn url_from(payload: Result<Json<UrlBody>, JsonRejection>) -> Result<String, ApiError> {
    payload
        .ok()
        .and_then(|Json(body)| body.url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Serialize)]
struct ToolStatus {
    installed: bool,
    version: Option<String>,
    message: String,
    timestamp: String,
}

async fn ytdlp_status(State(state): State<ServerState>) -> impl IntoResponse {
    let tool = state.streamer.tool();
    let status = match tool.version(state.config.tool_timeout).await {
        Ok(version) => ToolStatus {
            installed: true,
            message: format!("yt-dlp {} is installed and ready", version),
            version: Some(version),
            timestamp: timestamp(),
        },
        Err(err) => {
            warn!("yt-dlp version check failed: {}", err);
            ToolStatus {
                installed: false,
                version: None,
                message: format!(
                    "yt-dlp is not available ({}). Install it with: pip install yt-dlp",
                    err
                ),
                timestamp: timestamp(),
            }
        }
    };
    Json(status)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyStatus {
    has_api_key: bool,
    message: &'static str,
    timestamp: String,
}

async fn api_status(State(data_api): State<OptionalDataApiClient>) -> impl IntoResponse {
    let has_api_key = data_api.is_some();
    Json(ApiKeyStatus {
        has_api_key,
        message: if has_api_key {
            "YouTube Data API key is configured"
        } else {
            "No YouTube Data API key configured; set YOUTUBE_API_KEY for playlist support"
        },
        timestamp: timestamp(),
    })
}

/// Tool metadata first, then the Data API, then a placeholder.
async fn video_info(
    State(state): State<ServerState>,
    payload: Result<Json<UrlBody>, JsonRejection>,
) -> Response {
    let url = match url_from(payload) {
        Ok(url) => url,
        Err(err) => return err.into_response(),
    };
    let video_id = match extract_video_id(&url) {
        Some(id) => id,
        None => return ApiError::bad_request("Invalid YouTube URL").into_response(),
    };

    let tool = state.streamer.tool();
    match tool.video_metadata(&video_id, state.config.tool_timeout).await {
        Ok(dump) => return Json(dump.into_details()).into_response(),
        Err(err) => debug!("Tool metadata for {} failed: {}", video_id, err),
    }

    if let Some(data_api) = &state.data_api {
        match data_api.video(&video_id).await {
            Ok(Some(details)) => return Json(details).into_response(),
            Ok(None) => return ApiError::not_found("Video not found").into_response(),
            Err(err) => warn!("Data API lookup for {} failed: {}", video_id, err),
        }
    }

    Json(VideoDetails::placeholder(&video_id)).into_response()
}

async fn playlist_info(
    State(data_api): State<OptionalDataApiClient>,
    payload: Result<Json<UrlBody>, JsonRejection>,
) -> Response {
    let url = match url_from(payload) {
        Ok(url) => url,
        Err(err) => return err.into_response(),
    };
    let data_api = match data_api {
        Some(client) => client,
        None => {
            return ApiError::bad_request("A YouTube API key is required for playlist info")
                .into_response()
        }
    };
    let playlist_id = match extract_playlist_id(&url) {
        Some(id) => id,
        None => return ApiError::bad_request("Invalid playlist URL").into_response(),
    };

    match data_api.playlist(&playlist_id).await {
        Ok(playlist) => Json(playlist).into_response(),
        Err(DataApiError::PlaylistNotFound(_)) => {
            ApiError::not_found("Playlist not found").into_response()
        }
        Err(err) => {
            warn!("Playlist lookup for {} failed: {}", playlist_id, err);
            ApiError::internal(
                "Failed to get playlist info",
                err.to_string(),
                "Check that the API key is valid and the playlist is public",
            )
            .into_response()
        }
    }
}

pub fn make_info_routes(state: ServerState) -> Router {
    Router::new()
        .route("/status/ytdlp", get(ytdlp_status))
        .route("/status/api", get(api_status))
        .route("/video-info", post(video_info))
        .route("/playlist-info", post(playlist_info))
        .with_state(state)
}
