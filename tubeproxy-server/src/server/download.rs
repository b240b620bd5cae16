//! Streaming download and format listing routes

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::api_error::ApiError;
use super::state::{GuardedDownloadStreamer, ServerState};
use crate::download::{sanitize_filename, DownloadRequest, MediaFormat, MediaKind};
use crate::youtube::{extract_video_id, is_valid_video_id};

const ACCEPT_RANGES_BYTES: &str = "bytes";
const CACHE_CONTROL_NO_CACHE: &str = "no-cache";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DownloadBody {
    video_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    quality: Option<String>,
    url: Option<String>,
}

/// A validated download order.
#[derive(Debug, PartialEq, Eq)]
struct DownloadOrder {
    request: DownloadRequest,
    title: String,
}

impl DownloadBody {
    fn into_order(self) -> Result<DownloadOrder, ApiError> {
        let video_id = self
            .video_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.url.as_deref().and_then(extract_video_id));
        let (video_id, kind) = match (video_id, self.kind) {
            (Some(id), Some(kind)) => (id.trim().to_string(), kind),
            _ => return Err(ApiError::bad_request("Video ID and type are required")),
        };
        if !is_valid_video_id(&video_id) {
            return Err(ApiError::bad_request("Invalid video ID"));
        }
        let kind = MediaKind::parse(&kind)
            .ok_or_else(|| ApiError::bad_request(format!("Unsupported type: {}", kind)))?;
        let format = MediaFormat::new(kind, self.quality.as_deref());
        let title = self
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| video_id.clone());
        Ok(DownloadOrder {
            request: DownloadRequest { video_id, format },
            title,
        })
    }
}

/// `attachment` with an ASCII fallback name plus the UTF-8 original.
fn content_disposition(title: &str, kind: MediaKind) -> String {
    let file_name = format!("{}.{}", sanitize_filename(title), kind.extension());
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(&file_name)
    )
}

async fn download(
    State(streamer): State<GuardedDownloadStreamer>,
    payload: Result<Json<DownloadBody>, JsonRejection>,
) -> Response {
    let order = match payload {
        Ok(Json(body)) => body.into_order(),
        Err(rejection) => {
            debug!("Rejected download body: {}", rejection);
            Err(ApiError::bad_request("Video ID and type are required"))
        }
    };
    let DownloadOrder { request, title } = match order {
        Ok(order) => order,
        Err(err) => return err.into_response(),
    };
    let kind = request.format.kind();
    info!(
        "Starting {} download of {} ({:?})",
        kind, request.video_id, request.format
    );

    let stream = match streamer.start(&request).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!("Download of {} failed: {}", request.video_id, err);
            return ApiError::internal(err.summary(), err.to_string(), err.suggestion())
                .into_response();
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, kind.content_type())
        .header(header::CONTENT_DISPOSITION, content_disposition(&title, kind))
        .header(header::ACCEPT_RANGES, ACCEPT_RANGES_BYTES)
        .header(header::CACHE_CONTROL, CACHE_CONTROL_NO_CACHE)
        .body(Body::from_stream(stream))
        .unwrap_or_else(|err| {
            warn!("Failed to build download response: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

async fn formats(
    State(state): State<ServerState>,
    Path(video_id): Path<String>,
) -> Response {
    if !is_valid_video_id(&video_id) {
        return ApiError::bad_request("Invalid video ID").into_response();
    }
    let tool = state.streamer.tool();
    match tool.video_metadata(&video_id, state.config.tool_timeout).await {
        Ok(dump) => Json(dump.into_format_infos()).into_response(),
        Err(err) => {
            warn!("Format listing for {} failed: {}", video_id, err);
            ApiError::internal(
                "Failed to get formats",
                err.to_string(),
                "Make sure yt-dlp is installed and the video is available",
            )
            .into_response()
        }
    }
}

pub fn make_download_routes(state: ServerState) -> Router {
    Router::new()
        .route("/download", post(download))
        .route("/formats/{video_id}", get(formats))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(value: serde_json::Value) -> Result<DownloadOrder, ApiError> {
        serde_json::from_value::<DownloadBody>(value)
            .unwrap()
            .into_order()
    }

    #[test]
    fn video_order_with_quality() {
        let order = order(json!({
            "videoId": "abc123def45",
            "title": "Cats",
            "type": "mp4",
            "quality": "480p"
        }))
        .unwrap();
        assert_eq!(order.title, "Cats");
        assert_eq!(order.request.video_id, "abc123def45");
        assert_eq!(
            order.request.format,
            MediaFormat::Video {
                max_height: Some(480)
            }
        );
    }

    #[test]
    fn video_id_can_come_from_url() {
        let order = order(json!({
            "url": "https://www.youtube.com/watch?v=abc123def45",
            "type": "audio"
        }))
        .unwrap();
        assert_eq!(order.request.video_id, "abc123def45");
        assert_eq!(order.request.format, MediaFormat::Audio);
        assert_eq!(order.title, "abc123def45");
    }

    #[test]
    fn missing_fields_are_bad_requests() {
        for value in [
            json!({"type": "video"}),
            json!({"videoId": "abc123def45"}),
            json!({"videoId": "abc123def45", "type": "flac"}),
            json!({"videoId": "../etc/passwd", "type": "video"}),
        ] {
            let err = order(value).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn disposition_keeps_unicode_in_extended_name() {
        let value = content_disposition("Café: Live", MediaKind::Audio);
        assert_eq!(
            value,
            "attachment; filename=\"Caf__ Live.mp3\"; filename*=UTF-8''Caf%C3%A9_%20Live.mp3"
        );
    }
}
