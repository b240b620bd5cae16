use anyhow::{Context, Result};
use std::{net::SocketAddr, time::Duration};

use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::info;

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::metrics::make_metrics_app;
use super::{
    download::make_download_routes, info::make_info_routes, log_requests,
    search::make_search_routes, state::ServerState,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: format!("{}+{}", env!("CARGO_PKG_VERSION"), state.build_id),
    };
    Json(stats)
}

pub fn make_app(state: ServerState) -> Router {
    let home_router: Router = match &state.config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .merge(make_search_routes(state.clone()))
        .merge(make_download_routes(state.clone()))
        .merge(make_info_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state, log_requests))
}

/// Serves the API and the metrics endpoint until `shutdown` is cancelled.
/// In-flight downloads are dropped with their connections, which kills the
/// tool processes behind them.
pub async fn run_server(state: ServerState, shutdown: CancellationToken) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(("0.0.0.0", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let api_shutdown = shutdown.clone();
    let api = async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(api_shutdown.cancelled_owned())
        .await
    };
    let metrics = async move {
        axum::serve(metrics_listener, make_metrics_app())
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
    };

    let (api_result, metrics_result) = tokio::join!(api, metrics);
    api_result.context("API server failed")?;
    metrics_result.context("Metrics server failed")?;
    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{DownloadStreamer, StreamerConfig};
    use crate::rate_limit::{RateLimitConfig, RateLimiter};
    use crate::search::{CacheConfig, ResultCache, SearchOrchestrator};
    use crate::server::ServerConfig;
    use crate::youtube::SuggestionClient;
    use crate::ytdlp::YtDlp;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn test_state(rate_limit: RateLimitConfig, frontend_dir_path: Option<String>) -> ServerState {
        let config = ServerConfig {
            frontend_dir_path,
            tool_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let search = SearchOrchestrator::new(
            Arc::new(RateLimiter::new(rate_limit)),
            Arc::new(ResultCache::new(CacheConfig::default())),
            Vec::new(),
        );
        let tool = YtDlp::new("/nonexistent/bin/yt-dlp");
        ServerState::new(
            config,
            search,
            DownloadStreamer::new(tool, StreamerConfig::default()),
            SuggestionClient::new(reqwest::Client::new(), UNREACHABLE),
            None,
        )
    }

    fn app() -> Router {
        make_app(test_state(RateLimitConfig::default(), None))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let response = app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["uptime"].as_str().unwrap().starts_with("0d"));
        assert!(body["version"]
            .as_str()
            .unwrap()
            .starts_with(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn serves_frontend_when_configured() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>tubeproxy</h1>").unwrap();
        let app = make_app(test_state(
            RateLimitConfig::default(),
            Some(dir.path().to_string_lossy().to_string()),
        ));

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<h1>tubeproxy</h1>");
    }

    #[tokio::test]
    async fn search_rejects_bad_input() {
        let app = app();
        for request in [
            post_json("/search", json!({})),
            post_json("/search", json!({"query": 7})),
            post_json("/search", json!({"query": "  "})),
            Request::builder()
                .method("POST")
                .uri("/search")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        ] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(json_body(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn search_falls_back_and_caches() {
        let app = app();
        let body = json!({"query": "lofi beats", "maxResults": 3});

        let response = app
            .clone()
            .oneshot(post_json("/search", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let first = json_body(response).await;
        assert_eq!(first["source"], "trending_fallback");
        assert_eq!(first["cached"], false);
        assert_eq!(first["videos"].as_array().unwrap().len(), 3);
        assert!(first.get("rateLimited").is_none());

        let second = json_body(app.oneshot(post_json("/search", body)).await.unwrap()).await;
        assert_eq!(second["source"], "cached_trending_fallback");
        assert_eq!(second["cached"], true);
        assert_eq!(second["videos"], first["videos"]);
    }

    #[tokio::test]
    async fn rate_limited_search() {
        let app = make_app(test_state(
            RateLimitConfig {
                max_requests: 1,
                window: Duration::from_secs(60),
            },
            None,
        ));

        let response = app
            .clone()
            .oneshot(post_json("/search", json!({"query": "cats"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cached = json_body(
            app.clone()
                .oneshot(post_json("/search", json!({"query": "cats"})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(cached["source"], "rate_limited_cache_trending_fallback");
        assert_eq!(cached["rateLimited"], true);

        let response = app
            .oneshot(post_json("/search", json!({"query": "dogs"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = json_body(response).await;
        assert_eq!(body["rateLimited"], true);
        assert_eq!(body["remainingRequests"], 0);
        let wait = body["waitTime"].as_u64().unwrap();
        assert!(wait > 0 && wait <= 60);
    }

    #[tokio::test]
    async fn download_validation_and_tool_errors() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json("/download", json!({"type": "video"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json(
                "/download",
                json!({"videoId": "abc123def45", "type": "video", "quality": "720p"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Download failed");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("/nonexistent/bin/yt-dlp"));
        assert!(body["suggestion"].as_str().unwrap().contains("yt-dlp"));
    }

    #[tokio::test]
    async fn formats_with_missing_tool() {
        let app = app();
        let response = app.clone().oneshot(get("/formats/bad!id")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get("/formats/abc123def45")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Failed to get formats");
    }

    #[tokio::test]
    async fn status_endpoints() {
        let app = app();
        let body = json_body(app.clone().oneshot(get("/status/ytdlp")).await.unwrap()).await;
        assert_eq!(body["installed"], false);
        assert!(body["version"].is_null());
        assert!(body["timestamp"].is_string());

        let body = json_body(app.oneshot(get("/status/api")).await.unwrap()).await;
        assert_eq!(body["hasApiKey"], false);
    }

    #[tokio::test]
    async fn metadata_without_api_key() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/video-info",
                json!({"url": "https://youtu.be/abc123def45"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], "abc123def45");
        assert_eq!(body["title"], "YouTube Video abc123def45");
        assert_eq!(body["formats"].as_array().unwrap().len(), 5);

        let response = app
            .clone()
            .oneshot(post_json("/video-info", json!({"url": "not a url"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json(
                "/playlist-info",
                json!({"url": "https://www.youtube.com/playlist?list=PL123"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn suggestions_fall_back_locally() {
        let app = app();
        let body = json_body(app.clone().oneshot(get("/suggestions?q=a")).await.unwrap()).await;
        assert_eq!(body["suggestions"], json!([]));

        let body = json_body(app.oneshot(get("/suggestions?q=music")).await.unwrap()).await;
        let suggestions = body["suggestions"].as_array().unwrap();
        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= 8);
    }

    #[tokio::test]
    async fn responses_carry_cors_headers() {
        let request = Request::builder()
            .uri("/status/api")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
