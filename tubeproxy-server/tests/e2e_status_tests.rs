//! End-to-end tests for service status and video metadata endpoints

#![cfg(unix)]

mod common;

use common::{FakeTool, TestClient, TestServer, VIDEO_ID, VIDEO_TITLE};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_home_reports_uptime_and_version() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.home().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["uptime"].is_string());
    assert!(body["version"]
        .as_str()
        .unwrap()
        .starts_with(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn test_ytdlp_status_reports_version() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.ytdlp_status().await.json().await.unwrap();
    assert_eq!(body["installed"], true);
    assert_eq!(body["version"], "2024.08.06");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_ytdlp_status_when_tool_is_broken() {
    let server = TestServer::spawn(FakeTool::failing()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.ytdlp_status().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["installed"], false);
    assert!(body["version"].is_null());
}

#[tokio::test]
async fn test_api_status_without_key() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.api_status().await.json().await.unwrap();
    assert_eq!(body["hasApiKey"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_video_info_from_tool_metadata() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .video_info(&format!("https://www.youtube.com/watch?v={}&t=42", VIDEO_ID))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], VIDEO_ID);
    assert_eq!(body["title"], VIDEO_TITLE);
    assert_eq!(body["duration"], "2:05");
    assert_eq!(body["author"], "Cat Channel");
    assert_eq!(body["formats"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_video_info_placeholder_when_tool_fails() {
    let server = TestServer::spawn(FakeTool::failing()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .video_info(&format!("https://youtu.be/{}", VIDEO_ID))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["title"], format!("YouTube Video {}", VIDEO_ID));
    assert_eq!(body["viewCount"], "0");
}

#[tokio::test]
async fn test_video_info_rejects_bad_urls() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.video_info("").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "URL is required");

    let response = client.video_info("https://example.com/video").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid YouTube URL");
}

#[tokio::test]
async fn test_formats_lists_only_formats_with_audio() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.formats(VIDEO_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let formats: Vec<Value> = response.json().await.unwrap();
    assert_eq!(formats.len(), 2);
    assert_eq!(formats[0]["format_id"], "140");
    assert_eq!(formats[1]["resolution"], "640x360");
    assert!(formats.iter().all(|f| f["has_audio"] == true));
}

#[tokio::test]
async fn test_formats_failure_returns_500() {
    let server = TestServer::spawn(FakeTool::failing()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.formats(VIDEO_ID).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to get formats");
}
