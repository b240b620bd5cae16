//! End-to-end tests for search and suggestions
//!
//! Tests the fallback chain, result caching and per-client rate limiting.

#![cfg(unix)]

mod common;

use common::{FakeTool, TestClient, TestServer, VIDEO_ID, VIDEO_TITLE};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_search_served_by_tool_then_cached() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.search("Cats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["source"], "yt-dlp");
    assert_eq!(body["cached"], false);
    assert!(body.get("rateLimited").is_none());

    let videos = body["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["id"], VIDEO_ID);
    assert_eq!(videos[0]["title"], VIDEO_TITLE);
    assert_eq!(videos[0]["duration"], "2:05");
    assert_eq!(
        videos[0]["url"],
        format!("https://www.youtube.com/watch?v={}", VIDEO_ID)
    );
    assert_eq!(videos[1]["duration"], "1:02:05");

    // Same query, different case and padding: answered from the cache
    let response = client.search("  cats ").await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["source"], "cached_yt-dlp");
    assert_eq!(body["cached"], true);
    assert_eq!(server.tool.search_calls(), 1);
}

#[tokio::test]
async fn test_result_count_is_part_of_the_cache_key() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    client.search_raw(json!({"query": "cats", "maxResults": 5})).await;
    let response = client
        .search_raw(json!({"query": "cats", "maxResults": 6}))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["source"], "yt-dlp");
    assert_eq!(server.tool.search_calls(), 2);

    let calls = server.tool.invocations();
    assert!(calls.iter().any(|line| line.contains("ytsearch5:cats")));
    assert!(calls.iter().any(|line| line.contains("ytsearch6:cats")));
}

#[tokio::test]
async fn test_every_backend_failing_serves_trending() {
    let server = TestServer::spawn(FakeTool::failing()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.search("anything").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["source"], "trending_fallback");
    assert!(!body["videos"].as_array().unwrap().is_empty());

    let response = client.search("anything").await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["source"], "cached_trending_fallback");
}

#[tokio::test]
async fn test_missing_query_returns_400() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    for body in [json!({}), json!({"query": ""}), json!({"query": 7})] {
        let response = client.search_raw(body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Search query is required");
    }
    assert_eq!(server.tool.search_calls(), 0);
}

#[tokio::test]
async fn test_rate_limit_serves_stale_cache_then_refuses() {
    let server = TestServer::spawn_with_rate_limit(FakeTool::healthy(), 1).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.search("cats").await;
    assert_eq!(response.status(), StatusCode::OK);

    // Over the limit, but this query is cached
    let response = client.search("cats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["source"], "rate_limited_cache_yt-dlp");
    assert_eq!(body["rateLimited"], true);

    // Over the limit with nothing cached
    let response = client.search("dogs").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["rateLimited"], true);
    assert_eq!(body["remainingRequests"], 0);
    let wait = body["waitTime"].as_u64().unwrap();
    assert!(wait > 0 && wait <= 60, "unexpected wait time {}", wait);
    assert_eq!(server.tool.search_calls(), 1);
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let server = TestServer::spawn_with_rate_limit(FakeTool::healthy(), 1).await;
    let first = TestClient::with_ip(server.base_url.clone(), "198.51.100.1");
    let second = TestClient::with_ip(server.base_url.clone(), "198.51.100.2");

    assert_eq!(first.search("cats").await.status(), StatusCode::OK);
    assert_eq!(
        first.search("dogs").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(second.search("dogs").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_suggestions_fall_back_when_upstream_is_down() {
    let server = TestServer::spawn(FakeTool::healthy()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.suggestions("lofi").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let suggestions = body["suggestions"].as_array().unwrap();
    assert!(!suggestions.is_empty());
    assert!(suggestions
        .iter()
        .all(|s| s.as_str().unwrap().starts_with("lofi")));
}
