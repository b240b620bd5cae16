//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per endpoint. Each call sends a fixed
//! `X-Forwarded-For` so rate limiting sees a single client unless a test
//! asks for another one.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Address reported through `X-Forwarded-For`
    pub client_ip: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self::with_ip(base_url, "203.0.113.7")
    }

    pub fn with_ip(base_url: String, client_ip: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            client_ip: client_ip.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Service
    // ========================================================================

    pub async fn home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    pub async fn ytdlp_status(&self) -> Response {
        self.client
            .get(self.url("/status/ytdlp"))
            .send()
            .await
            .expect("Status request failed")
    }

    pub async fn api_status(&self) -> Response {
        self.client
            .get(self.url("/status/api"))
            .send()
            .await
            .expect("Status request failed")
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub async fn search(&self, query: &str) -> Response {
        self.search_raw(json!({ "query": query })).await
    }

    pub async fn search_raw(&self, body: Value) -> Response {
        self.client
            .post(self.url("/search"))
            .header("x-forwarded-for", &self.client_ip)
            .json(&body)
            .send()
            .await
            .expect("Search request failed")
    }

    pub async fn suggestions(&self, query: &str) -> Response {
        self.client
            .get(self.url("/suggestions"))
            .query(&[("q", query)])
            .send()
            .await
            .expect("Suggestions request failed")
    }

    // ========================================================================
    // Video information
    // ========================================================================

    pub async fn video_info(&self, url: &str) -> Response {
        self.client
            .post(self.url("/video-info"))
            .json(&json!({ "url": url }))
            .send()
            .await
            .expect("Video info request failed")
    }

    pub async fn formats(&self, video_id: &str) -> Response {
        self.client
            .get(self.url(&format!("/formats/{}", video_id)))
            .send()
            .await
            .expect("Formats request failed")
    }

    // ========================================================================
    // Download
    // ========================================================================

    pub async fn download(&self, body: Value) -> Response {
        self.client
            .post(self.url("/download"))
            .json(&body)
            .send()
            .await
            .expect("Download request failed")
    }
}
