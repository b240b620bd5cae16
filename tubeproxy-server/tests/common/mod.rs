//! Common test infrastructure
//!
//! Everything end-to-end tests need: a server running on a random port
//! against a fake yt-dlp, and a thin HTTP client for its endpoints.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeTool, TestClient, TestServer};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_home() {
//!     let server = TestServer::spawn(FakeTool::healthy()).await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.home().await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

#![allow(dead_code)]

mod client;
mod constants;
mod fixtures;
mod server;

pub use client::TestClient;
pub use constants::*;
pub use fixtures::{
    expected_payload, process_alive, FakeTool, PAYLOAD_CHUNKS, SEARCH_DUMP, VIDEO_DUMP, VIDEO_ID,
    VIDEO_TITLE,
};
pub use server::TestServer;
