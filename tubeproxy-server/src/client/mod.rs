//! Library side of `tubeproxy-fetch`: talks to a running server and feeds
//! the streamed response through the progress tracker.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::download::sanitize_filename;
use crate::progress::{
    record_failure, track_download, ControlReceiver, DownloadItem, TrackedOutcome,
};
use crate::search::SearchOutcome;
use crate::youtube::VideoDetails;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body every failing endpoint returns.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl ErrorBody {
    fn describe(&self) -> String {
        let mut message = self.error.clone();
        if let Some(details) = &self.details {
            message.push_str(": ");
            message.push_str(details);
        }
        if let Some(suggestion) = &self.suggestion {
            message.push_str(" (");
            message.push_str(suggestion);
            message.push(')');
        }
        message
    }
}

pub struct DownloadClient {
    client: reqwest::Client,
    base_url: String,
}

impl DownloadClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // No overall timeout: a download may legitimately stream for minutes.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn search(&self, query: &str, max_results: Option<u64>) -> Result<SearchOutcome> {
        let mut body = json!({ "query": query });
        if let Some(max_results) = max_results {
            body["maxResults"] = json!(max_results);
        }
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .context("Failed to reach the search endpoint")?;
        if !response.status().is_success() {
            let status = response.status();
            let error = response.json::<ErrorBody>().await.ok();
            anyhow::bail!(
                "Search failed with status {}: {}",
                status,
                error.map(|e| e.describe()).unwrap_or_default()
            );
        }
        response
            .json()
            .await
            .context("Failed to parse search response")
    }

    pub async fn video_info(&self, url: &str) -> Result<VideoDetails> {
        let response = self
            .client
            .post(format!("{}/video-info", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "url": url }))
            .send()
            .await
            .context("Failed to reach the video-info endpoint")?;
        if !response.status().is_success() {
            anyhow::bail!("Video info failed with status {}", response.status());
        }
        response
            .json()
            .await
            .context("Failed to parse video info response")
    }

    /// Requests the download described by `item` and reads it to the end.
    ///
    /// Transport and server errors end up as a failed item, never as `Err`.
    pub async fn download<F>(
        &self,
        item: &mut DownloadItem,
        control: ControlReceiver,
        on_update: F,
    ) -> TrackedOutcome
    where
        F: FnMut(&DownloadItem),
    {
        let body = json!({
            "videoId": item.video_id,
            "title": item.title,
            "type": item.kind,
            "quality": item.quality,
        });
        debug!("Requesting download of {} ({})", item.video_id, item.kind);

        let response = match self
            .client
            .post(format!("{}/download", self.base_url))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return fail(item, format!("Request failed: {}", err), on_update),
        };

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ErrorBody>().await {
                Ok(error) => error.describe(),
                Err(_) => format!("Server responded with {}", status),
            };
            return fail(item, message, on_update);
        }

        let total = response.content_length();
        track_download(item, response.bytes_stream(), total, control, on_update).await
    }
}

fn fail<F>(item: &mut DownloadItem, message: String, mut on_update: F) -> TrackedOutcome
where
    F: FnMut(&DownloadItem),
{
    record_failure(item, &message);
    on_update(item);
    TrackedOutcome::Failed(message)
}

/// File name the server's `Content-Disposition` would suggest for `item`.
pub fn file_name_for(item: &DownloadItem) -> String {
    format!("{}.{}", sanitize_filename(&item.title), item.kind.extension())
}

/// Writes a completed payload into `dir`.
pub async fn save_payload(dir: &Path, item: &DownloadItem, payload: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name_for(item));
    tokio::fs::write(&path, payload)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} bytes to {}", payload.len(), path.display());
    Ok(path)
}
