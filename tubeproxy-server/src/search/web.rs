//! Search strategies that talk to YouTube's web endpoints directly.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::backend::{BackendError, SearchBackend};
use super::models::{ResultSource, SearchQuery, VideoSummary};
use crate::youtube::renderer::SearchDocument;

const INTERNAL_API_CLIENT_NAME: &str = "WEB";
const INTERNAL_API_CLIENT_VERSION: &str = "2.20231201.01.00";
/// Restricts results to videos.
const VIDEO_ONLY_PARAMS: &str = "EgIQAQ%3D%3D";

lazy_static! {
    static ref INITIAL_DATA_RE: Regex =
        Regex::new(r"(?s)var ytInitialData\s*=\s*(\{.*?\});\s*</script>")
            .expect("invalid ytInitialData regex");
}

#[derive(Debug, Error)]
pub enum WebSearchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream answered {0}")]
    Status(reqwest::StatusCode),
    #[error("results page carries no ytInitialData")]
    MissingInitialData,
    #[error("could not parse search document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("search document has no results section")]
    NoResultsSection,
}

impl WebSearchError {
    pub fn kind(&self) -> &'static str {
        match self {
            WebSearchError::Http(_) => "http",
            WebSearchError::Status(_) => "status",
            WebSearchError::MissingInitialData => "missing_initial_data",
            WebSearchError::Parse(_) => "parse",
            WebSearchError::NoResultsSection => "no_results_section",
        }
    }
}

fn videos_from_document(
    document: SearchDocument,
    max_results: usize,
) -> Result<Vec<VideoSummary>, WebSearchError> {
    if !document.has_results_section() {
        return Err(WebSearchError::NoResultsSection);
    }
    Ok(document.into_videos(max_results))
}

/// Pulls the embedded `ytInitialData` object out of a results page.
pub fn extract_initial_data(html: &str) -> Option<&str> {
    INITIAL_DATA_RE
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// POSTs to the JSON search endpoint the YouTube web client uses.
pub struct InternalApiSearch {
    client: reqwest::Client,
    base_url: String,
}

impl InternalApiSearch {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<VideoSummary>, WebSearchError> {
        let url = format!("{}/youtubei/v1/search?prettyPrint=false", self.base_url);
        let body = json!({
            "context": {
                "client": {
                    "clientName": INTERNAL_API_CLIENT_NAME,
                    "clientVersion": INTERNAL_API_CLIENT_VERSION,
                    "hl": "en",
                    "gl": "US"
                }
            },
            "query": query.text(),
            "params": VIDEO_ONLY_PARAMS
        });
        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(WebSearchError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        let document: SearchDocument = serde_json::from_slice(&bytes)?;
        videos_from_document(document, query.max_results())
    }
}

#[async_trait]
impl SearchBackend for InternalApiSearch {
    fn source(&self) -> ResultSource {
        ResultSource::InternalApi
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoSummary>, BackendError> {
        Ok(self.fetch(query).await?)
    }
}

/// Fetches the HTML results page and reads the data blob embedded in it.
pub struct ResultsPageSearch {
    client: reqwest::Client,
    base_url: String,
}

impl ResultsPageSearch {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<VideoSummary>, WebSearchError> {
        let url = format!(
            "{}/results?search_query={}",
            self.base_url,
            urlencoding::encode(query.text())
        );
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WebSearchError::Status(response.status()));
        }
        let html = response.text().await?;
        let raw = extract_initial_data(&html).ok_or(WebSearchError::MissingInitialData)?;
        debug!("Found {} bytes of ytInitialData", raw.len());
        let document: SearchDocument = serde_json::from_str(raw)?;
        videos_from_document(document, query.max_results())
    }
}

#[async_trait]
impl SearchBackend for ResultsPageSearch {
    fn source(&self) -> ResultSource {
        ResultSource::Scrape
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoSummary>, BackendError> {
        Ok(self.fetch(query).await?)
    }
}
