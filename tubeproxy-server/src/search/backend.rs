use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::models::{ResultSource, SearchQuery, VideoSummary};
use super::web::WebSearchError;
use crate::ytdlp::{ToolError, YtDlp};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Web(#[from] WebSearchError),
}

impl BackendError {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Tool(err) => err.kind(),
            BackendError::Web(err) => err.kind(),
        }
    }
}

/// One step of the search fallback chain.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn source(&self) -> ResultSource;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoSummary>, BackendError>;
}

/// Search through the extraction tool, bounded by `timeout`.
pub struct ToolSearch {
    tool: YtDlp,
    timeout: Duration,
}

impl ToolSearch {
    pub fn new(tool: YtDlp, timeout: Duration) -> Self {
        Self { tool, timeout }
    }
}

#[async_trait]
impl SearchBackend for ToolSearch {
    fn source(&self) -> ResultSource {
        ResultSource::Tool
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoSummary>, BackendError> {
        Ok(self
            .tool
            .search(query.text(), query.max_results(), self.timeout)
            .await?)
    }
}
