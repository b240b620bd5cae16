use anyhow::{Context, Result};
use axum::extract::FromRef;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::ServerConfig;
use crate::config::AppConfig;
use crate::download::DownloadStreamer;
use crate::rate_limit::RateLimiter;
use crate::search::{
    InternalApiSearch, ResultCache, ResultsPageSearch, SearchBackend, SearchOrchestrator,
    ToolSearch,
};
use crate::youtube::{DataApiClient, SuggestionClient, BROWSER_USER_AGENT};
use crate::ytdlp::{resolve_tool_path, YtDlp};

pub type GuardedSearchOrchestrator = Arc<SearchOrchestrator>;
pub type GuardedDownloadStreamer = Arc<DownloadStreamer>;
pub type GuardedSuggestionClient = Arc<SuggestionClient>;
pub type OptionalDataApiClient = Option<Arc<DataApiClient>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub build_id: String,
    pub search: GuardedSearchOrchestrator,
    pub streamer: GuardedDownloadStreamer,
    pub suggestions: GuardedSuggestionClient,
    pub data_api: OptionalDataApiClient,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        search: SearchOrchestrator,
        streamer: DownloadStreamer,
        suggestions: SuggestionClient,
        data_api: Option<DataApiClient>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            build_id: env!("BUILD_ID").to_string(),
            search: Arc::new(search),
            streamer: Arc::new(streamer),
            suggestions: Arc::new(suggestions),
            data_api: data_api.map(Arc::new),
        }
    }

    /// Wires every component from resolved configuration. `base_dir` is
    /// where a bundled `bin/yt-dlp` is looked up.
    pub fn from_app_config(app: &AppConfig, base_dir: &Path) -> Result<ServerState> {
        let tool = YtDlp::new(resolve_tool_path(app.ytdlp_path.as_deref(), base_dir));
        info!("Using yt-dlp at {}", tool.path().display());

        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(app.search.http_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let backends: Vec<Arc<dyn SearchBackend>> = vec![
            Arc::new(ToolSearch::new(tool.clone(), app.search.tool_timeout)),
            Arc::new(InternalApiSearch::new(
                http.clone(),
                &app.search.youtube_base_url,
            )),
            Arc::new(ResultsPageSearch::new(
                http.clone(),
                &app.search.youtube_base_url,
            )),
        ];
        let search = SearchOrchestrator::new(
            Arc::new(RateLimiter::new(app.rate_limit.clone())),
            Arc::new(ResultCache::new(app.cache.clone())),
            backends,
        );

        let data_api = app.youtube_api_key.as_ref().map(|key| {
            info!("YouTube Data API enabled");
            DataApiClient::new(http.clone(), key.clone(), &app.search.data_api_base_url)
        });

        let config = ServerConfig {
            requests_logging_level: app.logging_level.clone(),
            port: app.port,
            metrics_port: app.metrics_port,
            frontend_dir_path: app.frontend_dir_path.clone(),
            tool_timeout: app.search.tool_timeout,
        };

        Ok(ServerState::new(
            config,
            search,
            DownloadStreamer::new(tool, app.download.clone()),
            SuggestionClient::new(http, &app.search.suggestions_base_url),
            data_api,
        ))
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedSearchOrchestrator {
    fn from_ref(input: &ServerState) -> Self {
        input.search.clone()
    }
}

impl FromRef<ServerState> for GuardedDownloadStreamer {
    fn from_ref(input: &ServerState) -> Self {
        input.streamer.clone()
    }
}

impl FromRef<ServerState> for GuardedSuggestionClient {
    fn from_ref(input: &ServerState) -> Self {
        input.suggestions.clone()
    }
}

impl FromRef<ServerState> for OptionalDataApiClient {
    fn from_ref(input: &ServerState) -> Self {
        input.data_api.clone()
    }
}
