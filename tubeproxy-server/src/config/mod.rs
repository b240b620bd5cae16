mod file_config;

pub use file_config::{
    CacheFileConfig, DownloadFileConfig, FileConfig, RateLimitFileConfig, SearchFileConfig,
};

use crate::download::StreamerConfig;
use crate::rate_limit::RateLimitConfig;
use crate::search::CacheConfig;
use crate::server::RequestsLoggingLevel;
use crate::youtube::{
    DEFAULT_DATA_API_BASE_URL, DEFAULT_SUGGESTIONS_BASE_URL, DEFAULT_YOUTUBE_BASE_URL,
};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub ytdlp_path: Option<PathBuf>,
    pub youtube_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub ytdlp_path: Option<PathBuf>,
    pub youtube_api_key: Option<String>,

    // Feature configs (with defaults)
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
    pub search: SearchSettings,
    pub download: StreamerConfig,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub tool_timeout: Duration,
    pub http_timeout: Duration,
    pub youtube_base_url: String,
    pub suggestions_base_url: String,
    pub data_api_base_url: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(30),
            http_timeout: Duration::from_secs(15),
            youtube_base_url: DEFAULT_YOUTUBE_BASE_URL.to_string(),
            suggestions_base_url: DEFAULT_SUGGESTIONS_BASE_URL.to_string(),
            data_api_base_url: DEFAULT_DATA_API_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port != 0 && port == metrics_port {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = match file.logging_level {
            Some(level) => match parse_logging_level(&level) {
                Some(level) => level,
                None => bail!("Unknown logging_level in config file: {}", level),
            },
            None => cli.logging_level.clone(),
        };

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        if let Some(dir) = &frontend_dir_path {
            if !PathBuf::from(dir).is_dir() {
                bail!("Frontend directory does not exist: {:?}", dir);
            }
        }

        let ytdlp_path = file
            .ytdlp_path
            .map(PathBuf::from)
            .or_else(|| cli.ytdlp_path.clone());
        let youtube_api_key = file
            .youtube_api_key
            .or_else(|| cli.youtube_api_key.clone())
            .filter(|key| !key.trim().is_empty());

        let rate_limit_file = file.rate_limit.unwrap_or_default();
        let rate_limit_defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: rate_limit_file
                .max_requests
                .unwrap_or(rate_limit_defaults.max_requests),
            window: rate_limit_file
                .window_secs
                .map(Duration::from_secs)
                .unwrap_or(rate_limit_defaults.window),
        };
        if rate_limit.max_requests == 0 {
            bail!("rate_limit.max_requests must be at least 1");
        }
        if rate_limit.window.is_zero() {
            bail!("rate_limit.window_secs must be at least 1");
        }

        let cache_file = file.cache.unwrap_or_default();
        let cache_defaults = CacheConfig::default();
        let cache = CacheConfig {
            ttl: cache_file
                .ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(cache_defaults.ttl),
            capacity: cache_file.capacity.unwrap_or(cache_defaults.capacity),
        };
        if cache.capacity == 0 {
            bail!("cache.capacity must be at least 1");
        }

        let search_file = file.search.unwrap_or_default();
        let search_defaults = SearchSettings::default();
        let search = SearchSettings {
            tool_timeout: search_file
                .tool_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(search_defaults.tool_timeout),
            http_timeout: search_file
                .http_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(search_defaults.http_timeout),
            youtube_base_url: search_file
                .youtube_base_url
                .unwrap_or(search_defaults.youtube_base_url),
            suggestions_base_url: search_file
                .suggestions_base_url
                .unwrap_or(search_defaults.suggestions_base_url),
            data_api_base_url: search_file
                .data_api_base_url
                .unwrap_or(search_defaults.data_api_base_url),
        };

        let download_file = file.download.unwrap_or_default();
        let download_defaults = StreamerConfig::default();
        let download = StreamerConfig {
            first_byte_timeout: download_file
                .first_byte_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(download_defaults.first_byte_timeout),
            max_duration: download_file
                .max_duration_secs
                .map(Duration::from_secs)
                .unwrap_or(download_defaults.max_duration),
            ..download_defaults
        };
        if download.first_byte_timeout > download.max_duration {
            bail!(
                "download.first_byte_timeout_secs ({:?}) exceeds download.max_duration_secs ({:?})",
                download.first_byte_timeout,
                download.max_duration
            );
        }

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            ytdlp_path,
            youtube_api_key,
            rate_limit,
            cache,
            search,
            download,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
