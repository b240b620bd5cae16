use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub ytdlp_path: Option<String>,
    pub youtube_api_key: Option<String>,

    // Feature configs
    pub rate_limit: Option<RateLimitFileConfig>,
    pub cache: Option<CacheFileConfig>,
    pub search: Option<SearchFileConfig>,
    pub download: Option<DownloadFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RateLimitFileConfig {
    pub max_requests: Option<u32>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CacheFileConfig {
    pub ttl_secs: Option<u64>,
    pub capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SearchFileConfig {
    pub tool_timeout_secs: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    pub youtube_base_url: Option<String>,
    pub suggestions_base_url: Option<String>,
    pub data_api_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DownloadFileConfig {
    pub first_byte_timeout_secs: Option<u64>,
    pub max_duration_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
