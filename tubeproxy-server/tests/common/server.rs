//! Test server lifecycle management
//!
//! Spawns the full application on a random port, configured through a
//! generated TOML file the same way the binary is. Web search fallbacks and
//! suggestions point at an unreachable address, so searches are answered by
//! the fake tool or fall through to the trending list.

use super::constants::*;
use super::fixtures::FakeTool;
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tubeproxy_server::{make_app, AppConfig, CliConfig, FileConfig, ServerState};

/// A running server instance for end-to-end testing
///
/// Dropping it triggers graceful shutdown and removes the fake tool.
pub struct TestServer {
    /// Base URL for HTTP requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The yt-dlp stand-in the server is wired to
    pub tool: FakeTool,

    _config_dir: TempDir,
    _shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with default limits.
    pub async fn spawn(tool: FakeTool) -> Self {
        Self::spawn_with_rate_limit(tool, 50).await
    }

    /// Spawns a server that admits `max_requests` searches per minute per client.
    pub async fn spawn_with_rate_limit(tool: FakeTool, max_requests: u32) -> Self {
        let config_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = config_dir.path().join("config.toml");
        let toml = format!(
            r#"ytdlp_path = "{tool}"
logging_level = "none"

[rate_limit]
max_requests = {max_requests}
window_secs = 60

[search]
tool_timeout_secs = 5
http_timeout_secs = 2
youtube_base_url = "{unreachable}"
suggestions_base_url = "{unreachable}"
data_api_base_url = "{unreachable}"

[download]
first_byte_timeout_secs = 5
max_duration_secs = 30
"#,
            tool = tool.path().display(),
            max_requests = max_requests,
            unreachable = UNREACHABLE_BASE_URL,
        );
        std::fs::write(&config_path, toml).expect("Failed to write config file");

        let file_config = FileConfig::load(&config_path).expect("Failed to load config file");
        let cli = CliConfig {
            port: 0,
            metrics_port: 0,
            ..Default::default()
        };
        let app_config =
            AppConfig::resolve(&cli, Some(file_config)).expect("Failed to resolve config");
        let state = ServerState::from_app_config(&app_config, config_dir.path())
            .expect("Failed to build server state");

        // Bind to random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().expect("Failed to get local address");
        let port = addr.port();
        let base_url = format!("http://{}", addr);

        let app = make_app(state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed to start");
        });

        let server = Self {
            base_url,
            port,
            tool,
            _config_dir: config_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Polls the home endpoint until the server answers.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::new();
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
