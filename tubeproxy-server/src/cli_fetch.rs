use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tubeproxy_server::client::{save_payload, DownloadClient};
use tubeproxy_server::download::MediaKind;
use tubeproxy_server::progress::{control_channel, DownloadItem, TrackedOutcome};
use tubeproxy_server::youtube::extract_video_id;
use tubeproxy_server::youtube::urls::watch_url;

fn parse_kind(s: &str) -> Result<MediaKind> {
    MediaKind::parse(s).with_context(|| format!("Unknown type {:?}, expected video or audio", s))
}

#[derive(Parser, Debug)]
#[command(version, about = "Download a video through a running tubeproxy server")]
struct FetchArgs {
    /// Video id or YouTube URL.
    pub video: String,

    /// Base URL of the tubeproxy server.
    #[clap(long, default_value = "http://localhost:3000")]
    pub server: String,

    /// What to download: video (mp4) or audio (mp3).
    #[clap(long = "type", default_value = "video", value_parser = parse_kind)]
    pub kind: MediaKind,

    /// Maximum video height, e.g. 720p.
    #[clap(long)]
    pub quality: Option<String>,

    /// File name to use instead of the video title.
    #[clap(long)]
    pub title: Option<String>,

    /// Directory the file is written to.
    #[clap(short, long, default_value = ".")]
    pub output: PathBuf,
}

fn progress_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

fn describe(item: &DownloadItem) -> String {
    let mut parts = Vec::new();
    if let Some(downloaded) = &item.downloaded_size {
        match &item.total_size {
            Some(total) => parts.push(format!("{} / {}", downloaded, total)),
            None => parts.push(downloaded.clone()),
        }
    }
    if let Some(speed) = &item.speed {
        parts.push(speed.clone());
    }
    if let Some(eta) = &item.eta {
        parts.push(format!("eta {}", eta));
    }
    parts.join("  ")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = FetchArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let video_id = extract_video_id(&args.video)
        .with_context(|| format!("Not a YouTube video id or URL: {}", args.video))?;
    let client = DownloadClient::new(&args.server)?;

    let title = match args.title {
        Some(title) => title,
        None => match client.video_info(&watch_url(&video_id)).await {
            Ok(details) => details.title,
            Err(err) => {
                warn!("Could not look up the title: {:#}", err);
                video_id.clone()
            }
        },
    };

    let mut item = DownloadItem::new(&video_id, &title, args.kind, args.quality.as_deref());
    let (control, receiver) = control_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            control.cancel();
        }
    });

    let bar = progress_bar()?;
    bar.set_message(format!("{} ({})", title, args.kind));
    let outcome = client
        .download(&mut item, receiver, |item| {
            bar.set_position(u64::from(item.progress));
            bar.set_message(describe(item));
        })
        .await;

    match outcome {
        TrackedOutcome::Completed(payload) => {
            let path = save_payload(&args.output, &item, &payload).await?;
            bar.finish_with_message(format!("saved {}", path.display()));
            Ok(())
        }
        TrackedOutcome::Failed(message) => {
            bar.abandon_with_message("failed");
            bail!("Download failed: {}", message)
        }
        TrackedOutcome::Cancelled => {
            bar.abandon_with_message("cancelled");
            bail!("Download cancelled")
        }
    }
}
