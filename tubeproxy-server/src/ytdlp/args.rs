//! Argument lists for every way the tool is invoked.

use crate::download::models::MediaFormat;
use crate::youtube::urls::watch_url;

pub fn search_args(query: &str, max_results: usize) -> Vec<String> {
    vec![
        "--dump-single-json".to_string(),
        "--no-warnings".to_string(),
        "--quiet".to_string(),
        "--skip-download".to_string(),
        "--flat-playlist".to_string(),
        "--no-check-certificate".to_string(),
        format!("ytsearch{}:{}", max_results, query),
    ]
}

pub fn video_format_selector(max_height: Option<u32>) -> String {
    match max_height {
        Some(height) => format!("best[height<={}][ext=mp4]", height),
        None => "best[ext=mp4]".to_string(),
    }
}

/// Streaming download: the media goes to stdout.
pub fn download_args(video_id: &str, format: &MediaFormat) -> Vec<String> {
    let mut args: Vec<String> = match format {
        MediaFormat::Audio => vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            "0".to_string(),
        ],
        MediaFormat::Video { max_height } => vec![
            "--format".to_string(),
            video_format_selector(*max_height),
        ],
    };
    args.extend(
        ["--output", "-", "--no-warnings", "--no-check-certificate"]
            .iter()
            .map(|s| s.to_string()),
    );
    if let MediaFormat::Video { .. } = format {
        args.extend(
            [
                "--socket-timeout",
                "30",
                "--retries",
                "3",
                "--fragment-retries",
                "3",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
    }
    args.push(watch_url(video_id));
    args
}

/// Full metadata dump for one video, formats included.
pub fn metadata_args(video_id: &str) -> Vec<String> {
    vec![
        "--dump-single-json".to_string(),
        "--no-warnings".to_string(),
        "--skip-download".to_string(),
        "--no-playlist".to_string(),
        "--no-check-certificate".to_string(),
        watch_url(video_id),
    ]
}

pub fn version_args() -> Vec<String> {
    vec!["--version".to_string()]
}
