use lazy_static::lazy_static;
use regex::Regex;

pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

lazy_static! {
    static ref VIDEO_URL_RE: Regex = Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?|shorts|live)/|.*[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})"#
    )
    .expect("invalid video url regex");
    static ref PLAYLIST_URL_RE: Regex =
        Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").expect("invalid playlist url regex");
}

/// Video ids are passed to the tool as part of a watch URL, so only the
/// characters YouTube itself uses are accepted.
pub fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extracts the video id from any of the usual URL shapes, or accepts a bare
/// 11 character id.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if let Some(captures) = VIDEO_URL_RE.captures(url) {
        return Some(captures[1].to_string());
    }
    if url.len() == 11 && is_valid_video_id(url) {
        return Some(url.to_string());
    }
    None
}

pub fn extract_playlist_id(url: &str) -> Option<String> {
    PLAYLIST_URL_RE
        .captures(url.trim())
        .map(|captures| captures[1].to_string())
}

pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL_PREFIX, video_id)
}

pub fn default_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/mqdefault.jpg", video_id)
}
