//! Display helpers shared by every metadata source.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref VIEW_COUNT_RE: Regex =
        Regex::new(r"(?i)([\d.,]+)\s*([KMB])?").expect("invalid view count regex");
    static ref ISO_DURATION_RE: Regex =
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("invalid ISO 8601 duration regex");
}

/// Formats a duration in seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Parses strings like `"1,234 views"`, `"1.2M views"` or `"3K"` into a count.
/// Anything unparseable is 0.
pub fn parse_view_count(text: &str) -> u64 {
    let Some(captures) = VIEW_COUNT_RE.captures(text) else {
        return 0;
    };
    let digits = captures[1].replace(',', "");
    let Ok(value) = digits.parse::<f64>() else {
        return 0;
    };
    let multiplier = match captures.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(suffix) if suffix == "K" => 1_000.0,
        Some(suffix) if suffix == "M" => 1_000_000.0,
        Some(suffix) if suffix == "B" => 1_000_000_000.0,
        _ => 1.0,
    };
    (value * multiplier).round() as u64
}

/// Compact rendering used by preview metadata, e.g. `1.4B`, `250K`.
pub fn format_view_count(count: u64) -> String {
    let (value, suffix) = match count {
        c if c >= 1_000_000_000 => (c as f64 / 1_000_000_000.0, "B"),
        c if c >= 1_000_000 => (c as f64 / 1_000_000.0, "M"),
        c if c >= 1_000 => (c as f64 / 1_000.0, "K"),
        c => return c.to_string(),
    };
    let rendered = format!("{:.1}", value);
    let rendered = rendered.strip_suffix(".0").unwrap_or(&rendered);
    format!("{}{}", rendered, suffix)
}

/// Parses ISO 8601 durations as returned by the Data API (`PT1H2M3S`).
pub fn parse_iso8601_duration(text: &str) -> Option<u64> {
    let captures = ISO_DURATION_RE.captures(text.trim())?;
    let field = |index: usize| -> u64 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Some(field(1) * 86_400 + field(2) * 3600 + field(3) * 60 + field(4))
}
