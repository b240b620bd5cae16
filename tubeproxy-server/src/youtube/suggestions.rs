//! Search-as-you-type suggestions.
//!
//! The public completion endpoint answers with JSONP; when it is unreachable
//! or unparseable, suggestions are generated locally from common patterns.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SUGGESTIONS_BASE_URL: &str = "https://suggestqueries.google.com";
pub const MIN_QUERY_CHARS: usize = 2;
const MAX_UPSTREAM_SUGGESTIONS: usize = 10;
const MAX_FALLBACK_SUGGESTIONS: usize = 8;

lazy_static! {
    static ref JSON_ARRAY_RE: Regex = Regex::new(r"(?s)\[.*\]").expect("invalid JSONP regex");
    static ref ARABIC_RE: Regex = Regex::new(r"[\x{0600}-\x{06FF}]").expect("invalid arabic regex");
}

const LATIN_PATTERNS: [&str; 5] = ["music", "video", "official", "lyrics", "live"];
const ARABIC_PATTERNS: [&str; 5] = ["أغنية", "فيديو", "كليب", "مباشر", "كاملة"];

const POPULAR_TERMS: [(&str, [&str; 3]); 6] = [
    ("music", ["music 2024", "music video", "music mix"]),
    ("song", ["songs 2024", "songs playlist", "songs mix"]),
    ("video", ["video funny", "video tutorial", "video game"]),
    ("موسيقى", ["موسيقى هادئة", "موسيقى حماسية", "موسيقى عربية"]),
    ("أغنية", ["أغنية جديدة", "أغنية حزينة", "أغنية رومانسية"]),
    ("فيلم", ["فيلم عربي", "فيلم كوميدي", "فيلم أكشن"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

impl Suggestions {
    pub fn empty() -> Self {
        Self {
            suggestions: Vec::new(),
            source: None,
        }
    }
}

pub struct SuggestionClient {
    client: reqwest::Client,
    base_url: String,
}

impl SuggestionClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Never fails: upstream problems fall back to generated suggestions.
    pub async fn suggest(&self, query: &str) -> Suggestions {
        if query.chars().count() < MIN_QUERY_CHARS {
            return Suggestions::empty();
        }

        match self.fetch_upstream(query).await {
            Ok(suggestions) => {
                debug!("Got {} upstream suggestions for {:?}", suggestions.len(), query);
                Suggestions {
                    suggestions,
                    source: Some("youtube"),
                }
            }
            Err(err) => {
                warn!("Suggestion endpoint failed, using fallback: {}", err);
                Suggestions {
                    suggestions: fallback_suggestions(query),
                    source: Some("fallback"),
                }
            }
        }
    }

    async fn fetch_upstream(&self, query: &str) -> anyhow::Result<Vec<String>> {
        let url = format!(
            "{}/complete/search?client=youtube&ds=yt&q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        parse_jsonp(&body).ok_or_else(|| anyhow::anyhow!("unrecognized suggestion payload"))
    }
}

/// Extracts `[query, [[s1, ...], [s2, ...]], ...]` from a JSONP wrapper.
pub fn parse_jsonp(body: &str) -> Option<Vec<String>> {
    let array = JSON_ARRAY_RE.find(body)?;
    let value: serde_json::Value = serde_json::from_str(array.as_str()).ok()?;
    let entries = value.get(1)?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| entry.get(0).and_then(|s| s.as_str()))
            .filter(|s| !s.is_empty())
            .take(MAX_UPSTREAM_SUGGESTIONS)
            .map(str::to_string)
            .collect(),
    )
}

pub fn fallback_suggestions(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let patterns: &[&str] = if ARABIC_RE.is_match(query) {
        &ARABIC_PATTERNS
    } else {
        &LATIN_PATTERNS
    };

    let mut suggestions: Vec<String> = patterns
        .iter()
        .map(|suffix| format!("{} {}", query, suffix))
        .collect();

    if let Some((_, popular)) = POPULAR_TERMS
        .iter()
        .find(|(term, _)| lowered.contains(&term.to_lowercase()))
    {
        suggestions.extend(popular.iter().map(|s| s.to_string()));
    }

    let mut seen = std::collections::HashSet::new();
    suggestions.retain(|s| seen.insert(s.clone()));
    suggestions.truncate(MAX_FALLBACK_SUGGESTIONS);
    suggestions
}
