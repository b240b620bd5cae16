//! Search pipeline: admission, cache, then the fallback chain.
//!
//! The chain always produces results. Each backend is tried in order and
//! the first non-empty answer wins; when all of them fail the static
//! trending list is served instead. Whatever is produced is cached under the
//! query's key, trending fallback included.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backend::SearchBackend;
use super::cache::{CacheEntry, ResultCache};
use super::models::{ResultSource, SearchOutcome, SearchQuery, VideoSummary};
use super::trending::trending_fallback;
use crate::rate_limit::RateLimiter;
use crate::server::metrics;

/// Why a search was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRefusal {
    pub wait_time_secs: u64,
    pub remaining_requests: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchDecision {
    Served(SearchOutcome),
    Refused(RateLimitRefusal),
}

pub struct SearchOrchestrator {
    limiter: Arc<RateLimiter>,
    cache: Arc<ResultCache>,
    backends: Vec<Arc<dyn SearchBackend>>,
}

impl SearchOrchestrator {
    /// `backends` are tried in the given order.
    pub fn new(
        limiter: Arc<RateLimiter>,
        cache: Arc<ResultCache>,
        backends: Vec<Arc<dyn SearchBackend>>,
    ) -> Self {
        Self {
            limiter,
            cache,
            backends,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Full request path for one client. A refused client still gets any
    /// cached entry for the query, however old, as long as it was not purged.
    pub async fn handle(&self, client_id: &str, query: &SearchQuery) -> SearchDecision {
        self.limiter.cleanup();

        if !self.limiter.is_allowed(client_id) {
            metrics::record_rate_limit_hit("/search");
            if let Some(entry) = self.cache.peek_stale(&query.cache_key()) {
                info!(
                    "Rate limited {}, serving cached results for {:?}",
                    client_id,
                    query.text()
                );
                metrics::record_cache_hit("stale");
                return SearchDecision::Served(SearchOutcome::rate_limited_cache(
                    entry.videos,
                    entry.source,
                ));
            }
            warn!("Rate limited {} with nothing cached", client_id);
            return SearchDecision::Refused(RateLimitRefusal {
                wait_time_secs: self.limiter.time_until_reset(client_id),
                remaining_requests: self.limiter.remaining_requests(client_id),
            });
        }

        SearchDecision::Served(self.search(query).await)
    }

    /// Never fails past input validation.
    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        let key = query.cache_key();
        self.cache.clean_expired();

        if let Some(entry) = self.cache.get(&key) {
            debug!("Cache hit for {:?}", key);
            metrics::record_cache_hit("fresh");
            return SearchOutcome::cached(entry.videos, entry.source);
        }

        let (videos, source) = self.resolve(query).await;
        self.cache
            .set(&key, CacheEntry::new(videos.clone(), source));
        metrics::record_search_result(source.as_str());
        SearchOutcome::fresh(videos, source)
    }

    async fn resolve(&self, query: &SearchQuery) -> (Vec<VideoSummary>, ResultSource) {
        for backend in &self.backends {
            let source = backend.source();
            match backend.search(query).await {
                Ok(videos) if !videos.is_empty() => {
                    info!(
                        "{} returned {} results for {:?}",
                        source,
                        videos.len(),
                        query.text()
                    );
                    return (videos, source);
                }
                Ok(_) => {
                    warn!("{} returned no results for {:?}", source, query.text());
                    metrics::record_backend_failure(source.as_str(), "no_results");
                }
                Err(err) => {
                    warn!("{} failed for {:?}: {}", source, query.text(), err);
                    metrics::record_backend_failure(source.as_str(), err.kind());
                }
            }
        }

        warn!(
            "All search sources failed for {:?}, serving trending videos",
            query.text()
        );
        (trending_fallback(query), ResultSource::Trending)
    }
}
