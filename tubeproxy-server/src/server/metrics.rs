use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all tubeproxy metrics
const PREFIX: &str = "tubeproxy";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 120.0, 300.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Search Metrics
    pub static ref SEARCH_RESULTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_search_results_total"), "Searches answered, by source"),
        &["source"]
    ).expect("Failed to create search_results_total metric");

    pub static ref SEARCH_BACKEND_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_search_backend_failures_total"),
            "Search strategies that failed and handed over to the next one"
        ),
        &["backend", "reason"]
    ).expect("Failed to create search_backend_failures_total metric");

    pub static ref CACHE_HITS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_cache_hits_total"), "Search cache hits"),
        &["freshness"]
    ).expect("Failed to create cache_hits_total metric");

    // Rate Limiting Metrics
    pub static ref RATE_LIMIT_HITS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_rate_limit_hits_total"), "Rate limit violations"),
        &["endpoint"]
    ).expect("Failed to create rate_limit_hits_total metric");

    // Download Metrics
    pub static ref DOWNLOADS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_downloads_total"), "Downloads by outcome"),
        &["outcome"]
    ).expect("Failed to create downloads_total metric");

    pub static ref DOWNLOAD_BYTES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_download_bytes_total"),
        "Bytes streamed to download clients"
    ).expect("Failed to create download_bytes_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Already registered metrics are ignored (tests call this repeatedly)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SEARCH_RESULTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SEARCH_BACKEND_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(RATE_LIMIT_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DOWNLOADS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DOWNLOAD_BYTES_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Collapses path parameters so label cardinality stays bounded.
pub fn normalize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or(path);
    if path.starts_with("/formats/") {
        return "/formats/{video_id}".to_string();
    }
    match path {
        "/" | "/search" | "/download" | "/suggestions" | "/status/ytdlp" | "/status/api"
        | "/video-info" | "/playlist-info" => path.to_string(),
        _ => "other".to_string(),
    }
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let path = normalize_path(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, &path])
        .observe(duration.as_secs_f64());
}

pub fn record_search_result(source: &str) {
    SEARCH_RESULTS_TOTAL.with_label_values(&[source]).inc();
}

pub fn record_backend_failure(backend: &str, reason: &str) {
    SEARCH_BACKEND_FAILURES_TOTAL
        .with_label_values(&[backend, reason])
        .inc();
}

/// `freshness` is `fresh` for a hit inside the TTL, `stale` for one served
/// to a rate-limited client.
pub fn record_cache_hit(freshness: &str) {
    CACHE_HITS_TOTAL.with_label_values(&[freshness]).inc();
}

pub fn record_rate_limit_hit(endpoint: &str) {
    RATE_LIMIT_HITS_TOTAL.with_label_values(&[endpoint]).inc();
}

pub fn record_download(outcome: &str) {
    DOWNLOADS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_download_bytes(bytes: u64) {
    DOWNLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}
