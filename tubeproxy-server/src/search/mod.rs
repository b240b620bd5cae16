pub mod backend;
pub mod cache;
pub mod models;
mod orchestrator;
pub mod trending;
pub mod web;

pub use backend::{BackendError, SearchBackend, ToolSearch};
pub use cache::{CacheConfig, CacheEntry, ResultCache};
pub use models::{ResultSource, SearchOutcome, SearchQuery, VideoSummary};
pub use orchestrator::{RateLimitRefusal, SearchDecision, SearchOrchestrator};
pub use web::{InternalApiSearch, ResultsPageSearch, WebSearchError};
