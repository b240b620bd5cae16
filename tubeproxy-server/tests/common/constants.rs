//! Shared constants for end-to-end tests
//!
//! Data the fake tool prints lives next to the scripts in `fixtures`.

// ============================================================================
// Network
// ============================================================================

/// Address nothing listens on; web fallbacks pointed here fail fast.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// How long a killed tool process may linger after a cancelled download.
pub const PROCESS_EXIT_TIMEOUT_MS: u64 = 5000;
