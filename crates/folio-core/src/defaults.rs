//! Centralized default constants for the folio system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// PROVENANCE
// =============================================================================

/// Source tag stamped on every record ingested from a WeChat Read export.
pub const SOURCE_TAG: &str = "WeChat Read";

// =============================================================================
// REMOTE STORE RETRY
// =============================================================================

/// Maximum attempts per remote write, counting the first.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between attempts.
pub const RETRY_BASE_DELAY_MS: u64 = 500;

// =============================================================================
// COVER RESOLUTION
// =============================================================================

/// How many books are resolved against cover sources concurrently.
pub const COVER_FAN_OUT: usize = 4;

/// Per-request timeout for cover source lookups (seconds).
pub const COVER_HTTP_TIMEOUT_SECS: u64 = 12;

/// Minimum spacing between consecutive requests to the scraped source.
pub const COVER_RATE_LIMIT_MS: u64 = 1000;

/// Default on-disk location of the cover cache.
pub const COVER_CACHE_PATH: &str = ".cache/covers.json";

/// Browser User-Agent sent to the scraped source.
pub const COVER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0 Safari/537.36";
