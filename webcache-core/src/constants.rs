//! Constants for the page cache.

// ═══════════════════════════════════════════════════════════════════════════════
// FRESHNESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live of a committed payload, in seconds.
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 90;

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════════════════════════

/// `strftime` pattern for the IMF-fixdate form of an HTTP date (RFC 7231 §7.1.1.1).
///
/// The zone is always the literal `GMT`; callers must format a UTC timestamp.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Header name the formatted timestamp is meant for.
pub const LAST_MODIFIED_HEADER: &str = "Last-Modified";

/// Upper bound on the freshness window, in seconds (about 1000 years).
///
/// Larger configured ages are clamped to this so that forced invalidation
/// always has a representable "stale" timestamp.
pub const MAX_AGE_CEILING_SECONDS: i64 = 1000 * 365 * 24 * 60 * 60;
