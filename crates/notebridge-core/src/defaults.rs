//! Centralized default constants for notebridge.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// NOTE BACKEND
// =============================================================================

/// Default note backend endpoint.
pub const SYNC_ENDPOINT: &str = "https://api.standardnotes.com";

/// API version sent with every backend request.
pub const SYNC_API_VERSION: &str = "20200115";

/// Encryption protocol version this client speaks.
pub const PROTOCOL_VERSION: &str = "004";

/// Timeout for a single backend request in seconds.
pub const SYNC_TIMEOUT_SECS: u64 = 30;

/// Page size requested on retrieval syncs.
pub const SYNC_PAGE_LIMIT: u32 = 150;

/// Upper bound on pages followed for one retrieval, guards against a backend
/// that never stops returning cursor tokens.
pub const SYNC_MAX_PAGES: usize = 100;

/// Minimum length of the password nonce accepted by the integrity check.
pub const PW_NONCE_MIN_LEN: usize = 16;

// =============================================================================
// KEY DERIVATION (Argon2id, protocol 004)
// =============================================================================

/// Memory cost in KiB.
pub const KDF_MEMORY_KIB: u32 = 65536;

/// Time cost (iterations).
pub const KDF_ITERATIONS: u32 = 5;

/// Parallelism degree.
pub const KDF_PARALLELISM: u32 = 1;

// =============================================================================
// ARTICLE EXTRACTION
// =============================================================================

/// Hard upper bound on a page fetch, in seconds.
pub const EXTRACT_TIMEOUT_SECS: u64 = 60;

/// Branches probed, in order, for a repository README.
pub const README_BRANCHES: [&str; 5] = ["master", "main", "develop", "development", "dev"];

/// Hosts treated as code-hosting sites for the README fast path.
pub const CODE_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// Base URL serving raw repository files.
pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// User agent sent with page fetches.
pub const EXTRACT_USER_AGENT: &str = concat!("notebridge/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// MESSAGING
// =============================================================================

/// Default Bot API endpoint.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Long-poll timeout for update retrieval, in seconds.
pub const TELEGRAM_POLL_TIMEOUT_SECS: u64 = 20;

/// Capacity of the queue between the update poller and the message worker.
pub const MESSAGE_QUEUE_CAPACITY: usize = 16;

/// Capacity of the gateway event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Delay before polling again after a failed update fetch, in milliseconds.
pub const POLL_ERROR_BACKOFF_MS: u64 = 3000;

/// Tags attached to every note created from a chat message.
pub const BASE_TAGS: [&str; 2] = ["telegram", "inbox"];

/// Tag attached when the message contains at least one link.
pub const LINKS_TAG: &str = "links";

/// Prefix for tags derived from hashtags in the message.
pub const HASHTAG_TAG_PREFIX: &str = "telegram.";
