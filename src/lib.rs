//! # Swapwatch
//!
//! Watches a classifieds-style listing board for new posts worth acting on.
//!
//! Swapwatch polls the board on a fixed cadence, remembers the most recently
//! seen listings in a bounded insertion-ordered cache, runs genuinely new
//! listings through staged text-pattern filters (title admission, then a
//! coarse and a fine tier), and forwards matches to a notification webhook.
//!
//! ## Example
//!
//! ```rust,ignore
//! use swapwatch::{Pipeline, PipelineContext, WatchConfig};
//!
//! let config = WatchConfig::from_env();
//! let ctx = PipelineContext::new(&config)?;
//! let mut pipeline = Pipeline::new(ctx, feed, notifier, config.query.clone());
//! let report = pipeline.run_cycle().await;
//! ```

#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cache;
pub mod classify;
pub mod config;
pub mod feed;
pub mod models;
pub mod notify;
pub mod observability;
pub mod pipeline;

// Re-exports for convenience
pub use cache::BoundedDedupCache;
pub use classify::{CompiledMatcher, MatchPartition, Matcher, PatternClassifier};
pub use config::WatchConfig;
pub use feed::{FeedSource, RedditFeed};
pub use models::{Listing, ListingKey, RawListing};
pub use notify::{Notifier, SlackNotifier};
pub use pipeline::{CycleReport, CycleStage, Pipeline, PipelineContext};

/// Error type for swapwatch operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Recovery |
/// |---------|-------------|----------|
/// | `PatternCompile` | A configured pattern is not valid regex syntax | Fatal at startup |
/// | `Fetch` | The feed returns a non-success response or an undecodable body | Abandon the cycle; next tick retries |
/// | `Delivery` | The webhook rejects or never receives a notification | Logged per tier, never aborts the cycle |
/// | `KeyNotFound` | The cache is asked for a key that was never admitted | Invariant violation, surfaced loudly |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A configured text pattern failed to compile.
    ///
    /// Raised only while building the classifier at startup. This is the one
    /// error that is allowed to terminate the process: a malformed pattern
    /// list means the operator's configuration is broken, and silently
    /// matching nothing would be worse than exiting.
    #[error("pattern '{pattern}' failed to compile: {cause}")]
    PatternCompile {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying regex error.
        cause: String,
    },

    /// Retrieving the feed failed.
    ///
    /// Raised when:
    /// - The HTTP request to the board fails outright
    /// - The board answers with a non-success status
    /// - The response body does not decode as the expected envelope
    #[error("feed fetch failed: {cause}")]
    Fetch {
        /// The underlying cause.
        cause: String,
    },

    /// Delivering a notification failed.
    ///
    /// Raised when the webhook endpoint is unreachable or answers with a
    /// non-success status. Callers recover per tier; a failed coarse
    /// notification must not block the fine one.
    #[error("notification delivery failed: {cause}")]
    Delivery {
        /// The underlying cause.
        cause: String,
    },

    /// A cache lookup was made for a key that is not resident.
    ///
    /// Callers only look up keys they just admitted, so hitting this variant
    /// means the admission bookkeeping is wrong somewhere. It is treated as
    /// a defect rather than a recoverable condition.
    #[error("key not resident in dedup cache: {0}")]
    KeyNotFound(String),
}

/// Result type alias for swapwatch operations.
pub type Result<T> = std::result::Result<T, Error>;
