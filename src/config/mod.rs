//! Configuration management.

use secrecy::SecretString;
use std::time::Duration;

/// Default board to watch.
pub const DEFAULT_BOARD: &str = "hardwareswap";

/// Default number of items requested per poll. Kept small to reduce the
/// randomness of queries that would otherwise return a large result set.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Default dedup-window multiplier.
///
/// The cache must hold more than one page of keys: posts are sometimes
/// removed upstream, which pushes older posts back into the result window,
/// and those must still be recognized as already seen. The real requirement
/// is "dedup window exceeds the feed's churn rate"; 2x one page has been
/// enough in practice.
pub const DEFAULT_CAPACITY_MULTIPLIER: usize = 2;

/// Default seconds between polls.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Title patterns admitting only posts that look like a sale accepting
/// PayPal. This also filters out local-only posts.
fn default_title_patterns() -> Vec<String> {
    vec![r"\[USA[^\]]*\].*\[H\].*\[W\].*(pay[\s-]*pal|\bPP\b)".to_string()]
}

/// Broad candidate patterns over title+body.
fn default_coarse_patterns() -> Vec<String> {
    vec![
        // nvidia 30-series numbers mentioned near "gpu"/"graphic"
        r"[23]0[789]0[\s\S]*?(gpu|graphic)".to_string(),
        r"(RTX|GTX)\s*[23]0[789]0".to_string(),
        // amd cards we want
        r"RX\s?[45][78]0".to_string(),
        r"R9[\s-]*390[\s\S]*?(gpu|graphic)".to_string(),
    ]
}

/// Strict patterns requiring the have/want shape in the text.
fn default_fine_patterns() -> Vec<String> {
    vec![
        r"\[H\].*?(RTX|GTX)\s*[23]0[789]0.*\[W\]".to_string(),
        r"\[H\].*?RX\s?[45][78]0[\s-]*8gb?.*\[W\]".to_string(),
        r"\[H\].*?R9[\s-]*390.*\[W\]".to_string(),
    ]
}

/// Patterns extracting `item`/`price` pairs for notification text.
fn default_price_patterns() -> Vec<String> {
    vec![
        r"(?P<item>(?:RTX|GTX)?\s*[23]0[789]0)[\s\S]*?(?P<price>\$\s?\d{1,3}(?:,?\d{3})*|\d{1,3}(?:,?\d{3})*\s*(?:USD|dollars|shipped|OBO))"
            .to_string(),
    ]
}

/// Main configuration for swapwatch.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `SWAPWATCH_BOARD` | string | `hardwareswap` | Board to watch |
/// | `SWAPWATCH_QUERY` | string | empty | Search query; empty means "all newest posts" |
/// | `SWAPWATCH_PAGE_SIZE` | usize | `30` | Items requested per poll |
/// | `SWAPWATCH_CAPACITY_MULTIPLIER` | usize | `2` | Dedup window as a multiple of the page size |
/// | `SWAPWATCH_INTERVAL_SECS` | u64 | `60` | Seconds between polls |
/// | `SWAPWATCH_USER_AGENT` | string | crate name/version | User agent sent to the feed |
/// | `SWAPWATCH_WEBHOOK_URL` | string | unset | Slack-compatible webhook URL |
///
/// The pattern banks default to the GPU sale patterns below and can be
/// replaced through the builder methods.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Board to watch.
    pub board: String,
    /// Search query; empty retrieves all newest posts instead.
    pub query: String,
    /// Items requested per poll.
    pub page_size: usize,
    /// Dedup window as a multiple of the page size.
    pub capacity_multiplier: usize,
    /// Interval between polls.
    pub poll_interval: Duration,
    /// User agent sent to the feed.
    pub user_agent: String,
    /// Webhook URL for notifications. Held as a secret: webhook URLs embed
    /// their authentication token.
    pub webhook_url: Option<SecretString>,
    /// Title-admission pattern list; empty disables the filter.
    pub title_patterns: Vec<String>,
    /// Coarse-tier pattern list.
    pub coarse_patterns: Vec<String>,
    /// Fine-tier pattern list.
    pub fine_patterns: Vec<String>,
    /// Price extraction pattern list.
    pub price_patterns: Vec<String>,
}

impl WatchConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults for any unset variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("SWAPWATCH_BOARD") {
            config.board = v;
        }
        if let Ok(v) = std::env::var("SWAPWATCH_QUERY") {
            config.query = v;
        }
        if let Ok(v) = std::env::var("SWAPWATCH_PAGE_SIZE") {
            if let Ok(n) = v.parse() {
                config.page_size = n;
            }
        }
        if let Ok(v) = std::env::var("SWAPWATCH_CAPACITY_MULTIPLIER") {
            if let Ok(n) = v.parse() {
                config.capacity_multiplier = n;
            }
        }
        if let Ok(v) = std::env::var("SWAPWATCH_INTERVAL_SECS") {
            if let Ok(n) = v.parse() {
                config.poll_interval = Duration::from_secs(n);
            }
        }
        if let Ok(v) = std::env::var("SWAPWATCH_USER_AGENT") {
            config.user_agent = v;
        }
        if let Ok(v) = std::env::var("SWAPWATCH_WEBHOOK_URL") {
            config.webhook_url = Some(SecretString::from(v));
        }

        config
    }

    /// The dedup cache capacity: multiplier x page size, floored at one
    /// page so a degenerate multiplier cannot shrink the window below the
    /// result set it has to absorb.
    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        (self.capacity_multiplier * self.page_size).max(self.page_size)
    }

    /// Builder method to set the board.
    #[must_use]
    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = board.into();
        self
    }

    /// Builder method to set the search query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Builder method to set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Builder method to set the capacity multiplier.
    #[must_use]
    pub const fn with_capacity_multiplier(mut self, multiplier: usize) -> Self {
        self.capacity_multiplier = multiplier;
        self
    }

    /// Builder method to set the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method to set the title-admission patterns.
    #[must_use]
    pub fn with_title_patterns(mut self, patterns: Vec<String>) -> Self {
        self.title_patterns = patterns;
        self
    }

    /// Builder method to set the coarse patterns.
    #[must_use]
    pub fn with_coarse_patterns(mut self, patterns: Vec<String>) -> Self {
        self.coarse_patterns = patterns;
        self
    }

    /// Builder method to set the fine patterns.
    #[must_use]
    pub fn with_fine_patterns(mut self, patterns: Vec<String>) -> Self {
        self.fine_patterns = patterns;
        self
    }

    /// Builder method to set the price patterns.
    #[must_use]
    pub fn with_price_patterns(mut self, patterns: Vec<String>) -> Self {
        self.price_patterns = patterns;
        self
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            board: DEFAULT_BOARD.to_string(),
            query: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            capacity_multiplier: DEFAULT_CAPACITY_MULTIPLIER,
            poll_interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            user_agent: format!("swapwatch/{}", env!("CARGO_PKG_VERSION")),
            webhook_url: None,
            title_patterns: default_title_patterns(),
            coarse_patterns: default_coarse_patterns(),
            fine_patterns: default_fine_patterns(),
            price_patterns: default_price_patterns(),
        }
    }
}
