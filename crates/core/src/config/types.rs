use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub douban: DoubanConfig,
    #[serde(default)]
    pub open_library: OpenLibraryConfig,
    #[serde(default)]
    pub google_books: GoogleBooksConfig,
}

impl Config {
    /// Strategies registered for this config, in race submission order.
    pub fn enabled_strategies(&self) -> Vec<StrategyKind> {
        let mut kinds = vec![StrategyKind::DoubanWeb, StrategyKind::DoubanBook];
        if self.open_library.enabled {
            kinds.push(StrategyKind::OpenLibrary);
        }
        if self.google_books.enabled {
            kinds.push(StrategyKind::GoogleBooks);
        }
        kinds
    }
}

/// The retrieval strategies a config can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    DoubanWeb,
    DoubanBook,
    OpenLibrary,
    GoogleBooks,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::DoubanWeb => "douban_web",
            StrategyKind::DoubanBook => "douban_book",
            StrategyKind::OpenLibrary => "open_library",
            StrategyKind::GoogleBooks => "google_books",
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Resolution engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Overall deadline for one strategy race in milliseconds (default: 8000).
    #[serde(default = "default_race_deadline_ms")]
    pub race_deadline_ms: u64,
    /// Maximum number of strategies running at once (default: 2).
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Abort still-running strategies once a winner is found (default: true).
    #[serde(default = "default_abort_losers")]
    pub abort_losers: bool,
    /// Number of short comments fetched per record (default: 3).
    #[serde(default = "default_comment_limit")]
    pub comment_limit: usize,
}

impl ResolverConfig {
    pub fn race_deadline(&self) -> Duration {
        Duration::from_millis(self.race_deadline_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            race_deadline_ms: default_race_deadline_ms(),
            pool_size: default_pool_size(),
            abort_losers: default_abort_losers(),
            comment_limit: default_comment_limit(),
        }
    }
}

fn default_race_deadline_ms() -> u64 {
    8000
}

fn default_pool_size() -> usize {
    2
}

fn default_abort_losers() -> bool {
    true
}

fn default_comment_limit() -> usize {
    3
}

/// Title matcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatcherConfig {
    /// Minimum `len(shorter) / len(longer)` for a containment match (default: 0.7).
    #[serde(default = "default_min_containment_ratio")]
    pub min_containment_ratio: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_containment_ratio: default_min_containment_ratio(),
        }
    }
}

fn default_min_containment_ratio() -> f64 {
    0.7
}

/// In-memory record cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds (default: 3600).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum number of entries (default: 1000).
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Share of entries evicted when the cache is full (default: 0.1).
    #[serde(default = "default_eviction_fraction")]
    pub eviction_fraction: f64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_size: default_max_size(),
            eviction_fraction: default_eviction_fraction(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_max_size() -> usize {
    1000
}

fn default_eviction_fraction() -> f64 {
    0.1
}

/// Per-strategy fetch retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Timeout of the first attempt in milliseconds (default: 5000).
    #[serde(default = "default_first_timeout_ms")]
    pub first_timeout_ms: u64,
    /// Timeout of the single retry in milliseconds (default: 7000).
    #[serde(default = "default_retry_timeout_ms")]
    pub retry_timeout_ms: u64,
    /// Fixed pause between the two attempts in milliseconds (default: 500).
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            first_timeout_ms: default_first_timeout_ms(),
            retry_timeout_ms: default_retry_timeout_ms(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_first_timeout_ms() -> u64 {
    5000
}

fn default_retry_timeout_ms() -> u64 {
    7000
}

fn default_backoff_ms() -> u64 {
    500
}

/// Douban scraping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DoubanConfig {
    /// Douban web search base URL.
    #[serde(default = "default_web_url")]
    pub web_url: String,
    /// Douban Books base URL.
    #[serde(default = "default_book_url")]
    pub book_url: String,
    /// Browser-like User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Candidates inspected per extraction technique (default: 3).
    #[serde(default = "default_candidates_per_technique")]
    pub candidates_per_technique: usize,
    /// Timeout for fetching a detail page for comments (default: 15).
    #[serde(default = "default_comment_timeout_secs")]
    pub comment_timeout_secs: u64,
    /// Whether short comments can be requested at all (default: true).
    #[serde(default = "default_comments_enabled")]
    pub comments_enabled: bool,
}

impl DoubanConfig {
    pub fn comment_timeout(&self) -> Duration {
        Duration::from_secs(self.comment_timeout_secs)
    }
}

impl Default for DoubanConfig {
    fn default() -> Self {
        Self {
            web_url: default_web_url(),
            book_url: default_book_url(),
            user_agent: default_user_agent(),
            candidates_per_technique: default_candidates_per_technique(),
            comment_timeout_secs: default_comment_timeout_secs(),
            comments_enabled: default_comments_enabled(),
        }
    }
}

fn default_web_url() -> String {
    "https://www.douban.com".to_string()
}

fn default_book_url() -> String {
    "https://book.douban.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_candidates_per_technique() -> usize {
    3
}

fn default_comment_timeout_secs() -> u64 {
    15
}

fn default_comments_enabled() -> bool {
    true
}

/// Open Library search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenLibraryConfig {
    /// Register the Open Library strategy (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Open Library base URL.
    #[serde(default = "default_open_library_url")]
    pub url: String,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_open_library_url(),
        }
    }
}

fn default_open_library_url() -> String {
    "https://openlibrary.org".to_string()
}

/// Google Books volumes search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleBooksConfig {
    /// Register the Google Books strategy (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Google Books API base URL.
    #[serde(default = "default_google_books_url")]
    pub url: String,
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_google_books_url(),
        }
    }
}

fn default_google_books_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

/// Public view of the config for API responses (request headers redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub matcher: MatcherConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub strategies: Vec<String>,
    pub comments_enabled: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let strategies = config
            .enabled_strategies()
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect();

        Self {
            server: config.server.clone(),
            resolver: config.resolver.clone(),
            matcher: config.matcher.clone(),
            cache: config.cache.clone(),
            retry: config.retry.clone(),
            strategies,
            comments_enabled: config.douban.comments_enabled,
        }
    }
}
