//! The resolve pipeline: cache, race, fallback, enrichment.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::comments::{CommentEnricher, DoubanCommentEnricher};
use crate::config::{Config, ResolverConfig, StrategyKind};
use crate::http::HttpClient;
use crate::metrics::{CACHE_LOOKUPS, RESOLUTIONS_TOTAL, RESOLVE_DURATION};
use crate::strategy::{
    DoubanBookSearch, DoubanWebSearch, GoogleBooksSearch, OpenLibrarySearch, RetryPolicy,
    Strategy,
};

use super::cache::{BookCache, CacheKey};
use super::executor::StrategyExecutor;
use super::fallback::FallbackSynthesizer;
use super::matcher::TitleMatcher;
use super::types::{BookRecord, Comment, Query, ResolveError};

/// Resolves queries into book records.
///
/// Cheap to share behind an `Arc`; every call goes through the same cache.
pub struct Resolver {
    cache: Arc<BookCache>,
    executor: StrategyExecutor,
    strategies: Vec<Arc<dyn Strategy>>,
    fallback: FallbackSynthesizer,
    enricher: Option<Arc<dyn CommentEnricher>>,
    comment_limit: usize,
}

impl Resolver {
    pub fn new(
        cache: Arc<BookCache>,
        executor: StrategyExecutor,
        strategies: Vec<Arc<dyn Strategy>>,
        fallback: FallbackSynthesizer,
    ) -> Self {
        Self {
            cache,
            executor,
            strategies,
            fallback,
            enricher: None,
            comment_limit: ResolverConfig::default().comment_limit,
        }
    }

    /// Build the production resolver: every strategy the config enables,
    /// sharing `http`, and the Douban comment enricher when comments are
    /// enabled.
    pub fn from_config(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let matcher = TitleMatcher::with_config(&config.matcher);
        let retry = RetryPolicy::from(&config.retry);

        let strategies: Vec<Arc<dyn Strategy>> = config
            .enabled_strategies()
            .into_iter()
            .map(|kind| -> Arc<dyn Strategy> {
                let http = Arc::clone(&http);
                let matcher = matcher.clone();
                let retry = retry.clone();
                match kind {
                    StrategyKind::DoubanWeb => {
                        Arc::new(DoubanWebSearch::new(http, matcher, retry, &config.douban))
                    }
                    StrategyKind::DoubanBook => {
                        Arc::new(DoubanBookSearch::new(http, matcher, retry, &config.douban))
                    }
                    StrategyKind::OpenLibrary => Arc::new(OpenLibrarySearch::new(
                        http,
                        matcher,
                        retry,
                        &config.open_library,
                    )),
                    StrategyKind::GoogleBooks => Arc::new(GoogleBooksSearch::new(
                        http,
                        matcher,
                        retry,
                        &config.google_books,
                    )),
                }
            })
            .collect();

        let resolver = Self::new(
            Arc::new(BookCache::new(&config.cache)),
            StrategyExecutor::with_config(&config.resolver),
            strategies,
            FallbackSynthesizer::with_config(&config.douban),
        );

        if config.douban.comments_enabled {
            let enricher = Arc::new(DoubanCommentEnricher::new(http, &config.douban));
            resolver.with_comment_enricher(enricher, config.resolver.comment_limit)
        } else {
            resolver
        }
    }

    /// Attach a comment enricher used when a query asks for comments.
    pub fn with_comment_enricher(
        mut self,
        enricher: Arc<dyn CommentEnricher>,
        comment_limit: usize,
    ) -> Self {
        self.enricher = Some(enricher);
        self.comment_limit = comment_limit;
        self
    }

    pub fn cache(&self) -> &Arc<BookCache> {
        &self.cache
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn comments_enabled(&self) -> bool {
        self.enricher.is_some()
    }

    /// Resolve `query` into a record.
    ///
    /// Only an empty title is an error; when no strategy succeeds a fallback
    /// record is returned (and cached).
    pub async fn resolve(&self, query: &Query) -> Result<BookRecord, ResolveError> {
        if let Err(e) = query.validate() {
            RESOLUTIONS_TOTAL.with_label_values(&["invalid"]).inc();
            return Err(e);
        }

        let started = Instant::now();
        let key = CacheKey::from(query);

        let (mut record, outcome) = match self.cache.get(&key).await {
            Some(entry) => {
                CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                debug!(title = %query.title, "Cache hit");
                (entry.record, "cache_hit")
            }
            None => {
                CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                let (record, outcome) = match self.executor.race(query, &self.strategies).await {
                    Some(record) => (record, "matched"),
                    None => (self.fallback.synthesize(query), "fallback"),
                };

                let mut cached = record.clone();
                cached.short_comments = None;
                self.cache.put(key, cached).await;
                (record, outcome)
            }
        };

        record.short_comments = if query.include_comments {
            Some(self.comments_for(&record).await)
        } else {
            None
        };

        let elapsed = started.elapsed();
        RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();
        RESOLVE_DURATION
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());
        info!(
            title = %query.title,
            outcome,
            source = %record.source,
            elapsed_ms = elapsed.as_millis() as u64,
            "Resolved book"
        );

        Ok(record)
    }

    /// Fetch short comments for an arbitrary detail URL.
    ///
    /// Empty when comments are disabled or the fetch fails.
    pub async fn fetch_comments(&self, url: &str, limit: usize) -> Vec<Comment> {
        match &self.enricher {
            Some(enricher) => enricher.fetch_comments(url, limit).await,
            None => Vec::new(),
        }
    }

    async fn comments_for(&self, record: &BookRecord) -> Vec<Comment> {
        if record.is_fallback() {
            return Vec::new();
        }
        let Some(url) = record.url.as_deref() else {
            return Vec::new();
        };
        let Some(enricher) = &self.enricher else {
            warn!(title = %record.title, "Comments requested but no enricher is configured");
            return Vec::new();
        };
        enricher.fetch_comments(url, self.comment_limit).await
    }
}
