//! Resolver lifecycle integration tests.
//!
//! These tests drive the full resolve path through the public API:
//! validate -> cache lookup -> strategy race -> fallback -> cache -> enrich

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use bookfinder_core::{
    config::{CacheConfig, DoubanConfig, RetryConfig},
    resolver::FallbackSynthesizer,
    strategy::{DoubanBookSearch, DoubanWebSearch, RetryPolicy},
    testing::{fixtures, MockCommentEnricher, MockHttpClient, MockStrategy},
    BookCache, Config, DoubanCommentEnricher, HttpClient, HttpResponse, Query, RecordSource,
    ResolveError, Resolver, Strategy, StrategyExecutor, StrategyFailure, TitleMatcher,
};

/// Test helper wiring mock strategies into a resolver.
struct TestHarness {
    primary: Arc<MockStrategy>,
    secondary: Arc<MockStrategy>,
    enricher: Arc<MockCommentEnricher>,
    resolver: Resolver,
}

impl TestHarness {
    fn new(primary: MockStrategy, secondary: MockStrategy) -> Self {
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let enricher = Arc::new(MockCommentEnricher::with_comments(fixtures::comments(4)));

        let strategies: Vec<Arc<dyn Strategy>> = vec![primary.clone(), secondary.clone()];
        let resolver = Resolver::new(
            Arc::new(BookCache::new(&CacheConfig::default())),
            StrategyExecutor::new(2, Duration::from_secs(8)),
            strategies,
            FallbackSynthesizer::default(),
        )
        .with_comment_enricher(enricher.clone(), 3);

        Self {
            primary,
            secondary,
            enricher,
            resolver,
        }
    }

    async fn total_calls(&self) -> usize {
        self.primary.call_count().await + self.secondary.call_count().await
    }
}

#[tokio::test]
async fn test_fallback_invariant() {
    let harness = TestHarness::new(
        MockStrategy::failing("web", StrategyFailure::Transport("reset".into())),
        MockStrategy::failing("book", StrategyFailure::NoMatch),
    );
    let query = Query::new("直抵人心的写作").unwrap();

    let record = harness.resolver.resolve(&query).await.unwrap();

    assert_eq!(record.title, query.title);
    assert_eq!(record.source, RecordSource::Fallback);
    assert!(record.rating.is_none());
    assert!(record
        .url
        .as_deref()
        .unwrap()
        .starts_with("https://www.douban.com/search?cat=1001&q="));
}

#[tokio::test]
async fn test_cache_hit_determinism() {
    let harness = TestHarness::new(
        MockStrategy::succeeding("web", fixtures::book_record("活着")),
        MockStrategy::failing("book", StrategyFailure::NoMatch),
    );
    let query = Query::new("活着").unwrap();

    let first = harness.resolver.resolve(&query).await.unwrap();
    let calls_after_first = harness.total_calls().await;
    let second = harness.resolver.resolve(&query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(harness.total_calls().await, calls_after_first);
    assert_eq!(harness.primary.call_count().await, 1);
}

#[tokio::test]
async fn test_cache_key_ignores_comment_flag_and_case() {
    let harness = TestHarness::new(
        MockStrategy::succeeding("web", fixtures::book_record("Clean Code")),
        MockStrategy::failing("book", StrategyFailure::NoMatch),
    );

    harness
        .resolver
        .resolve(&Query::new("Clean Code").unwrap())
        .await
        .unwrap();
    let record = harness
        .resolver
        .resolve(&Query::new("  clean code ").unwrap().with_comments(true))
        .await
        .unwrap();

    assert_eq!(harness.primary.call_count().await, 1);
    assert_eq!(record.short_comments.map(|c| c.len()), Some(3));
}

#[tokio::test]
async fn test_enrichment_isolation() {
    let harness = TestHarness::new(
        MockStrategy::succeeding("web", fixtures::book_record("活着")),
        MockStrategy::failing("book", StrategyFailure::NoMatch),
    );
    harness.enricher.set_comments(Vec::new()).await;

    let record = harness
        .resolver
        .resolve(&Query::new("活着").unwrap().with_comments(true))
        .await
        .unwrap();

    assert_eq!(record.title, "活着");
    assert_eq!(record.rating, Some(9.4));
    assert_eq!(record.short_comments, Some(Vec::new()));
    assert_eq!(harness.enricher.fetch_count().await, 1);
}

#[tokio::test]
async fn test_faster_strategy_wins() {
    let mut slow_record = fixtures::book_record("活着");
    slow_record.source = RecordSource::DoubanWeb;
    let mut fast_record = fixtures::book_record("活着");
    fast_record.source = RecordSource::DoubanBook;

    let harness = TestHarness::new(
        MockStrategy::succeeding("web", slow_record).with_delay(Duration::from_millis(500)),
        MockStrategy::succeeding("book", fast_record).with_delay(Duration::from_millis(50)),
    );

    let started = std::time::Instant::now();
    let record = harness
        .resolver
        .resolve(&Query::new("活着").unwrap())
        .await
        .unwrap();

    assert_eq!(record.source, RecordSource::DoubanBook);
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test]
async fn test_invalid_query_is_rejected() {
    let harness = TestHarness::new(
        MockStrategy::succeeding("web", fixtures::book_record("活着")),
        MockStrategy::failing("book", StrategyFailure::NoMatch),
    );
    let query: Query = serde_json::from_str(r#"{"title": ""}"#).unwrap();

    let err = harness.resolver.resolve(&query).await.unwrap_err();
    assert_eq!(err, ResolveError::InvalidInput("title must not be empty".into()));
    assert_eq!(harness.total_calls().await, 0);
}

#[tokio::test]
async fn test_concurrent_resolves_share_cache() {
    let harness = TestHarness::new(
        MockStrategy::succeeding("web", fixtures::book_record("活着"))
            .with_delay(Duration::from_millis(20)),
        MockStrategy::failing("book", StrategyFailure::NoMatch),
    );
    let titles = ["活着", "许三观卖血记", "兄弟", "第七天"];

    let results = join_all(titles.iter().map(|title| {
        let resolver = &harness.resolver;
        async move { resolver.resolve(&Query::new(*title).unwrap()).await }
    }))
    .await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(harness.resolver.cache().len().await, titles.len());

    // Every title is now cached; a second round runs no strategies.
    let calls = harness.total_calls().await;
    join_all(titles.iter().map(|title| {
        let resolver = &harness.resolver;
        async move { resolver.resolve(&Query::new(*title).unwrap()).await }
    }))
    .await;
    assert_eq!(harness.total_calls().await, calls);
}

/// Douban strategies and comment enricher over a scripted HTTP client.
#[tokio::test]
async fn test_douban_pipeline_over_mock_http() {
    let douban = DoubanConfig {
        web_url: "http://www.douban.test".to_string(),
        book_url: "https://book.douban.com".to_string(),
        ..DoubanConfig::default()
    };
    let retry = RetryPolicy::from(&RetryConfig {
        first_timeout_ms: 100,
        retry_timeout_ms: 100,
        backoff_ms: 5,
    });

    let http = Arc::new(MockHttpClient::new());
    http.respond(
        "http://www.douban.test/search?cat=1001&q=%E6%B4%BB%E7%9D%80",
        HttpResponse::new(200, fixtures::DOUBAN_WEB_RESULTS),
    )
    .await;
    http.respond(
        "https://book.douban.com/subject/4913064/",
        HttpResponse::new(200, fixtures::DOUBAN_COMMENTS_PAGE),
    )
    .await;

    let client: Arc<dyn HttpClient> = http.clone();
    let strategies: Vec<Arc<dyn Strategy>> = vec![
        Arc::new(DoubanWebSearch::new(
            client.clone(),
            TitleMatcher::default(),
            retry.clone(),
            &douban,
        )),
        // Book search has nothing scripted and fails with a transport error.
        Arc::new(DoubanBookSearch::new(
            client.clone(),
            TitleMatcher::default(),
            retry,
            &douban,
        )),
    ];
    let resolver = Resolver::new(
        Arc::new(BookCache::default()),
        StrategyExecutor::new(2, Duration::from_secs(8)),
        strategies,
        FallbackSynthesizer::with_config(&douban),
    )
    .with_comment_enricher(Arc::new(DoubanCommentEnricher::new(client, &douban)), 3);

    let record = resolver
        .resolve(&Query::new("活着").unwrap().with_comments(true))
        .await
        .unwrap();

    assert_eq!(record.source, RecordSource::DoubanWeb);
    assert_eq!(record.author, "余华");
    assert_eq!(
        record.url.as_deref(),
        Some("https://book.douban.com/subject/4913064/")
    );
    let comments = record.short_comments.unwrap();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0].rating, Some(5));
}

#[test]
fn test_production_resolver_from_default_config() {
    let config = Config::default();
    let http: Arc<dyn HttpClient> = Arc::new(MockHttpClient::new());
    let resolver = Resolver::from_config(&config, http);
    assert_eq!(resolver.strategy_names(), vec!["douban_web", "douban_book"]);
}
