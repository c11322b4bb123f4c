//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock strategies and a mock comment enricher injected, enabling
//! E2E testing without network access.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use bookfinder_core::{
    resolver::FallbackSynthesizer,
    testing::{MockCommentEnricher, MockStrategy},
    BookCache, Config, Resolver, Strategy, StrategyExecutor, StrategyFailure,
};
use bookfinder_server::state::AppState;

/// Re-export fixtures for test convenience
pub use bookfinder_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - Two retrieval strategies (MockStrategy), named like the production ones
/// - Short comment fetching (MockCommentEnricher)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_resolve() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/books/resolve", json!({
///         "title": "活着"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Strategy registered first ("douban_web")
    pub web: Arc<MockStrategy>,
    /// Strategy registered second ("douban_book")
    pub book: Arc<MockStrategy>,
    /// Comment enricher - configure returned comments
    pub enricher: Arc<MockCommentEnricher>,
    /// Shared state, for inspecting the cache directly
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture whose first strategy resolves every title to `活着`.
    pub async fn new() -> Self {
        Self::with_strategies(
            MockStrategy::succeeding("douban_web", fixtures::book_record("活着")),
            MockStrategy::failing("douban_book", StrategyFailure::NoMatch),
        )
    }

    /// Create a fixture where every strategy fails, so every resolve falls back.
    pub async fn failing() -> Self {
        Self::with_strategies(
            MockStrategy::failing("douban_web", StrategyFailure::Transport("reset".into())),
            MockStrategy::failing("douban_book", StrategyFailure::NoMatch),
        )
    }

    pub fn with_strategies(web: MockStrategy, book: MockStrategy) -> Self {
        let config = Config::default();
        let web = Arc::new(web);
        let book = Arc::new(book);
        let enricher = Arc::new(MockCommentEnricher::with_comments(fixtures::comments(5)));

        let strategies: Vec<Arc<dyn Strategy>> = vec![web.clone(), book.clone()];
        let resolver = Resolver::new(
            Arc::new(BookCache::new(&config.cache)),
            StrategyExecutor::new(2, Duration::from_secs(2)),
            strategies,
            FallbackSynthesizer::with_config(&config.douban),
        )
        .with_comment_enricher(enricher.clone(), config.resolver.comment_limit);

        let state = Arc::new(AppState::new(config, Arc::new(resolver)));
        let router = bookfinder_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            web,
            book,
            enricher,
            state,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await.0
    }

    /// GET a non-JSON endpoint and return status and body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (response, bytes) = self.send(request).await;
        (response.status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await.0
    }

    async fn send(&self, request: Request<Body>) -> (TestResponse, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (TestResponse { status, body }, body_bytes.to_vec())
    }
}
