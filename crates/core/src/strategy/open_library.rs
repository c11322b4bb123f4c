//! Open Library JSON search.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{OpenLibraryConfig, StrategyKind};
use crate::http::{HttpClient, HttpRequest};
use crate::resolver::{BookRecord, Query, RecordSource, TitleMatcher};

use super::{fetch_with_retry, RetryPolicy, Strategy, StrategyFailure};

const RESULT_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    publisher: Vec<String>,
    key: Option<String>,
}

/// Open Library `search.json` strategy.
pub struct OpenLibrarySearch {
    http: Arc<dyn HttpClient>,
    matcher: TitleMatcher,
    retry: RetryPolicy,
    base_url: String,
}

impl OpenLibrarySearch {
    pub fn new(
        http: Arc<dyn HttpClient>,
        matcher: TitleMatcher,
        retry: RetryPolicy,
        config: &OpenLibraryConfig,
    ) -> Self {
        Self {
            http,
            matcher,
            retry,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &Query) -> String {
        let mut url = format!(
            "{}/search.json?title={}&limit={}",
            self.base_url,
            urlencoding::encode(query.title.trim()),
            RESULT_LIMIT
        );
        if let Some(author) = query.author.as_deref().filter(|a| !a.trim().is_empty()) {
            url.push_str("&author=");
            url.push_str(&urlencoding::encode(author.trim()));
        }
        url
    }

    fn pick(&self, response: SearchResponse, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let doc = response
            .docs
            .into_iter()
            .find(|doc| {
                doc.title
                    .as_deref()
                    .is_some_and(|title| self.matcher.is_match(&query.title, title))
            })
            .ok_or(StrategyFailure::NoMatch)?;

        let mut record = BookRecord::new(
            doc.title.unwrap_or_default().trim(),
            RecordSource::OpenLibrary,
        );
        record.author = if doc.author_name.is_empty() {
            query.author.clone().unwrap_or_default()
        } else {
            doc.author_name.join(", ")
        };
        record.publisher = doc.publisher.join(", ");
        record.url = doc.key.map(|key| format!("{}{}", self.base_url, key));

        debug!(title = %record.title, "Matched Open Library document");
        Ok(record)
    }
}

#[async_trait]
impl Strategy for OpenLibrarySearch {
    fn name(&self) -> &str {
        StrategyKind::OpenLibrary.as_str()
    }

    async fn attempt(&self, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let request = HttpRequest::get(self.search_url(query), self.retry.first_timeout)
            .with_header("Accept", "application/json");
        let response = fetch_with_retry(self.http.as_ref(), &request, &self.retry).await?;

        let parsed: SearchResponse = serde_json::from_str(&response.body)
            .map_err(|e| StrategyFailure::Malformed(format!("invalid search JSON: {}", e)))?;

        self.pick(parsed, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::testing::{fixtures, MockHttpClient};
    use std::time::Duration;

    const BASE: &str = "http://openlibrary.test";

    fn strategy(http: Arc<MockHttpClient>) -> OpenLibrarySearch {
        let config = OpenLibraryConfig {
            enabled: true,
            url: BASE.to_string(),
        };
        let retry = RetryPolicy {
            first_timeout: Duration::from_millis(100),
            retry_timeout: Duration::from_millis(100),
            backoff: Duration::from_millis(5),
        };
        OpenLibrarySearch::new(http, TitleMatcher::default(), retry, &config)
    }

    #[test]
    fn test_search_url_includes_author() {
        let s = strategy(Arc::new(MockHttpClient::new()));
        let query = Query::new("Clean Code").unwrap().with_author("Robert Martin");
        assert_eq!(
            s.search_url(&query),
            "http://openlibrary.test/search.json?title=Clean%20Code&limit=5&author=Robert%20Martin"
        );
    }

    #[tokio::test]
    async fn test_matching_document() {
        let http = Arc::new(MockHttpClient::new());
        let query = Query::new("Clean Code").unwrap();
        let s = strategy(http.clone());
        http.respond(
            &s.search_url(&query),
            HttpResponse::new(200, fixtures::OPEN_LIBRARY_RESULTS),
        )
        .await;

        let record = s.attempt(&query).await.unwrap();
        assert_eq!(record.title, "Clean Code");
        assert_eq!(record.author, "Robert C. Martin");
        assert_eq!(record.publisher, "Prentice Hall, Pearson");
        assert_eq!(
            record.url.as_deref(),
            Some("http://openlibrary.test/works/OL17618370W")
        );
        assert_eq!(record.source, RecordSource::OpenLibrary);
    }

    #[tokio::test]
    async fn test_no_matching_document() {
        let http = Arc::new(MockHttpClient::new());
        let query = Query::new("The Pragmatic Programmer").unwrap();
        let s = strategy(http.clone());
        http.respond(
            &s.search_url(&query),
            HttpResponse::new(200, fixtures::OPEN_LIBRARY_RESULTS),
        )
        .await;

        assert_eq!(s.attempt(&query).await.unwrap_err(), StrategyFailure::NoMatch);
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let http = Arc::new(MockHttpClient::new());
        let query = Query::new("Clean Code").unwrap();
        let s = strategy(http.clone());
        http.respond(&s.search_url(&query), HttpResponse::new(200, "<html>"))
            .await;

        assert!(matches!(
            s.attempt(&query).await,
            Err(StrategyFailure::Malformed(_))
        ));
    }
}
