//! Google Books volumes search.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{GoogleBooksConfig, StrategyKind};
use crate::http::{HttpClient, HttpRequest};
use crate::resolver::{BookRecord, Query, RecordSource, TitleMatcher};

use super::{fetch_with_retry, RetryPolicy, Strategy, StrategyFailure};

const MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    average_rating: Option<f64>,
    info_link: Option<String>,
}

/// Google Books `volumes` strategy.
///
/// Ratings are passed through on Google's 0-5 scale.
pub struct GoogleBooksSearch {
    http: Arc<dyn HttpClient>,
    matcher: TitleMatcher,
    retry: RetryPolicy,
    base_url: String,
}

impl GoogleBooksSearch {
    pub fn new(
        http: Arc<dyn HttpClient>,
        matcher: TitleMatcher,
        retry: RetryPolicy,
        config: &GoogleBooksConfig,
    ) -> Self {
        Self {
            http,
            matcher,
            retry,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &Query) -> String {
        let mut terms = format!("intitle:{}", urlencoding::encode(query.title.trim()));
        if let Some(author) = query.author.as_deref().filter(|a| !a.trim().is_empty()) {
            terms.push_str("+inauthor:");
            terms.push_str(&urlencoding::encode(author.trim()));
        }
        format!(
            "{}/volumes?q={}&maxResults={}",
            self.base_url, terms, MAX_RESULTS
        )
    }

    fn pick(&self, response: VolumesResponse, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let info = response
            .items
            .into_iter()
            .map(|volume| volume.volume_info)
            .find(|info| {
                info.title
                    .as_deref()
                    .is_some_and(|title| self.matcher.is_match(&query.title, title))
            })
            .ok_or(StrategyFailure::NoMatch)?;

        let mut record = BookRecord::new(
            info.title.unwrap_or_default().trim(),
            RecordSource::GoogleBooks,
        );
        record.author = if info.authors.is_empty() {
            query.author.clone().unwrap_or_default()
        } else {
            info.authors.join(", ")
        };
        record.publisher = info.publisher.unwrap_or_default();
        record.rating = info.average_rating;
        record.url = info.info_link;

        debug!(title = %record.title, "Matched Google Books volume");
        Ok(record)
    }
}

#[async_trait]
impl Strategy for GoogleBooksSearch {
    fn name(&self) -> &str {
        StrategyKind::GoogleBooks.as_str()
    }

    async fn attempt(&self, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let request = HttpRequest::get(self.search_url(query), self.retry.first_timeout)
            .with_header("Accept", "application/json");
        let response = fetch_with_retry(self.http.as_ref(), &request, &self.retry).await?;

        let parsed: VolumesResponse = serde_json::from_str(&response.body)
            .map_err(|e| StrategyFailure::Malformed(format!("invalid volumes JSON: {}", e)))?;

        self.pick(parsed, query)
    }
}
