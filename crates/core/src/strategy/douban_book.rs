//! Douban Books subject search (`/subject_search`).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{DoubanConfig, StrategyKind};
use crate::html::{ElementQuery, HtmlDocument, HtmlElement, HtmlParser, ScraperParser};
use crate::http::{HttpClient, HttpRequest};
use crate::resolver::{BookRecord, Query, RecordSource, TitleMatcher};

use super::{fetch_with_retry, RetryPolicy, Strategy, StrategyFailure};

/// Douban Books subject search strategy.
pub struct DoubanBookSearch<P: HtmlParser = ScraperParser> {
    http: Arc<dyn HttpClient>,
    parser: P,
    matcher: TitleMatcher,
    retry: RetryPolicy,
    base_url: String,
    max_candidates: usize,
}

impl DoubanBookSearch<ScraperParser> {
    pub fn new(
        http: Arc<dyn HttpClient>,
        matcher: TitleMatcher,
        retry: RetryPolicy,
        config: &DoubanConfig,
    ) -> Self {
        Self::with_parser(http, ScraperParser, matcher, retry, config)
    }
}

impl<P: HtmlParser> DoubanBookSearch<P> {
    pub fn with_parser(
        http: Arc<dyn HttpClient>,
        parser: P,
        matcher: TitleMatcher,
        retry: RetryPolicy,
        config: &DoubanConfig,
    ) -> Self {
        Self {
            http,
            parser,
            matcher,
            retry,
            base_url: config.book_url.trim_end_matches('/').to_string(),
            max_candidates: config.candidates_per_technique,
        }
    }

    fn search_url(&self, title: &str) -> String {
        format!(
            "{}/subject_search?search_text={}",
            self.base_url,
            urlencoding::encode(title.trim())
        )
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}/{}", self.base_url, href.trim_start_matches('/'))
        }
    }

    fn extract(&self, body: &str, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let document = self.parser.parse(body);
        let items = document.root().find_all_any(&[
            ElementQuery::tag("li").with_class("subject-item"),
            ElementQuery::tag("div").with_class("pic"),
        ]);

        for item in items.into_iter().take(self.max_candidates) {
            let Some((found, href)) = item_title(item) else {
                continue;
            };
            if !self.matcher.is_match(&query.title, &found) {
                continue;
            }

            let mut record = BookRecord::new(found, RecordSource::DoubanBook);
            record.url = Some(self.absolute_url(href));
            record.rating = item
                .find(&ElementQuery::tag("span").with_class("rating_nums"))
                .and_then(|span| span.text().trim().parse::<f64>().ok());
            record.author = query.author.clone().unwrap_or_default();

            debug!(title = %record.title, "Matched subject search item");
            return Ok(record);
        }

        Err(StrategyFailure::NoMatch)
    }
}

/// First link in the item carrying a title, either as text or as a `title` attribute.
fn item_title<'a, E: HtmlElement<'a>>(item: E) -> Option<(String, &'a str)> {
    item.find_all(&ElementQuery::tag("a").with_attr("href"))
        .into_iter()
        .find_map(|link| {
            let href = link.attr("href")?;
            let text = link.text();
            let title = if text.trim().is_empty() {
                link.attr("title").unwrap_or_default().trim().to_string()
            } else {
                text.trim().to_string()
            };
            (!title.is_empty()).then_some((title, href))
        })
}

#[async_trait]
impl<P: HtmlParser> Strategy for DoubanBookSearch<P> {
    fn name(&self) -> &str {
        StrategyKind::DoubanBook.as_str()
    }

    async fn attempt(&self, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let request = HttpRequest::get(self.search_url(&query.title), self.retry.first_timeout);
        let response = fetch_with_retry(self.http.as_ref(), &request, &self.retry).await?;

        if response.body.trim().is_empty() {
            return Err(StrategyFailure::Malformed("empty subject search page".to_string()));
        }

        self.extract(&response.body, query)
    }
}
