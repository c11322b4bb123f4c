//! Douban site-wide search (`/search?cat=1001`).
//!
//! The results page is inspected with three techniques in order, stopping at
//! the first that yields a matching record: structured result blocks, any
//! link pointing at a book subject, and finally a plain-text scan.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use crate::config::{DoubanConfig, StrategyKind};
use crate::html::{ElementQuery, HtmlDocument, HtmlElement, HtmlParser, ScraperParser};
use crate::http::{HttpClient, HttpRequest};
use crate::resolver::{BookRecord, Query, RecordSource, TitleMatcher};

use super::{fetch_with_retry, RetryPolicy, Strategy, StrategyFailure};

static REDIRECT_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url=([^&]+)").expect("valid redirect regex"));

static SUBJECT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://book\.douban\.com/subject/\d+/?").expect("valid subject regex")
});

/// Douban book-category search URL for `title`.
pub fn douban_search_url(base_url: &str, title: &str) -> String {
    format!(
        "{}/search?cat=1001&q={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(title.trim())
    )
}

/// Douban site-wide search strategy.
pub struct DoubanWebSearch<P: HtmlParser = ScraperParser> {
    http: Arc<dyn HttpClient>,
    parser: P,
    matcher: TitleMatcher,
    retry: RetryPolicy,
    base_url: String,
    max_candidates: usize,
}

impl DoubanWebSearch<ScraperParser> {
    pub fn new(
        http: Arc<dyn HttpClient>,
        matcher: TitleMatcher,
        retry: RetryPolicy,
        config: &DoubanConfig,
    ) -> Self {
        Self::with_parser(http, ScraperParser, matcher, retry, config)
    }
}

impl<P: HtmlParser> DoubanWebSearch<P> {
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
            base_url: config.web_url.clone(),
            max_candidates: config.candidates_per_technique,
        }
    }

    fn extract(&self, body: &str, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let document = self.parser.parse(body);
        let root = document.root();

        if let Some(record) = self.from_result_blocks(root, query) {
            debug!(title = %record.title, "Matched structured search result");
            return Ok(record);
        }
        if let Some(record) = self.from_subject_links(root, query) {
            debug!(title = %record.title, "Matched subject link");
            return Ok(record);
        }
        if let Some(record) = self.from_page_text(&document.text(), body, query) {
            debug!(title = %record.title, "Matched page text");
            return Ok(record);
        }

        Err(StrategyFailure::NoMatch)
    }

    /// `div.result > div.content > div.title > h3 > a`, with rating and cast alongside.
    fn from_result_blocks<'a, E: HtmlElement<'a>>(
        &self,
        root: E,
        query: &Query,
    ) -> Option<BookRecord> {
        let results = root.find_all(&ElementQuery::tag("div").with_class("result"));

        for result in results.into_iter().take(self.max_candidates) {
            let Some(title_block) = result
                .find(&ElementQuery::tag("div").with_class("content"))
                .and_then(|content| content.find(&ElementQuery::tag("div").with_class("title")))
            else {
                continue;
            };
            let Some(link) = title_block
                .find(&ElementQuery::tag("h3"))
                .and_then(|h3| h3.find(&ElementQuery::tag("a").with_attr("href")))
            else {
                continue;
            };

            let found = clean_title(&link.text());
            if !self.matcher.is_match(&query.title, &found) {
                continue;
            }

            let mut record = BookRecord::new(found, RecordSource::DoubanWeb);
            record.url = link.attr("href").map(unwrap_redirect).filter(|u| !u.is_empty());

            if let Some(info) =
                title_block.find(&ElementQuery::tag("div").with_class("rating-info"))
            {
                record.rating = find_rating(info);
                if let Some((author, publisher)) = find_cast(info) {
                    record.author = author;
                    record.publisher = publisher;
                }
            }
            if record.author.is_empty() {
                record.author = query.author.clone().unwrap_or_default();
            }
            return Some(record);
        }

        None
    }

    /// Any link to a book subject (direct or via the `link2` redirector) whose
    /// text loosely contains the title. Rating and cast are looked up in the
    /// nearest three ancestors.
    fn from_subject_links<'a, E: HtmlElement<'a>>(
        &self,
        root: E,
        query: &Query,
    ) -> Option<BookRecord> {
        let candidates = root
            .find_all(&ElementQuery::tag("a").with_attr("href"))
            .into_iter()
            .filter(|link| {
                let href = link.attr("href").unwrap_or_default();
                (href.contains("book.douban.com/subject") || href.contains("link2"))
                    && self.matcher.loosely_contains(&link.text(), &query.title)
            })
            .take(self.max_candidates);

        for link in candidates {
            let found = clean_title(&link.text());
            if !self.matcher.is_match(&query.title, &found) {
                continue;
            }

            let mut record = BookRecord::new(found, RecordSource::DoubanWeb);
            record.url = link.attr("href").map(unwrap_redirect).filter(|u| !u.is_empty());

            let mut cast = None;
            let mut ancestor = link.parent();
            for _ in 0..3 {
                let Some(element) = ancestor else {
                    break;
                };
                if record.rating.is_none() {
                    record.rating = find_rating(element);
                }
                if cast.is_none() {
                    cast = find_cast(element);
                }
                if record.rating.is_some() && cast.is_some() {
                    break;
                }
                ancestor = element.parent();
            }

            match cast {
                Some((author, publisher)) if !author.is_empty() => {
                    record.author = author;
                    record.publisher = publisher;
                }
                _ => record.author = query.author.clone().unwrap_or_default(),
            }
            return Some(record);
        }

        None
    }

    /// Last resort: the page mentions the title and links at least one subject.
    fn from_page_text(&self, text: &str, body: &str, query: &Query) -> Option<BookRecord> {
        let title = query.title.trim();
        if !text.contains(title) {
            return None;
        }
        let url = SUBJECT_URL.find(body)?.as_str().to_string();

        let mut record = BookRecord::new(title, RecordSource::DoubanWeb);
        record.author = query.author.clone().unwrap_or_default();
        record.url = Some(url);
        Some(record)
    }
}

#[async_trait]
impl<P: HtmlParser> Strategy for DoubanWebSearch<P> {
    fn name(&self) -> &str {
        StrategyKind::DoubanWeb.as_str()
    }

    async fn attempt(&self, query: &Query) -> Result<BookRecord, StrategyFailure> {
        let url = douban_search_url(&self.base_url, &query.title);
        let request = HttpRequest::get(url, self.retry.first_timeout);
        let response = fetch_with_retry(self.http.as_ref(), &request, &self.retry).await?;

        if response.body.trim().is_empty() {
            return Err(StrategyFailure::Malformed("empty search page".to_string()));
        }

        self.extract(&response.body, query)
    }
}

/// Strip the `[书籍]` marker and collapse whitespace.
fn clean_title(raw: &str) -> String {
    raw.replace("[书籍]", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `link2/?url=<encoded>` redirector links to their target.
fn unwrap_redirect(href: &str) -> String {
    if href.contains("link2") {
        if let Some(target) = REDIRECT_TARGET.captures(href).and_then(|c| c.get(1)) {
            if let Ok(decoded) = urlencoding::decode(target.as_str()) {
                return decoded.into_owned();
            }
        }
    }
    href.to_string()
}

fn find_rating<'a, E: HtmlElement<'a>>(scope: E) -> Option<f64> {
    scope
        .find(&ElementQuery::tag("span").with_class("rating_nums"))
        .and_then(|span| span.text().trim().parse::<f64>().ok())
}

/// `span.subject-cast` reads "author / publisher / year".
fn find_cast<'a, E: HtmlElement<'a>>(scope: E) -> Option<(String, String)> {
    let cast = scope.find(&ElementQuery::tag("span").with_class("subject-cast"))?;
    let text = cast.text();
    let mut parts = text.split('/').map(str::trim);
    let author = parts.next().unwrap_or_default().to_string();
    let publisher = parts.next().unwrap_or_default().to_string();
    Some((author, publisher))
}
