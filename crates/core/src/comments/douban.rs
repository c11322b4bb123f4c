use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Url;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::DoubanConfig;
use crate::html::{ElementQuery, HtmlDocument, HtmlElement, HtmlParser, ScraperParser};
use crate::http::{HttpClient, HttpRequest};
use crate::metrics::COMMENT_FETCHES;
use crate::resolver::Comment;

use super::CommentEnricher;

static STAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^allstar(\d)0rating$").expect("valid star regex"));

/// Star count encoded in a class token such as `allstar40rating`.
///
/// Only 1 to 5 stars are accepted.
pub fn decode_star_token(token: &str) -> Option<u8> {
    let digit = STAR_TOKEN.captures(token)?.get(1)?.as_str();
    let stars = digit.parse::<u8>().ok()?;
    (1..=5).contains(&stars).then_some(stars)
}

/// Reads short comments from Douban book detail pages.
pub struct DoubanCommentEnricher<P: HtmlParser = ScraperParser> {
    http: Arc<dyn HttpClient>,
    parser: P,
    timeout: Duration,
    detail_origin: Option<DetailOrigin>,
}

/// Host and explicit port that detail pages are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DetailOrigin {
    host: String,
    port: Option<u16>,
}

impl DetailOrigin {
    fn from_base_url(base: &str) -> Option<Self> {
        let url = Url::parse(base).ok()?;
        Some(Self {
            host: url.host_str()?.to_string(),
            port: url.port(),
        })
    }

    /// Whether `url` is an http(s) page under `/subject/` on this origin.
    fn owns(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        matches!(url.scheme(), "http" | "https")
            && url.host_str() == Some(self.host.as_str())
            && url.port() == self.port
            && url.path().starts_with("/subject/")
    }
}

impl DoubanCommentEnricher<ScraperParser> {
    pub fn new(http: Arc<dyn HttpClient>, config: &DoubanConfig) -> Self {
        Self::with_parser(http, ScraperParser, config)
    }
}

impl<P: HtmlParser> DoubanCommentEnricher<P> {
    pub fn with_parser(http: Arc<dyn HttpClient>, parser: P, config: &DoubanConfig) -> Self {
        let detail_origin = DetailOrigin::from_base_url(&config.book_url);
        if detail_origin.is_none() {
            warn!(book_url = %config.book_url, "Cannot derive detail page host, comments disabled");
        }
        Self {
            http,
            parser,
            timeout: config.comment_timeout(),
            detail_origin,
        }
    }

    fn is_detail_url(&self, url: &str) -> bool {
        self.detail_origin
            .as_ref()
            .is_some_and(|origin| origin.owns(url))
    }

    fn extract(&self, body: &str, limit: usize) -> Vec<Comment> {
        let document = self.parser.parse(body);
        let items = document.root().find_all_any(&[
            ElementQuery::tag("div").with_class("comment-item"),
            ElementQuery::tag("li").with_class("comment-item"),
            ElementQuery::tag("div").with_class("comment"),
        ]);

        let mut comments = Vec::new();
        for item in items {
            if comments.len() >= limit {
                break;
            }
            if let Some(comment) = parse_item(item) {
                comments.push(comment);
            }
        }
        comments
    }
}

fn parse_item<'a, E: HtmlElement<'a>>(item: E) -> Option<Comment> {
    let content = item
        .find_any(&[
            ElementQuery::tag("span").with_class("short"),
            ElementQuery::tag("p").with_class("comment-content"),
            ElementQuery::tag("div").with_class("comment-content"),
        ])
        .map(|el| el.text().trim().to_string())
        .filter(|text| !text.is_empty())?;

    let author = item
        .find_any(&[
            ElementQuery::tag("a").with_class("name"),
            ElementQuery::tag("a").with_attr_containing("href", "/people/"),
            ElementQuery::tag("span").with_class("comment-info"),
        ])
        .map(|el| el.text().trim().to_string())
        .unwrap_or_default();

    let rating = item
        .find(&ElementQuery::tag("span").with_class_prefix("allstar"))
        .and_then(|el| el.classes().into_iter().find_map(decode_star_token));

    let useful_count = item
        .find_any(&[
            ElementQuery::tag("span").with_class("vote-count"),
            ElementQuery::tag("span").with_class("votes"),
        ])
        .and_then(|el| el.text().trim().parse::<u32>().ok())
        .unwrap_or(0);

    Some(Comment {
        content,
        author,
        rating,
        useful_count,
    })
}

#[async_trait]
impl<P: HtmlParser> CommentEnricher for DoubanCommentEnricher<P> {
    async fn fetch_comments(&self, url: &str, limit: usize) -> Vec<Comment> {
        if limit == 0 {
            return Vec::new();
        }
        if !self.is_detail_url(url) {
            COMMENT_FETCHES.with_label_values(&["invalid_url"]).inc();
            debug!(url, "Skipping comments for non-detail URL");
            return Vec::new();
        }

        let request = HttpRequest::get(url, self.timeout);
        let response = match timeout(self.timeout, self.http.get(&request)).await {
            Ok(Ok(response)) if response.is_success() => response,
            Ok(Ok(response)) => {
                COMMENT_FETCHES.with_label_values(&["failed"]).inc();
                warn!(url, status = response.status, "Comment page returned error status");
                return Vec::new();
            }
            Ok(Err(e)) => {
                COMMENT_FETCHES.with_label_values(&["failed"]).inc();
                warn!(url, error = %e, "Failed to fetch comment page");
                return Vec::new();
            }
            Err(_) => {
                COMMENT_FETCHES.with_label_values(&["failed"]).inc();
                warn!(url, "Timed out fetching comment page");
                return Vec::new();
            }
        };

        let comments = self.extract(&response.body, limit);
        let outcome = if comments.is_empty() { "empty" } else { "success" };
        COMMENT_FETCHES.with_label_values(&[outcome]).inc();
        debug!(url, count = comments.len(), "Fetched short comments");
        comments
    }
}
