//! Types shared by the resolution engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A free-text bibliographic query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Book title (required, non-empty).
    pub title: String,
    /// Optional author hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Optional publisher hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Fetch short reader comments for the resolved record.
    #[serde(default)]
    pub include_comments: bool,
}

impl Query {
    /// Build a validated query for `title`.
    pub fn new(title: impl Into<String>) -> Result<Self, ResolveError> {
        let query = Self {
            title: title.into(),
            author: None,
            publisher: None,
            include_comments: false,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_comments(mut self, include_comments: bool) -> Self {
        self.include_comments = include_comments;
        self
    }

    /// Reject queries whose title is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.title.trim().is_empty() {
            return Err(ResolveError::InvalidInput(
                "title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Douban site-wide search (`www.douban.com/search`).
    DoubanWeb,
    /// Douban Books subject search (`book.douban.com/subject_search`).
    DoubanBook,
    /// Open Library JSON search.
    OpenLibrary,
    /// Google Books volumes search.
    GoogleBooks,
    /// Synthesized from the query when nothing else matched.
    Fallback,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::DoubanWeb => "douban_web",
            RecordSource::DoubanBook => "douban_book",
            RecordSource::OpenLibrary => "open_library",
            RecordSource::GoogleBooks => "google_books",
            RecordSource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A best-effort canonical book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Book title. Never empty.
    pub title: String,
    /// Author(s), empty when unknown.
    #[serde(default)]
    pub author: String,
    /// Publisher, empty when unknown.
    #[serde(default)]
    pub publisher: String,
    /// Average rating on the source's scale (Douban: 0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Detail page (or search page for fallback records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub source: RecordSource,
    /// Short reader comments, present only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_comments: Option<Vec<Comment>>,
}

impl BookRecord {
    /// A record with only a title and a source.
    pub fn new(title: impl Into<String>, source: RecordSource) -> Self {
        Self {
            title: title.into(),
            author: String::new(),
            publisher: String::new(),
            rating: None,
            url: None,
            source,
            short_comments: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RecordSource::Fallback
    }
}

/// A short reader comment from a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub content: String,
    #[serde(default)]
    pub author: String,
    /// Star rating 1-5, absent when the markup carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub useful_count: u32,
}

/// Errors visible to callers of the resolver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
