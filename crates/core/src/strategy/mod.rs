//! Retrieval strategies.
//!
//! Each strategy is one independent way of turning a [`Query`] into a
//! [`BookRecord`]. Strategies validate their own candidates with the title
//! matcher; a candidate that does not match is reported as
//! [`StrategyFailure::NoMatch`], never returned as a record.

mod douban_book;
mod douban_web;
mod google_books;
mod open_library;
mod retry;

pub use douban_book::DoubanBookSearch;
pub use douban_web::{douban_search_url, DoubanWebSearch};
pub use google_books::GoogleBooksSearch;
pub use open_library::OpenLibrarySearch;
pub use retry::{fetch_with_retry, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

use crate::http::TransportError;
use crate::resolver::{BookRecord, Query};

/// Why a strategy produced no record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyFailure {
    #[error("Strategy timed out")]
    Timeout,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("No matching book found")]
    NoMatch,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl StrategyFailure {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyFailure::Timeout => "timeout",
            StrategyFailure::Transport(_) => "transport",
            StrategyFailure::NoMatch => "no_match",
            StrategyFailure::Malformed(_) => "malformed",
        }
    }
}

impl From<TransportError> for StrategyFailure {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => StrategyFailure::Timeout,
            other => StrategyFailure::Transport(other.to_string()),
        }
    }
}

/// One retrieval technique.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Strategy name for logging/metrics.
    fn name(&self) -> &str;

    /// Try to resolve `query` into a record whose title matches.
    async fn attempt(&self, query: &Query) -> Result<BookRecord, StrategyFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_from_transport_error() {
        assert_eq!(
            StrategyFailure::from(TransportError::Timeout),
            StrategyFailure::Timeout
        );
        let failure = StrategyFailure::from(TransportError::Connect("refused".to_string()));
        assert_eq!(failure.kind(), "transport");
        assert!(failure.to_string().contains("refused"));
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(StrategyFailure::NoMatch.kind(), "no_match");
        assert_eq!(StrategyFailure::Malformed("x".into()).kind(), "malformed");
        assert_eq!(
            StrategyFailure::NoMatch.to_string(),
            "No matching book found"
        );
    }
}
