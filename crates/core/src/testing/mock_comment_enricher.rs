//! Mock comment enricher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::comments::CommentEnricher;
use crate::resolver::Comment;

/// A recorded comment fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub url: String,
    pub limit: usize,
}

/// Mock implementation of the CommentEnricher trait.
///
/// Returns the configured comments (truncated to the requested limit) and
/// records every call.
#[derive(Debug, Default)]
pub struct MockCommentEnricher {
    comments: Arc<RwLock<Vec<Comment>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    delay: Duration,
}

impl MockCommentEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comments(comments: Vec<Comment>) -> Self {
        Self {
            comments: Arc::new(RwLock::new(comments)),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn set_comments(&self, comments: Vec<Comment>) {
        *self.comments.write().await = comments;
    }

    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl CommentEnricher for MockCommentEnricher {
    async fn fetch_comments(&self, url: &str, limit: usize) -> Vec<Comment> {
        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            limit,
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.comments.read().await.iter().take(limit).cloned().collect()
    }
}
