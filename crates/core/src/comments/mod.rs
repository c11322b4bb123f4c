//! Short reader comments from book detail pages.
//!
//! Enrichment is best-effort: every failure degrades to an empty list and is
//! never surfaced to the caller.

mod douban;

pub use douban::{decode_star_token, DoubanCommentEnricher};

use async_trait::async_trait;

use crate::resolver::Comment;

/// Fetches up to `limit` short comments for a detail page.
#[async_trait]
pub trait CommentEnricher: Send + Sync {
    async fn fetch_comments(&self, url: &str, limit: usize) -> Vec<Comment>;
}
