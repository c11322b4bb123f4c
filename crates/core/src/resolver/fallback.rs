//! Synthetic record for queries no strategy could resolve.

use crate::config::DoubanConfig;
use crate::strategy::douban_search_url;

use super::types::{BookRecord, Query, RecordSource};

/// Builds a fallback record from the query itself.
#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    search_base: String,
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self::with_config(&DoubanConfig::default())
    }
}

impl FallbackSynthesizer {
    pub fn new(search_base: impl Into<String>) -> Self {
        Self {
            search_base: search_base.into(),
        }
    }

    pub fn with_config(config: &DoubanConfig) -> Self {
        Self::new(config.web_url.clone())
    }

    /// Title, author and publisher from the query; the URL points at a Douban
    /// book search for the title so the caller still has somewhere to go.
    pub fn synthesize(&self, query: &Query) -> BookRecord {
        let mut record = BookRecord::new(query.title.clone(), RecordSource::Fallback);
        record.author = query.author.clone().unwrap_or_default();
        record.publisher = query.publisher.clone().unwrap_or_default();
        record.url = Some(douban_search_url(&self.search_base, &query.title));
        record
    }
}
