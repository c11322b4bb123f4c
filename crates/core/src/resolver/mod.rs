//! Book resolution engine.
//!
//! A [`Resolver`] turns a [`Query`] into a [`BookRecord`] by consulting the
//! shared [`BookCache`], racing the registered strategies through a
//! [`StrategyExecutor`], and falling back to a synthesized record when every
//! strategy fails. Short comments are attached on request.

mod cache;
mod engine;
mod executor;
mod fallback;
mod matcher;
mod types;

pub use cache::{BookCache, CacheEntry, CacheKey, CacheStats};
pub use engine::Resolver;
pub use executor::StrategyExecutor;
pub use fallback::FallbackSynthesizer;
pub use matcher::{containment_ratio, normalize_title, TitleMatcher};
pub use types::{BookRecord, Comment, Query, RecordSource, ResolveError};
