//! Mock strategy for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::resolver::{BookRecord, Query};
use crate::strategy::{Strategy, StrategyFailure};

/// Mock implementation of the Strategy trait.
///
/// Provides controllable behavior for testing:
/// - Return a fixed record or failure
/// - Simulate slow sources with a delay
/// - Track attempted queries and how many attempts ran to completion
///
/// # Example
///
/// ```rust,ignore
/// use bookfinder_core::testing::{MockStrategy, fixtures};
///
/// let fast = MockStrategy::succeeding("fast", fixtures::book_record("活着"))
///     .with_delay(Duration::from_millis(50));
/// let slow = MockStrategy::failing("slow", StrategyFailure::NoMatch);
///
/// let record = executor.race(&query, &[Arc::new(fast), Arc::new(slow)]).await;
/// ```
#[derive(Debug)]
pub struct MockStrategy {
    name: String,
    /// Result returned by every attempt.
    result: Arc<RwLock<Result<BookRecord, StrategyFailure>>>,
    /// Simulated latency before the result is returned.
    delay: Duration,
    /// Recorded queries, one per attempt started.
    queries: Arc<RwLock<Vec<Query>>>,
    /// Attempts that ran to completion (not cancelled).
    completed: Arc<RwLock<usize>>,
}

impl MockStrategy {
    pub fn new(name: impl Into<String>, result: Result<BookRecord, StrategyFailure>) -> Self {
        Self {
            name: name.into(),
            result: Arc::new(RwLock::new(result)),
            delay: Duration::ZERO,
            queries: Arc::new(RwLock::new(Vec::new())),
            completed: Arc::new(RwLock::new(0)),
        }
    }

    /// A strategy that always returns `record`.
    pub fn succeeding(name: impl Into<String>, record: BookRecord) -> Self {
        Self::new(name, Ok(record))
    }

    /// A strategy that always fails with `failure`.
    pub fn failing(name: impl Into<String>, failure: StrategyFailure) -> Self {
        Self::new(name, Err(failure))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the result for subsequent attempts.
    pub async fn set_result(&self, result: Result<BookRecord, StrategyFailure>) {
        *self.result.write().await = result;
    }

    /// Number of attempts started.
    pub async fn call_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Number of attempts that returned a result.
    pub async fn completed_count(&self) -> usize {
        *self.completed.read().await
    }

    pub async fn recorded_queries(&self) -> Vec<Query> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl Strategy for MockStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, query: &Query) -> Result<BookRecord, StrategyFailure> {
        self.queries.write().await.push(query.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = self.result.read().await.clone();
        *self.completed.write().await += 1;
        result
    }
}
