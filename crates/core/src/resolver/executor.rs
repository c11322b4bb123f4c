//! Bounded, deadline-limited race between strategies.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::metrics::{RACE_DURATION, STRATEGY_OUTCOMES};
use crate::strategy::{Strategy, StrategyFailure};

use super::types::{BookRecord, Query};

struct StrategyOutcome {
    strategy: String,
    result: Result<BookRecord, StrategyFailure>,
    elapsed: Duration,
}

/// Runs strategies concurrently and returns the first successful record.
///
/// At most `pool_size` strategies run at once. Completion order decides the
/// winner; registration order only decides who gets a pool slot first.
#[derive(Debug, Clone)]
pub struct StrategyExecutor {
    pool_size: usize,
    deadline: Duration,
    abort_losers: bool,
}

impl StrategyExecutor {
    pub fn new(pool_size: usize, deadline: Duration) -> Self {
        Self {
            pool_size: pool_size.max(1),
            deadline,
            abort_losers: true,
        }
    }

    pub fn with_config(config: &ResolverConfig) -> Self {
        Self::new(config.pool_size, config.race_deadline()).with_abort_losers(config.abort_losers)
    }

    /// Whether still-running strategies are cancelled once the race is decided.
    pub fn with_abort_losers(mut self, abort_losers: bool) -> Self {
        self.abort_losers = abort_losers;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Race `strategies` for `query`.
    ///
    /// Returns `None` when every strategy failed or the deadline passed first.
    pub async fn race(
        &self,
        query: &Query,
        strategies: &[Arc<dyn Strategy>],
    ) -> Option<BookRecord> {
        if strategies.is_empty() {
            return None;
        }

        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.pool_size));
        let (tx, mut rx) = mpsc::channel(strategies.len());
        let query = Arc::new(query.clone());

        let handles: Vec<JoinHandle<()>> = strategies
            .iter()
            .map(|strategy| {
                let strategy = Arc::clone(strategy);
                let permits = Arc::clone(&permits);
                let query = Arc::clone(&query);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    let attempt_started = Instant::now();
                    let result = strategy.attempt(&query).await;
                    // The receiver is gone once the race is decided.
                    let _ = tx
                        .send(StrategyOutcome {
                            strategy: strategy.name().to_string(),
                            result,
                            elapsed: attempt_started.elapsed(),
                        })
                        .await;
                })
            })
            .collect();
        drop(tx);

        let outcome = tokio::time::timeout(self.deadline, first_success(&mut rx)).await;

        if self.abort_losers {
            for handle in &handles {
                handle.abort();
            }
        }

        let elapsed = started.elapsed();
        match outcome {
            Ok(Some((strategy, record))) => {
                RACE_DURATION
                    .with_label_values(&["winner"])
                    .observe(elapsed.as_secs_f64());
                info!(
                    title = %query.title,
                    strategy = %strategy,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Strategy race won"
                );
                Some(record)
            }
            Ok(None) => {
                RACE_DURATION
                    .with_label_values(&["exhausted"])
                    .observe(elapsed.as_secs_f64());
                info!(title = %query.title, strategies = strategies.len(), "All strategies failed");
                None
            }
            Err(_) => {
                RACE_DURATION
                    .with_label_values(&["deadline"])
                    .observe(elapsed.as_secs_f64());
                warn!(
                    title = %query.title,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Strategy race deadline elapsed"
                );
                None
            }
        }
    }
}

/// Drain outcomes until one succeeds or every sender is gone.
async fn first_success(
    rx: &mut mpsc::Receiver<StrategyOutcome>,
) -> Option<(String, BookRecord)> {
    while let Some(outcome) = rx.recv().await {
        let elapsed_ms = outcome.elapsed.as_millis() as u64;
        match outcome.result {
            Ok(record) => {
                STRATEGY_OUTCOMES
                    .with_label_values(&[outcome.strategy.as_str(), "success"])
                    .inc();
                return Some((outcome.strategy, record));
            }
            Err(failure) => {
                STRATEGY_OUTCOMES
                    .with_label_values(&[outcome.strategy.as_str(), failure.kind()])
                    .inc();
                if failure == StrategyFailure::NoMatch {
                    debug!(strategy = %outcome.strategy, elapsed_ms, "Strategy found no match");
                } else {
                    warn!(strategy = %outcome.strategy, elapsed_ms, error = %failure, "Strategy failed");
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::RecordSource;
    use crate::testing::{fixtures, MockStrategy};

    fn query() -> Query {
        Query::new("活着").unwrap()
    }

    fn record_from(source: RecordSource, title: &str) -> BookRecord {
        let mut record = fixtures::book_record(title);
        record.source = source;
        record
    }

    #[tokio::test]
    async fn test_fastest_success_wins() {
        let fast = Arc::new(
            MockStrategy::succeeding("fast", record_from(RecordSource::DoubanBook, "活着"))
                .with_delay(Duration::from_millis(50)),
        );
        let slow = Arc::new(
            MockStrategy::succeeding("slow", record_from(RecordSource::DoubanWeb, "活着"))
                .with_delay(Duration::from_millis(500)),
        );
        let executor = StrategyExecutor::new(2, Duration::from_secs(8));

        let started = Instant::now();
        let strategies: Vec<Arc<dyn Strategy>> = vec![slow.clone(), fast.clone()];
        let record = executor.race(&query(), &strategies).await.unwrap();

        assert_eq!(record.source, RecordSource::DoubanBook);
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_losers_are_aborted() {
        let fast = Arc::new(
            MockStrategy::succeeding("fast", fixtures::book_record("活着"))
                .with_delay(Duration::from_millis(10)),
        );
        let slow = Arc::new(
            MockStrategy::succeeding("slow", fixtures::book_record("活着"))
                .with_delay(Duration::from_millis(200)),
        );
        let executor = StrategyExecutor::new(2, Duration::from_secs(8));

        let strategies: Vec<Arc<dyn Strategy>> = vec![fast.clone(), slow.clone()];
        executor.race(&query(), &strategies).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(slow.call_count().await, 1);
        assert_eq!(slow.completed_count().await, 0);
    }

    #[tokio::test]
    async fn test_losers_run_on_when_not_aborted() {
        let fast = Arc::new(
            MockStrategy::succeeding("fast", fixtures::book_record("活着"))
                .with_delay(Duration::from_millis(10)),
        );
        let slow = Arc::new(
            MockStrategy::succeeding("slow", fixtures::book_record("活着"))
                .with_delay(Duration::from_millis(100)),
        );
        let executor =
            StrategyExecutor::new(2, Duration::from_secs(8)).with_abort_losers(false);

        let strategies: Vec<Arc<dyn Strategy>> = vec![fast.clone(), slow.clone()];
        executor.race(&query(), &strategies).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(slow.completed_count().await, 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_race() {
        let failing = Arc::new(MockStrategy::failing(
            "failing",
            StrategyFailure::Transport("reset".into()),
        ));
        let succeeding = Arc::new(
            MockStrategy::succeeding("ok", fixtures::book_record("活着"))
                .with_delay(Duration::from_millis(30)),
        );
        let executor = StrategyExecutor::new(2, Duration::from_secs(8));

        let strategies: Vec<Arc<dyn Strategy>> = vec![failing, succeeding];
        let record = executor.race(&query(), &strategies).await;
        assert!(record.is_some());
    }

    #[tokio::test]
    async fn test_all_failures_return_none() {
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(MockStrategy::failing("a", StrategyFailure::NoMatch)),
            Arc::new(MockStrategy::failing("b", StrategyFailure::Timeout)),
            Arc::new(MockStrategy::failing(
                "c",
                StrategyFailure::Malformed("empty".into()),
            )),
        ];
        let executor = StrategyExecutor::new(2, Duration::from_secs(8));

        assert!(executor.race(&query(), &strategies).await.is_none());
    }

    #[tokio::test]
    async fn test_no_strategies_return_none() {
        let executor = StrategyExecutor::new(2, Duration::from_secs(8));
        assert!(executor.race(&query(), &[]).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_race() {
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(
                MockStrategy::succeeding("a", fixtures::book_record("活着"))
                    .with_delay(Duration::from_secs(20)),
            ),
            Arc::new(
                MockStrategy::succeeding("b", fixtures::book_record("活着"))
                    .with_delay(Duration::from_secs(30)),
            ),
        ];
        let executor = StrategyExecutor::new(2, Duration::from_secs(8));

        let started = tokio::time::Instant::now();
        assert!(executor.race(&query(), &strategies).await.is_none());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(8));
        assert!(elapsed < Duration::from_secs(9));
    }

    #[tokio::test]
    async fn test_pool_size_limits_concurrency() {
        let first = Arc::new(
            MockStrategy::failing("first", StrategyFailure::NoMatch)
                .with_delay(Duration::from_millis(100)),
        );
        let second = Arc::new(
            MockStrategy::succeeding("second", fixtures::book_record("活着"))
                .with_delay(Duration::from_millis(10)),
        );
        let executor = StrategyExecutor::new(1, Duration::from_secs(8));

        let started = Instant::now();
        let strategies: Vec<Arc<dyn Strategy>> = vec![first.clone(), second.clone()];
        let record = executor.race(&query(), &strategies).await;

        assert!(record.is_some());
        // The second strategy only starts after the first frees the slot.
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(first.completed_count().await, 1);
    }

    #[tokio::test]
    async fn test_three_strategies_with_pool_of_two() {
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(
                MockStrategy::failing("a", StrategyFailure::NoMatch)
                    .with_delay(Duration::from_millis(20)),
            ),
            Arc::new(
                MockStrategy::failing("b", StrategyFailure::Timeout)
                    .with_delay(Duration::from_millis(20)),
            ),
            Arc::new(
                MockStrategy::succeeding("c", record_from(RecordSource::OpenLibrary, "活着"))
                    .with_delay(Duration::from_millis(20)),
            ),
        ];
        let executor = StrategyExecutor::new(2, Duration::from_secs(8));

        let record = executor.race(&query(), &strategies).await.unwrap();
        assert_eq!(record.source, RecordSource::OpenLibrary);
    }

    #[test]
    fn test_with_config() {
        let config = ResolverConfig {
            pool_size: 0,
            abort_losers: false,
            ..ResolverConfig::default()
        };
        let executor = StrategyExecutor::with_config(&config);
        assert_eq!(executor.pool_size, 1);
        assert!(!executor.abort_losers);
        assert_eq!(executor.deadline(), Duration::from_secs(8));
    }
}
