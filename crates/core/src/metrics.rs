//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Resolution (outcomes, latency, cache lookups)
//! - Strategy races (per-strategy outcomes, race duration)
//! - External fetches (search pages, comment pages)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Resolution Metrics
// =============================================================================

/// Resolutions total by outcome.
pub static RESOLUTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookfinder_resolutions_total", "Total resolve calls"),
        &["outcome"], // "cache_hit", "matched", "fallback", "invalid"
    )
    .unwrap()
});

/// Resolution duration in seconds, comment enrichment included.
pub static RESOLVE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bookfinder_resolve_duration_seconds",
            "Duration of resolve calls",
        )
        .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.5, 5.0, 8.0, 15.0, 30.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookfinder_cache_lookups_total", "Record cache lookups"),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Strategy Race Metrics
// =============================================================================

/// Strategy outcomes by strategy name and result.
pub static STRATEGY_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookfinder_strategy_outcomes_total",
            "Strategy attempt outcomes",
        ),
        &["strategy", "result"], // result: "success", "timeout", "transport", "no_match", "malformed"
    )
    .unwrap()
});

/// Race duration in seconds by result.
pub static RACE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bookfinder_race_duration_seconds",
            "Duration of strategy races",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 6.0, 8.0, 10.0]),
        &["result"], // "winner", "exhausted", "deadline"
    )
    .unwrap()
});

// =============================================================================
// External Fetch Metrics
// =============================================================================

/// Search page fetch attempts by result.
pub static FETCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookfinder_fetch_attempts_total",
            "HTTP fetch attempts made by strategies",
        ),
        &["result"], // "success", "http_error", "timeout", "transport"
    )
    .unwrap()
});

/// Comment page fetches by result.
pub static COMMENT_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookfinder_comment_fetches_total",
            "Short comment fetches",
        ),
        &["result"], // "success", "empty", "invalid_url", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Resolution
        Box::new(RESOLUTIONS_TOTAL.clone()),
        Box::new(RESOLVE_DURATION.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        // Races
        Box::new(STRATEGY_OUTCOMES.clone()),
        Box::new(RACE_DURATION.clone()),
        // External fetches
        Box::new(FETCH_ATTEMPTS.clone()),
        Box::new(COMMENT_FETCHES.clone()),
    ]
}
