// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! gauge {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_gauge {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Initializes the descriptions for all the metrics emitted by the selector graph.
/// This should be called once at startup, after a recorder is installed.
pub fn describe_metrics() {
    describe_counter!(
        "selector_recompute_total",
        "Number of times a derivation node invoked its combining function."
    );
    describe_counter!(
        "selector_cache_hit_total",
        "Number of derivation reads served from the cached output."
    );
    describe_counter!(
        "selector_recompute_failed_total",
        "Number of recomputations that returned an error (nothing cached)."
    );
    describe_histogram!(
        "selector_recompute_ms",
        "Wall time spent in a derivation node's combining function."
    );
    describe_gauge!(
        "selector_enriched_swaps",
        "Number of swaps in the last computed enriched collection."
    );
    describe_counter!(
        "raw_state_writes_total",
        "Number of wholesale collection replacements in the raw state store."
    );
}

pub fn increment_recompute(node: &'static str) {
    counter!("selector_recompute_total", 1, "node" => node);
}

pub fn increment_cache_hit(node: &'static str) {
    counter!("selector_cache_hit_total", 1, "node" => node);
}

pub fn increment_recompute_failed(node: &'static str) {
    counter!("selector_recompute_failed_total", 1, "node" => node);
}

pub fn record_recompute(node: &'static str, duration: std::time::Duration) {
    histogram!("selector_recompute_ms", duration.as_secs_f64() * 1000.0, "node" => node);
}

pub fn set_enriched_swaps(count: usize) {
    gauge!("selector_enriched_swaps", count as f64);
}

pub fn increment_raw_state_write(collection: &'static str) {
    counter!("raw_state_writes_total", 1, "collection" => collection);
}
