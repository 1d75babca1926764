/// Metrics and telemetry for the ban checker
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Ban query outcomes and latencies
/// - Name resolution results
/// - Identifier cache hit/miss rates, size and repairs
/// - Snapshot persistence failures

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== Ban Query Metrics ==========

    /// Ban queries by outcome (not_banned, banned, timeout, error)
    pub static ref BAN_QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ban_queries_total",
        "Total number of ban server queries",
        &["outcome"]
    )
    .unwrap();

    /// Ban query round trip in seconds
    pub static ref BAN_QUERY_DURATION_SECONDS: Histogram = register_histogram!(
        "ban_query_duration_seconds",
        "Ban server round trip latencies in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Name Resolution Metrics ==========

    /// Handle lookups by result
    pub static ref NAME_RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "name_resolutions_total",
        "Total number of handle to ID lookups",
        &["result"]
    )
    .unwrap();

    // ========== Cache Metrics ==========

    /// Cache hits by cache type
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_hits_total",
        "Total number of cache hits",
        &["cache_type"]
    )
    .unwrap();

    /// Cache misses by cache type
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_misses_total",
        "Total number of cache misses",
        &["cache_type"]
    )
    .unwrap();

    /// Cache size (number of entries)
    pub static ref CACHE_SIZE: IntGauge = register_int_gauge!(
        "cache_size",
        "Number of entries in cache"
    )
    .unwrap();

    /// Corrupt cache entries evicted on discovery
    pub static ref CACHE_REPAIRS_TOTAL: IntCounter = register_int_counter!(
        "cache_repairs_total",
        "Total number of corrupt cache entries evicted"
    )
    .unwrap();

    /// Failed snapshot writes
    pub static ref SNAPSHOT_WRITE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "snapshot_write_failures_total",
        "Total number of failed cache snapshot writes"
    )
    .unwrap();
}

/// Render all registered metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a ban query
pub fn record_ban_query(outcome: &str, duration: f64) {
    BAN_QUERIES_TOTAL.with_label_values(&[outcome]).inc();
    BAN_QUERY_DURATION_SECONDS.observe(duration);
}

/// Record a handle resolution
pub fn record_name_resolution(success: bool) {
    NAME_RESOLUTIONS_TOTAL
        .with_label_values(&[if success { "success" } else { "not_found" }])
        .inc();
}

/// Record a cache access
pub fn record_cache_access(cache_type: &str, hit: bool) {
    if hit {
        CACHE_HITS_TOTAL.with_label_values(&[cache_type]).inc();
    } else {
        CACHE_MISSES_TOTAL.with_label_values(&[cache_type]).inc();
    }
}

pub fn set_cache_size(size: usize) {
    CACHE_SIZE.set(size as i64);
}

pub fn record_cache_repair() {
    CACHE_REPAIRS_TOTAL.inc();
}

pub fn record_snapshot_failure() {
    SNAPSHOT_WRITE_FAILURES_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ban_query() {
        record_ban_query("banned", 0.05);
        let metrics = render_metrics();
        assert!(metrics.contains("ban_queries_total"));
        assert!(metrics.contains("ban_query_duration_seconds"));
    }

    #[test]
    fn test_record_cache_access() {
        record_cache_access("rid_cache", true);
        record_cache_access("rid_cache", false);
        let metrics = render_metrics();
        assert!(metrics.contains("cache_hits_total"));
        assert!(metrics.contains("cache_misses_total"));
    }

    #[test]
    fn test_counters_increase() {
        let before = SNAPSHOT_WRITE_FAILURES_TOTAL.get();
        record_snapshot_failure();
        assert!(SNAPSHOT_WRITE_FAILURES_TOTAL.get() > before);

        record_name_resolution(false);
        assert!(render_metrics().contains("name_resolutions_total"));
    }
}
