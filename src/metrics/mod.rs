//! Prometheus metrics for the search subsystem
//!
//! All metrics live in a dedicated registry so the embedding application can
//! expose them next to its own.
//!
//! # Example
//! ```no_run
//! use blog_search::metrics;
//!
//! metrics::init_metrics().expect("metrics registered once");
//! println!("{}", metrics::gather_metrics());
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "blog_search";

/// Search subsystem metrics collection
pub struct SearchMetrics {
    /// Search calls by outcome (ok, empty_query, grammar_error, storage_error)
    pub searches_total: CounterVec,

    /// Search duration in seconds
    pub search_duration: HistogramVec,

    /// Index writes by operation and result
    pub index_operations_total: CounterVec,

    /// Query log appends that failed and were swallowed
    pub query_log_failures_total: CounterVec,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self {
            searches_total: CounterVec::new(
                Opts::new("searches_total", "Total number of search calls").namespace(NAMESPACE),
                &["outcome"],
            )
            .expect("Failed to create searches_total metric"),

            search_duration: HistogramVec::new(
                HistogramOpts::new("search_duration_seconds", "Search duration in seconds")
                    .namespace(NAMESPACE)
                    .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
                &["outcome"],
            )
            .expect("Failed to create search_duration_seconds metric"),

            index_operations_total: CounterVec::new(
                Opts::new("index_operations_total", "Total number of index write operations")
                    .namespace(NAMESPACE),
                &["operation", "result"],
            )
            .expect("Failed to create index_operations_total metric"),

            query_log_failures_total: CounterVec::new(
                Opts::new("query_log_failures_total", "Query log writes that failed")
                    .namespace(NAMESPACE),
                &["kind"],
            )
            .expect("Failed to create query_log_failures_total metric"),
        }
    }

    /// Record a finished search call
    pub fn record_search(&self, outcome: &str, duration_secs: f64) {
        self.searches_total.with_label_values(&[outcome]).inc();
        self.search_duration
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    /// Record an index write
    pub fn record_index_operation(&self, operation: &str, success: bool) {
        let result = if success { "success" } else { "failure" };
        self.index_operations_total
            .with_label_values(&[operation, result])
            .inc();
    }

    /// Record a swallowed query log failure
    pub fn record_query_log_failure(&self, kind: &str) {
        self.query_log_failures_total.with_label_values(&[kind]).inc();
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Registry holding every search metric
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Global search metrics instance
    pub static ref SEARCH_METRICS: SearchMetrics = SearchMetrics::new();
}

/// Register all metrics with the registry.
///
/// Call once at startup; a second call fails with `AlreadyReg`.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_METRICS.searches_total.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_METRICS.search_duration.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_METRICS.index_operations_total.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_METRICS.query_log_failures_total.clone()))?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
