//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the search index directory
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    #[validate(range(min = 15_000_000))]
    pub writer_heap_size: usize,

    /// Score multiplier for title matches
    #[validate(range(min = 0.0))]
    pub title_boost: f32,

    /// Maximum ranked ids taken from the index per query
    #[validate(range(min = 1))]
    pub max_candidates: usize,

    /// Page size used when the caller does not give one
    #[validate(range(min = 1))]
    pub default_per_page: usize,

    /// Upper bound for the page size
    #[validate(range(min = 1))]
    pub max_per_page: usize,

    /// Excerpt window length in characters
    #[validate(range(min = 1))]
    pub excerpt_length: usize,

    /// Distance between candidate excerpt windows in characters
    #[validate(range(min = 1))]
    pub excerpt_stride: usize,

    /// Marker inserted before a highlighted term
    pub highlight_open: String,

    /// Marker inserted after a highlighted term
    pub highlight_close: String,

    /// Prefer the index's own snippet extraction over the window heuristic
    pub native_snippets: bool,

    /// Enable query suggestions
    pub enable_suggestions: bool,

    /// Documents written per commit during bulk population
    #[validate(range(min = 1))]
    pub bulk_batch_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/search_index"),
            writer_heap_size: 50_000_000, // 50MB
            title_boost: 2.0,
            max_candidates: 1000,
            default_per_page: 10,
            max_per_page: 100,
            excerpt_length: 200,
            excerpt_stride: 50,
            highlight_open: "<mark>".to_string(),
            highlight_close: "</mark>".to_string(),
            native_snippets: true,
            enable_suggestions: true,
            bulk_batch_size: 500,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn title_boost(mut self, boost: f32) -> Self {
        self.config.title_boost = boost;
        self
    }

    pub fn max_candidates(mut self, max: usize) -> Self {
        self.config.max_candidates = max;
        self
    }

    pub fn max_per_page(mut self, max: usize) -> Self {
        self.config.max_per_page = max;
        self
    }

    pub fn excerpt_length(mut self, length: usize) -> Self {
        self.config.excerpt_length = length;
        self
    }

    pub fn excerpt_stride(mut self, stride: usize) -> Self {
        self.config.excerpt_stride = stride;
        self
    }

    pub fn highlight_markers(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.config.highlight_open = open.into();
        self.config.highlight_close = close.into();
        self
    }

    pub fn native_snippets(mut self, enabled: bool) -> Self {
        self.config.native_snippets = enabled;
        self
    }

    pub fn enable_suggestions(mut self, enabled: bool) -> Self {
        self.config.enable_suggestions = enabled;
        self
    }

    pub fn bulk_batch_size(mut self, size: usize) -> Self {
        self.config.bulk_batch_size = size;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Health probe thresholds
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HealthConfig {
    /// Coverage below this percentage is reported as a warning
    #[validate(range(min = 0.0, max = 100.0))]
    pub coverage_warning_percent: f64,

    /// Query text used for the synthetic latency probe
    #[validate(length(min = 1))]
    pub sample_query: String,

    /// Trailing window (days) for the "recent queries" count
    #[validate(range(min = 1))]
    pub recent_query_days: i64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            coverage_warning_percent: 90.0,
            sample_query: "test".to_string(),
            recent_query_days: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = SearchConfigBuilder::new()
            .excerpt_length(120)
            .highlight_markers("[", "]")
            .native_snippets(false)
            .build();

        assert_eq!(config.excerpt_length, 120);
        assert_eq!(config.excerpt_stride, 50);
        assert_eq!(config.highlight_open, "[");
        assert!(!config.native_snippets);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_small_writer_heap_rejected() {
        let config = SearchConfigBuilder::new().writer_heap_size(1_000).build();
        assert!(config.validate().is_err());
    }
}
