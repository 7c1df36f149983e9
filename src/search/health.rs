//! Index health reporting

use crate::search::config::HealthConfig;
use crate::search::executor::QueryExecutor;
use crate::search::index::IndexManager;
use crate::search::sanitizer::QuerySanitizer;
use crate::state::ContentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use strum::Display;

/// Overall health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Health snapshot of the search index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub index_exists: bool,
    pub indexed_documents: u64,
    pub published_records: u64,

    /// Indexed entries per published record, as a percentage
    pub coverage_percent: f64,

    pub sample_query: String,

    /// Latency of the synthetic query, absent when it did not run
    pub sample_query_ms: Option<f64>,

    pub message: String,
}

/// Percentage of published records present in the index; 100 when nothing is published
pub fn coverage_percent(indexed: u64, published: u64) -> f64 {
    if published == 0 {
        100.0
    } else {
        indexed as f64 / published as f64 * 100.0
    }
}

/// Checks index existence, coverage and query latency
pub struct HealthProbe {
    manager: Arc<IndexManager>,
    executor: Arc<QueryExecutor>,
    content: Arc<dyn ContentStore>,
    config: HealthConfig,
}

impl HealthProbe {
    pub fn new(
        manager: Arc<IndexManager>,
        executor: Arc<QueryExecutor>,
        content: Arc<dyn ContentStore>,
        config: HealthConfig,
    ) -> Self {
        Self {
            manager,
            executor,
            content,
            config,
        }
    }

    /// Classify the index: missing index or failing sample query is critical,
    /// low coverage is a warning.
    pub async fn check(&self) -> HealthReport {
        let mut report = HealthReport {
            status: HealthStatus::Healthy,
            index_exists: self.manager.index_exists().await,
            indexed_documents: 0,
            published_records: 0,
            coverage_percent: 0.0,
            sample_query: self.config.sample_query.clone(),
            sample_query_ms: None,
            message: String::new(),
        };

        match self.content.count_published().await {
            Ok(count) => report.published_records = count,
            Err(e) => return Self::critical(report, format!("content store unavailable: {}", e)),
        }

        if !report.index_exists {
            return Self::critical(report, "search index does not exist".to_string());
        }

        match self.manager.document_count().await {
            Ok(count) => report.indexed_documents = count,
            Err(e) => return Self::critical(report, format!("index unreadable: {}", e)),
        }
        report.coverage_percent = coverage_percent(report.indexed_documents, report.published_records);

        let start = Instant::now();
        let sample = QuerySanitizer::sanitize(&self.config.sample_query);
        let sample_result = self.executor.ranked_ids(&sample).await;
        report.sample_query_ms = Some(start.elapsed().as_secs_f64() * 1000.0);

        if let Err(e) = sample_result {
            return Self::critical(report, format!("sample query failed: {}", e));
        }

        if report.coverage_percent < self.config.coverage_warning_percent {
            report.status = HealthStatus::Warning;
            report.message = format!(
                "coverage {:.1}% is below {:.1}%",
                report.coverage_percent, self.config.coverage_warning_percent
            );
            tracing::warn!(
                coverage = report.coverage_percent,
                indexed = report.indexed_documents,
                published = report.published_records,
                "Search index coverage low"
            );
        } else {
            report.message = "search index healthy".to_string();
        }

        report
    }

    fn critical(mut report: HealthReport, message: String) -> HealthReport {
        tracing::error!(%message, "Search index critical");
        report.status = HealthStatus::Critical;
        report.message = message;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::config::SearchConfig;
    use crate::state::InMemoryStore;

    #[test]
    fn test_coverage_percent() {
        assert_eq!(coverage_percent(0, 0), 100.0);
        assert_eq!(coverage_percent(9, 10), 90.0);
        assert_eq!(coverage_percent(1, 4), 25.0);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(HealthStatus::Critical.to_string(), "critical");
    }

    #[test]
    fn test_probe_without_index_is_critical() {
        tokio_test::block_on(async {
            let temp_dir = tempfile::TempDir::new().unwrap();
            let config = SearchConfig {
                index_path: temp_dir.path().join("index"),
                ..Default::default()
            };
            let store = Arc::new(InMemoryStore::new());
            let manager = Arc::new(IndexManager::new(config, store.clone()));
            let executor = Arc::new(QueryExecutor::new(manager.clone(), store.clone()));
            let probe = HealthProbe::new(manager, executor, store, HealthConfig::default());

            let report = probe.check().await;
            assert_eq!(report.status, HealthStatus::Critical);
            assert!(!report.index_exists);
            assert_eq!(report.coverage_percent, 0.0);
        });
    }
}
