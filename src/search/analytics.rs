//! Query analytics

use crate::error::Result;
use crate::metrics::SEARCH_METRICS;
use crate::models::QueryLogEntry;
use crate::state::QueryLogStore;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A query text and how often it was searched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularQuery {
    pub query: String,
    pub count: u64,
}

/// Search call counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    pub total_queries: u64,
    pub recent_queries: u64,
}

/// Best-effort append-only record of search calls
pub struct AnalyticsLogger {
    query_log: Arc<dyn QueryLogStore>,
}

impl AnalyticsLogger {
    pub fn new(query_log: Arc<dyn QueryLogStore>) -> Self {
        Self { query_log }
    }

    /// Record a search call. Failures are logged and swallowed.
    pub async fn log(
        &self,
        query: &str,
        result_count: u64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) {
        let entry = QueryLogEntry::new(query, result_count).with_client(ip_address, user_agent);
        self.append(&entry, "search").await;
    }

    /// Record a click-through from a result list. Failures are logged and swallowed.
    pub async fn log_click(
        &self,
        query: &str,
        content_id: u64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) {
        let entry = QueryLogEntry::new(query, 0)
            .with_click(content_id)
            .with_client(ip_address, user_agent);
        self.append(&entry, "click").await;
    }

    /// Most frequent query texts within the last `days` days
    pub async fn popular(&self, limit: usize, days: i64) -> Result<Vec<PopularQuery>> {
        let since = Utc::now() - Duration::days(days.max(0));
        let mut counts: HashMap<String, u64> = HashMap::new();

        for entry in self.query_log.queries_since(Some(since)).await? {
            if entry.clicked_content_id.is_some() || entry.query_text.trim().is_empty() {
                continue;
            }
            *counts.entry(entry.query_text).or_insert(0) += 1;
        }

        let mut popular: Vec<PopularQuery> = counts
            .into_iter()
            .map(|(query, count)| PopularQuery { query, count })
            .collect();
        popular.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
        popular.truncate(limit);

        Ok(popular)
    }

    /// Total search calls and those within the last `recent_days` days
    pub async fn stats(&self, recent_days: i64) -> Result<QueryStats> {
        let since = Utc::now() - Duration::days(recent_days.max(0));
        let mut stats = QueryStats {
            total_queries: 0,
            recent_queries: 0,
        };

        for entry in self.query_log.queries_since(None).await? {
            if entry.clicked_content_id.is_some() {
                continue;
            }
            stats.total_queries += 1;
            if entry.timestamp >= since {
                stats.recent_queries += 1;
            }
        }

        Ok(stats)
    }

    async fn append(&self, entry: &QueryLogEntry, kind: &str) {
        if let Err(e) = self.query_log.append_query(entry).await {
            SEARCH_METRICS.record_query_log_failure(kind);
            tracing::warn!(
                error = %e,
                kind,
                query = %entry.query_text,
                "Failed to record query, continuing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::state::InMemoryStore;
    use async_trait::async_trait;
    use chrono::DateTime;

    struct BrokenLog;

    #[async_trait]
    impl QueryLogStore for BrokenLog {
        async fn append_query(&self, _entry: &QueryLogEntry) -> Result<()> {
            Err(AppError::Storage("query log unavailable".to_string()))
        }

        async fn queries_since(&self, _since: Option<DateTime<Utc>>) -> Result<Vec<QueryLogEntry>> {
            Err(AppError::Storage("query log unavailable".to_string()))
        }

        async fn count_queries(&self, _since: Option<DateTime<Utc>>) -> Result<u64> {
            Err(AppError::Storage("query log unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_popular_groups_by_exact_text() {
        let store = Arc::new(InMemoryStore::new());
        let logger = AnalyticsLogger::new(store.clone());

        logger.log("rust", 3, None, None).await;
        logger.log("rust", 3, None, None).await;
        logger.log("Rust", 3, None, None).await;
        logger.log("python", 1, Some("127.0.0.1".into()), None).await;
        logger.log_click("rust", 1, None, None).await;

        let popular = logger.popular(10, 7).await.unwrap();
        assert_eq!(popular[0], PopularQuery { query: "rust".into(), count: 2 });
        assert_eq!(popular.len(), 3);

        assert_eq!(logger.popular(1, 7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_popular_window_excludes_old_queries() {
        let store = Arc::new(InMemoryStore::new());
        let mut old = QueryLogEntry::new("ancient", 0);
        old.timestamp = Utc::now() - Duration::days(30);
        store.append_query(&old).await.unwrap();

        let logger = AnalyticsLogger::new(store);
        logger.log("fresh", 0, None, None).await;

        let popular = logger.popular(10, 7).await.unwrap();
        assert_eq!(popular, vec![PopularQuery { query: "fresh".into(), count: 1 }]);

        let stats = logger.stats(7).await.unwrap();
        assert_eq!(stats.total_queries, 2);
        assert_eq!(stats.recent_queries, 1);
    }

    #[tokio::test]
    async fn test_log_failures_are_swallowed() {
        let logger = AnalyticsLogger::new(Arc::new(BrokenLog));
        logger.log("anything", 0, None, None).await;
        logger.log_click("anything", 1, None, None).await;
        assert!(logger.popular(5, 7).await.is_err());
    }
}
