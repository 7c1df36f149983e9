//! Search service facade for admin and public callers

use crate::config::Config;
use crate::models::ContentRecord;
use crate::search::analytics::{AnalyticsLogger, PopularQuery};
use crate::search::config::{HealthConfig, SearchConfig};
use crate::search::error::SearchResult;
use crate::search::executor::{PagedResult, QueryExecutor};
use crate::search::health::{coverage_percent, HealthProbe, HealthReport};
use crate::search::index::{IndexManager, IndexStats};
use crate::search::indexer::{ContentEvent, Indexer, SyncAction};
use crate::search::query::SearchFilters;
use crate::search::suggest::SuggestionEngine;
use crate::state::{create_stores, ContentStore, QueryLogStore, Stores};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Coverage and query volume for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    pub indexed_documents: u64,
    pub published_records: u64,
    pub coverage_percent: f64,
    pub total_queries: u64,
    pub recent_queries: u64,
}

/// Main search service.
///
/// Owns the index handle and the stores. Every operation runs inside the
/// caller's request; nothing is scheduled in the background.
pub struct SearchService {
    /// Index manager
    index_manager: Arc<IndexManager>,

    indexer: Indexer,
    executor: Arc<QueryExecutor>,
    suggestions: SuggestionEngine,
    analytics: AnalyticsLogger,
    health: HealthProbe,

    content: Arc<dyn ContentStore>,
    query_log: Arc<dyn QueryLogStore>,

    /// Configuration
    config: SearchConfig,
    health_config: HealthConfig,
}

impl SearchService {
    /// Wire the components without opening the index
    pub fn new(config: SearchConfig, health_config: HealthConfig, stores: Stores) -> Self {
        let Stores { content, query_log } = stores;

        let index_manager = Arc::new(IndexManager::new(config.clone(), content.clone()));
        let executor = Arc::new(QueryExecutor::new(index_manager.clone(), content.clone()));

        Self {
            indexer: Indexer::new(index_manager.clone(), content.clone()),
            suggestions: SuggestionEngine::new(
                query_log.clone(),
                content.clone(),
                config.enable_suggestions,
            ),
            analytics: AnalyticsLogger::new(query_log.clone()),
            health: HealthProbe::new(
                index_manager.clone(),
                executor.clone(),
                content.clone(),
                health_config.clone(),
            ),
            index_manager,
            executor,
            content,
            query_log,
            config,
            health_config,
        }
    }

    /// Wire the components and open (or create) the index
    pub async fn open(
        config: SearchConfig,
        health_config: HealthConfig,
        stores: Stores,
    ) -> SearchResult<Self> {
        let service = Self::new(config, health_config, stores);
        service.create_index(false).await?;
        Ok(service)
    }

    /// Build stores from application configuration and open the index
    pub async fn from_config(config: &Config) -> crate::error::Result<Self> {
        let stores = create_stores(&config.store)?;
        Ok(Self::open(config.search.clone(), config.health.clone(), stores).await?)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn content_store(&self) -> Arc<dyn ContentStore> {
        self.content.clone()
    }

    pub fn query_log(&self) -> Arc<dyn QueryLogStore> {
        self.query_log.clone()
    }

    // Index lifecycle

    /// Idempotently create the index, optionally populating it
    pub async fn create_index(&self, populate: bool) -> SearchResult<usize> {
        self.index_manager.create_index(populate).await
    }

    /// Drop and repopulate the index from every published record
    pub async fn rebuild_index(&self) -> SearchResult<usize> {
        self.index_manager.rebuild_index().await
    }

    pub async fn drop_index(&self) -> SearchResult<()> {
        self.index_manager.drop_index().await
    }

    pub async fn index_exists(&self) -> bool {
        self.index_manager.index_exists().await
    }

    pub async fn index_stats(&self) -> SearchResult<IndexStats> {
        self.index_manager.get_stats().await
    }

    // Synchronization

    /// Index a record if published, otherwise remove its entry
    pub async fn index_content(&self, record: &ContentRecord) -> SearchResult<SyncAction> {
        self.indexer.index(record).await
    }

    pub async fn remove_content(&self, content_id: u64) -> SearchResult<()> {
        self.indexer.remove(content_id).await
    }

    /// Re-derive one entry from the content store
    pub async fn sync_content(&self, content_id: u64) -> SearchResult<SyncAction> {
        self.indexer.sync(content_id).await
    }

    pub async fn apply_event(&self, event: &ContentEvent) -> SearchResult<SyncAction> {
        self.indexer.apply(event).await
    }

    // Queries

    /// Ranked, filtered, paginated search. Never fails.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: usize,
        per_page: usize,
    ) -> PagedResult {
        self.executor.search(query, filters, page, per_page).await
    }

    pub async fn suggest(&self, partial: &str, limit: usize) -> Vec<String> {
        self.suggestions.suggest(partial, limit).await
    }

    // Analytics

    /// Record a search call; failures are swallowed
    pub async fn log_query(
        &self,
        query: &str,
        result_count: u64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) {
        self.analytics
            .log(query, result_count, ip_address, user_agent)
            .await
    }

    /// Record a click-through; failures are swallowed
    pub async fn log_click(
        &self,
        query: &str,
        content_id: u64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) {
        self.analytics
            .log_click(query, content_id, ip_address, user_agent)
            .await
    }

    pub async fn popular(&self, limit: usize, days: i64) -> SearchResult<Vec<PopularQuery>> {
        Ok(self.analytics.popular(limit, days).await?)
    }

    // Reporting

    /// Coverage plus total and recent query counts
    pub async fn get_stats(&self) -> SearchResult<SearchStats> {
        let indexed_documents = self.index_manager.document_count().await?;
        let published_records = self.content.count_published().await?;
        let queries = self
            .analytics
            .stats(self.health_config.recent_query_days)
            .await?;

        Ok(SearchStats {
            indexed_documents,
            published_records,
            coverage_percent: coverage_percent(indexed_documents, published_records),
            total_queries: queries.total_queries,
            recent_queries: queries.recent_queries,
        })
    }

    pub async fn health(&self) -> HealthReport {
        self.health.check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::health::HealthStatus;
    use crate::state::create_in_memory_stores;
    use tempfile::TempDir;

    async fn create_test_service(temp_dir: &TempDir) -> SearchService {
        let config = SearchConfig {
            index_path: temp_dir.path().join("index"),
            ..Default::default()
        };

        SearchService::open(config, HealthConfig::default(), create_in_memory_stores())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_service_creation() {
        let temp_dir = TempDir::new().unwrap();
        let service = create_test_service(&temp_dir).await;

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.indexed_documents, 0);
        assert_eq!(stats.coverage_percent, 100.0);
    }

    #[tokio::test]
    async fn test_index_and_search() {
        let temp_dir = TempDir::new().unwrap();
        let service = create_test_service(&temp_dir).await;

        let record = ContentRecord::new(1, "Database connection pooling", "<p>Pools reuse connections</p>")
            .publish();
        service.content_store().save_content(&record).await.unwrap();
        service.index_content(&record).await.unwrap();

        let results = service.search("database", &SearchFilters::default(), 1, 10).await;
        assert_eq!(results.total_results, 1);
        assert_eq!(results.posts[0].content.id, 1);

        service.log_query("database", results.total_results as u64, None, None).await;
        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total_queries, 1);
        assert_eq!(stats.recent_queries, 1);
    }

    #[tokio::test]
    async fn test_health_after_drop_is_critical() {
        let temp_dir = TempDir::new().unwrap();
        let service = create_test_service(&temp_dir).await;

        assert_eq!(service.health().await.status, HealthStatus::Healthy);

        service.drop_index().await.unwrap();
        let report = service.health().await;
        assert_eq!(report.status, HealthStatus::Critical);
        assert!(!report.index_exists);
    }
}
