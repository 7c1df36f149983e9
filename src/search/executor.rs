//! Ranked, filtered, paginated query execution

use crate::metrics::SEARCH_METRICS;
use crate::models::ContentRecord;
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::excerpt::ExcerptHighlighter;
use crate::search::index::IndexManager;
use crate::search::query::{QueryBuilder, SearchFilters};
use crate::search::sanitizer::{QuerySanitizer, SafeQuery};
use crate::search::text::normalize_html;
use crate::state::ContentStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tantivy::collector::TopDocs;
use tantivy::query::Query;
use tantivy::schema::Value;
use tantivy::{Searcher, SnippetGenerator, TantivyDocument};

/// A single ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: ContentRecord,

    /// Index relevance score
    pub score: f32,

    /// Highlighted excerpt of the body
    pub excerpt: String,
}

/// One page of search results with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult {
    pub posts: Vec<SearchHit>,

    /// Matches across all pages
    pub total_results: usize,

    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,

    /// Query text as received
    pub query: String,

    /// Set when the query failed and the result was emptied
    pub error: Option<String>,

    pub search_time_ms: f64,
}

impl PagedResult {
    /// No matches and no error
    pub fn empty(query: impl Into<String>, page: usize, per_page: usize) -> Self {
        Self {
            posts: Vec::new(),
            total_results: 0,
            page,
            per_page,
            total_pages: 0,
            has_prev: page > 1,
            has_next: false,
            query: query.into(),
            error: None,
            search_time_ms: 0.0,
        }
    }

    /// Empty result carrying the failure message
    pub fn failed(
        query: impl Into<String>,
        page: usize,
        per_page: usize,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(query, page, per_page)
        }
    }

    /// Number of hits on this page
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Runs sanitized queries against the index and joins them with the content store
pub struct QueryExecutor {
    manager: Arc<IndexManager>,
    content: Arc<dyn ContentStore>,
    highlighter: ExcerptHighlighter,
    config: SearchConfig,
}

impl QueryExecutor {
    pub fn new(manager: Arc<IndexManager>, content: Arc<dyn ContentStore>) -> Self {
        let config = manager.config().clone();
        Self {
            highlighter: ExcerptHighlighter::from_config(&config),
            manager,
            content,
            config,
        }
    }

    /// Search published content. Never fails: errors come back in `PagedResult::error`.
    ///
    /// `page` is 1-based and `page < 1` reads as 1. `per_page` is clamped to
    /// `[1, max_per_page]`.
    #[tracing::instrument(skip(self, filters), fields(outcome = tracing::field::Empty))]
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: usize,
        per_page: usize,
    ) -> PagedResult {
        let start = Instant::now();
        let page = page.max(1);
        let per_page = per_page.clamp(1, self.config.max_per_page.max(1));

        if query.trim().is_empty() {
            tracing::Span::current().record("outcome", "empty_query");
            SEARCH_METRICS.record_search("empty_query", start.elapsed().as_secs_f64());
            return PagedResult::empty(query, page, per_page);
        }

        let safe = QuerySanitizer::sanitize(query.trim());
        tracing::debug!(safe_query = %safe, rule = ?safe.rule(), "Query sanitized");

        let mut result = match self.execute(query, &safe, filters, page, per_page).await {
            Ok(result) => {
                tracing::Span::current().record("outcome", "ok");
                SEARCH_METRICS.record_search("ok", start.elapsed().as_secs_f64());
                result
            }
            Err(e) => {
                let outcome = Self::failure_outcome(&e);
                tracing::Span::current().record("outcome", outcome);
                tracing::warn!(error = %e, safe_query = %safe, "Search failed, returning empty result");
                SEARCH_METRICS.record_search(outcome, start.elapsed().as_secs_f64());
                PagedResult::failed(query, page, per_page, e.to_string())
            }
        };

        result.search_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        result
    }

    /// Ranked content ids for a sanitized query, best first
    pub async fn ranked_ids(&self, safe: &SafeQuery) -> SearchResult<Vec<(u64, f32)>> {
        let handle = self.manager.handle().await?;
        let parsed = QueryBuilder::new(handle.index(), handle.fields(), self.config.title_boost)
            .build(safe)?;
        let searcher = handle.searcher();

        self.collect_ranked(&searcher, &*parsed, handle.fields().content_id)
    }

    async fn execute(
        &self,
        query: &str,
        safe: &SafeQuery,
        filters: &SearchFilters,
        page: usize,
        per_page: usize,
    ) -> SearchResult<PagedResult> {
        let handle = self.manager.handle().await?;
        let fields = *handle.fields();
        let parsed = QueryBuilder::new(handle.index(), &fields, self.config.title_boost)
            .build(safe)?;
        let searcher = handle.searcher();

        let ranked = self.collect_ranked(&searcher, &*parsed, fields.content_id)?;

        // Join with the store; filters narrow the ranked list, never reorder it
        let ids: Vec<u64> = ranked.iter().map(|(id, _)| *id).collect();
        let records = self
            .content
            .fetch_many(&ids, &filters.to_content_filter())
            .await?;
        let mut by_id: HashMap<u64, ContentRecord> =
            records.into_iter().map(|r| (r.id, r)).collect();

        let matched: Vec<(ContentRecord, f32)> = ranked
            .into_iter()
            .filter_map(|(id, score)| by_id.remove(&id).map(|record| (record, score)))
            .collect();

        let total_results = matched.len();
        let total_pages = total_results.div_ceil(per_page);
        let offset = (page - 1).saturating_mul(per_page);

        let snippets = if self.config.native_snippets {
            match SnippetGenerator::create(&searcher, &*parsed, fields.body) {
                Ok(mut generator) => {
                    generator.set_max_num_chars(self.config.excerpt_length);
                    Some(generator)
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Native snippets unavailable, using window excerpts");
                    None
                }
            }
        } else {
            None
        };

        let posts = matched
            .into_iter()
            .skip(offset)
            .take(per_page)
            .map(|(content, score)| {
                let excerpt = self.excerpt_for(&content, query, snippets.as_ref());
                SearchHit {
                    content,
                    score,
                    excerpt,
                }
            })
            .collect();

        Ok(PagedResult {
            posts,
            total_results,
            page,
            per_page,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
            query: query.to_string(),
            error: None,
            search_time_ms: 0.0,
        })
    }

    fn collect_ranked(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        id_field: tantivy::schema::Field,
    ) -> SearchResult<Vec<(u64, f32)>> {
        let top_docs = searcher
            .search(query, &TopDocs::with_limit(self.config.max_candidates.max(1)))
            .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;

        let mut ranked = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;

            if let Some(id) = doc.get_first(id_field).and_then(|v| v.as_u64()) {
                ranked.push((id, score));
            }
        }

        Ok(ranked)
    }

    /// Native snippet when it highlights something, window excerpt otherwise
    fn excerpt_for(
        &self,
        record: &ContentRecord,
        query: &str,
        snippets: Option<&SnippetGenerator>,
    ) -> String {
        let source = if record.body.trim().is_empty() {
            &record.summary
        } else {
            &record.body
        };

        if let Some(generator) = snippets {
            let snippet = generator.snippet(&normalize_html(source));
            if !snippet.is_empty() && !snippet.highlighted().is_empty() {
                return self
                    .highlighter
                    .mark_ranges(snippet.fragment(), snippet.highlighted());
            }
        }

        self.highlighter
            .excerpt(source, query, self.config.excerpt_length)
    }

    fn failure_outcome(error: &SearchError) -> &'static str {
        match error {
            e if e.is_grammar_error() => "grammar_error",
            SearchError::IndexNotFound(_) => "index_missing",
            _ => "storage_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::document::IndexEntry;
    use crate::state::InMemoryStore;
    use tempfile::TempDir;

    async fn setup(temp_dir: &TempDir, native_snippets: bool) -> (QueryExecutor, Arc<InMemoryStore>) {
        let config = SearchConfig {
            index_path: temp_dir.path().join("index"),
            native_snippets,
            ..Default::default()
        };
        let store = Arc::new(InMemoryStore::new());
        let manager = Arc::new(IndexManager::open(config, store.clone()).await.unwrap());

        let record = ContentRecord::new(1, "Python Basics", "<p>Learn Python today</p>")
            .with_category("programming")
            .publish();
        store.save_content(&record).await.unwrap();
        manager.upsert(&IndexEntry::from(&record)).await.unwrap();

        (QueryExecutor::new(manager, store.clone()), store)
    }

    #[tokio::test]
    async fn test_search_highlights_match() {
        for native in [true, false] {
            let temp_dir = TempDir::new().unwrap();
            let (executor, _) = setup(&temp_dir, native).await;
            let result = executor.search("Python", &SearchFilters::default(), 1, 10).await;

            assert!(result.error.is_none());
            assert_eq!(result.total_results, 1);
            assert_eq!(result.posts[0].content.id, 1);
            assert!(result.posts[0].excerpt.contains("<mark>Python</mark>"));
        }
    }

    #[tokio::test]
    async fn test_empty_query_returns_empty_page() {
        let temp_dir = TempDir::new().unwrap();
        let (executor, _) = setup(&temp_dir, true).await;

        let result = executor.search("   ", &SearchFilters::default(), 0, 0).await;
        assert!(result.is_empty());
        assert_eq!(result.total_results, 0);
        assert_eq!(result.page, 1);
        assert_eq!(result.per_page, 1);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_category_filter_excludes() {
        let temp_dir = TempDir::new().unwrap();
        let (executor, _) = setup(&temp_dir, true).await;

        let filters = SearchFilters::new().with_category("cooking");
        let result = executor.search("python", &filters, 1, 10).await;
        assert_eq!(result.total_results, 0);
        assert_eq!(result.total_pages, 0);
        assert!(!result.has_next);
    }

    #[tokio::test]
    async fn test_missing_index_absorbed() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().join("index"),
            ..Default::default()
        };
        let store = Arc::new(InMemoryStore::new());
        let manager = Arc::new(IndexManager::new(config, store.clone()));
        let executor = QueryExecutor::new(manager, store);

        let result = executor.search("python", &SearchFilters::default(), 1, 10).await;
        assert!(result.is_empty());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_index_entry_without_store_record_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let (executor, store) = setup(&temp_dir, true).await;

        store.delete_content(1).await.unwrap();
        let result = executor.search("python", &SearchFilters::default(), 1, 10).await;
        assert_eq!(result.total_results, 0);
        assert!(result.error.is_none());
    }
}
