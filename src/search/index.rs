//! Search index lifecycle management

use crate::metrics::SEARCH_METRICS;
use crate::search::config::SearchConfig;
use crate::search::document::{build_content_schema, ContentFields, IndexEntry, SearchDocument};
use crate::search::error::{SearchError, SearchResult};
use crate::state::ContentStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, Term};
use tokio::sync::{Mutex, RwLock};

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Live documents in the index
    pub total_documents: u64,

    /// Index size in bytes
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// An open index with its writer and reader
pub struct IndexHandle {
    index: Index,
    fields: ContentFields,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
}

impl IndexHandle {
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn fields(&self) -> &ContentFields {
        &self.fields
    }

    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    /// Delete-then-insert each entry and commit them together.
    ///
    /// The delete terms and the new documents become visible in the same
    /// commit, so readers never see a duplicate or a gap for one id. On any
    /// failure the pending operations are rolled back.
    async fn write_entries(&self, entries: &[IndexEntry]) -> SearchResult<usize> {
        let mut writer = self.writer.lock().await;

        for entry in entries {
            writer.delete_term(Term::from_field_u64(self.fields.content_id, entry.document_id()));

            if let Err(e) = writer.add_document(entry.to_tantivy_doc(&self.fields)) {
                let _ = writer.rollback();
                return Err(SearchError::IndexingFailed(format!(
                    "Failed to add content {}: {}",
                    entry.content_id, e
                )));
            }
        }

        if let Err(e) = writer.commit() {
            let _ = writer.rollback();
            return Err(SearchError::IndexingFailed(format!("Failed to commit: {}", e)));
        }
        drop(writer);

        self.reload()?;
        Ok(entries.len())
    }

    async fn delete_ids(&self, ids: &[u64]) -> SearchResult<()> {
        let mut writer = self.writer.lock().await;

        for id in ids {
            writer.delete_term(Term::from_field_u64(self.fields.content_id, *id));
        }

        if let Err(e) = writer.commit() {
            let _ = writer.rollback();
            return Err(SearchError::DeletionFailed(format!(
                "Failed to commit deletion: {}",
                e
            )));
        }
        drop(writer);

        self.reload()
    }

    fn reload(&self) -> SearchResult<()> {
        self.reader
            .reload()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to reload reader: {}", e)))
    }
}

/// Owns the index structure: creation, population, teardown.
///
/// The handle is explicit process state. Until `create_index` runs (or after
/// `drop_index`) every operation fails with `SearchError::IndexNotFound`.
pub struct IndexManager {
    config: SearchConfig,
    content: Arc<dyn ContentStore>,
    handle: RwLock<Option<Arc<IndexHandle>>>,
}

impl IndexManager {
    /// Create a manager with no open index
    pub fn new(config: SearchConfig, content: Arc<dyn ContentStore>) -> Self {
        Self {
            config,
            content,
            handle: RwLock::new(None),
        }
    }

    /// Create a manager and open (or create) the index without populating it
    pub async fn open(config: SearchConfig, content: Arc<dyn ContentStore>) -> SearchResult<Self> {
        let manager = Self::new(config, content);
        manager.create_index(false).await?;
        Ok(manager)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Idempotently create the index; with `populate`, also load every published record.
    ///
    /// Returns the number of documents written by population.
    pub async fn create_index(&self, populate: bool) -> SearchResult<usize> {
        {
            let mut guard = self.handle.write().await;
            if guard.is_none() {
                *guard = Some(Arc::new(self.open_or_create()?));
            }
        }

        if populate {
            self.populate().await
        } else {
            Ok(0)
        }
    }

    /// Drop and recreate the index from every published record.
    ///
    /// Not atomic: if this fails after the drop, the index is missing or only
    /// partly populated until the next successful rebuild.
    pub async fn rebuild_index(&self) -> SearchResult<usize> {
        tracing::info!(path = ?self.config.index_path, "Rebuilding search index");
        self.drop_index().await?;
        let indexed = self.create_index(true).await?;
        tracing::info!(documents = indexed, "Search index rebuilt");
        Ok(indexed)
    }

    /// Close the index and delete its directory
    pub async fn drop_index(&self) -> SearchResult<()> {
        let mut guard = self.handle.write().await;
        // Dropping the handle releases the writer lock file
        guard.take();

        let path = &self.config.index_path;
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }

        tracing::info!(path = ?path, "Search index dropped");
        Ok(())
    }

    /// Whether the index is open and its directory still holds an index
    pub async fn index_exists(&self) -> bool {
        self.handle.read().await.is_some() && Self::index_on_disk(&self.config.index_path)
    }

    /// The open index, or `IndexNotFound`
    pub async fn handle(&self) -> SearchResult<Arc<IndexHandle>> {
        self.handle.read().await.clone().ok_or_else(|| {
            SearchError::IndexNotFound(format!(
                "no open index at {}",
                self.config.index_path.display()
            ))
        })
    }

    /// Replace any entry for this id with `entry`
    pub async fn upsert(&self, entry: &IndexEntry) -> SearchResult<()> {
        let handle = self.handle().await?;
        let result = handle.write_entries(std::slice::from_ref(entry)).await;
        SEARCH_METRICS.record_index_operation("upsert", result.is_ok());
        result?;

        tracing::debug!(content_id = entry.content_id, "Index entry upserted");
        Ok(())
    }

    /// Upsert many entries in one commit
    pub async fn upsert_batch(&self, entries: &[IndexEntry]) -> SearchResult<usize> {
        let handle = self.handle().await?;
        let result = handle.write_entries(entries).await;
        SEARCH_METRICS.record_index_operation("upsert_batch", result.is_ok());
        result
    }

    /// Delete any entry for this id (no-op if absent)
    pub async fn delete(&self, content_id: u64) -> SearchResult<()> {
        let handle = self.handle().await?;
        let result = handle.delete_ids(&[content_id]).await;
        SEARCH_METRICS.record_index_operation("delete", result.is_ok());
        result?;

        tracing::debug!(content_id, "Index entry removed");
        Ok(())
    }

    /// Live (non-deleted) documents in the index
    pub async fn document_count(&self) -> SearchResult<u64> {
        let handle = self.handle().await?;
        Ok(handle.searcher().num_docs())
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        let handle = self.handle().await?;
        let searcher = handle.searcher();

        let index_size_bytes = std::fs::read_dir(&self.config.index_path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);

        Ok(IndexStats {
            total_documents: searcher.num_docs(),
            index_size_bytes,
            num_segments: searcher.segment_readers().len(),
        })
    }

    /// Load every published record, committing once per batch
    async fn populate(&self) -> SearchResult<usize> {
        let records = self.content.list_published().await?;
        let total = records.len();
        let mut indexed = 0;

        for chunk in records.chunks(self.config.bulk_batch_size) {
            let entries: Vec<IndexEntry> = chunk.iter().map(IndexEntry::from).collect();
            indexed += self.upsert_batch(&entries).await?;
            tracing::debug!(indexed, total, "Bulk population progress");
        }

        tracing::info!(documents = indexed, "Search index populated");
        Ok(indexed)
    }

    fn open_or_create(&self) -> SearchResult<IndexHandle> {
        let path = &self.config.index_path;

        std::fs::create_dir_all(path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        let index = if Self::index_on_disk(path) {
            tracing::info!(path = ?path, "Opening existing search index");
            Index::open_in_dir(path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?
        } else {
            tracing::info!(path = ?path, "Creating search index");
            Index::create_in_dir(path, build_content_schema()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })?
        };

        let fields = ContentFields::from_schema(&index.schema()).map_err(|e| {
            SearchError::IndexInitFailed(format!("Index schema does not match: {}", e))
        })?;

        let writer = index
            .writer(self.config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        // Reloaded explicitly after every commit
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        Ok(IndexHandle {
            index,
            fields,
            writer: Mutex::new(writer),
            reader,
        })
    }

    /// Check if an index exists at the given path
    fn index_on_disk(path: &Path) -> bool {
        path.join("meta.json").exists()
    }
}
