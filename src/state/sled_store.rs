use crate::error::{AppError, Result};
use crate::models::{ContentRecord, QueryLogEntry};
use crate::state::{ContentFilter, ContentStore, QueryLogStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent content store and query log using the Sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    content_tree: sled::Tree,
    query_log_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref();
        let db = sled::open(path_str).map_err(|e| {
            AppError::Storage(format!("Failed to open Sled database: {}", e))
        })?;

        let content_tree = db.open_tree("content").map_err(|e| {
            AppError::Storage(format!("Failed to open content tree: {}", e))
        })?;

        let query_log_tree = db.open_tree("query_log").map_err(|e| {
            AppError::Storage(format!("Failed to open query_log tree: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path_str);

        Ok(Self {
            db: Arc::new(db),
            content_tree,
            query_log_tree,
        })
    }

    /// Content key; big-endian so tree order is ID order
    fn content_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn deserialize_record(bytes: &[u8]) -> Result<ContentRecord> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize content record: {}", e))
        })
    }

    fn deserialize_entry(bytes: &[u8]) -> Result<QueryLogEntry> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize query log entry: {}", e))
        })
    }

    /// Iterate over every content record
    fn scan_content(&self) -> impl Iterator<Item = Result<ContentRecord>> + '_ {
        self.content_tree.iter().values().map(|value| {
            let bytes = value.map_err(|e| {
                AppError::Storage(format!("Failed to read content tree: {}", e))
            })?;
            Self::deserialize_record(&bytes)
        })
    }

    /// Iterate over the query log in append order
    fn scan_query_log(&self) -> impl Iterator<Item = Result<QueryLogEntry>> + '_ {
        self.query_log_tree.iter().values().map(|value| {
            let bytes = value.map_err(|e| {
                AppError::Storage(format!("Failed to read query log: {}", e))
            })?;
            Self::deserialize_entry(&bytes)
        })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Storage(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }

    /// Get database size in bytes
    pub fn size_on_disk(&self) -> Result<u64> {
        self.db.size_on_disk().map_err(|e| {
            AppError::Storage(format!("Failed to get database size: {}", e))
        })
    }
}

#[async_trait]
impl ContentStore for SledStore {
    async fn save_content(&self, record: &ContentRecord) -> Result<()> {
        let value = bincode::serialize(record)?;

        self.content_tree
            .insert(Self::content_key(record.id), value)
            .map_err(|e| AppError::Storage(format!("Failed to save content: {}", e)))?;

        self.content_tree.flush().map_err(|e| {
            AppError::Storage(format!("Failed to flush content tree: {}", e))
        })?;

        tracing::debug!(content_id = record.id, status = %record.status, "Content saved to Sled");
        Ok(())
    }

    async fn get_content(&self, id: u64) -> Result<Option<ContentRecord>> {
        match self.content_tree.get(Self::content_key(id)) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize_record(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to get content: {}", e))),
        }
    }

    async fn delete_content(&self, id: u64) -> Result<()> {
        let removed = self
            .content_tree
            .remove(Self::content_key(id))
            .map_err(|e| AppError::Storage(format!("Failed to delete content: {}", e)))?;

        if removed.is_none() {
            return Err(AppError::NotFound(format!("Content {} not found", id)));
        }

        tracing::debug!(content_id = id, "Content deleted from Sled");
        Ok(())
    }

    async fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentRecord>> {
        let mut records = Vec::new();
        for record in self.scan_content() {
            let record = record?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn fetch_many(&self, ids: &[u64], filter: &ContentFilter) -> Result<Vec<ContentRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get_content(*id).await? {
                if filter.matches(&record) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    async fn count_content(&self, filter: &ContentFilter) -> Result<u64> {
        let mut count = 0;
        for record in self.scan_content() {
            if filter.matches(&record?) {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl QueryLogStore for SledStore {
    async fn append_query(&self, entry: &QueryLogEntry) -> Result<()> {
        // Monotonic IDs keep the tree in append order
        let id = self.db.generate_id().map_err(|e| {
            AppError::Storage(format!("Failed to generate query log id: {}", e))
        })?;
        let value = bincode::serialize(entry)?;

        self.query_log_tree
            .insert(id.to_be_bytes(), value)
            .map_err(|e| AppError::Storage(format!("Failed to append query log: {}", e)))?;

        Ok(())
    }

    async fn queries_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<QueryLogEntry>> {
        let mut entries = Vec::new();
        for entry in self.scan_query_log() {
            let entry = entry?;
            if since.map_or(true, |s| entry.timestamp >= s) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn count_queries(&self, since: Option<DateTime<Utc>>) -> Result<u64> {
        match since {
            None => Ok(self.query_log_tree.len() as u64),
            Some(_) => Ok(self.queries_since(since).await?.len() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sled_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        let record = ContentRecord::new(7, "Sled Notes", "<p>Embedded storage</p>")
            .with_tags(vec!["storage", "rust"])
            .publish();
        store.save_content(&record).await.unwrap();

        let fetched = store.get_content(7).await.unwrap().unwrap();
        assert_eq!(fetched, record);

        store.delete_content(7).await.unwrap();
        assert!(store.get_content(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_content_is_ordered_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        for id in [300u64, 2, 41] {
            store
                .save_content(&ContentRecord::new(id, format!("Post {}", id), "body").publish())
                .await
                .unwrap();
        }

        let ids: Vec<u64> = store
            .list_published()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 41, 300]);
    }

    #[tokio::test]
    async fn test_query_log_append_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        store.append_query(&QueryLogEntry::new("first", 1)).await.unwrap();
        store.append_query(&QueryLogEntry::new("second", 0)).await.unwrap();

        let entries = store.queries_since(None).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query_text, "first");
        assert_eq!(store.count_queries(None).await.unwrap(), 2);
    }
}
