use crate::error::{AppError, Result};
use crate::models::{ContentRecord, QueryLogEntry};
use crate::state::{ContentFilter, ContentStore, QueryLogStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory content store and query log (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    content: Arc<DashMap<u64, ContentRecord>>,
    query_log: Arc<RwLock<Vec<QueryLogEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            content: Arc::new(DashMap::new()),
            query_log: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn save_content(&self, record: &ContentRecord) -> Result<()> {
        self.content.insert(record.id, record.clone());
        tracing::debug!(content_id = record.id, status = %record.status, "Content saved");
        Ok(())
    }

    async fn get_content(&self, id: u64) -> Result<Option<ContentRecord>> {
        Ok(self.content.get(&id).map(|entry| entry.clone()))
    }

    async fn delete_content(&self, id: u64) -> Result<()> {
        if self.content.remove(&id).is_some() {
            tracing::debug!(content_id = id, "Content deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Content {} not found", id)))
        }
    }

    async fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentRecord>> {
        let mut records: Vec<ContentRecord> = self
            .content
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn fetch_many(&self, ids: &[u64], filter: &ContentFilter) -> Result<Vec<ContentRecord>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.content.get(id).map(|entry| entry.clone()))
            .filter(|record| filter.matches(record))
            .collect())
    }

    async fn count_content(&self, filter: &ContentFilter) -> Result<u64> {
        let count = self
            .content
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count();

        Ok(count as u64)
    }
}

#[async_trait]
impl QueryLogStore for InMemoryStore {
    async fn append_query(&self, entry: &QueryLogEntry) -> Result<()> {
        self.query_log.write().push(entry.clone());
        Ok(())
    }

    async fn queries_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<QueryLogEntry>> {
        let log = self.query_log.read();
        Ok(log
            .iter()
            .filter(|entry| since.map_or(true, |s| entry.timestamp >= s))
            .cloned()
            .collect())
    }

    async fn count_queries(&self, since: Option<DateTime<Utc>>) -> Result<u64> {
        let log = self.query_log.read();
        let count = log
            .iter()
            .filter(|entry| since.map_or(true, |s| entry.timestamp >= s))
            .count();

        Ok(count as u64)
    }
}
