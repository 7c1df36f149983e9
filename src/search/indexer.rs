//! Per-record synchronization between the content store and the index

use crate::models::ContentRecord;
use crate::search::document::IndexEntry;
use crate::search::error::SearchResult;
use crate::search::index::IndexManager;
use crate::state::ContentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Content lifecycle transitions reported by the authoring side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ContentEvent {
    Created(ContentRecord),
    Updated(ContentRecord),
    Published(ContentRecord),
    Unpublished(u64),
    Deleted(u64),
}

impl ContentEvent {
    pub fn content_id(&self) -> u64 {
        match self {
            ContentEvent::Created(r) | ContentEvent::Updated(r) | ContentEvent::Published(r) => r.id,
            ContentEvent::Unpublished(id) | ContentEvent::Deleted(id) => *id,
        }
    }
}

/// What a sync call did to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    Indexed,
    Removed,
}

/// Keeps index entries in step with content records.
///
/// An entry for id X exists iff the last record synchronized for X was
/// published. Nothing here subscribes to changes; callers invoke it after
/// each create, update, publish, unpublish or delete.
pub struct Indexer {
    manager: Arc<IndexManager>,
    content: Arc<dyn ContentStore>,
}

impl Indexer {
    pub fn new(manager: Arc<IndexManager>, content: Arc<dyn ContentStore>) -> Self {
        Self { manager, content }
    }

    /// Index a published record, or remove the entry of any other record.
    ///
    /// Published records are always deleted and reinserted, even when
    /// unchanged. Storage failures propagate.
    pub async fn index(&self, record: &ContentRecord) -> SearchResult<SyncAction> {
        if !record.is_published() {
            tracing::debug!(
                content_id = record.id,
                status = %record.status,
                "Record not published, removing from index"
            );
            self.remove(record.id).await?;
            return Ok(SyncAction::Removed);
        }

        self.manager.upsert(&IndexEntry::from(record)).await?;
        Ok(SyncAction::Indexed)
    }

    /// Remove the entry for `content_id`; no-op if absent
    pub async fn remove(&self, content_id: u64) -> SearchResult<()> {
        self.manager.delete(content_id).await
    }

    /// Re-derive the entry for `content_id` from the current store state
    pub async fn sync(&self, content_id: u64) -> SearchResult<SyncAction> {
        match self.content.get_content(content_id).await? {
            Some(record) => self.index(&record).await,
            None => {
                self.remove(content_id).await?;
                Ok(SyncAction::Removed)
            }
        }
    }

    /// Apply one lifecycle event
    pub async fn apply(&self, event: &ContentEvent) -> SearchResult<SyncAction> {
        tracing::debug!(content_id = event.content_id(), ?event, "Applying content event");

        match event {
            ContentEvent::Created(record)
            | ContentEvent::Updated(record)
            | ContentEvent::Published(record) => self.index(record).await,
            ContentEvent::Unpublished(id) | ContentEvent::Deleted(id) => {
                self.remove(*id).await?;
                Ok(SyncAction::Removed)
            }
        }
    }
}
