pub mod store;
pub mod sled_store;
pub mod factory;

pub use store::*;
pub use sled_store::SledStore;
pub use factory::{create_stores, create_in_memory_stores, Stores};

use crate::error::Result;
use crate::models::{ContentRecord, PublicationStatus, QueryLogEntry};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Trait for content repository operations consumed by the search subsystem
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Save (insert or replace) a content record
    async fn save_content(&self, record: &ContentRecord) -> Result<()>;

    /// Get a content record by ID
    async fn get_content(&self, id: u64) -> Result<Option<ContentRecord>>;

    /// Delete a content record
    async fn delete_content(&self, id: u64) -> Result<()>;

    /// List records matching the filter, ordered by ID
    async fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentRecord>>;

    /// Fetch the given IDs, keeping only records that match the filter (order unspecified)
    async fn fetch_many(&self, ids: &[u64], filter: &ContentFilter) -> Result<Vec<ContentRecord>>;

    /// Count records matching the filter
    async fn count_content(&self, filter: &ContentFilter) -> Result<u64>;

    /// Full listing of published records (bulk population)
    async fn list_published(&self) -> Result<Vec<ContentRecord>> {
        self.list_content(&ContentFilter::published()).await
    }

    /// Number of published records
    async fn count_published(&self) -> Result<u64> {
        self.count_content(&ContentFilter::published()).await
    }
}

/// Trait for the append-only query log
#[async_trait]
pub trait QueryLogStore: Send + Sync {
    /// Append a query log entry
    async fn append_query(&self, entry: &QueryLogEntry) -> Result<()>;

    /// Entries at or after `since` (all entries when `None`), oldest first
    async fn queries_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<QueryLogEntry>>;

    /// Count entries at or after `since`
    async fn count_queries(&self, since: Option<DateTime<Utc>>) -> Result<u64>;
}

/// Filter for querying content records
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub status: Option<PublicationStatus>,
    pub category: Option<String>,
    pub published_from: Option<NaiveDate>,
    pub published_to: Option<NaiveDate>,
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
}

impl ContentFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PublicationStatus::Published),
            ..Default::default()
        }
    }

    /// Check a record against every set criterion
    pub fn matches(&self, record: &ContentRecord) -> bool {
        let status_match = self.status.map_or(true, |s| record.status == s);

        let category_match = self
            .category
            .as_ref()
            .map_or(true, |c| &record.category == c);

        let date_match = if self.published_from.is_none() && self.published_to.is_none() {
            true
        } else {
            match record.published_date() {
                Some(date) => {
                    self.published_from.map_or(true, |from| date >= from)
                        && self.published_to.map_or(true, |to| date <= to)
                }
                None => false,
            }
        };

        let title_match = self.title_contains.as_ref().map_or(true, |needle| {
            record.title.to_lowercase().contains(&needle.to_lowercase())
        });

        status_match && category_match && date_match && title_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_matches_category_and_dates() {
        let record = ContentRecord::new(1, "Rust Ownership", "body")
            .with_category("programming")
            .published_on(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap());

        let filter = ContentFilter {
            status: Some(PublicationStatus::Published),
            category: Some("programming".to_string()),
            published_from: NaiveDate::from_ymd_opt(2024, 3, 15),
            published_to: NaiveDate::from_ymd_opt(2024, 3, 15),
            ..Default::default()
        };
        assert!(filter.matches(&record));

        let filter = ContentFilter {
            category: Some("Programming".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&record));

        let filter = ContentFilter {
            published_from: NaiveDate::from_ymd_opt(2024, 3, 16),
            ..Default::default()
        };
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_date_filter_excludes_unpublished_dates() {
        let record = ContentRecord::new(1, "Draft", "body");
        let filter = ContentFilter {
            published_to: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..Default::default()
        };
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_title_contains_is_case_insensitive() {
        let record = ContentRecord::new(1, "Python Basics", "body");
        let filter = ContentFilter {
            title_contains: Some("pyTH".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record));
    }
}
