use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// A unit of publishable content owned by the content store.
///
/// The search subsystem reads these records but never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ContentRecord {
    /// Unique identifier
    pub id: u64,

    /// Human-readable title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// Body, usually HTML
    pub body: String,

    /// Short summary shown in listings
    #[serde(default)]
    pub summary: String,

    /// Category name (exact-match filter)
    #[serde(default)]
    pub category: String,

    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: PublicationStatus,

    /// Publication timestamp (set once published)
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Create a new draft
    pub fn new(id: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id,
            title: title.into(),
            body: body.into(),
            summary: String::new(),
            category: String::new(),
            tags: Vec::new(),
            status: PublicationStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Mark the record published now (keeps an existing publication date)
    pub fn publish(mut self) -> Self {
        let now = Utc::now();
        self.status = PublicationStatus::Published;
        self.published_at = self.published_at.or(Some(now));
        self.updated_at = now;
        self
    }

    /// Mark the record published at a specific time
    pub fn published_on(mut self, published_at: DateTime<Utc>) -> Self {
        self.status = PublicationStatus::Published;
        self.published_at = Some(published_at);
        self
    }

    /// Move the record back to draft
    pub fn unpublish(mut self) -> Self {
        self.status = PublicationStatus::Draft;
        self.updated_at = Utc::now();
        self
    }

    /// Check if the record is visible to readers
    pub fn is_published(&self) -> bool {
        self.status == PublicationStatus::Published
    }

    /// Calendar date of publication
    pub fn published_date(&self) -> Option<NaiveDate> {
        self.published_at.map(|ts| ts.date_naive())
    }
}

/// Content lifecycle status
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
}
