//! Index entries and the index schema

use crate::models::ContentRecord;
use crate::search::text::{collapse_whitespace, normalize_html};
use serde::{Deserialize, Serialize};
use tantivy::schema::*;
use tantivy::TantivyDocument;

pub const FIELD_CONTENT_ID: &str = "content_id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_BODY: &str = "body";
pub const FIELD_SUMMARY: &str = "summary";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_TAGS: &str = "tags";

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, fields: &ContentFields) -> TantivyDocument;

    /// Get document ID
    fn document_id(&self) -> u64;
}

/// Denormalized searchable projection of a published content record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    pub content_id: u64,
    pub title: String,
    /// Body with markup removed
    pub body: String,
    pub summary: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl From<&ContentRecord> for IndexEntry {
    fn from(record: &ContentRecord) -> Self {
        Self {
            content_id: record.id,
            title: collapse_whitespace(&record.title),
            body: normalize_html(&record.body),
            summary: normalize_html(&record.summary),
            category: collapse_whitespace(&record.category),
            tags: record
                .tags
                .iter()
                .map(|t| collapse_whitespace(t))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

impl IndexEntry {
    /// Tags as one space-separated string
    pub fn tag_text(&self) -> String {
        self.tags.join(" ")
    }
}

impl SearchDocument for IndexEntry {
    fn to_tantivy_doc(&self, fields: &ContentFields) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        doc.add_u64(fields.content_id, self.content_id);
        doc.add_text(fields.title, &self.title);
        doc.add_text(fields.body, &self.body);
        doc.add_text(fields.summary, &self.summary);
        doc.add_text(fields.category, &self.category);

        // Multi-valued
        for tag in &self.tags {
            doc.add_text(fields.tags, tag);
        }

        doc
    }

    fn document_id(&self) -> u64 {
        self.content_id
    }
}

/// Resolved field handles for the content schema
#[derive(Debug, Clone, Copy)]
pub struct ContentFields {
    pub content_id: Field,
    pub title: Field,
    pub body: Field,
    pub summary: Field,
    pub category: Field,
    pub tags: Field,
}

impl ContentFields {
    /// Resolve every field from a schema, failing if the index was built with another layout
    pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
        Ok(Self {
            content_id: schema.get_field(FIELD_CONTENT_ID)?,
            title: schema.get_field(FIELD_TITLE)?,
            body: schema.get_field(FIELD_BODY)?,
            summary: schema.get_field(FIELD_SUMMARY)?,
            category: schema.get_field(FIELD_CATEGORY)?,
            tags: schema.get_field(FIELD_TAGS)?,
        })
    }

    /// Fields searched by default, title first
    pub fn default_query_fields(&self) -> Vec<Field> {
        vec![self.title, self.body, self.summary, self.category, self.tags]
    }
}

/// Build the search schema for content
pub fn build_content_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Content ID - term lookups for delete, stored for result joins
    schema_builder.add_u64_field(FIELD_CONTENT_ID, INDEXED | STORED | FAST);

    // Full-text fields, stored for snippet extraction
    schema_builder.add_text_field(FIELD_TITLE, TEXT | STORED);
    schema_builder.add_text_field(FIELD_BODY, TEXT | STORED);
    schema_builder.add_text_field(FIELD_SUMMARY, TEXT | STORED);
    schema_builder.add_text_field(FIELD_CATEGORY, TEXT | STORED);
    schema_builder.add_text_field(FIELD_TAGS, TEXT | STORED);

    schema_builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_to_entry_normalizes() {
        let record = ContentRecord::new(1, "  Python   Basics ", "<p>Learn</p><p>Python&nbsp;today</p>")
            .with_summary("<em>Intro</em> to Python")
            .with_category("programming")
            .with_tags(vec!["python", " ", "beginner"])
            .publish();

        let entry = IndexEntry::from(&record);
        assert_eq!(entry.content_id, 1);
        assert_eq!(entry.title, "Python Basics");
        assert_eq!(entry.body, "Learn Python today");
        assert_eq!(entry.summary, "Intro to Python");
        assert_eq!(entry.tags, vec!["python", "beginner"]);
        assert_eq!(entry.tag_text(), "python beginner");
    }

    #[test]
    fn test_schema_building() {
        let schema = build_content_schema();
        let fields = ContentFields::from_schema(&schema).unwrap();
        assert_eq!(fields.default_query_fields().len(), 5);
        assert!(schema.get_field("content_id").is_ok());
    }
}
