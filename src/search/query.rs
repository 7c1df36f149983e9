//! Search filters and query building

use crate::search::document::ContentFields;
use crate::search::error::SearchResult;
use crate::search::sanitizer::{SafeQuery, SanitizeRule};
use crate::state::ContentFilter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tantivy::query::{Query, QueryParser};
use tantivy::Index;

/// Filters applied to ranked candidates during the store join
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFilters {
    /// Exact category match
    pub category: Option<String>,

    /// Inclusive lower bound on the publication date
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper bound on the publication date
    pub date_to: Option<NaiveDate>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Filter by publication date range
    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Store filter restricted to published records
    pub fn to_content_filter(&self) -> ContentFilter {
        ContentFilter {
            category: self.category.clone(),
            published_from: self.date_from,
            published_to: self.date_to,
            ..ContentFilter::published()
        }
    }
}

/// Builds index queries from sanitized text
pub struct QueryBuilder {
    parser: QueryParser,
}

impl QueryBuilder {
    /// Parser over the default content fields with the title boosted
    pub fn new(index: &Index, fields: &ContentFields, title_boost: f32) -> Self {
        let mut parser = QueryParser::for_index(index, fields.default_query_fields());
        parser.set_field_boost(fields.title, title_boost);
        // Every term must match, as with a plain multi-word search box
        parser.set_conjunction_by_default();

        Self { parser }
    }

    /// Parse a sanitized query; grammar rejections surface as `QueryParsingFailed`
    pub fn build(&self, query: &SafeQuery) -> SearchResult<Box<dyn Query>> {
        let parsed = match query.rule() {
            SanitizeRule::Terms => self.parser.parse_query(&neutralize_operators(query.as_str())),
            _ => self.parser.parse_query(query.as_str()),
        };
        Ok(parsed?)
    }
}

/// Uppercase words the query grammar treats as operators
const OPERATOR_WORDS: [&str; 4] = ["AND", "OR", "NOT", "IN"];

/// Lowercase standalone operator words so they are searched as plain terms.
///
/// The default tokenizer lowercases indexed text, so matching is unchanged.
fn neutralize_operators(terms: &str) -> String {
    terms
        .split(' ')
        .map(|word| {
            if OPERATOR_WORDS.contains(&word) {
                word.to_ascii_lowercase()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
