//! Autocomplete from query history and published titles

use crate::error::Result;
use crate::state::{ContentFilter, ContentStore, QueryLogStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Partial input shorter than this gets no suggestions
const MIN_PARTIAL_CHARS: usize = 2;

/// Suggests completions for partial search input.
///
/// Prior queries that start with the input come first, most frequent first.
/// Published titles containing the input fill any remaining slots.
pub struct SuggestionEngine {
    query_log: Arc<dyn QueryLogStore>,
    content: Arc<dyn ContentStore>,
    enabled: bool,
}

impl SuggestionEngine {
    pub fn new(
        query_log: Arc<dyn QueryLogStore>,
        content: Arc<dyn ContentStore>,
        enabled: bool,
    ) -> Self {
        Self {
            query_log,
            content,
            enabled,
        }
    }

    /// At most `limit` distinct suggestions in their original casing.
    ///
    /// Store failures yield an empty list.
    pub async fn suggest(&self, partial: &str, limit: usize) -> Vec<String> {
        let partial = partial.trim();
        if !self.enabled || limit == 0 || partial.chars().count() < MIN_PARTIAL_CHARS {
            return Vec::new();
        }

        match self.collect(partial, limit).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, partial, "Suggestion lookup failed");
                Vec::new()
            }
        }
    }

    async fn collect(&self, partial: &str, limit: usize) -> Result<Vec<String>> {
        let needle = partial.to_lowercase();
        let mut suggestions = self.from_history(&needle).await?;
        suggestions.truncate(limit);

        if suggestions.len() < limit {
            let mut seen: HashSet<String> = suggestions.iter().cloned().collect();
            let filter = ContentFilter {
                title_contains: Some(partial.to_string()),
                ..ContentFilter::published()
            };

            for record in self.content.list_content(&filter).await? {
                if suggestions.len() >= limit {
                    break;
                }
                if seen.insert(record.title.clone()) {
                    suggestions.push(record.title);
                }
            }
        }

        Ok(suggestions)
    }

    /// Distinct prior queries starting with `needle`, by frequency then text
    async fn from_history(&self, needle: &str) -> Result<Vec<String>> {
        let mut counts: HashMap<String, u64> = HashMap::new();

        for entry in self.query_log.queries_since(None).await? {
            if entry.query_text.to_lowercase().starts_with(needle) {
                *counts.entry(entry.query_text).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(ranked.into_iter().map(|(text, _)| text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentRecord, QueryLogEntry};
    use crate::state::InMemoryStore;

    async fn engine_with_history(queries: &[&str]) -> (SuggestionEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        for query in queries {
            store.append_query(&QueryLogEntry::new(*query, 1)).await.unwrap();
        }
        (SuggestionEngine::new(store.clone(), store.clone(), true), store)
    }

    #[tokio::test]
    async fn test_short_partial_returns_nothing() {
        let (engine, _) = engine_with_history(&["python"]).await;
        assert!(engine.suggest("p", 5).await.is_empty());
        assert!(engine.suggest(" p ", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_history_ordered_by_frequency() {
        let (engine, _) =
            engine_with_history(&["python tips", "Python basics", "python tips", "rust"]).await;

        let suggestions = engine.suggest("py", 10).await;
        assert_eq!(suggestions, vec!["python tips", "Python basics"]);
    }

    #[tokio::test]
    async fn test_titles_pad_without_duplicates() {
        let (engine, store) = engine_with_history(&["Python Basics"]).await;
        store
            .save_content(&ContentRecord::new(1, "Python Basics", "b").publish())
            .await
            .unwrap();
        store
            .save_content(&ContentRecord::new(2, "Advanced Python", "b").publish())
            .await
            .unwrap();
        store
            .save_content(&ContentRecord::new(3, "Python Drafts", "b"))
            .await
            .unwrap();

        let suggestions = engine.suggest("pyth", 10).await;
        assert_eq!(suggestions, vec!["Python Basics", "Advanced Python"]);

        let limited = engine.suggest("pyth", 1).await;
        assert_eq!(limited, vec!["Python Basics"]);
    }

    #[tokio::test]
    async fn test_disabled_engine() {
        let store = Arc::new(InMemoryStore::new());
        store.append_query(&QueryLogEntry::new("python", 1)).await.unwrap();
        let engine = SuggestionEngine::new(store.clone(), store, false);
        assert!(engine.suggest("py", 5).await.is_empty());
    }
}
