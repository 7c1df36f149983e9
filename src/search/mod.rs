//! Full-text search for published blog content, powered by Tantivy
//!
//! This module keeps a denormalized index in step with the content store and
//! answers ranked, sanitized, paginated, highlighted queries:
//!
//! - **Index lifecycle**: create, populate, rebuild and drop the index
//! - **Synchronization**: explicit per-record upsert/remove calls
//! - **Query sanitization**: arbitrary input mapped onto the query grammar
//! - **Execution**: ranked ids joined with store filters, rank order kept
//! - **Excerpts**: native snippets, with a term-density window as fallback
//! - **Suggestions, analytics and health** for the admin side
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Search Service API                     │
//! ├─────────────────────────────────────────────────┤
//! │  - search()        - suggest()                  │
//! │  - index_content() - remove_content()           │
//! │  - get_stats()     - health()                   │
//! └─────────────────────────────────────────────────┘
//!          │                         │
//!          ▼                         ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │  Indexer / Executor   │  │  ContentStore         │
//! │  Sanitizer / Excerpts │  │  QueryLogStore        │
//! └──────────────────────┘  └──────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────────┐
//! │           Index Manager → Tantivy Index          │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use blog_search::models::ContentRecord;
//! use blog_search::search::{HealthConfig, SearchConfig, SearchFilters, SearchService};
//! use blog_search::state::{create_in_memory_stores, ContentStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = SearchService::open(
//!         SearchConfig::default(),
//!         HealthConfig::default(),
//!         create_in_memory_stores(),
//!     )
//!     .await?;
//!
//!     let post = ContentRecord::new(1, "Python Basics", "<p>Learn Python today</p>").publish();
//!     service.content_store().save_content(&post).await?;
//!     service.index_content(&post).await?;
//!
//!     let page = service.search("python", &SearchFilters::default(), 1, 10).await;
//!     service.log_query("python", page.total_results as u64, None, None).await;
//!
//!     for hit in page.posts {
//!         println!("{} - {}", hit.content.title, hit.excerpt);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod document;
pub mod error;
pub mod excerpt;
pub mod executor;
pub mod health;
pub mod index;
pub mod indexer;
pub mod query;
pub mod sanitizer;
pub mod service;
pub mod suggest;
pub mod text;

pub use analytics::{AnalyticsLogger, PopularQuery, QueryStats};
pub use config::{HealthConfig, SearchConfig, SearchConfigBuilder};
pub use document::{IndexEntry, SearchDocument};
pub use error::{SearchError, SearchResult};
pub use excerpt::ExcerptHighlighter;
pub use executor::{PagedResult, QueryExecutor, SearchHit};
pub use health::{HealthProbe, HealthReport, HealthStatus};
pub use index::{IndexManager, IndexStats};
pub use indexer::{ContentEvent, Indexer, SyncAction};
pub use query::{QueryBuilder, SearchFilters};
pub use sanitizer::{QuerySanitizer, SafeQuery, SanitizeRule};
pub use service::{SearchService, SearchStats};
pub use suggest::SuggestionEngine;
