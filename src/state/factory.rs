use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, Result};
use crate::state::{ContentStore, InMemoryStore, QueryLogStore, SledStore};
use std::sync::Arc;

/// Content store and query log handles, usually backed by the same database
#[derive(Clone)]
pub struct Stores {
    pub content: Arc<dyn ContentStore>,
    pub query_log: Arc<dyn QueryLogStore>,
}

/// Create the stores based on configuration
pub fn create_stores(config: &StoreConfig) -> Result<Stores> {
    match config.backend {
        StoreBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled backend requires 'path' configuration".to_string())
            })?;

            tracing::info!(path = ?path, "Initializing Sled storage backend");

            let store = Arc::new(SledStore::new(path)?);
            Ok(Stores {
                content: store.clone(),
                query_log: store,
            })
        }

        StoreBackend::Memory => Ok(create_in_memory_stores()),
    }
}

/// Create in-memory stores (for testing and development)
pub fn create_in_memory_stores() -> Stores {
    tracing::info!("Initializing in-memory storage backend");
    let store = Arc::new(InMemoryStore::new());
    Stores {
        content: store.clone(),
        query_log: store,
    }
}
