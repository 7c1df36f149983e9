use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only record of one search call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryLogEntry {
    /// Raw query text as typed by the user
    pub query_text: String,

    /// Number of results the search returned
    pub results_count: u64,

    /// Content the user clicked through to (click-through records only)
    pub clicked_content_id: Option<u64>,

    /// Client address
    pub ip_address: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// When the query was made
    pub timestamp: DateTime<Utc>,
}

impl QueryLogEntry {
    pub fn new(query_text: impl Into<String>, results_count: u64) -> Self {
        Self {
            query_text: query_text.into(),
            results_count,
            clicked_content_id: None,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_click(mut self, content_id: u64) -> Self {
        self.clicked_content_id = Some(content_id);
        self
    }
}
