//! Full-text search indexing and query subsystem for the blog platform
//!
//! The [`search`] module is the core; [`state`] holds the content store and
//! query log it reads from and appends to.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod search;
pub mod state;

pub use error::{AppError, Result};
