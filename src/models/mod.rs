pub mod content;
pub mod query_log;

pub use content::*;
pub use query_log::*;
