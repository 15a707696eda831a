//! In-memory state storage modules.
//!
//! Stores manage runtime state next to the settings database:
//! - `HistoryStore` - Past publishes, persisted through the settings store
//! - `RequestStore` - Published requests available to result views

pub mod history;
pub mod requests;

// Re-export store types
pub use history::{HistoryError, HistoryStore, StagedAppend, HISTORY_KEY, HISTORY_LIMIT};
pub use requests::RequestStore;
