//! Domain entities - Core business objects with identity

mod history_entry;
mod roll_group;
mod roll_item;
mod roll_request;

pub use history_entry::HistoryEntry;
pub use roll_group::{ensure_unique_item_ids, is_request_empty, RollGroup};
pub use roll_item::{RollItem, RollKind, DEFAULT_CHECK_STATISTIC, DEFAULT_DC};
pub use roll_request::RollRequest;
