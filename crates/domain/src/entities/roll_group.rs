//! Roll groups - titled display sections of a request

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entities::RollItem;
use crate::error::DomainError;
use crate::ids::{GroupId, RollItemId};

/// A titled, ordered list of roll items.
///
/// Item order only matters for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollGroup {
    pub id: GroupId,
    /// Empty means untitled.
    #[serde(default)]
    pub title: String,
    #[serde(rename = "rolls", default)]
    pub items: Vec<RollItem>,
}

impl RollGroup {
    /// An untitled group with no items.
    pub fn new() -> Self {
        Self {
            id: GroupId::new(),
            title: String::new(),
            items: Vec::new(),
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::new()
        }
    }

    pub fn with_item(mut self, item: RollItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    pub fn find_item(&self, item_id: RollItemId) -> Option<&RollItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn normalized(mut self) -> Self {
        self.items = self.items.into_iter().map(RollItem::normalized).collect();
        self
    }
}

impl Default for RollGroup {
    fn default() -> Self {
        Self::new()
    }
}

/// True when no group holds any item; such a request cannot be published.
pub fn is_request_empty(groups: &[RollGroup]) -> bool {
    groups.iter().all(|group| group.items.is_empty())
}

/// Item ids key the results, so each may appear only once across a request.
pub fn ensure_unique_item_ids(groups: &[RollGroup]) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for item in groups.iter().flat_map(|group| &group.items) {
        if !seen.insert(item.id) {
            return Err(DomainError::validation(format!(
                "Roll item {} appears more than once",
                item.id
            )));
        }
    }
    Ok(())
}
