//! History entries - snapshots of past publishes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::RollGroup;
use crate::ids::{HistoryEntryId, RequestId};

/// A past publish. `request_id` is absent for announce-only publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub groups: Vec<RollGroup>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl HistoryEntry {
    /// Snapshot `groups`; later edits to the caller's groups do not reach the entry.
    pub fn new(groups: &[RollGroup], created_at: DateTime<Utc>) -> Self {
        Self {
            id: HistoryEntryId::new(),
            groups: groups.to_vec(),
            created_at,
            request_id: None,
        }
    }

    pub fn for_request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RollItem;

    #[test]
    fn entry_is_a_deep_copy() {
        let mut groups = vec![RollGroup::new().with_item(RollItem::new_check())];
        let entry = HistoryEntry::new(&groups, Utc::now());

        groups[0].items[0].dc = 40;
        groups[0].title = "Changed".into();

        assert_eq!(entry.groups[0].items[0].dc, 10);
        assert!(entry.groups[0].title.is_empty());
    }
}
