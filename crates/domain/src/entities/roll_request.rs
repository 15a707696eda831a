//! Roll requests - a published ask addressed to a set of participants

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::{RollGroup, RollItem};
use crate::ids::{ParticipantId, RequestId, RollItemId};

/// A published request. The groups are a deep copy taken at publish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollRequest {
    pub id: RequestId,
    pub groups: Vec<RollGroup>,
    pub recipients: BTreeSet<ParticipantId>,
}

impl RollRequest {
    pub fn new(
        groups: Vec<RollGroup>,
        recipients: impl IntoIterator<Item = ParticipantId>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            groups,
            recipients: recipients.into_iter().collect(),
        }
    }

    pub fn is_recipient(&self, participant: &ParticipantId) -> bool {
        self.recipients.contains(participant)
    }

    /// Locate the group and item a correlation tag points at.
    pub fn find_item(&self, item_id: RollItemId) -> Option<(&RollGroup, &RollItem)> {
        self.groups
            .iter()
            .find_map(|group| group.find_item(item_id).map(|item| (group, item)))
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}
