//! Result bookkeeping for one published request.
//!
//! State is kept per (participant, item). A participant usually rolls one
//! item out of each group, so the group view shows whichever item of that
//! group was written last.

use std::collections::{BTreeMap, HashMap};

use rollreq_domain::{
    DegreeOfSuccess, GroupId, OutcomeEvent, ParticipantId, RecordId, RerollKind, RollItemId,
    RollRequest,
};
use rollreq_shared::{GroupResult, ParticipantResults, ResultsSnapshot};

/// Shown for participants the directory could not name.
pub const UNKNOWN_PARTICIPANT: &str = "Unknown";

/// Why an event left the results untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    OtherRequest,
    NotARecipient,
    UnknownItem,
    /// A retraction for a record that is not the stored one.
    RecordMismatch,
}

impl IgnoreReason {
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreReason::OtherRequest => "other-request",
            IgnoreReason::NotARecipient => "not-a-recipient",
            IgnoreReason::UnknownItem => "unknown-item",
            IgnoreReason::RecordMismatch => "record-mismatch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Recorded,
    Cleared,
    Ignored(IgnoreReason),
}

impl Applied {
    pub fn changed_results(self) -> bool {
        !matches!(self, Applied::Ignored(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemState {
    group_id: GroupId,
    outcome: Option<DegreeOfSuccess>,
    record_id: RecordId,
    reroll_kind: Option<RerollKind>,
    /// Write order, used to pick a group's latest item.
    seq: u64,
}

/// One row of the raw per-item table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub participant_id: ParticipantId,
    pub group_id: GroupId,
    pub item_id: RollItemId,
    pub outcome: Option<DegreeOfSuccess>,
    pub reroll_kind: Option<RerollKind>,
    pub record_id: RecordId,
}

pub struct ResultTracker {
    request: RollRequest,
    names: BTreeMap<ParticipantId, String>,
    items: HashMap<(ParticipantId, RollItemId), ItemState>,
    seq: u64,
    applied_events: u64,
    ignored_events: u64,
}

impl ResultTracker {
    pub fn new(request: RollRequest) -> Self {
        Self {
            request,
            names: BTreeMap::new(),
            items: HashMap::new(),
            seq: 0,
            applied_events: 0,
            ignored_events: 0,
        }
    }

    pub fn with_names(mut self, names: BTreeMap<ParticipantId, String>) -> Self {
        self.names = names;
        self
    }

    pub fn request(&self) -> &RollRequest {
        &self.request
    }

    pub fn apply(&mut self, event: &OutcomeEvent) -> Applied {
        let applied = self.transition(event);
        match applied {
            Applied::Ignored(_) => self.ignored_events += 1,
            Applied::Recorded | Applied::Cleared => self.applied_events += 1,
        }
        applied
    }

    fn transition(&mut self, event: &OutcomeEvent) -> Applied {
        if event.request_id != self.request.id {
            return Applied::Ignored(IgnoreReason::OtherRequest);
        }
        if !self.request.is_recipient(&event.participant_id) {
            return Applied::Ignored(IgnoreReason::NotARecipient);
        }
        let Some((group, _)) = self.request.find_item(event.item_id) else {
            return Applied::Ignored(IgnoreReason::UnknownItem);
        };
        let group_id = group.id;
        let key = (event.participant_id.clone(), event.item_id);

        if event.is_retraction {
            return match self.items.get(&key) {
                Some(state) if state.record_id == event.record_id => {
                    self.items.remove(&key);
                    Applied::Cleared
                }
                _ => Applied::Ignored(IgnoreReason::RecordMismatch),
            };
        }

        self.seq += 1;
        self.items.insert(
            key,
            ItemState {
                group_id,
                outcome: event.outcome,
                record_id: event.record_id.clone(),
                reroll_kind: event.effective_reroll_kind(),
                seq: self.seq,
            },
        );
        Applied::Recorded
    }

    /// Raw per-item results, in request order.
    pub fn item_results(&self) -> Vec<ItemResult> {
        let mut rows = Vec::new();
        for participant_id in &self.request.recipients {
            for group in &self.request.groups {
                for item in &group.items {
                    if let Some(state) = self.items.get(&(participant_id.clone(), item.id)) {
                        rows.push(ItemResult {
                            participant_id: participant_id.clone(),
                            group_id: state.group_id,
                            item_id: item.id,
                            outcome: state.outcome,
                            reroll_kind: state.reroll_kind,
                            record_id: state.record_id.clone(),
                        });
                    }
                }
            }
        }
        rows
    }

    pub fn snapshot(&self) -> ResultsSnapshot {
        let participants = self
            .request
            .recipients
            .iter()
            .map(|participant_id| ParticipantResults {
                participant_id: participant_id.clone(),
                display_name: self
                    .names
                    .get(participant_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_PARTICIPANT.to_string()),
                groups: self
                    .request
                    .groups
                    .iter()
                    .filter_map(|group| {
                        let (item_id, state) = group
                            .items
                            .iter()
                            .filter_map(|item| {
                                self.items
                                    .get(&(participant_id.clone(), item.id))
                                    .map(|state| (item.id, state))
                            })
                            .max_by_key(|(_, state)| state.seq)?;
                        Some(GroupResult {
                            group_id: group.id,
                            label: group.title.clone(),
                            item_id,
                            outcome: state.outcome,
                            reroll_kind: state.reroll_kind,
                            record_id: state.record_id.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        ResultsSnapshot {
            request_id: self.request.id,
            participants,
            applied_events: self.applied_events,
            ignored_events: self.ignored_events,
        }
    }
}
