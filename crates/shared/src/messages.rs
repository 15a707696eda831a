//! WebSocket message types for engine and client communication
//!
//! Two layers travel over the socket:
//! - `SocketMessage` is the payload clients relay to each other
//!   (`roll-request`, `style-update`)
//! - `ClientMessage` / `ServerMessage` are the envelopes exchanged with the
//!   engine
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rollreq_domain::{
    CorrelationTags, DegreeOfSuccess, GroupId, HistoryEntryId, OutcomeEvent, ParticipantId,
    RecordId, RequestId, RerollKind, RollGroup, RollItemId, HERO_POINT_OPTION,
};

// =============================================================================
// Socket payloads (relayed between clients)
// =============================================================================

/// CSS snippets applied to rendered announcements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSettings {
    #[serde(default)]
    pub outer_container: String,
    #[serde(default)]
    pub group_container: String,
    #[serde(default)]
    pub group_header: String,
    #[serde(default)]
    pub roll_container: String,
}

impl StyleSettings {
    /// Settings keys each field is stored under.
    pub const OUTER_CONTAINER_KEY: &'static str = "css.OuterContainer";
    pub const GROUP_CONTAINER_KEY: &'static str = "css.GroupContainer";
    pub const GROUP_HEADER_KEY: &'static str = "css.GroupHeader";
    pub const ROLL_CONTAINER_KEY: &'static str = "css.RollContainer";

    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            (Self::OUTER_CONTAINER_KEY, &self.outer_container),
            (Self::GROUP_CONTAINER_KEY, &self.group_container),
            (Self::GROUP_HEADER_KEY, &self.group_header),
            (Self::ROLL_CONTAINER_KEY, &self.roll_container),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SocketMessage {
    #[serde(rename = "roll-request")]
    RollRequest {
        id: RequestId,
        groups: Vec<RollGroup>,
        users: BTreeSet<ParticipantId>,
    },
    #[serde(rename = "style-update")]
    StyleUpdate { data: StyleSettings },
}

impl SocketMessage {
    /// The participants a message is addressed to; `None` means everyone.
    pub fn addressees(&self) -> Option<&BTreeSet<ParticipantId>> {
        match self {
            SocketMessage::RollRequest { users, .. } => Some(users),
            SocketMessage::StyleUpdate { .. } => None,
        }
    }
}

/// Whether a client should open a received roll request: the sender must be
/// a GM and the client must be one of the addressed users.
pub fn accepts_roll_request(
    message: &SocketMessage,
    sender_is_gm: bool,
    self_id: &ParticipantId,
) -> bool {
    match message {
        SocketMessage::RollRequest { users, .. } => sender_is_gm && users.contains(self_id),
        SocketMessage::StyleUpdate { .. } => false,
    }
}

/// Whether a client should apply a received style update. Senders ignore
/// their own.
pub fn accepts_style_update(
    message: &SocketMessage,
    sender_id: &ParticipantId,
    self_id: &ParticipantId,
) -> bool {
    matches!(message, SocketMessage::StyleUpdate { .. }) && sender_id != self_id
}

// =============================================================================
// Check results
// =============================================================================

/// A check result as reported by the rules system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResultReport {
    pub author_id: ParticipantId,
    pub record_id: RecordId,
    /// Degree of success, when the check had a DC.
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub is_reroll: bool,
    #[serde(default)]
    pub options: Vec<String>,
    /// The result record was removed.
    #[serde(default)]
    pub deleted: bool,
}

impl CheckResultReport {
    /// Convert to an outcome event. Reports without both correlation tags
    /// belong to no request and yield `None`.
    pub fn to_outcome_event(&self) -> Option<OutcomeEvent> {
        let tags = CorrelationTags::from_options(&self.options)?;
        if self.deleted {
            return Some(OutcomeEvent::retraction(
                tags.request_id,
                tags.item_id,
                self.author_id.clone(),
                self.record_id.clone(),
            ));
        }

        let outcome = self
            .outcome
            .as_deref()
            .and_then(|o| o.parse::<DegreeOfSuccess>().ok());
        let event = OutcomeEvent::result(
            tags.request_id,
            tags.item_id,
            self.author_id.clone(),
            self.record_id.clone(),
            outcome,
        );
        if !self.is_reroll {
            return Some(event);
        }
        let kind = if self.options.iter().any(|o| o == HERO_POINT_OPTION) {
            RerollKind::Privileged
        } else {
            RerollKind::Other
        };
        Some(event.with_reroll(kind))
    }
}

// =============================================================================
// Result views
// =============================================================================

/// The latest result of one group for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub group_id: GroupId,
    /// The group title.
    pub label: String,
    pub item_id: RollItemId,
    pub outcome: Option<DegreeOfSuccess>,
    pub reroll_kind: Option<RerollKind>,
    pub record_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResults {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub groups: Vec<GroupResult>,
}

impl ParticipantResults {
    pub fn group(&self, group_id: GroupId) -> Option<&GroupResult> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }
}

/// Everything known about one request's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSnapshot {
    pub request_id: RequestId,
    /// One row per recipient, in recipient order.
    pub participants: Vec<ParticipantResults>,
    pub applied_events: u64,
    pub ignored_events: u64,
}

impl ResultsSnapshot {
    pub fn participant(&self, participant_id: &ParticipantId) -> Option<&ParticipantResults> {
        self.participants
            .iter()
            .find(|p| &p.participant_id == participant_id)
    }
}

// =============================================================================
// Client Messages (Client → Engine)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Gm,
    Player,
}

impl ParticipantRole {
    pub fn is_gm(self) -> bool {
        matches!(self, ParticipantRole::Gm)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Identify this connection
    Join {
        user_id: ParticipantId,
        name: String,
        role: ParticipantRole,
    },
    /// GM publishes a tracked roll request; `recipients` absent means every
    /// connected player
    PublishRollRequest {
        groups: Vec<RollGroup>,
        #[serde(default)]
        recipients: Option<Vec<ParticipantId>>,
    },
    /// GM posts the rolls as an announcement instead
    AnnounceRolls { groups: Vec<RollGroup> },
    /// A check result or its deletion
    ReportOutcome { report: CheckResultReport },
    WatchResults { request_id: RequestId },
    UnwatchResults { request_id: RequestId },
    UpdateStyle { style: StyleSettings },
    Heartbeat,
}

// =============================================================================
// Server Messages (Engine → Client)
// =============================================================================

/// A rendered announcement. `groups` lets the GM reopen the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: Uuid,
    pub author_id: ParticipantId,
    pub content: String,
    pub groups: Vec<RollGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Joined {
        user_id: ParticipantId,
        role: ParticipantRole,
    },
    /// A relayed socket payload
    Socket {
        sender_id: ParticipantId,
        sender_is_gm: bool,
        message: SocketMessage,
    },
    Announcement { announcement: Announcement },
    Published {
        request_id: RequestId,
        history_entry_id: HistoryEntryId,
        close_composer: bool,
        open_results: bool,
    },
    Announced {
        history_entry_id: HistoryEntryId,
        close_composer: bool,
    },
    ResultsUpdated {
        request_id: RequestId,
        results: ResultsSnapshot,
    },
    /// A precondition was not met; nothing happened
    Warning { code: String, message: String },
    Error { code: String, message: String },
    Pong,
}

impl ServerMessage {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Warning {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
