//! Outcome events reported back by the external checker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ParticipantId, RecordId, RequestId, RollItemId};

/// Four degrees of success, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegreeOfSuccess {
    CriticalFailure,
    Failure,
    Success,
    CriticalSuccess,
}

impl DegreeOfSuccess {
    pub fn as_str(self) -> &'static str {
        match self {
            DegreeOfSuccess::CriticalFailure => "critical-failure",
            DegreeOfSuccess::Failure => "failure",
            DegreeOfSuccess::Success => "success",
            DegreeOfSuccess::CriticalSuccess => "critical-success",
        }
    }
}

impl fmt::Display for DegreeOfSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DegreeOfSuccess {
    type Err = DomainError;

    /// Accepts the kebab-case form as well as the camelCase strings the
    /// PF2e system writes into check contexts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical-failure" | "criticalFailure" => Ok(Self::CriticalFailure),
            "failure" => Ok(Self::Failure),
            "success" => Ok(Self::Success),
            "critical-success" | "criticalSuccess" => Ok(Self::CriticalSuccess),
            _ => Err(DomainError::parse(format!("Unknown degree of success: {}", s))),
        }
    }
}

/// How a re-roll was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RerollKind {
    /// Paid for with a privileged resource (a hero point).
    Privileged,
    Other,
}

/// A result (or the withdrawal of one) for a single requested roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeEvent {
    pub participant_id: ParticipantId,
    pub item_id: RollItemId,
    pub request_id: RequestId,
    /// The underlying result record was deleted.
    #[serde(default)]
    pub is_retraction: bool,
    #[serde(default)]
    pub outcome: Option<DegreeOfSuccess>,
    #[serde(default)]
    pub is_reroll: bool,
    #[serde(default)]
    pub reroll_kind: Option<RerollKind>,
    pub record_id: RecordId,
}

impl OutcomeEvent {
    /// A fresh (non-retraction, non-reroll) result.
    pub fn result(
        request_id: RequestId,
        item_id: RollItemId,
        participant_id: ParticipantId,
        record_id: RecordId,
        outcome: Option<DegreeOfSuccess>,
    ) -> Self {
        Self {
            participant_id,
            item_id,
            request_id,
            is_retraction: false,
            outcome,
            is_reroll: false,
            reroll_kind: None,
            record_id,
        }
    }

    pub fn with_reroll(mut self, kind: RerollKind) -> Self {
        self.is_reroll = true;
        self.reroll_kind = Some(kind);
        self
    }

    /// The withdrawal of the result stored under `record_id`.
    pub fn retraction(
        request_id: RequestId,
        item_id: RollItemId,
        participant_id: ParticipantId,
        record_id: RecordId,
    ) -> Self {
        Self {
            participant_id,
            item_id,
            request_id,
            is_retraction: true,
            outcome: None,
            is_reroll: false,
            reroll_kind: None,
            record_id,
        }
    }

    /// Reroll kind, only when the event actually is a reroll.
    pub fn effective_reroll_kind(&self) -> Option<RerollKind> {
        if self.is_reroll {
            Some(self.reroll_kind.unwrap_or(RerollKind::Other))
        } else {
            None
        }
    }
}
