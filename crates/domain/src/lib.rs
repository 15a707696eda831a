extern crate self as rollreq_domain;

pub mod catalog;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use catalog::{ActionDefinition, ActionVariant, LoreOwnership, RollCatalog, StatisticOption};

pub use entities::{
    ensure_unique_item_ids, is_request_empty, HistoryEntry, RollGroup, RollItem, RollKind,
    RollRequest, DEFAULT_CHECK_STATISTIC, DEFAULT_DC,
};

pub use error::DomainError;

// Re-export ID types
pub use ids::{GroupId, HistoryEntryId, ParticipantId, RecordId, RequestId, RollItemId};

pub use value_objects::{
    adjust_dc, render_announcement, render_label, roll_to_inline, signed_integer,
    CorrelationTags, DcAdjustment, DegreeOfSuccess, LabelLookups, OutcomeEvent, RerollKind,
    HERO_POINT_OPTION, REQUEST_ID_OPTION, ROLL_ID_OPTION,
};
