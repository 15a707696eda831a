//! Value objects - Immutable objects defined by their attributes

mod dc_adjustment;
mod inline;
mod label;
mod outcome;

pub use dc_adjustment::{adjust_dc, signed_integer, DcAdjustment};

// Inline directives and the correlation tags they carry
pub use inline::{
    render_announcement, roll_to_inline, CorrelationTags, HERO_POINT_OPTION, REQUEST_ID_OPTION,
    ROLL_ID_OPTION,
};

pub use label::{render_label, LabelLookups, ACTION_MARKER, STATISTIC_MARKER};
pub use outcome::{DegreeOfSuccess, OutcomeEvent, RerollKind};
