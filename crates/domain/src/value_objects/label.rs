//! Label templates
//!
//! Item labels may reference the display names of what is rolled:
//! `$a` is the action name (actions only), `$s` the statistic name.

use std::collections::HashMap;

use crate::entities::{RollItem, RollKind};

pub const ACTION_MARKER: &str = "$a";
pub const STATISTIC_MARKER: &str = "$s";

/// Display names for actions and statistics, keyed by slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelLookups {
    pub actions: HashMap<String, String>,
    pub statistics: HashMap<String, String>,
}

impl LabelLookups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, slug: impl Into<String>, name: impl Into<String>) -> Self {
        self.actions.insert(slug.into(), name.into());
        self
    }

    pub fn with_statistic(mut self, slug: impl Into<String>, name: impl Into<String>) -> Self {
        self.statistics.insert(slug.into(), name.into());
        self
    }

    pub fn action_name(&self, slug: &str) -> Option<&str> {
        self.actions.get(slug).map(String::as_str)
    }

    pub fn statistic_name(&self, slug: &str) -> Option<&str> {
        self.statistics.get(slug).map(String::as_str)
    }
}

/// Resolve the markers in an item's label.
///
/// Markers without a lookup entry are left as they are.
pub fn render_label(item: &RollItem, lookups: &LabelLookups) -> Option<String> {
    let label = item.label.as_deref()?;
    if !label.contains('$') {
        return Some(label.to_string());
    }

    let statistic = item
        .statistic_key()
        .and_then(|key| lookups.statistic_name(key))
        .unwrap_or(STATISTIC_MARKER);

    let rendered = match &item.kind {
        RollKind::Action { .. } => {
            let action = lookups.action_name(&item.slug).unwrap_or(ACTION_MARKER);
            label
                .replace(ACTION_MARKER, action)
                .replace(STATISTIC_MARKER, statistic)
        }
        RollKind::Check { .. } | RollKind::Counteract { .. } => {
            label.replace(STATISTIC_MARKER, statistic)
        }
    };
    Some(rendered)
}
