//! Roll items - one described roll a participant is asked to make
//!
//! An item is an action (`[[/act ...]]`), a check against a statistic
//! (`@Check[...]`), or a counteract check. The `id` is generated once and is
//! the key results are correlated by, so it is never reassigned.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::RollCatalog;
use crate::ids::RollItemId;
use crate::value_objects::DcAdjustment;

/// Default DC for newly created items.
pub const DEFAULT_DC: i32 = 10;

/// Statistic used by newly created checks.
pub const DEFAULT_CHECK_STATISTIC: &str = "perception";

/// A single requested roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollItem {
    pub id: RollItemId,
    pub dc: i32,
    /// Display template, may contain `$a` / `$s` markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The action slug for actions, the statistic slug otherwise.
    pub slug: String,
    #[serde(flatten)]
    pub kind: RollKind,
}

/// Kind-specific parameters, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RollKind {
    #[serde(rename_all = "camelCase")]
    Action {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        statistic: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Check {
        #[serde(default)]
        traits: BTreeSet<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        adjustment: Option<DcAdjustment>,
        #[serde(default)]
        basic: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        defense: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Counteract { source_rank: u8, target_rank: u8 },
}

impl RollKind {
    pub fn name(&self) -> &'static str {
        match self {
            RollKind::Action { .. } => "action",
            RollKind::Check { .. } => "check",
            RollKind::Counteract { .. } => "counteract",
        }
    }
}

impl RollItem {
    pub fn action(slug: impl Into<String>, dc: i32) -> Self {
        Self::with_kind(
            slug,
            dc,
            RollKind::Action {
                statistic: None,
                variant: None,
            },
        )
    }

    pub fn check(slug: impl Into<String>, dc: i32) -> Self {
        Self::with_kind(
            slug,
            dc,
            RollKind::Check {
                traits: BTreeSet::new(),
                adjustment: None,
                basic: false,
                defense: None,
            },
        )
    }

    pub fn counteract(slug: impl Into<String>, dc: i32, source_rank: u8, target_rank: u8) -> Self {
        Self::with_kind(
            slug,
            dc,
            RollKind::Counteract {
                source_rank,
                target_rank,
            },
        )
    }

    fn with_kind(slug: impl Into<String>, dc: i32, kind: RollKind) -> Self {
        Self {
            id: RollItemId::new(),
            dc,
            label: None,
            slug: slug.into(),
            kind,
        }
    }

    /// A new check with the default DC against perception.
    pub fn new_check() -> Self {
        Self::check(DEFAULT_CHECK_STATISTIC, DEFAULT_DC)
    }

    /// A new action preset to the first action in the catalog, with that
    /// action's statistic and first variant.
    pub fn new_action(catalog: &RollCatalog) -> Option<Self> {
        let action = catalog.actions.first()?;
        Some(Self {
            kind: RollKind::Action {
                statistic: action.statistic.clone(),
                variant: action.variants.first().map(|v| v.slug.clone()),
            },
            ..Self::action(action.slug.clone(), DEFAULT_DC)
        })
    }

    pub fn with_id(mut self, id: RollItemId) -> Self {
        self.id = id;
        self
    }

    /// Set the label; an empty label is the same as none.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = (!label.is_empty()).then_some(label);
        self
    }

    pub fn with_statistic(mut self, value: impl Into<String>) -> Self {
        if let RollKind::Action { statistic, .. } = &mut self.kind {
            *statistic = Some(value.into());
        }
        self
    }

    pub fn with_variant(mut self, value: impl Into<String>) -> Self {
        if let RollKind::Action { variant, .. } = &mut self.kind {
            *variant = Some(value.into());
        }
        self
    }

    pub fn with_traits<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let RollKind::Check { traits, .. } = &mut self.kind {
            traits.extend(values.into_iter().map(Into::into));
        }
        self
    }

    pub fn with_adjustment(mut self, value: DcAdjustment) -> Self {
        if let RollKind::Check { adjustment, .. } = &mut self.kind {
            *adjustment = Some(value);
        }
        self
    }

    pub fn as_basic(mut self) -> Self {
        if let RollKind::Check { basic, .. } = &mut self.kind {
            *basic = true;
        }
        self
    }

    pub fn with_defense(mut self, value: impl Into<String>) -> Self {
        if let RollKind::Check { defense, .. } = &mut self.kind {
            *defense = Some(value.into());
        }
        self
    }

    /// The statistic whose display name replaces `$s`.
    pub fn statistic_key(&self) -> Option<&str> {
        match &self.kind {
            RollKind::Action { statistic, .. } => statistic.as_deref(),
            RollKind::Check { .. } | RollKind::Counteract { .. } => Some(&self.slug),
        }
    }

    /// Collapse fields that equal their implicit default, so an item and its
    /// transport form compare equal.
    pub fn normalized(mut self) -> Self {
        if self.label.as_deref() == Some("") {
            self.label = None;
        }
        match &mut self.kind {
            RollKind::Action { statistic, variant } => {
                if statistic.as_deref() == Some("") {
                    *statistic = None;
                }
                if variant.as_deref() == Some("") {
                    *variant = None;
                }
            }
            RollKind::Check {
                adjustment,
                defense,
                ..
            } => {
                if *adjustment == Some(DcAdjustment::Normal) {
                    *adjustment = None;
                }
                if defense.as_deref() == Some("") {
                    *defense = None;
                }
            }
            RollKind::Counteract { .. } => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_only_touch_their_own_kind() {
        let action = RollItem::action("climb", 15)
            .with_statistic("athletics")
            .with_traits(["secret"])
            .as_basic();
        assert_eq!(
            action.kind,
            RollKind::Action {
                statistic: Some("athletics".into()),
                variant: None
            }
        );
    }

    #[test]
    fn statistic_key_depends_on_kind() {
        assert_eq!(RollItem::action("aid", 10).statistic_key(), None);
        assert_eq!(
            RollItem::action("aid", 10).with_statistic("perception").statistic_key(),
            Some("perception")
        );
        assert_eq!(RollItem::check("reflex", 20).statistic_key(), Some("reflex"));
        assert_eq!(
            RollItem::counteract("arcana", 25, 3, 4).statistic_key(),
            Some("arcana")
        );
    }

    #[test]
    fn normalized_drops_default_values() {
        let item = RollItem::check("fortitude", 18)
            .with_adjustment(DcAdjustment::Normal)
            .with_defense("");
        let mut raw = item.clone();
        raw.label = Some(String::new());

        let normalized = raw.normalized();
        assert_eq!(normalized.label, None);
        assert_eq!(
            normalized.kind,
            RollKind::Check {
                traits: BTreeSet::new(),
                adjustment: None,
                basic: false,
                defense: None
            }
        );
    }

    #[test]
    fn wire_form_is_tagged_by_type() {
        let item = RollItem::check("athletics", 20)
            .with_traits(["move", "attack"])
            .with_adjustment(DcAdjustment::Hard);
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["type"], "check");
        assert_eq!(json["adjustment"], "hard");
        assert_eq!(json["traits"], serde_json::json!(["attack", "move"]));

        let back: RollItem = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, item);
    }

    #[test]
    fn new_check_uses_defaults() {
        let item = RollItem::new_check();
        assert_eq!(item.dc, DEFAULT_DC);
        assert_eq!(item.slug, "perception");
        assert_ne!(item.id, RollItem::new_check().id);
    }
}
