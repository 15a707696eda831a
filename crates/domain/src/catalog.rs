//! Roll catalog - the actions and statistics a request can refer to
//!
//! The catalog feeds item creation (`RollItem::new_action`) and the display
//! names used when labels are rendered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::DEFAULT_CHECK_STATISTIC;
use crate::value_objects::LabelLookups;

/// A selectable statistic (skill, lore, save).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticOption {
    pub slug: String,
    pub label: String,
}

impl StatisticOption {
    pub fn new(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionVariant {
    pub slug: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub slug: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistic: Option<String>,
    #[serde(default)]
    pub variants: Vec<ActionVariant>,
}

impl ActionDefinition {
    pub fn new(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
            statistic: None,
            variants: Vec::new(),
        }
    }

    pub fn with_statistic(mut self, statistic: impl Into<String>) -> Self {
        self.statistic = Some(statistic.into());
        self
    }

    pub fn with_variant(mut self, slug: impl Into<String>, label: impl Into<String>) -> Self {
        self.variants.push(ActionVariant {
            slug: slug.into(),
            label: label.into(),
            statistic: None,
        });
        self
    }
}

/// A lore as known by the characters that have it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoreOwnership {
    pub slug: String,
    pub label: String,
    #[serde(default)]
    pub owners: Vec<String>,
}

/// Actions and statistics available to roll items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollCatalog {
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub skills: Vec<StatisticOption>,
    #[serde(default)]
    pub lores: Vec<StatisticOption>,
    #[serde(default)]
    pub saves: Vec<StatisticOption>,
}

impl RollCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The core skills, saves and a handful of common actions.
    pub fn standard() -> Self {
        let skills = [
            "acrobatics",
            "arcana",
            "athletics",
            "crafting",
            "deception",
            "diplomacy",
            "intimidation",
            "medicine",
            "nature",
            "occultism",
            "performance",
            "religion",
            "society",
            "stealth",
            "survival",
            "thievery",
        ]
        .into_iter()
        .map(|slug| StatisticOption::new(slug, title_case(slug)))
        .collect();

        let saves = ["fortitude", "reflex", "will"]
            .into_iter()
            .map(|slug| StatisticOption::new(slug, title_case(slug)))
            .collect();

        let actions = vec![
            ActionDefinition::new("balance", "Balance").with_statistic("acrobatics"),
            ActionDefinition::new("climb", "Climb").with_statistic("athletics"),
            ActionDefinition::new("create-a-diversion", "Create a Diversion")
                .with_statistic("deception")
                .with_variant("distracting-words", "Distracting Words")
                .with_variant("gesture", "Gesture")
                .with_variant("trick", "Trick"),
            ActionDefinition::new("demoralize", "Demoralize").with_statistic("intimidation"),
            ActionDefinition::new("escape", "Escape"),
            ActionDefinition::new("seek", "Seek").with_statistic("perception"),
            ActionDefinition::new("sense-motive", "Sense Motive").with_statistic("perception"),
            ActionDefinition::new("treat-wounds", "Treat Wounds")
                .with_statistic("medicine")
                .with_variant("trained", "Trained")
                .with_variant("expert", "Expert")
                .with_variant("master", "Master")
                .with_variant("legendary", "Legendary"),
        ];

        Self {
            actions,
            skills,
            lores: Vec::new(),
            saves,
        }
    }

    /// Merge lores known by characters into the catalog.
    ///
    /// Each label is suffixed with its owners, e.g. `Sailing Lore (Amiri, Ezren)`.
    /// Lores nobody owns are left out; their slugs are returned so the caller
    /// can report them.
    pub fn add_lores(&mut self, lores: impl IntoIterator<Item = LoreOwnership>) -> Vec<String> {
        let mut owners: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
        for lore in lores {
            let entry = owners
                .entry(lore.slug)
                .or_insert_with(|| (lore.label, Vec::new()));
            for owner in lore.owners {
                if !entry.1.contains(&owner) {
                    entry.1.push(owner);
                }
            }
        }

        let mut dropped = Vec::new();
        for (slug, (label, names)) in owners {
            if names.is_empty() {
                dropped.push(slug);
                continue;
            }
            let label = format!("{} ({})", label, names.join(", "));
            match self.lores.iter_mut().find(|l| l.slug == slug) {
                Some(existing) => existing.label = label,
                None => self.lores.push(StatisticOption::new(slug, label)),
            }
        }
        dropped
    }

    pub fn find_action(&self, slug: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.slug == slug)
    }

    /// Skills, lores and saves, in that order.
    pub fn statistics(&self) -> impl Iterator<Item = &StatisticOption> {
        self.skills
            .iter()
            .chain(self.lores.iter())
            .chain(self.saves.iter())
    }

    /// Display names for label rendering.
    pub fn lookups(&self) -> LabelLookups {
        let mut lookups = LabelLookups::new().with_statistic(
            DEFAULT_CHECK_STATISTIC,
            title_case(DEFAULT_CHECK_STATISTIC),
        );
        for stat in self.statistics() {
            lookups = lookups.with_statistic(stat.slug.clone(), stat.label.clone());
        }
        for action in &self.actions {
            lookups = lookups.with_action(action.slug.clone(), action.label.clone());
        }
        lookups
    }
}

fn title_case(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{RollItem, RollKind};

    fn lore(slug: &str, label: &str, owners: &[&str]) -> LoreOwnership {
        LoreOwnership {
            slug: slug.into(),
            label: label.into(),
            owners: owners.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn lores_are_labelled_with_owners() {
        let mut catalog = RollCatalog::new();
        let dropped = catalog.add_lores([
            lore("sailing-lore", "Sailing Lore", &["Amiri"]),
            lore("sailing-lore", "Sailing Lore", &["Ezren", "Amiri"]),
            lore("forgotten-lore", "Forgotten Lore", &[]),
        ]);

        assert_eq!(dropped, vec!["forgotten-lore".to_string()]);
        assert_eq!(
            catalog.lores,
            vec![StatisticOption::new(
                "sailing-lore",
                "Sailing Lore (Amiri, Ezren)"
            )]
        );
    }

    #[test]
    fn lookups_include_perception_and_actions() {
        let lookups = RollCatalog::standard().lookups();
        assert_eq!(lookups.statistic_name("perception"), Some("Perception"));
        assert_eq!(lookups.statistic_name("athletics"), Some("Athletics"));
        assert_eq!(
            lookups.action_name("create-a-diversion"),
            Some("Create a Diversion")
        );
    }

    #[test]
    fn new_action_takes_first_catalog_entry() {
        let catalog = RollCatalog {
            actions: vec![ActionDefinition::new("treat-wounds", "Treat Wounds")
                .with_statistic("medicine")
                .with_variant("expert", "Expert")
                .with_variant("master", "Master")],
            ..RollCatalog::new()
        };
        let item = RollItem::new_action(&catalog).expect("catalog has actions");
        assert_eq!(item.slug, "treat-wounds");
        assert_eq!(
            item.kind,
            RollKind::Action {
                statistic: Some("medicine".into()),
                variant: Some("expert".into())
            }
        );
        assert!(RollItem::new_action(&RollCatalog::new()).is_none());
    }

    #[test]
    fn title_case_handles_hyphens() {
        assert_eq!(title_case("sense-motive"), "Sense Motive");
    }
}
