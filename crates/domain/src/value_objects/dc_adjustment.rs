//! DC adjustment levels
//!
//! Named offsets a GM can apply to a check's DC. The deltas follow the
//! Pathfinder 2e "Adjusting Difficulty" table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A named DC adjustment level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DcAdjustment {
    IncrediblyEasy,
    VeryEasy,
    Easy,
    Normal,
    Hard,
    VeryHard,
    IncrediblyHard,
}

impl DcAdjustment {
    /// All levels, ordered by delta.
    pub const ALL: [DcAdjustment; 7] = [
        DcAdjustment::IncrediblyEasy,
        DcAdjustment::VeryEasy,
        DcAdjustment::Easy,
        DcAdjustment::Normal,
        DcAdjustment::Hard,
        DcAdjustment::VeryHard,
        DcAdjustment::IncrediblyHard,
    ];

    pub fn delta(self) -> i32 {
        match self {
            DcAdjustment::IncrediblyEasy => -10,
            DcAdjustment::VeryEasy => -5,
            DcAdjustment::Easy => -2,
            DcAdjustment::Normal => 0,
            DcAdjustment::Hard => 2,
            DcAdjustment::VeryHard => 5,
            DcAdjustment::IncrediblyHard => 10,
        }
    }

    /// Look up the level for a raw delta, as carried on a check item.
    pub fn from_delta(delta: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.delta() == delta)
    }

    pub fn slug(self) -> &'static str {
        match self {
            DcAdjustment::IncrediblyEasy => "incredibly-easy",
            DcAdjustment::VeryEasy => "very-easy",
            DcAdjustment::Easy => "easy",
            DcAdjustment::Normal => "normal",
            DcAdjustment::Hard => "hard",
            DcAdjustment::VeryHard => "very-hard",
            DcAdjustment::IncrediblyHard => "incredibly-hard",
        }
    }

    /// English display name, capitalised per word.
    pub fn display_name(self) -> &'static str {
        match self {
            DcAdjustment::IncrediblyEasy => "Incredibly Easy",
            DcAdjustment::VeryEasy => "Very Easy",
            DcAdjustment::Easy => "Easy",
            DcAdjustment::Normal => "Normal",
            DcAdjustment::Hard => "Hard",
            DcAdjustment::VeryHard => "Very Hard",
            DcAdjustment::IncrediblyHard => "Incredibly Hard",
        }
    }

    /// Levels a GM can pick from. `Normal` is the implicit default, not a choice.
    pub fn selectable() -> impl Iterator<Item = DcAdjustment> {
        Self::ALL.into_iter().filter(|a| *a != DcAdjustment::Normal)
    }

    /// Selectable levels paired with a label such as `"Hard (+2)"`.
    pub fn selectable_options() -> Vec<(i32, String)> {
        Self::selectable()
            .map(|a| {
                (
                    a.delta(),
                    format!("{} ({})", a.display_name(), signed_integer(a.delta())),
                )
            })
            .collect()
    }
}

impl fmt::Display for DcAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DcAdjustment {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.slug() == s)
            .ok_or_else(|| DomainError::parse(format!("Unknown DC adjustment: {}", s)))
    }
}

/// Apply an adjustment level to a base DC.
pub fn adjust_dc(dc: i32, adjustment: DcAdjustment) -> i32 {
    dc + adjustment.delta()
}

/// Format an integer with an explicit sign, e.g. `+2`, `-5`, `+0`.
pub fn signed_integer(value: i32) -> String {
    if value < 0 {
        value.to_string()
    } else {
        format!("+{}", value)
    }
}
