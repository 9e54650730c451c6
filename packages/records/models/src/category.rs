//! Location category taxonomy and the shared category color table.
//!
//! The same table drives the point layer paint rule, the sidebar legend,
//! and popup badges, so every consumer must go through
//! [`category_color`] rather than keeping its own copy.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Category assigned to locations whose source record carries none.
pub const DEFAULT_CATEGORY: &str = "Default";

/// Program categories a service location can belong to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum LocationCategory {
    /// Community garden
    Garden,
    /// Summer Food Service Program site
    #[strum(serialize = "SFSP")]
    #[serde(rename = "SFSP")]
    Sfsp,
    /// SNAP / WIC enrollment help
    #[strum(serialize = "Benefits Assistance")]
    #[serde(rename = "Benefits Assistance")]
    BenefitsAssistance,
    /// Child and Adult Care Food Program site
    #[strum(serialize = "CACFP")]
    #[serde(rename = "CACFP")]
    Cacfp,
    /// School backpack program
    Backpack,
    /// Group home
    #[strum(serialize = "Group Home")]
    #[serde(rename = "Group Home")]
    GroupHome,
    /// Adult day program
    #[strum(serialize = "Day Program")]
    #[serde(rename = "Day Program")]
    DayProgram,
    /// Shelter
    Shelter,
    /// Senior staples box distribution
    #[strum(serialize = "Senior Staples Program")]
    #[serde(rename = "Senior Staples Program")]
    SeniorStaplesProgram,
    /// Afterschool meal site
    Afterschool,
    /// Mobile pantry stop
    #[strum(serialize = "Mobile Pantry")]
    #[serde(rename = "Mobile Pantry")]
    MobilePantry,
    /// Anything not matching a named program
    Default,
}

impl LocationCategory {
    /// Hex color used for this category on the map and in the legend.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Garden => "#2ecc71",
            Self::Sfsp => "#e74c3c",
            Self::BenefitsAssistance => "#000080",
            Self::Cacfp => "#9b59b6",
            Self::Backpack => "#00ffff",
            Self::GroupHome => "#ffff00",
            Self::DayProgram => "#ffc0cb",
            Self::Shelter => "#808080",
            Self::SeniorStaplesProgram => "#a52a2a",
            Self::Afterschool => "#c0c0c0",
            Self::MobilePantry => "#ffd700",
            Self::Default => "#3498db",
        }
    }

    /// Returns all variants, named programs first and [`Self::Default`]
    /// last.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Garden,
            Self::Sfsp,
            Self::BenefitsAssistance,
            Self::Cacfp,
            Self::Backpack,
            Self::GroupHome,
            Self::DayProgram,
            Self::Shelter,
            Self::SeniorStaplesProgram,
            Self::Afterschool,
            Self::MobilePantry,
            Self::Default,
        ]
    }

    /// Returns the named program variants, excluding [`Self::Default`].
    #[must_use]
    pub fn named() -> &'static [Self] {
        let all = Self::all();
        &all[..all.len() - 1]
    }
}

/// Looks up the color for a free-text category name, falling back to the
/// default color for names outside the taxonomy.
#[must_use]
pub fn category_color(name: &str) -> &'static str {
    name.parse::<LocationCategory>().map_or(LocationCategory::Default.color(), |c| c.color())
}
