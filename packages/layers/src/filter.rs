//! User-controlled category inclusion.

use std::collections::BTreeMap;

use food_map_records_models::{Location, LocationCategory};

/// A record with a categorical attribute.
pub trait Categorized {
    /// The record's category, already canonicalized.
    fn category(&self) -> &str;
}

impl Categorized for Location {
    fn category(&self) -> &str {
        &self.category
    }
}

/// Which categories are shown.
///
/// An empty filter includes everything. A non-empty filter includes
/// exactly the categories mapped to `true`; unlisted categories are
/// excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    enabled: BTreeMap<String, bool>,
}

impl CategoryFilter {
    /// The identity filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: BTreeMap::new(),
        }
    }

    /// Every known category switched on, the map's initial state.
    #[must_use]
    pub fn all_enabled() -> Self {
        Self {
            enabled: LocationCategory::all()
                .iter()
                .map(|c| (c.to_string(), true))
                .collect(),
        }
    }

    /// Includes only the named categories.
    #[must_use]
    pub fn only<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: categories.into_iter().map(|c| (c.into(), true)).collect(),
        }
    }

    /// Parses a comma separated category list such as `Garden,Shelter`.
    /// Blank input yields the identity filter.
    #[must_use]
    pub fn parse_list(list: &str) -> Self {
        Self::only(
            list.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
        )
    }

    pub fn set(&mut self, category: impl Into<String>, enabled: bool) {
        self.enabled.insert(category.into(), enabled);
    }

    /// Flips a category, treating unlisted categories as off.
    pub fn toggle(&mut self, category: &str) {
        let entry = self.enabled.entry(category.to_string()).or_insert(false);
        *entry = !*entry;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    #[must_use]
    pub fn includes(&self, category: &str) -> bool {
        self.is_empty() || self.enabled.get(category).copied().unwrap_or(false)
    }

    /// Categories and their switches, in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.enabled.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Records whose category is included, in input order.
    #[must_use]
    pub fn apply<'a, T: Categorized>(&self, records: &'a [T]) -> Vec<&'a T> {
        records.iter().filter(|r| self.includes(r.category())).collect()
    }
}
