//! Field lookup helpers for raw API objects.
//!
//! The dashboard API has stored records under more than one naming
//! convention over time (`Name` vs `name`, keys with stray whitespace).
//! These helpers accept a list of candidate names and return the first
//! usable value.

use serde_json::{Map, Value};

use crate::Coordinates;

/// Returns the first non-null value among `names`.
#[must_use]
pub fn first_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

/// Returns the first non-empty string among `names`.
///
/// Numeric values are accepted and rendered as strings, since some
/// identifiers (zip codes, legacy ids) are stored as numbers.
#[must_use]
pub fn string_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match obj.get(*name)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Returns the first JSON number among `names`. Strings are not coerced.
#[must_use]
pub fn number_field(obj: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    first_field(obj, names).and_then(Value::as_f64)
}

/// Returns the first numeric value among `names`, accepting numeric
/// strings (with thousands separators and a trailing `%` stripped).
#[must_use]
pub fn lenient_number_field(obj: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| match obj.get(*name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    })
}

/// Reads the `latitude`/`longitude` pair.
///
/// A record carrying only one of the two is treated as unlocated; the
/// half-set value is discarded with a warning.
#[must_use]
pub fn coordinates(obj: &Map<String, Value>, entity: &str, id: &str) -> Option<Coordinates> {
    let lat = number_field(obj, &["latitude", "Latitude"]);
    let lng = number_field(obj, &["longitude", "Longitude"]);

    match (lat, lng) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        (None, None) => None,
        _ => {
            log::warn!("{entity} {id} has only one coordinate set, treating as unlocated");
            None
        }
    }
}

/// Returns a copy of `obj` with surrounding whitespace stripped from
/// every key. Later duplicates win.
#[must_use]
pub fn trim_keys(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .map(|(k, v)| (k.trim().to_string(), v.clone()))
        .collect()
}
