//! Hover popup content for point layers.

use food_map_records_models::{DEFAULT_CATEGORY, category_color};
use geojson::JsonObject;

/// Renders a feature's properties as popup HTML.
pub type PopupRenderer = fn(&JsonObject) -> String;

fn text<'a>(props: &'a JsonObject, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Popup for a service location: name, colored category badge, address.
#[must_use]
pub fn location_popup(props: &JsonObject) -> String {
    let name = text(props, "Name").unwrap_or("Unnamed Location");
    let category = text(props, "Category");
    let color = category_color(category.unwrap_or(DEFAULT_CATEGORY));
    let address = text(props, "Address").unwrap_or("No address provided");

    format!(
        concat!(
            r#"<div class="mapbox-popup location-popup">"#,
            "<h4>{}</h4>",
            r#"<div class="popup-category" style="background-color: {}">{}</div>"#,
            r#"<p class="popup-address">{}</p>"#,
            "</div>"
        ),
        escape_html(name),
        color,
        escape_html(category.unwrap_or("Uncategorized")),
        escape_html(address),
    )
}

/// Partners as a comma separated list.
///
/// Accepts a JSON array (inline or as a string starting with `[`) or a
/// comma separated string; `"None"` when absent.
#[must_use]
pub fn partners_display(partners: Option<&serde_json::Value>) -> String {
    let list = match partners {
        None | Some(serde_json::Value::Null) => return "None".to_string(),
        Some(serde_json::Value::Array(items)) => items.clone(),
        Some(serde_json::Value::String(s)) if s.trim().starts_with('[') => {
            match serde_json::from_str::<Vec<serde_json::Value>>(s.trim()) {
                Ok(items) => items,
                Err(_) => return s.clone(),
            }
        }
        Some(serde_json::Value::String(s)) => {
            let parts: Vec<&str> = s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
            if parts.is_empty() {
                return "None".to_string();
            }
            return parts.join(", ");
        }
        Some(other) => return other.to_string(),
    };

    let names: Vec<String> = list
        .iter()
        .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
        .collect();
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

/// Popup for a supplier: identifier, address, partners.
#[must_use]
pub fn supplier_popup(props: &JsonObject) -> String {
    let identifier = text(props, "Identifier").unwrap_or("Unnamed Supplier");
    let address = text(props, "Address").unwrap_or("No address provided");
    let partners = partners_display(props.get("Partners"));

    format!(
        concat!(
            r#"<div class="mapbox-popup supplier-popup">"#,
            "<h4>{}</h4>",
            r#"<p class="popup-address">{}</p>"#,
            r#"<div class="popup-partners"><strong>Partners:</strong> {}</div>"#,
            "</div>"
        ),
        escape_html(identifier),
        escape_html(address),
        escape_html(&partners),
    )
}
