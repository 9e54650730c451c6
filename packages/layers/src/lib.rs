#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keeps a map rendering surface in sync with the food map datasets.
//!
//! - [`controller`] sequences surface startup into a single readiness gate
//!   and registers the zip boundary base layers.
//! - [`filter`] applies the user's category switches to locations.
//! - [`projector`] turns located records into GeoJSON point features.
//! - [`reconciler`] creates, updates, hides, and removes the location and
//!   supplier overlays, and shows hover popups.
//! - [`choropleth`] paints zip regions by need score.
//! - [`view`] ties the above together for one surface.
//!
//! The renderer itself sits behind [`surface::RenderSurface`];
//! [`style::StyleDocument`] is an in-memory implementation that builds a
//! Mapbox GL style fragment.

pub mod choropleth;
pub mod controller;
pub mod filter;
pub mod popup;
pub mod projector;
pub mod reconciler;
pub mod style;
pub mod surface;
pub mod view;

#[cfg(test)]
mod test_support;

pub use controller::{MapController, MapInteraction, ReadinessState};
pub use filter::{CategoryFilter, Categorized};
pub use projector::{Projectable, empty_collection, project};
pub use reconciler::{LayerReconciler, LayerState, LayerStyle, ReconcileOutcome};
pub use style::StyleDocument;
pub use surface::{RenderSurface, SurfaceEvent};
pub use view::MapView;

/// Zip code property on zip boundary features.
pub const ZIP_PROPERTY: &str = "ZCTA5CE10";

/// Operations a renderer refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("source '{id}' does not exist")]
    SourceNotFound { id: String },

    #[error("source '{id}' already exists")]
    DuplicateSource { id: String },

    #[error("source '{id}' is still used by layer '{layer}'")]
    SourceInUse { id: String, layer: String },

    #[error("layer '{id}' does not exist")]
    LayerNotFound { id: String },

    #[error("layer '{id}' already exists")]
    DuplicateLayer { id: String },

    /// Renderer-specific failure.
    #[error("{message}")]
    Rejected { message: String },
}

/// Errors raised while reconciling layers.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// A surface operation failed.
    #[error("failed to {operation} '{target}': {source}")]
    Surface {
        operation: &'static str,
        target: String,
        #[source]
        source: SurfaceError,
    },
}

impl LayerError {
    pub(crate) fn surface(operation: &'static str, target: &str, source: SurfaceError) -> Self {
        log::error!("Failed to {operation} '{target}': {source}");
        Self::Surface {
            operation,
            target: target.to_string(),
            source,
        }
    }
}
