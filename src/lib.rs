//! # geoapp-map
//!
//! Map coordination layer for a geocache management application.
//!
//! A shared [`MapService`] holds the loaded geocaches, the selection, the
//! active basemap and detected-coordinate highlights, and publishes every
//! change as a [`MapServiceEvent`]. Each map view is a [`MapWidget`] created
//! through the [`MapWidgetFactory`]; its [`MapLayerManager`] turns domain
//! records into keyed features and pushes change batches to a [`RenderPort`]
//! implemented by the host's rendering engine.

pub mod backend;
pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod service;
pub mod spatial;
pub mod tiles;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{ClusteringProfile, MapConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
};

pub use data::{
    DetectedCoordinateHighlight, MapContext, MapGeocache, MapViewState, PreviewOverlay, Waypoint,
};

pub use input::{
    EventKind, ExternalEvent, ExternalEventBridge, ExternalEventSender, MapServiceEvent,
    Subscription,
};

pub use layers::{FeatureChange, LayerKind, MapLayerManager};

pub use service::MapService;

pub use spatial::{Cluster, Clustering, ClusteringConfig};

pub use traits::{GeocacheSource, Notifier, RenderPort, RenderPortFactory, WaypointSink};

pub use ui::{LoadOutcome, MapWidget, MapWidgetFactory, WidgetState};

pub use backend::BackendClient;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid geocache {id}: {reason}")]
    InvalidGeocache { id: i64, reason: String },

    #[error("Malformed '{event}' event: {reason}")]
    MalformedEvent { event: String, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Map not ready: {0}")]
    NotReady(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Initialise `env_logger` from `RUST_LOG`; safe to call more than once
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init();
}
