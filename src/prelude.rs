//! Prelude module for common geoapp-map types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use geoapp_map::prelude::*;`

pub use crate::core::{
    config::{ClusteringProfile, MapConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
};

pub use crate::data::{
    DetectedCoordinateHighlight, HighlightMode, MapContext, MapGeocache, MapViewState,
    PreviewOverlay, Waypoint,
};

pub use crate::input::{
    EventKind, ExternalEvent, ExternalEventBridge, ExternalEventSender, MapServiceEvent,
    Subscription,
};

pub use crate::layers::{Feature, FeatureChange, Geometry, LayerKind, MapLayerManager};

pub use crate::rendering::{HeadlessPort, HeadlessPortFactory};

pub use crate::service::MapService;

pub use crate::spatial::{Cluster, Clustering, ClusteringConfig};

pub use crate::tiles::{TileProvider, TileProviders, TileSource};

pub use crate::traits::{
    GeocacheSource, LogNotifier, NoticeLevel, Notifier, RenderPort, RenderPortFactory,
    WaypointSink,
};

pub use crate::ui::{LoadOutcome, MapWidget, MapWidgetFactory, WidgetState};

pub use crate::backend::BackendClient;

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
