//! Seams between the coordination layer and its collaborators
//!
//! The rendering engine, the data backend, the user notification surface and
//! the waypoint editor all sit behind these traits so the layer itself stays
//! engine independent and testable.

use crate::{
    core::geo::LatLng,
    data::{MapContext, MapGeocache},
    layers::{base::LayerKind, feature::FeatureChange},
    tiles::TileProvider,
    Result,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Narrow view of a rendering engine instance
pub trait RenderPort: Send + Sync {
    /// Apply one batch of changes to a layer
    fn apply(&self, layer: LayerKind, changes: &[FeatureChange]) -> Result<()>;

    fn set_basemap(&self, provider: &TileProvider) -> Result<()>;

    fn set_clustering(&self, enabled: bool) -> Result<()>;

    /// Release engine resources; later calls are ignored by the engine
    fn detach(&self);
}

/// Creates one render port per map instance
pub trait RenderPortFactory: Send + Sync {
    fn create(&self, instance_id: &str) -> Arc<dyn RenderPort>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User facing message surface
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => log::info!("{}", message),
            NoticeLevel::Warning => log::warn!("{}", message),
            NoticeLevel::Error => log::error!("{}", message),
        }
    }
}

/// Receiver for waypoints created from the map, usually an open geocache editor
pub trait WaypointSink: Send + Sync {
    fn add_waypoint(&self, position: LatLng, formatted: &str) -> Result<()>;
}

/// Asynchronous provider of the geocaches shown for a context
#[async_trait]
pub trait GeocacheSource: Send + Sync {
    async fn fetch_geocaches(&self, context: &MapContext) -> Result<Vec<MapGeocache>>;
}
