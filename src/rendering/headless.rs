//! In-memory render port
//!
//! Mirrors every layer as a keyed source and records each batch it receives.
//! Used by the driver binary and by tests in place of a real engine.

use crate::{
    layers::{
        base::LayerKind,
        feature::{Feature, FeatureChange},
        source::VectorSource,
    },
    prelude::HashMap,
    tiles::TileProvider,
    traits::{RenderPort, RenderPortFactory},
    MapError, Result,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct HeadlessState {
    layers: HashMap<LayerKind, VectorSource>,
    batches: Vec<(LayerKind, Vec<FeatureChange>)>,
    basemap: Option<String>,
    clustering: Option<bool>,
    detached: bool,
}

#[derive(Default)]
pub struct HeadlessPort {
    state: Mutex<HeadlessState>,
}

impl HeadlessPort {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_attached(state: &HeadlessState) -> Result<()> {
        if state.detached {
            return Err(MapError::InvalidState("render port is detached".to_string()));
        }
        Ok(())
    }

    pub fn feature_count(&self, layer: LayerKind) -> usize {
        self.state().layers.get(&layer).map_or(0, VectorSource::len)
    }

    /// Mirrored features of a layer in insertion order
    pub fn features(&self, layer: LayerKind) -> Vec<Feature> {
        self.state()
            .layers
            .get(&layer)
            .map(|source| source.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn batch_count(&self) -> usize {
        self.state().batches.len()
    }

    pub fn last_batch(&self) -> Option<(LayerKind, Vec<FeatureChange>)> {
        self.state().batches.last().cloned()
    }

    pub fn basemap(&self) -> Option<String> {
        self.state().basemap.clone()
    }

    /// Last clustering toggle received, `None` if never set
    pub fn clustering_enabled(&self) -> Option<bool> {
        self.state().clustering
    }

    pub fn is_detached(&self) -> bool {
        self.state().detached
    }
}

impl RenderPort for HeadlessPort {
    fn apply(&self, layer: LayerKind, changes: &[FeatureChange]) -> Result<()> {
        let mut state = self.state();
        Self::check_attached(&state)?;

        let source = state
            .layers
            .entry(layer)
            .or_insert_with(|| VectorSource::new(layer));
        for change in changes {
            match change {
                FeatureChange::Add(feature) | FeatureChange::Update(feature) => {
                    source.upsert(feature.clone());
                }
                FeatureChange::Remove(id) => {
                    source.remove(id);
                }
                FeatureChange::Clear => {
                    source.clear();
                }
            }
        }
        state.batches.push((layer, changes.to_vec()));
        Ok(())
    }

    fn set_basemap(&self, provider: &TileProvider) -> Result<()> {
        let mut state = self.state();
        Self::check_attached(&state)?;
        state.basemap = Some(provider.id.to_string());
        Ok(())
    }

    fn set_clustering(&self, enabled: bool) -> Result<()> {
        let mut state = self.state();
        Self::check_attached(&state)?;
        state.clustering = Some(enabled);
        Ok(())
    }

    fn detach(&self) {
        self.state().detached = true;
    }
}

/// Hands out headless ports and keeps them reachable by instance id
#[derive(Default)]
pub struct HeadlessPortFactory {
    ports: Mutex<HashMap<String, Arc<HeadlessPort>>>,
}

impl HeadlessPortFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent port created for `instance_id`
    pub fn port(&self, instance_id: &str) -> Option<Arc<HeadlessPort>> {
        self.ports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(instance_id)
            .cloned()
    }
}

impl RenderPortFactory for HeadlessPortFactory {
    fn create(&self, instance_id: &str) -> Arc<dyn RenderPort> {
        let port = Arc::new(HeadlessPort::new());
        self.ports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instance_id.to_string(), port.clone());
        port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::geo::LatLng, layers::style::waypoint_style, tiles::TileProviders};

    fn feature(id: &str) -> Feature {
        Feature::point(id, LatLng::new(48.0, 2.0), waypoint_style())
    }

    #[test]
    fn test_mirror_follows_changes() {
        let port = HeadlessPort::new();
        port.apply(
            LayerKind::Waypoints,
            &[FeatureChange::Add(feature("a")), FeatureChange::Add(feature("b"))],
        )
        .unwrap();
        port.apply(LayerKind::Waypoints, &[FeatureChange::Remove("a".into())])
            .unwrap();

        assert_eq!(port.feature_count(LayerKind::Waypoints), 1);
        assert_eq!(port.features(LayerKind::Waypoints)[0].id, "b");
        assert_eq!(port.batch_count(), 2);

        port.apply(LayerKind::Waypoints, &[FeatureChange::Clear]).unwrap();
        assert_eq!(port.feature_count(LayerKind::Waypoints), 0);
    }

    #[test]
    fn test_detached_port_rejects() {
        let port = HeadlessPort::new();
        port.set_basemap(TileProviders::resolve("osm")).unwrap();
        port.detach();
        assert!(port.is_detached());
        assert!(port.apply(LayerKind::Geocaches, &[FeatureChange::Clear]).is_err());
        assert!(port.set_clustering(true).is_err());
        assert_eq!(port.basemap().as_deref(), Some("osm"));
    }

    #[test]
    fn test_factory_tracks_ports() {
        let factory = HeadlessPortFactory::new();
        let port = factory.create("geoapp-map-general");
        port.set_clustering(true).unwrap();
        assert_eq!(
            factory
                .port("geoapp-map-general")
                .and_then(|p| p.clustering_enabled()),
            Some(true)
        );
        assert!(factory.port("other").is_none());
    }
}
