use crate::{
    core::{config::MapConfig, constants::DEFAULT_VIEW_ZOOM},
    data::{DetectedCoordinateHighlight, HighlightMode, MapGeocache, PreviewOverlay, PreviewShape},
    layers::{
        base::{LayerKind, LayerProperties},
        exclusion::{mercator_radius, zones_for},
        feature::{Feature, FeatureChange, Geometry},
        source::VectorSource,
        style,
    },
    prelude::HashMap,
    spatial::{Cluster, Clustering},
    tiles::{TileProvider, TileProviders},
    traits::RenderPort,
};
use std::sync::Arc;

/// One keyed source per layer kind
#[derive(Debug, Clone)]
struct Sources {
    zones: VectorSource,
    preview: VectorSource,
    nearby: VectorSource,
    waypoints: VectorSource,
    geocaches: VectorSource,
    detected: VectorSource,
}

impl Sources {
    fn new() -> Self {
        Self {
            zones: VectorSource::new(LayerKind::ExclusionZones),
            preview: VectorSource::new(LayerKind::Preview),
            nearby: VectorSource::new(LayerKind::Nearby),
            waypoints: VectorSource::new(LayerKind::Waypoints),
            geocaches: VectorSource::new(LayerKind::Geocaches),
            detected: VectorSource::new(LayerKind::DetectedCoordinates),
        }
    }

    fn get(&self, kind: LayerKind) -> &VectorSource {
        match kind {
            LayerKind::ExclusionZones => &self.zones,
            LayerKind::Preview => &self.preview,
            LayerKind::Nearby => &self.nearby,
            LayerKind::Waypoints => &self.waypoints,
            LayerKind::Geocaches => &self.geocaches,
            LayerKind::DetectedCoordinates => &self.detected,
        }
    }

    fn get_mut(&mut self, kind: LayerKind) -> &mut VectorSource {
        match kind {
            LayerKind::ExclusionZones => &mut self.zones,
            LayerKind::Preview => &mut self.preview,
            LayerKind::Nearby => &mut self.nearby,
            LayerKind::Waypoints => &mut self.waypoints,
            LayerKind::Geocaches => &mut self.geocaches,
            LayerKind::DetectedCoordinates => &mut self.detected,
        }
    }
}

/// Owns the renderable state of one map instance
///
/// Domain records go in, keyed features come out. Every mutation is pushed
/// to the [`RenderPort`] as one change batch per touched layer.
///
/// The geocache layer is kept twice: one feature per geocache, and the view
/// the port currently shows, which holds cluster bubbles while clustering is on.
pub struct MapLayerManager {
    map_id: String,
    port: Arc<dyn RenderPort>,
    layers: Vec<LayerProperties>,
    sources: Sources,
    rendered: VectorSource,
    zoom: f64,
    geocaches: HashMap<i64, MapGeocache>,
    selected: Option<i64>,
    detected_seq: usize,
    tile_provider: &'static TileProvider,
    clustering: Clustering<i64>,
    clustering_enabled: bool,
}

fn geocache_feature(geocache: &MapGeocache, selected: bool) -> Feature {
    Feature::point(
        geocache.id.to_string(),
        geocache.position(),
        style::geocache_style(geocache, selected),
    )
    .with_property("geocacheId", geocache.id)
    .with_property("gcCode", geocache.gc_code.as_str())
    .with_property("name", geocache.name.as_str())
    .with_property("cacheType", geocache.cache_type.as_str())
    .with_property("found", geocache.found)
    .with_selected(selected)
}

fn detected_feature(id: String, highlight: &DetectedCoordinateHighlight) -> Feature {
    Feature::point(
        id,
        highlight.position(),
        style::detected_style(&highlight.formatted),
    )
    .with_property("formatted", highlight.formatted.as_str())
    .with_property("pluginName", highlight.plugin_name.clone())
    .with_property("gcCode", highlight.gc_code.clone())
    .with_property("autoSaved", highlight.auto_saved)
}

fn detected_id(highlight: &DetectedCoordinateHighlight, fallback: usize) -> String {
    match &highlight.brute_force_id {
        Some(id) => format!("detected_bf_{}", id),
        None => format!("detected_{}", fallback),
    }
}

impl MapLayerManager {
    pub fn new(map_id: &str, port: Arc<dyn RenderPort>, config: &MapConfig) -> Self {
        let layers = LayerKind::ALL
            .iter()
            .map(|kind| LayerProperties::new(map_id, *kind))
            .collect();

        Self {
            map_id: map_id.to_string(),
            port,
            layers,
            sources: Sources::new(),
            rendered: VectorSource::new(LayerKind::Geocaches),
            zoom: DEFAULT_VIEW_ZOOM,
            geocaches: HashMap::default(),
            selected: None,
            detected_seq: 0,
            tile_provider: TileProviders::resolve(&config.default_tile_provider),
            clustering: Clustering::new(config.clustering.clone()),
            clustering_enabled: config.clustering_enabled,
        }
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn port(&self) -> &Arc<dyn RenderPort> {
        &self.port
    }

    /// Layer properties in render order
    pub fn layers(&self) -> &[LayerProperties] {
        &self.layers
    }

    fn push(&self, kind: LayerKind, changes: Vec<FeatureChange>) {
        if changes.is_empty() {
            return;
        }
        log::debug!(
            "{}: pushing {} change(s) to {}",
            self.map_id,
            changes.len(),
            kind
        );
        if let Err(e) = self.port.apply(kind, &changes) {
            log::warn!("{}: render port rejected {} batch: {}", self.map_id, kind, e);
        }
    }

    /// Diff the port's geocache layer against the current clusters
    fn sync_geocaches(&mut self) {
        let desired = self.cluster_features(self.zoom);
        let changes = self.rendered.replace_all(desired);
        self.push(LayerKind::Geocaches, changes);
    }

    // --- geocaches -------------------------------------------------------------------------

    /// Show exactly `geocaches`, returns how many were accepted
    ///
    /// Waypoint features are rebuilt alongside. Unchanged features are left
    /// alone on the port; invalid records are skipped.
    pub fn add_geocaches(&mut self, geocaches: &[MapGeocache]) -> usize {
        let mut features = Vec::with_capacity(geocaches.len());
        let mut waypoints = Vec::new();
        self.geocaches.clear();

        for geocache in geocaches {
            if let Err(e) = geocache.validate() {
                log::warn!("{}: skipping geocache: {}", self.map_id, e);
                continue;
            }
            let selected = self.selected == Some(geocache.id);
            features.push(geocache_feature(geocache, selected));

            if let Some(original) = geocache.original_position() {
                waypoints.push(
                    Feature::point(
                        format!("original_{}", geocache.id),
                        original,
                        style::original_position_style(),
                    )
                    .with_property("geocacheId", geocache.id),
                );
            }
            for waypoint in &geocache.waypoints {
                if let Some(position) = waypoint.position() {
                    waypoints.push(
                        Feature::point(
                            format!("waypoint_{}", waypoint.id),
                            position,
                            style::waypoint_style(),
                        )
                        .with_property("geocacheId", geocache.id)
                        .with_property("name", waypoint.display_name()),
                    );
                }
            }
            self.geocaches.insert(geocache.id, geocache.clone());
        }

        if let Some(selected) = self.selected {
            if !self.geocaches.contains_key(&selected) {
                self.selected = None;
            }
        }

        let accepted = features.len();
        self.clustering.set_items(
            features
                .iter()
                .filter_map(|f| Some((f.id.clone(), f.geometry.anchor()?, f.id.parse().ok()?))),
        );

        let changes = self.sources.get_mut(LayerKind::Waypoints).replace_all(waypoints);
        self.push(LayerKind::Waypoints, changes);
        self.sources.get_mut(LayerKind::Geocaches).replace_all(features);
        self.sync_geocaches();

        log::debug!(
            "{}: showing {} of {} geocache(s)",
            self.map_id,
            accepted,
            geocaches.len()
        );
        accepted
    }

    pub fn geocache(&self, id: i64) -> Option<&MapGeocache> {
        self.geocaches.get(&id)
    }

    /// Geocache behind a clicked geocache or original-position feature
    pub fn geocache_for_feature(&self, feature_id: &str) -> Option<&MapGeocache> {
        let id = feature_id.strip_prefix("original_").unwrap_or(feature_id);
        id.parse().ok().and_then(|id| self.geocaches.get(&id))
    }

    // --- selection -------------------------------------------------------------------------

    /// Mark one geocache as selected, returns false for unknown ids
    pub fn select_geocache(&mut self, id: i64) -> bool {
        let Some(geocache) = self.geocaches.get(&id) else {
            log::warn!("{}: cannot select unknown geocache {}", self.map_id, id);
            return false;
        };
        if self.selected == Some(id) {
            return true;
        }

        let source = self.sources.get_mut(LayerKind::Geocaches);
        if let Some(previous) = self.selected.and_then(|prev| self.geocaches.get(&prev)) {
            source.upsert(geocache_feature(previous, false));
        }
        source.upsert(geocache_feature(geocache, true));
        self.selected = Some(id);
        self.sync_geocaches();
        true
    }

    pub fn deselect_all_geocaches(&mut self) {
        let Some(previous) = self.selected.take() else {
            return;
        };
        if let Some(geocache) = self.geocaches.get(&previous) {
            self.sources
                .get_mut(LayerKind::Geocaches)
                .upsert(geocache_feature(geocache, false));
            self.sync_geocaches();
        }
    }

    pub fn selected_geocache(&self) -> Option<i64> {
        self.selected
    }

    // --- detected coordinates --------------------------------------------------------------

    pub fn show_detected_coordinate(&mut self, highlight: &DetectedCoordinateHighlight) {
        if !highlight.is_valid() {
            log::warn!("{}: ignoring invalid detected coordinate", self.map_id);
            return;
        }
        let mut changes = Vec::new();
        if highlight.mode() == HighlightMode::Replace {
            changes.extend(self.sources.get_mut(LayerKind::DetectedCoordinates).clear());
        }
        self.detected_seq += 1;
        let feature = detected_feature(detected_id(highlight, self.detected_seq), highlight);
        changes.extend(self.sources.get_mut(LayerKind::DetectedCoordinates).upsert(feature));
        self.push(LayerKind::DetectedCoordinates, changes);
    }

    /// Show exactly `highlights`
    pub fn show_multiple_detected_coordinates(&mut self, highlights: &[DetectedCoordinateHighlight]) {
        let features = highlights
            .iter()
            .enumerate()
            .filter(|(_, h)| h.is_valid())
            .map(|(index, h)| detected_feature(detected_id(h, index), h))
            .collect();
        let changes = self
            .sources
            .get_mut(LayerKind::DetectedCoordinates)
            .replace_all(features);
        self.push(LayerKind::DetectedCoordinates, changes);
    }

    pub fn clear_detected_coordinates(&mut self) {
        self.detected_seq = 0;
        let change = self.sources.get_mut(LayerKind::DetectedCoordinates).clear();
        self.push(LayerKind::DetectedCoordinates, change.into_iter().collect());
    }

    // --- exclusion zones -------------------------------------------------------------------

    /// Draw the zones `geocaches` produce, returns the zone count
    pub fn show_exclusion_zones(&mut self, geocaches: &[MapGeocache]) -> usize {
        let features: Vec<Feature> = zones_for(geocaches)
            .into_iter()
            .map(|zone| {
                Feature::new(
                    zone.feature_id(),
                    Geometry::Circle {
                        center: zone.center,
                        radius: zone.render_radius,
                    },
                    style::exclusion_zone_style(zone.color),
                )
                .with_property("geocacheId", zone.geocache_id)
                .with_property("radiusM", zone.radius_m)
            })
            .collect();
        let count = features.len();
        let changes = self.sources.get_mut(LayerKind::ExclusionZones).replace_all(features);
        self.push(LayerKind::ExclusionZones, changes);
        count
    }

    pub fn clear_exclusion_zones(&mut self) {
        let change = self.sources.get_mut(LayerKind::ExclusionZones).clear();
        self.push(LayerKind::ExclusionZones, change.into_iter().collect());
    }

    // --- nearby geocaches ------------------------------------------------------------------

    /// Context geocaches around the loaded set; ids already shown are skipped
    pub fn show_nearby_geocaches(&mut self, nearby: &[MapGeocache]) -> usize {
        let features: Vec<Feature> = nearby
            .iter()
            .filter(|g| !self.geocaches.contains_key(&g.id) && g.validate().is_ok())
            .map(|g| {
                Feature::point(format!("nearby_{}", g.id), g.position(), style::nearby_style(g))
                    .with_property("geocacheId", g.id)
                    .with_property("gcCode", g.gc_code.as_str())
            })
            .collect();
        let count = features.len();
        let changes = self.sources.get_mut(LayerKind::Nearby).replace_all(features);
        self.push(LayerKind::Nearby, changes);
        count
    }

    // --- formula preview -------------------------------------------------------------------

    /// Replace the preview layer, `None` clears it
    pub fn show_preview_overlay(&mut self, overlay: Option<&PreviewOverlay>) {
        let mut features = Vec::new();
        if let Some(overlay) = overlay {
            if let Some(circle) = &overlay.circle {
                features.push(Feature::new(
                    "preview_circle",
                    Geometry::Circle {
                        center: circle.center(),
                        radius: mercator_radius(circle.radius_m, circle.latitude),
                    },
                    style::preview_area_style(),
                ));
            }
            for (index, shape) in overlay.shapes.iter().enumerate() {
                let id = format!("preview_{}", index);
                let feature = match shape {
                    PreviewShape::Point { .. } => Feature::new(
                        id,
                        Geometry::Point(shape.vertices()[0]),
                        style::preview_point_style(),
                    ),
                    PreviewShape::BoundingBox { .. } => Feature::new(
                        id,
                        Geometry::Polygon(shape.vertices()),
                        style::preview_area_style(),
                    ),
                    PreviewShape::LatitudeLine { .. } | PreviewShape::LongitudeLine { .. } => {
                        Feature::new(
                            id,
                            Geometry::LineString(shape.vertices()),
                            style::preview_line_style(),
                        )
                    }
                };
                features.push(feature);
            }
        }
        let changes = self.sources.get_mut(LayerKind::Preview).replace_all(features);
        self.push(LayerKind::Preview, changes);
    }

    // --- basemap ---------------------------------------------------------------------------

    /// Switch basemap; unknown ids fall back to the default provider
    pub fn set_tile_provider(&mut self, id: &str) -> &'static TileProvider {
        let provider = TileProviders::resolve(id);
        self.tile_provider = provider;
        if let Err(e) = self.port.set_basemap(provider) {
            log::warn!("{}: render port rejected basemap {}: {}", self.map_id, provider.id, e);
        }
        provider
    }

    pub fn tile_provider(&self) -> &'static TileProvider {
        self.tile_provider
    }

    // --- clustering ------------------------------------------------------------------------

    pub fn set_clustering_enabled(&mut self, enabled: bool) {
        if self.clustering_enabled == enabled {
            return;
        }
        self.clustering_enabled = enabled;
        if let Err(e) = self.port.set_clustering(enabled) {
            log::warn!("{}: render port rejected clustering toggle: {}", self.map_id, e);
        }
        self.sync_geocaches();
    }

    pub fn clustering_enabled(&self) -> bool {
        self.clustering_enabled
    }

    /// Follow the view's zoom; clusters are rebuilt when clustering is on
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() || (self.zoom - zoom).abs() < f64::EPSILON {
            return;
        }
        self.zoom = zoom;
        if self.clustering_enabled {
            self.sync_geocaches();
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Geocache groups at `zoom`; singletons while clustering is off
    pub fn clusters(&mut self, zoom: f64) -> Vec<Cluster<i64>> {
        if self.clustering_enabled {
            self.clustering.get_clusters(zoom)
        } else {
            self.clustering.singletons(zoom)
        }
    }

    /// Cluster bubbles as features, single members keep their geocache style
    pub fn cluster_features(&mut self, zoom: f64) -> Vec<Feature> {
        self.clusters(zoom)
            .into_iter()
            .filter_map(|cluster| {
                if cluster.is_single() {
                    return self.sources.get(LayerKind::Geocaches).get(&cluster.id).cloned();
                }
                Some(
                    Feature::point(
                        cluster.id.clone(),
                        cluster.center,
                        style::cluster_style(cluster.count()),
                    )
                    .with_property("count", cluster.count())
                    .with_property(
                        "members",
                        cluster.items.iter().map(|item| item.data).collect::<Vec<i64>>(),
                    ),
                )
            })
            .collect()
    }

    // --- inspection ------------------------------------------------------------------------

    pub fn feature_count(&self, kind: LayerKind) -> usize {
        self.sources.get(kind).len()
    }

    pub fn feature(&self, kind: LayerKind, id: &str) -> Option<&Feature> {
        self.sources.get(kind).get(id)
    }

    pub fn features(&self, kind: LayerKind) -> impl Iterator<Item = &Feature> {
        self.sources.get(kind).iter()
    }

    /// Clear every layer; the port stays attached
    pub fn dispose(&mut self) {
        for kind in LayerKind::ALL {
            let change = self.sources.get_mut(kind).clear();
            let change = match kind {
                LayerKind::Geocaches => self.rendered.clear(),
                _ => change,
            };
            self.push(kind, change.into_iter().collect());
        }
        self.geocaches.clear();
        self.selected = None;
        self.detected_seq = 0;
        self.clustering.clear();
        log::debug!("{}: layers disposed", self.map_id);
    }
}
