//! Shared map state and event hub
//!
//! One `MapService` is created when the application starts and handed to every
//! map widget as an `Arc`. It owns the loaded geocache set, the selection slot,
//! the active basemap id and the detected-coordinate highlights. Every change
//! is announced through its [`EventBus`]; nothing here returns an error to the
//! caller, bad input is logged and ignored.

use crate::{
    core::{config::MapConfig, constants::DEFAULT_TILE_PROVIDER, geo::LatLng},
    data::{
        DetectedCoordinateHighlight, HighlightMode, MapGeocache, MapViewState, PreviewOverlay,
    },
    input::{
        events::{EventKind, MapServiceEvent},
        handler::{EventBus, Subscription},
    },
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct ServiceState {
    geocaches: Arc<Vec<MapGeocache>>,
    selected: Option<MapGeocache>,
    tile_provider: String,
    highlights: Vec<DetectedCoordinateHighlight>,
    view: Option<MapViewState>,
    preview: Option<PreviewOverlay>,
}

pub struct MapService {
    state: Mutex<ServiceState>,
    events: EventBus,
}

impl MapService {
    pub fn new(config: &MapConfig) -> Self {
        Self::with_tile_provider(&config.default_tile_provider)
    }

    pub fn with_tile_provider(tile_provider: &str) -> Self {
        Self {
            state: Mutex::new(ServiceState {
                tile_provider: tile_provider.to_string(),
                ..ServiceState::default()
            }),
            events: EventBus::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit outside of the state lock so listeners can read the service
    fn emit(&self, event: MapServiceEvent) {
        let delivered = self.events.emit(&event);
        log::debug!("{:?} delivered to {} listener(s)", event.kind(), delivered);
    }

    // --- listeners -------------------------------------------------------------------------

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MapServiceEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(callback)
    }

    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&MapServiceEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    /// Drop every listener; the state itself is kept
    pub fn dispose(&self) {
        log::debug!("disposing map service listeners");
        self.events.clear();
    }

    // --- geocaches -------------------------------------------------------------------------

    /// Replace the whole loaded set
    pub fn load_geocaches(&self, geocaches: Vec<MapGeocache>) {
        let geocaches = Arc::new(geocaches);
        self.state().geocaches = geocaches.clone();
        log::debug!("loaded {} geocache(s)", geocaches.len());
        self.emit(MapServiceEvent::GeocachesLoaded(geocaches));
    }

    /// Loaded geocaches in the order they were supplied
    pub fn loaded_geocaches(&self) -> Arc<Vec<MapGeocache>> {
        self.state().geocaches.clone()
    }

    pub fn geocache_by_id(&self, id: i64) -> Option<MapGeocache> {
        self.state().geocaches.iter().find(|g| g.id == id).cloned()
    }

    /// Loaded geocaches within `radius_m` of `center`, nearest first
    pub fn geocaches_within(&self, center: LatLng, radius_m: f64) -> Vec<(MapGeocache, f64)> {
        let geocaches = self.loaded_geocaches();
        let mut found: Vec<(MapGeocache, f64)> = geocaches
            .iter()
            .filter(|g| g.position().is_valid())
            .map(|g| (g, center.distance_to(&g.position())))
            .filter(|(_, distance)| *distance <= radius_m)
            .map(|(g, distance)| (g.clone(), distance))
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }

    // --- selection -------------------------------------------------------------------------

    pub fn select_geocache(&self, geocache: MapGeocache) {
        self.state().selected = Some(geocache.clone());
        log::debug!("selected geocache {} ({})", geocache.id, geocache.gc_code);
        self.emit(MapServiceEvent::GeocacheSelected(geocache));
    }

    pub fn deselect_geocache(&self) {
        self.state().selected = None;
        self.emit(MapServiceEvent::GeocacheDeselected);
    }

    pub fn selected_geocache(&self) -> Option<MapGeocache> {
        self.state().selected.clone()
    }

    // --- basemap ---------------------------------------------------------------------------

    /// Any id is accepted, the tile registry falls back for unknown ones
    pub fn change_tile_provider(&self, provider_id: &str) {
        self.state().tile_provider = provider_id.to_string();
        self.emit(MapServiceEvent::TileProviderChanged(provider_id.to_string()));
    }

    pub fn tile_provider(&self) -> String {
        self.state().tile_provider.clone()
    }

    // --- highlights ------------------------------------------------------------------------

    pub fn highlight_detected_coordinate(&self, highlight: DetectedCoordinateHighlight) {
        if !highlight.is_valid() {
            log::warn!(
                "ignoring detected coordinate with invalid position ({}, {})",
                highlight.latitude,
                highlight.longitude
            );
            return;
        }

        let highlights = {
            let mut state = self.state();
            match highlight.mode() {
                HighlightMode::Replace => state.highlights = vec![highlight.clone()],
                HighlightMode::Accumulate => {
                    let existing = highlight.brute_force_id.as_ref().and_then(|id| {
                        state
                            .highlights
                            .iter()
                            .position(|h| h.brute_force_id.as_ref() == Some(id))
                    });
                    match existing {
                        Some(index) => state.highlights[index] = highlight.clone(),
                        None => state.highlights.push(highlight.clone()),
                    }
                }
            }
            state.highlights.clone()
        };

        log::debug!(
            "highlighting {} ({} active)",
            highlight.formatted,
            highlights.len()
        );
        self.emit(MapServiceEvent::HighlightsChanged(highlights));
        self.emit(MapServiceEvent::LastHighlightChanged(Some(highlight)));
    }

    /// Remove one accumulated highlight, returns whether it existed
    pub fn remove_brute_force_point(&self, brute_force_id: &str) -> bool {
        let (highlights, last) = {
            let mut state = self.state();
            let Some(index) = state
                .highlights
                .iter()
                .position(|h| h.brute_force_id.as_deref() == Some(brute_force_id))
            else {
                log::warn!("no highlighted brute force point with id {}", brute_force_id);
                return false;
            };
            state.highlights.remove(index);
            (state.highlights.clone(), state.highlights.last().cloned())
        };

        self.emit(MapServiceEvent::HighlightsChanged(highlights));
        self.emit(MapServiceEvent::LastHighlightChanged(last));
        true
    }

    pub fn clear_highlighted_coordinate(&self) {
        self.state().highlights.clear();
        self.emit(MapServiceEvent::HighlightsChanged(Vec::new()));
        self.emit(MapServiceEvent::LastHighlightChanged(None));
    }

    pub fn highlighted_coordinates(&self) -> Vec<DetectedCoordinateHighlight> {
        self.state().highlights.clone()
    }

    pub fn last_highlighted_coordinate(&self) -> Option<DetectedCoordinateHighlight> {
        self.state().highlights.last().cloned()
    }

    // --- view ------------------------------------------------------------------------------

    pub fn update_view_state(&self, view: MapViewState) {
        if !view.center.is_valid() || !view.zoom.is_finite() {
            log::warn!("ignoring invalid view state {:?}", view);
            return;
        }
        self.state().view = Some(view);
        self.emit(MapServiceEvent::ViewChanged(view));
    }

    pub fn view_state(&self) -> Option<MapViewState> {
        self.state().view
    }

    // --- formula preview -------------------------------------------------------------------

    /// Show a preview overlay; an empty overlay clears it
    pub fn show_preview_overlay(&self, overlay: PreviewOverlay) {
        if overlay.is_empty() {
            self.clear_preview_overlay();
            return;
        }
        if let Err(e) = overlay.validate() {
            log::warn!("ignoring invalid preview overlay: {}", e);
            return;
        }
        self.state().preview = Some(overlay.clone());
        self.emit(MapServiceEvent::PreviewChanged(Some(overlay)));
    }

    pub fn clear_preview_overlay(&self) {
        self.state().preview = None;
        self.emit(MapServiceEvent::PreviewChanged(None));
    }

    pub fn preview_overlay(&self) -> Option<PreviewOverlay> {
        self.state().preview.clone()
    }
}

impl Default for MapService {
    fn default() -> Self {
        Self::with_tile_provider(DEFAULT_TILE_PROVIDER)
    }
}
