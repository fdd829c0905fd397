//! One map view bound to a [`MapContext`]
//!
//! A widget is created by the factory, attached once the host has laid it
//! out, loaded with geocaches and finally disposed. Readiness is a watch
//! flag so callers can await attachment instead of sleeping.

use crate::{
    core::{config::MapConfig, geo::LatLng},
    data::{format_degrees_minutes, MapContext, MapGeocache, MapViewState},
    input::{events::MapServiceEvent, handler::Subscription},
    layers::manager::MapLayerManager,
    prelude::HashMap,
    service::MapService,
    traits::{GeocacheSource, NoticeLevel, Notifier, RenderPort, WaypointSink},
    ui::request::RequestGenerations,
    MapError, Result,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::Duration,
};
use tokio::sync::watch;

pub(crate) type Registry = Mutex<HashMap<String, Arc<MapWidget>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Uninitialized,
    Attached,
    Loaded,
    Disposed,
}

/// Result of [`MapWidget::load_from_source`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Number of geocaches shown
    Loaded(usize),
    /// A newer request started before this one finished
    Stale,
    Failed(String),
}

struct WidgetInner {
    state: WidgetState,
    layers: MapLayerManager,
    subscription: Option<Subscription>,
    waypoint_sink: Option<Arc<dyn WaypointSink>>,
}

fn lock(inner: &Mutex<WidgetInner>) -> MutexGuard<'_, WidgetInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the loading flag unless a newer request owns it
struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
    generations: &'a RequestGenerations,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.generations.is_current(self.generation) {
            self.flag.store(false, Ordering::SeqCst);
        }
    }
}

pub struct MapWidget {
    context: MapContext,
    instance_id: String,
    service: Arc<MapService>,
    notifier: Arc<dyn Notifier>,
    inner: Arc<Mutex<WidgetInner>>,
    ready: watch::Sender<bool>,
    generations: RequestGenerations,
    loading: AtomicBool,
    ready_timeout: Duration,
    registry: Weak<Registry>,
}

impl MapWidget {
    pub(crate) fn new(
        context: MapContext,
        service: Arc<MapService>,
        port: Arc<dyn RenderPort>,
        notifier: Arc<dyn Notifier>,
        config: &MapConfig,
        registry: Weak<Registry>,
    ) -> Self {
        let instance_id = context.instance_id();
        let layers = MapLayerManager::new(&instance_id, port, config);
        let (ready, _) = watch::channel(false);

        Self {
            context,
            instance_id,
            service,
            notifier,
            inner: Arc::new(Mutex::new(WidgetInner {
                state: WidgetState::Uninitialized,
                layers,
                subscription: None,
                waypoint_sink: None,
            })),
            ready,
            generations: RequestGenerations::new(),
            loading: AtomicBool::new(false),
            ready_timeout: config.ready_timeout(),
            registry,
        }
    }

    pub fn context(&self) -> &MapContext {
        &self.context
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn title(&self) -> String {
        self.context.title()
    }

    pub fn state(&self) -> WidgetState {
        lock(&self.inner).state
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Run `f` against the layer manager
    ///
    /// The widget lock is held while `f` runs and service events are applied
    /// under the same lock, so `f` must not call [`MapService`] methods.
    pub fn with_layers<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut MapLayerManager) -> R,
    {
        f(&mut lock(&self.inner).layers)
    }

    // --- lifecycle -------------------------------------------------------------------------

    /// The host has created the engine view; start following the service
    pub fn attach(&self) -> Result<()> {
        let weak = Arc::downgrade(&self.inner);
        let subscription = self.service.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                apply_service_event(&mut lock(&inner), event);
            }
        });

        {
            let mut inner = lock(&self.inner);
            if inner.state != WidgetState::Uninitialized {
                return Err(MapError::InvalidState(format!(
                    "{}: cannot attach from {:?}",
                    self.instance_id, inner.state
                )));
            }
            inner.state = WidgetState::Attached;
            inner.subscription = Some(subscription);

            // Catch up with state that changed before this widget existed
            inner.layers.set_tile_provider(&self.service.tile_provider());
            inner
                .layers
                .show_multiple_detected_coordinates(&self.service.highlighted_coordinates());
            inner
                .layers
                .show_preview_overlay(self.service.preview_overlay().as_ref());
        }

        self.ready.send_replace(true);
        log::debug!("{}: attached", self.instance_id);
        Ok(())
    }

    /// Wait until [`attach`](Self::attach) ran, bounded by the configured timeout
    pub async fn wait_ready(&self) -> Result<()> {
        let mut ready = self.ready.subscribe();
        let outcome = tokio::time::timeout(self.ready_timeout, ready.wait_for(|ready| *ready))
            .await
            .map(|waited| waited.map(|_| ()));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(MapError::NotReady(self.instance_id.clone())),
            Err(_) => {
                log::warn!(
                    "{}: not attached after {:?}",
                    self.instance_id,
                    self.ready_timeout
                );
                Err(MapError::NotReady(self.instance_id.clone()))
            }
        }
    }

    /// Show `geocaches` and mirror them into the service
    pub fn load(&self, geocaches: Vec<MapGeocache>) -> Result<usize> {
        let shown = {
            let mut inner = lock(&self.inner);
            match inner.state {
                WidgetState::Attached | WidgetState::Loaded => {}
                WidgetState::Uninitialized => {
                    return Err(MapError::NotReady(self.instance_id.clone()))
                }
                WidgetState::Disposed => {
                    return Err(MapError::InvalidState(format!(
                        "{}: cannot load after dispose",
                        self.instance_id
                    )))
                }
            }
            let shown = inner.layers.add_geocaches(&geocaches);
            inner.state = WidgetState::Loaded;
            shown
        };

        self.service.load_geocaches(geocaches);
        Ok(shown)
    }

    /// Fetch this widget's geocaches and load them, unless superseded
    pub async fn load_from_source(&self, source: &dyn GeocacheSource) -> LoadOutcome {
        let generation = self.generations.next();
        self.loading.store(true, Ordering::SeqCst);
        let _guard = LoadingGuard {
            flag: &self.loading,
            generations: &self.generations,
            generation,
        };

        let fetched = source.fetch_geocaches(&self.context).await;
        if !self.generations.is_current(generation) {
            log::debug!(
                "{}: discarding stale response for request {}",
                self.instance_id,
                generation
            );
            return LoadOutcome::Stale;
        }

        match fetched.and_then(|geocaches| self.load(geocaches)) {
            Ok(shown) => LoadOutcome::Loaded(shown),
            Err(e) => {
                log::error!("{}: loading geocaches failed: {}", self.instance_id, e);
                self.notifier
                    .notify(NoticeLevel::Error, "Unable to load geocaches for this map");
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Tear down: stop listening, clear and detach the engine view
    ///
    /// Service state is left untouched.
    pub fn dispose(&self) -> Result<()> {
        let subscription = {
            let mut inner = lock(&self.inner);
            if inner.state == WidgetState::Disposed {
                return Err(MapError::InvalidState(format!(
                    "{}: already disposed",
                    self.instance_id
                )));
            }
            inner.state = WidgetState::Disposed;
            inner.waypoint_sink = None;
            inner.layers.dispose();
            inner.layers.port().detach();
            inner.subscription.take()
        };
        drop(subscription);

        self.generations.invalidate();
        self.loading.store(false, Ordering::SeqCst);
        self.ready.send_replace(false);

        if let Some(registry) = self.registry.upgrade() {
            let mut widgets = registry.lock().unwrap_or_else(PoisonError::into_inner);
            let is_self = widgets
                .get(&self.instance_id)
                .map_or(false, |w| std::ptr::eq(Arc::as_ptr(w), self));
            if is_self {
                widgets.remove(&self.instance_id);
            }
        }
        log::debug!("{}: disposed", self.instance_id);
        Ok(())
    }

    // --- interaction -----------------------------------------------------------------------

    /// A feature was clicked; geocache features become the shared selection
    pub fn handle_feature_click(&self, feature_id: &str) -> Option<MapGeocache> {
        let geocache = lock(&self.inner)
            .layers
            .geocache_for_feature(feature_id)
            .cloned();
        match &geocache {
            Some(geocache) => self.service.select_geocache(geocache.clone()),
            None => log::debug!("{}: click on non-geocache feature {}", self.instance_id, feature_id),
        }
        geocache
    }

    /// Click on empty map space
    pub fn handle_background_click(&self) {
        if self.service.selected_geocache().is_some() {
            self.service.deselect_geocache();
        }
    }

    /// Report the current view so other components can follow it
    ///
    /// The zoom also drives this widget's clustering.
    pub fn update_view(&self, center: LatLng, zoom: f64) {
        lock(&self.inner).layers.set_zoom(zoom);
        self.service
            .update_view_state(MapViewState::new(center, zoom));
    }

    /// Register or clear the receiver for waypoints created from the map
    pub fn set_waypoint_sink(&self, sink: Option<Arc<dyn WaypointSink>>) {
        lock(&self.inner).waypoint_sink = sink;
    }

    /// Create a waypoint at `position` in the open geocache
    pub fn add_waypoint_at(&self, position: LatLng) -> bool {
        if !position.is_valid() {
            log::warn!("{}: invalid waypoint position {:?}", self.instance_id, position);
            return false;
        }
        let sink = lock(&self.inner).waypoint_sink.clone();
        let Some(sink) = sink else {
            self.notifier.notify(
                NoticeLevel::Warning,
                "Open a geocache first to add a waypoint from the map",
            );
            return false;
        };

        match sink.add_waypoint(position, &format_degrees_minutes(position)) {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}: adding waypoint failed: {}", self.instance_id, e);
                self.notifier
                    .notify(NoticeLevel::Error, "Unable to add the waypoint");
                false
            }
        }
    }
}

fn apply_service_event(inner: &mut WidgetInner, event: &MapServiceEvent) {
    if inner.state == WidgetState::Disposed {
        return;
    }
    let layers = &mut inner.layers;
    match event {
        MapServiceEvent::GeocacheSelected(geocache) => {
            // The selection is global: a cache this map lacks clears its own
            if layers.geocache(geocache.id).is_some() {
                layers.select_geocache(geocache.id);
            } else {
                layers.deselect_all_geocaches();
            }
        }
        MapServiceEvent::GeocacheDeselected => layers.deselect_all_geocaches(),
        MapServiceEvent::TileProviderChanged(id) => {
            layers.set_tile_provider(id);
        }
        MapServiceEvent::HighlightsChanged(highlights) => {
            layers.show_multiple_detected_coordinates(highlights)
        }
        MapServiceEvent::PreviewChanged(overlay) => layers.show_preview_overlay(overlay.as_ref()),
        MapServiceEvent::GeocachesLoaded(_)
        | MapServiceEvent::LastHighlightChanged(_)
        | MapServiceEvent::ViewChanged(_) => {}
    }
}

impl std::fmt::Debug for MapWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapWidget")
            .field("instance_id", &self.instance_id)
            .field("state", &self.state())
            .finish()
    }
}
