//! Widget factory and lifecycle scenarios against headless render ports

use async_trait::async_trait;
use geoapp_map::{input::HIGHLIGHT_COORDINATE_EVENT, prelude::*};
use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

#[derive(Default)]
struct RecordingSink {
    waypoints: Mutex<Vec<(LatLng, String)>>,
}

impl WaypointSink for RecordingSink {
    fn add_waypoint(&self, position: LatLng, formatted: &str) -> Result<()> {
        self.waypoints
            .lock()
            .unwrap()
            .push((position, formatted.to_string()));
        Ok(())
    }
}

/// Returns a fixed list per zone id
struct ZoneSource;

#[async_trait]
impl GeocacheSource for ZoneSource {
    async fn fetch_geocaches(&self, context: &MapContext) -> Result<Vec<MapGeocache>> {
        match context {
            MapContext::Zone { id, .. } => Ok(vec![
                MapGeocache::new(id * 10, "GCA", "A", 48.0, 2.0),
                MapGeocache::new(id * 10 + 1, "GCB", "B", 48.01, 2.01),
            ]),
            _ => Ok(Vec::new()),
        }
    }
}

/// First call answers late with one cache, later calls answer at once with another
#[derive(Default)]
struct SlowFirstSource {
    calls: AtomicUsize,
}

#[async_trait]
impl GeocacheSource for SlowFirstSource {
    async fn fetch_geocaches(&self, _context: &MapContext) -> Result<Vec<MapGeocache>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![MapGeocache::new(1, "GC1", "Old", 48.0, 2.0)])
        } else {
            Ok(vec![MapGeocache::new(2, "GC2", "New", 48.1, 2.1)])
        }
    }
}

struct FailingSource;

#[async_trait]
impl GeocacheSource for FailingSource {
    async fn fetch_geocaches(&self, _context: &MapContext) -> Result<Vec<MapGeocache>> {
        Err(MapError::Backend("HTTP 500".to_string()))
    }
}

struct Harness {
    service: Arc<MapService>,
    ports: Arc<HeadlessPortFactory>,
    notifier: Arc<RecordingNotifier>,
    factory: MapWidgetFactory,
}

fn harness_with(config: MapConfig) -> Harness {
    let service = Arc::new(MapService::new(&config));
    let ports = Arc::new(HeadlessPortFactory::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let factory = MapWidgetFactory::new(service.clone(), ports.clone(), notifier.clone(), config);
    Harness {
        service,
        ports,
        notifier,
        factory,
    }
}

fn harness() -> Harness {
    harness_with(MapConfig::default())
}

impl Harness {
    fn port(&self, widget: &MapWidget) -> Arc<HeadlessPort> {
        self.ports.port(widget.instance_id()).unwrap()
    }

    fn attached(&self, context: &MapContext) -> Arc<MapWidget> {
        let widget = self.factory.open(context);
        widget.attach().unwrap();
        widget
    }
}

fn pair() -> Vec<MapGeocache> {
    vec![
        MapGeocache::new(1, "GC1", "A", 48.0, 2.0),
        MapGeocache::new(2, "GC2", "B", 48.1, 2.1),
    ]
}

/// One live widget per context key
#[test]
fn test_open_reuses_live_widget() {
    let h = harness();
    let zone = MapContext::zone(3, "Forest");

    let first = h.factory.open(&zone);
    let again = h.factory.open(&zone);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(first.title(), "Map - Forest");

    h.factory.open(&MapContext::general());
    assert_eq!(h.factory.open_count(), 2);
    assert_eq!(
        h.factory.instance_ids(),
        vec!["geoapp-map-general".to_string(), "geoapp-map-zone-3".to_string()]
    );
}

#[test]
fn test_state_machine() {
    let h = harness();
    let widget = h.factory.open(&MapContext::zone(1, "Z"));
    assert_eq!(widget.state(), WidgetState::Uninitialized);
    assert!(matches!(widget.load(pair()), Err(MapError::NotReady(_))));

    widget.attach().unwrap();
    assert_eq!(widget.state(), WidgetState::Attached);
    assert!(widget.is_ready());
    assert!(matches!(widget.attach(), Err(MapError::InvalidState(_))));

    assert_eq!(widget.load(pair()).unwrap(), 2);
    assert_eq!(widget.state(), WidgetState::Loaded);

    widget.dispose().unwrap();
    assert_eq!(widget.state(), WidgetState::Disposed);
    assert!(matches!(widget.load(pair()), Err(MapError::InvalidState(_))));
    assert!(matches!(widget.dispose(), Err(MapError::InvalidState(_))));
}

/// Delivery waits for a host that attaches later instead of a fixed delay
#[tokio::test(start_paused = true)]
async fn test_deliver_waits_for_attach() {
    let h = harness();
    let zone = MapContext::zone(7, "Late");
    let widget = h.factory.open(&zone);

    let host = {
        let widget = widget.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            widget.attach()
        })
    };

    assert_eq!(h.factory.deliver(&zone, pair()).await.unwrap(), 2);
    host.await.unwrap().unwrap();
    assert_eq!(h.port(&widget).feature_count(LayerKind::Geocaches), 2);
    assert_eq!(h.service.loaded_geocaches().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_deliver_times_out_without_attach() {
    let config = MapConfig {
        ready_timeout_ms: 50,
        ..MapConfig::default()
    };
    let h = harness_with(config);
    let zone = MapContext::zone(8, "Never");

    let err = h.factory.deliver(&zone, pair()).await.unwrap_err();
    assert!(matches!(err, MapError::NotReady(_)));
    assert!(h.service.loaded_geocaches().is_empty());
}

/// A response that arrives after a newer request is discarded
#[tokio::test(start_paused = true)]
async fn test_stale_response_is_discarded() {
    let h = harness();
    let widget = h.attached(&MapContext::zone(1, "Z"));
    let source = SlowFirstSource::default();

    let (first, second) = tokio::join!(
        widget.load_from_source(&source),
        widget.load_from_source(&source)
    );
    assert_eq!(first, LoadOutcome::Stale);
    assert_eq!(second, LoadOutcome::Loaded(1));
    assert!(!widget.is_loading());

    let shown = widget.with_layers(|layers| layers.geocache(2).is_some() && layers.geocache(1).is_none());
    assert!(shown);
    assert_eq!(h.service.loaded_geocaches()[0].id, 2);
}

#[tokio::test]
async fn test_failed_load_notifies_user() {
    let h = harness();
    let widget = h.attached(&MapContext::zone(1, "Z"));

    let outcome = widget.load_from_source(&FailingSource).await;
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    assert!(!widget.is_loading());
    assert_eq!(
        h.notifier.notices(),
        vec![(
            NoticeLevel::Error,
            "Unable to load geocaches for this map".to_string()
        )]
    );
}

#[tokio::test]
async fn test_refresh_all_loads_every_widget() {
    let h = harness();
    h.attached(&MapContext::zone(1, "One"));
    h.attached(&MapContext::zone(2, "Two"));

    let mut outcomes = h.factory.refresh_all(&ZoneSource).await;
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        outcomes,
        vec![
            ("geoapp-map-zone-1".to_string(), LoadOutcome::Loaded(2)),
            ("geoapp-map-zone-2".to_string(), LoadOutcome::Loaded(2)),
        ]
    );
}

/// A click in one map selects in every map that shows the cache
#[test]
fn test_feature_click_selects_across_widgets() {
    let h = harness();
    let left = h.attached(&MapContext::zone(1, "Left"));
    let right = h.attached(&MapContext::zone(2, "Right"));
    left.load(pair()).unwrap();
    right
        .load(vec![
            MapGeocache::new(2, "GC2", "B", 48.1, 2.1),
            MapGeocache::new(3, "GC3", "C", 48.2, 2.2),
        ])
        .unwrap();

    let clicked = left.handle_feature_click("1").unwrap();
    assert_eq!(clicked.id, 1);
    assert_eq!(h.service.selected_geocache().map(|g| g.id), Some(1));
    assert_eq!(left.with_layers(|l| l.selected_geocache()), Some(1));
    assert_eq!(right.with_layers(|l| l.selected_geocache()), None);

    right.handle_feature_click("2");
    assert_eq!(left.with_layers(|l| l.selected_geocache()), Some(2));
    assert_eq!(right.with_layers(|l| l.selected_geocache()), Some(2));

    let selected: Vec<String> = h
        .port(&left)
        .features(LayerKind::Geocaches)
        .into_iter()
        .filter(|f| f.selected)
        .map(|f| f.id)
        .collect();
    assert_eq!(selected, vec!["2".to_string()]);

    assert!(left.handle_feature_click("waypoint_9").is_none());
    left.handle_background_click();
    assert!(h.service.selected_geocache().is_none());
    assert_eq!(right.with_layers(|l| l.selected_geocache()), None);
}

/// Selecting a cache another map lacks clears that map's highlight
#[test]
fn test_foreign_selection_clears_local_highlight() {
    let h = harness();
    let left = h.attached(&MapContext::zone(1, "Left"));
    let right = h.attached(&MapContext::zone(2, "Right"));
    left.load(pair()).unwrap();
    right
        .load(vec![MapGeocache::new(2, "GC2", "B", 48.1, 2.1)])
        .unwrap();

    right.handle_feature_click("2");
    assert_eq!(right.with_layers(|l| l.selected_geocache()), Some(2));

    left.handle_feature_click("1");
    assert_eq!(h.service.selected_geocache().map(|g| g.id), Some(1));
    assert_eq!(right.with_layers(|l| l.selected_geocache()), None);
    assert!(h
        .port(&right)
        .features(LayerKind::Geocaches)
        .iter()
        .all(|f| !f.selected));
}

/// The reported zoom drives clustering on the widget's port
#[test]
fn test_view_zoom_drives_clustering() {
    let config = MapConfig {
        clustering_enabled: true,
        ..MapConfig::default()
    };
    let h = harness_with(config);
    let widget = h.attached(&MapContext::general());
    widget
        .load(vec![
            MapGeocache::new(1, "GC1", "A", 48.8566, 2.3522),
            MapGeocache::new(2, "GC2", "B", 48.8570, 2.3530),
            MapGeocache::new(3, "GC3", "C", 45.75, 4.85),
        ])
        .unwrap();
    let port = h.port(&widget);

    widget.update_view(LatLng::new(47.0, 3.5), 10.0);
    assert_eq!(port.feature_count(LayerKind::Geocaches), 2);
    assert!(port
        .features(LayerKind::Geocaches)
        .iter()
        .any(|f| f.id == "cluster_1"));

    widget.update_view(LatLng::new(48.8566, 2.3522), 18.0);
    assert_eq!(port.feature_count(LayerKind::Geocaches), 3);
    assert_eq!(h.service.view_state().map(|v| v.zoom), Some(18.0));
}

/// Reloading after an empty load shows the whole list
#[test]
fn test_empty_then_full_load() {
    let h = harness();
    let widget = h.attached(&MapContext::general());
    assert_eq!(widget.load(Vec::new()).unwrap(), 0);
    assert_eq!(widget.load(pair()).unwrap(), 2);
    assert_eq!(h.port(&widget).feature_count(LayerKind::Geocaches), 2);
}

/// Attaching picks up state set before the widget existed
#[test]
fn test_attach_catches_up_with_service() {
    let h = harness();
    h.service.change_tile_provider("opentopomap");
    h.service
        .highlight_detected_coordinate(DetectedCoordinateHighlight::new(48.0, 2.0));

    let widget = h.attached(&MapContext::general());
    let port = h.port(&widget);
    assert_eq!(port.basemap().as_deref(), Some("opentopomap"));
    assert_eq!(port.feature_count(LayerKind::DetectedCoordinates), 1);

    h.service.change_tile_provider("no-such-provider");
    assert_eq!(port.basemap().as_deref(), Some("osm"));
}

/// Plugin events reach every attached map
#[test]
fn test_bridge_events_reach_widgets() {
    let h = harness();
    let widget = h.attached(&MapContext::geocache(5, "GC5"));
    let bridge = ExternalEventBridge::new(h.service.clone());
    let sender = bridge.sender();

    for (i, id) in ["a", "b", "c"].iter().enumerate() {
        sender.dispatch(
            HIGHLIGHT_COORDINATE_EVENT,
            json!({
                "coordinates": {"latitude": 48.0 + i as f64 * 0.01, "longitude": 2.0},
                "replaceExisting": false,
                "bruteForceId": id
            }),
        );
    }
    sender.dispatch(
        geoapp_map::input::REMOVE_BRUTE_FORCE_POINT_EVENT,
        json!({"bruteForceId": "b"}),
    );
    let stats = bridge.pump();
    assert_eq!(stats.applied, 4);

    let port = h.port(&widget);
    assert_eq!(port.feature_count(LayerKind::DetectedCoordinates), 2);
}

#[test]
fn test_add_waypoint_requires_target() {
    let h = harness();
    let widget = h.attached(&MapContext::geocache(5, "GC5"));
    let position = LatLng::new(48.8566, 2.3522);

    assert!(!widget.add_waypoint_at(position));
    assert_eq!(
        h.notifier.notices(),
        vec![(
            NoticeLevel::Warning,
            "Open a geocache first to add a waypoint from the map".to_string()
        )]
    );

    let sink = Arc::new(RecordingSink::default());
    widget.set_waypoint_sink(Some(sink.clone()));
    assert!(widget.add_waypoint_at(position));
    let waypoints = sink.waypoints.lock().unwrap();
    assert_eq!(waypoints.len(), 1);
    assert_eq!(waypoints[0].0, position);
    assert!(waypoints[0].1.starts_with("N 48°"));
}

/// Disposal releases the view but keeps shared state
#[test]
fn test_dispose_leaves_service_state() {
    let h = harness();
    let zone = MapContext::zone(1, "Z");
    let widget = h.attached(&zone);
    widget.load(pair()).unwrap();
    widget.handle_feature_click("2");
    let listeners = h.service.listener_count();

    widget.dispose().unwrap();
    assert!(h.port(&widget).is_detached());
    assert!(h.factory.get(widget.instance_id()).is_none());
    assert_eq!(h.factory.open_count(), 0);
    assert_eq!(h.service.listener_count(), listeners - 1);
    assert_eq!(h.service.loaded_geocaches().len(), 2);
    assert_eq!(h.service.selected_geocache().map(|g| g.id), Some(2));

    let reopened = h.factory.open(&zone);
    assert!(!Arc::ptr_eq(&widget, &reopened));
    assert_eq!(reopened.state(), WidgetState::Uninitialized);
}

#[test]
fn test_dispose_all() {
    let h = harness();
    let first = h.attached(&MapContext::zone(1, "One"));
    let second = h.attached(&MapContext::general());

    h.factory.dispose_all();
    assert_eq!(h.factory.open_count(), 0);
    assert_eq!(first.state(), WidgetState::Disposed);
    assert_eq!(second.state(), WidgetState::Disposed);
    assert_eq!(h.service.listener_count(), 0);
}
