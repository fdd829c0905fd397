//! Inbound side of the loosely typed event channel other subsystems use
//!
//! Plugins broadcast `(name, json)` pairs. Producers hold an
//! [`ExternalEventSender`]; the owner of the bridge calls [`ExternalEventBridge::pump`]
//! from its event loop. Every payload is validated by [`ExternalEvent::parse`]
//! before it touches the [`MapService`]; malformed ones are logged and dropped.

use crate::{input::events::ExternalEvent, service::MapService};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_json::Value;
use std::sync::Arc;

/// Raw event as broadcast by a producer
#[derive(Debug, Clone)]
pub struct RawExternalEvent {
    pub name: String,
    pub detail: Value,
}

/// Cloneable producer handle
#[derive(Debug, Clone)]
pub struct ExternalEventSender {
    tx: Sender<RawExternalEvent>,
}

impl ExternalEventSender {
    /// Queue an event, returns false once the bridge is gone
    pub fn dispatch(&self, name: &str, detail: Value) -> bool {
        self.tx
            .send(RawExternalEvent {
                name: name.to_string(),
                detail,
            })
            .is_ok()
    }
}

/// Result of one [`ExternalEventBridge::pump`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub applied: usize,
    pub dropped: usize,
}

pub struct ExternalEventBridge {
    service: Arc<MapService>,
    tx: Sender<RawExternalEvent>,
    rx: Receiver<RawExternalEvent>,
}

impl ExternalEventBridge {
    pub fn new(service: Arc<MapService>) -> Self {
        let (tx, rx) = unbounded();
        Self { service, tx, rx }
    }

    pub fn sender(&self) -> ExternalEventSender {
        ExternalEventSender {
            tx: self.tx.clone(),
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Drain the inbox and apply everything that validates
    pub fn pump(&self) -> PumpStats {
        let mut stats = PumpStats::default();
        while let Ok(raw) = self.rx.try_recv() {
            if self.handle(&raw.name, &raw.detail) {
                stats.applied += 1;
            } else {
                stats.dropped += 1;
            }
        }
        if stats.applied + stats.dropped > 0 {
            log::debug!(
                "external events: {} applied, {} dropped",
                stats.applied,
                stats.dropped
            );
        }
        stats
    }

    /// Validate and apply one event synchronously
    pub fn handle(&self, name: &str, detail: &Value) -> bool {
        match ExternalEvent::parse(name, detail) {
            Ok(event) => {
                self.apply(event);
                true
            }
            Err(e) => {
                log::warn!("dropping external event: {}", e);
                false
            }
        }
    }

    fn apply(&self, event: ExternalEvent) {
        log::debug!("applying external event {}", event.name());
        match event {
            ExternalEvent::CoordinateDetected(highlight) => {
                self.service.highlight_detected_coordinate(highlight)
            }
            ExternalEvent::ClearHighlight => self.service.clear_highlighted_coordinate(),
            ExternalEvent::RemoveBruteForcePoint { brute_force_id } => {
                self.service.remove_brute_force_point(&brute_force_id);
            }
            ExternalEvent::FormulaPreview(overlay) => self.service.show_preview_overlay(overlay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::{
        EventKind, CLEAR_HIGHLIGHT_EVENT, FORMULA_PREVIEW_EVENT, HIGHLIGHT_COORDINATE_EVENT,
        REMOVE_BRUTE_FORCE_POINT_EVENT,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn coordinate(lat: f64, lng: f64, id: &str) -> Value {
        json!({
            "coordinates": {"latitude": lat, "longitude": lng},
            "replaceExisting": false,
            "bruteForceId": id
        })
    }

    #[test]
    fn test_pump_applies_in_order() {
        let service = Arc::new(MapService::default());
        let bridge = ExternalEventBridge::new(service.clone());
        let sender = bridge.sender();

        assert!(sender.dispatch(HIGHLIGHT_COORDINATE_EVENT, coordinate(48.0, 2.0, "a")));
        assert!(sender.dispatch(HIGHLIGHT_COORDINATE_EVENT, coordinate(48.1, 2.0, "b")));
        assert!(sender.dispatch(HIGHLIGHT_COORDINATE_EVENT, coordinate(48.2, 2.0, "c")));
        assert!(sender.dispatch(REMOVE_BRUTE_FORCE_POINT_EVENT, json!({"bruteForceId": "b"})));
        assert_eq!(bridge.pending(), 4);

        let stats = bridge.pump();
        assert_eq!(stats, PumpStats { applied: 4, dropped: 0 });
        let ids: Vec<_> = service
            .highlighted_coordinates()
            .into_iter()
            .filter_map(|h| h.brute_force_id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_malformed_event_changes_nothing() {
        let service = Arc::new(MapService::default());
        let bridge = ExternalEventBridge::new(service.clone());
        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        let _s = service.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let sender = bridge.sender();
        sender.dispatch(
            HIGHLIGHT_COORDINATE_EVENT,
            json!({"coordinates": {"latitude": "north", "longitude": 2.0}}),
        );
        sender.dispatch("geoapp-unknown", json!({}));

        assert_eq!(bridge.pump(), PumpStats { applied: 0, dropped: 2 });
        assert!(service.highlighted_coordinates().is_empty());
        assert_eq!(events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_and_preview() {
        let service = Arc::new(MapService::default());
        let bridge = ExternalEventBridge::new(service.clone());
        let previews = Arc::new(AtomicUsize::new(0));
        let counter = previews.clone();
        let _s = service.on(EventKind::PreviewChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bridge.handle(HIGHLIGHT_COORDINATE_EVENT, &coordinate(48.0, 2.0, "a")));
        assert!(bridge.handle(CLEAR_HIGHLIGHT_EVENT, &Value::Null));
        assert!(service.highlighted_coordinates().is_empty());

        assert!(bridge.handle(
            FORMULA_PREVIEW_EVENT,
            &json!({"shapes": [{"kind": "point", "latitude": 48.85, "longitude": 2.35}]})
        ));
        assert!(service.preview_overlay().is_some());
        assert!(bridge.handle(FORMULA_PREVIEW_EVENT, &Value::Null));
        assert!(service.preview_overlay().is_none());
        assert_eq!(previews.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sender_after_bridge_dropped() {
        let bridge = ExternalEventBridge::new(Arc::new(MapService::default()));
        let sender = bridge.sender();
        drop(bridge);
        assert!(!sender.dispatch(CLEAR_HIGHLIGHT_EVENT, Value::Null));
    }
}
