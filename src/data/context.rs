use crate::core::{
    constants::{GENERAL_MAP_ID, MAP_INSTANCE_PREFIX},
    geo::LatLng,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which logical map a widget shows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MapContext {
    Zone { id: i64, label: String },
    Geocache { id: i64, label: String },
    General { label: String },
}

impl MapContext {
    pub fn zone(id: i64, label: &str) -> Self {
        Self::Zone {
            id,
            label: label.to_string(),
        }
    }

    pub fn geocache(id: i64, label: &str) -> Self {
        Self::Geocache {
            id,
            label: label.to_string(),
        }
    }

    pub fn general() -> Self {
        Self::General {
            label: "Geocaches".to_string(),
        }
    }

    /// Stable key: one live widget per value
    pub fn instance_id(&self) -> String {
        match self {
            Self::Zone { id, .. } => format!("{}-zone-{}", MAP_INSTANCE_PREFIX, id),
            Self::Geocache { id, .. } => format!("{}-geocache-{}", MAP_INSTANCE_PREFIX, id),
            Self::General { .. } => GENERAL_MAP_ID.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Zone { label, .. } | Self::Geocache { label, .. } | Self::General { label } => {
                label
            }
        }
    }

    /// Tab title shown by the shell
    pub fn title(&self) -> String {
        match self {
            Self::Zone { label, .. } => format!("Map - {}", label),
            Self::Geocache { label, .. } => format!("Map - {}", label),
            Self::General { .. } => "Map".to_string(),
        }
    }
}

impl fmt::Display for MapContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instance_id())
    }
}

/// Current center and zoom of a map instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapViewState {
    pub center: LatLng,
    pub zoom: f64,
}

impl MapViewState {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

impl Default for MapViewState {
    fn default() -> Self {
        // Metropolitan France
        Self::new(LatLng::new(46.603354, 1.888334), 6.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_ids() {
        assert_eq!(MapContext::zone(3, "Lyon").instance_id(), "geoapp-map-zone-3");
        assert_eq!(
            MapContext::geocache(42, "GC42").instance_id(),
            "geoapp-map-geocache-42"
        );
        assert_eq!(MapContext::general().instance_id(), "geoapp-map-general");
        assert_eq!(
            MapContext::General { label: "Other".into() }.instance_id(),
            MapContext::general().instance_id()
        );
    }

    #[test]
    fn test_labels_and_titles() {
        let zone = MapContext::zone(3, "Lyon");
        assert_eq!(zone.label(), "Lyon");
        assert_eq!(zone.title(), "Map - Lyon");
        assert_eq!(MapContext::general().title(), "Map");
        assert_eq!(zone.to_string(), "geoapp-map-zone-3");
    }

    #[test]
    fn test_serde_tagging() {
        let context: MapContext =
            serde_json::from_str(r#"{"type": "zone", "id": 5, "label": "Alps"}"#).unwrap();
        assert_eq!(context, MapContext::zone(5, "Alps"));
    }
}
