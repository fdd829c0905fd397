//! Geocache records as the map sees them
//!
//! These mirror the backend JSON closely so they can be deserialized straight
//! from a REST response. Only the fields the map needs are kept.

use crate::{core::geo::LatLng, MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache category derived from the free-text type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    Traditional,
    Multi,
    Mystery,
    Letterbox,
    Wherigo,
    Earthcache,
    Virtual,
    Webcam,
    Event,
    Cito,
    Other,
}

impl CacheCategory {
    /// Lenient parse of backend type strings ("Traditional Cache", "Unknown Cache", ...)
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        if tag.contains("traditional") {
            Self::Traditional
        } else if tag.contains("multi") {
            Self::Multi
        } else if tag.contains("mystery") || tag.contains("unknown") || tag.contains("puzzle") {
            Self::Mystery
        } else if tag.contains("letterbox") {
            Self::Letterbox
        } else if tag.contains("wherigo") {
            Self::Wherigo
        } else if tag.contains("earth") {
            Self::Earthcache
        } else if tag.contains("virtual") {
            Self::Virtual
        } else if tag.contains("webcam") {
            Self::Webcam
        } else if tag.contains("cito") || tag.contains("trash") {
            Self::Cito
        } else if tag.contains("event") {
            Self::Event
        } else {
            Self::Other
        }
    }

    /// Whether the category has a physical container at its final location
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            Self::Traditional | Self::Multi | Self::Mystery | Self::Letterbox | Self::Wherigo
        )
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Traditional => "traditional",
            Self::Multi => "multi",
            Self::Mystery => "mystery",
            Self::Letterbox => "letterbox",
            Self::Wherigo => "wherigo",
            Self::Earthcache => "earthcache",
            Self::Virtual => "virtual",
            Self::Webcam => "webcam",
            Self::Event => "event",
            Self::Cito => "cito",
            Self::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Auxiliary coordinate attached to a geocache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: i64,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub lookup: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub waypoint_type: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Waypoint {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            prefix: None,
            lookup: None,
            name: None,
            waypoint_type: None,
            latitude: None,
            longitude: None,
            note: None,
        }
    }

    pub fn with_position(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Resolved position, `None` while the waypoint has no usable coordinates
    pub fn position(&self) -> Option<LatLng> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)).filter(LatLng::is_valid),
            _ => None,
        }
    }

    /// Label shown next to the marker
    pub fn display_name(&self) -> String {
        match (&self.prefix, &self.name) {
            (Some(prefix), Some(name)) => format!("{} - {}", prefix, name),
            (None, Some(name)) => name.clone(),
            (Some(prefix), None) => prefix.clone(),
            (None, None) => format!("Waypoint {}", self.id),
        }
    }
}

/// A geocache projected for display on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapGeocache {
    pub id: i64,
    pub gc_code: String,
    pub name: String,
    #[serde(default)]
    pub cache_type: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub difficulty: Option<f32>,
    #[serde(default)]
    pub terrain: Option<f32>,
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub is_corrected: bool,
    #[serde(default)]
    pub original_latitude: Option<f64>,
    #[serde(default)]
    pub original_longitude: Option<f64>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl MapGeocache {
    pub fn new(id: i64, gc_code: &str, name: &str, lat: f64, lng: f64) -> Self {
        Self {
            id,
            gc_code: gc_code.to_string(),
            name: name.to_string(),
            cache_type: "Traditional Cache".to_string(),
            latitude: lat,
            longitude: lng,
            difficulty: None,
            terrain: None,
            found: false,
            is_corrected: false,
            original_latitude: None,
            original_longitude: None,
            waypoints: Vec::new(),
        }
    }

    pub fn with_type(mut self, cache_type: &str) -> Self {
        self.cache_type = cache_type.to_string();
        self
    }

    /// Mark the current position as corrected, remembering the published one
    pub fn with_correction(mut self, original_lat: f64, original_lng: f64) -> Self {
        self.is_corrected = true;
        self.original_latitude = Some(original_lat);
        self.original_longitude = Some(original_lng);
        self
    }

    pub fn with_waypoint(mut self, waypoint: Waypoint) -> Self {
        self.waypoints.push(waypoint);
        self
    }

    /// Displayed position; the corrected one when a correction exists
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Published position of a corrected geocache
    pub fn original_position(&self) -> Option<LatLng> {
        if !self.is_corrected {
            return None;
        }
        match (self.original_latitude, self.original_longitude) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        }
    }

    pub fn category(&self) -> CacheCategory {
        CacheCategory::from_tag(&self.cache_type)
    }

    /// Checks the coordinate invariants of the record
    pub fn validate(&self) -> Result<()> {
        if !self.position().is_valid() {
            return Err(MapError::InvalidGeocache {
                id: self.id,
                reason: format!(
                    "coordinates out of range: ({}, {})",
                    self.latitude, self.longitude
                ),
            });
        }
        if self.is_corrected {
            match self.original_position() {
                Some(original) if original.is_valid() => {}
                Some(original) => {
                    return Err(MapError::InvalidGeocache {
                        id: self.id,
                        reason: format!(
                            "original coordinates out of range: ({}, {})",
                            original.lat, original.lng
                        ),
                    })
                }
                None => {
                    return Err(MapError::InvalidGeocache {
                        id: self.id,
                        reason: "corrected geocache without original coordinates".to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_tag() {
        assert_eq!(CacheCategory::from_tag("Traditional Cache"), CacheCategory::Traditional);
        assert_eq!(CacheCategory::from_tag("Multi-cache"), CacheCategory::Multi);
        assert_eq!(CacheCategory::from_tag("Unknown Cache"), CacheCategory::Mystery);
        assert_eq!(CacheCategory::from_tag("Mystery"), CacheCategory::Mystery);
        assert_eq!(CacheCategory::from_tag("Earthcache"), CacheCategory::Earthcache);
        assert_eq!(CacheCategory::from_tag("Mega-Event Cache"), CacheCategory::Event);
        assert_eq!(
            CacheCategory::from_tag("Cache In Trash Out Event"),
            CacheCategory::Cito
        );
        assert_eq!(CacheCategory::from_tag("Lab Cache"), CacheCategory::Other);
        assert!(CacheCategory::Wherigo.is_physical());
        assert!(!CacheCategory::Virtual.is_physical());
    }

    #[test]
    fn test_validate() {
        let ok = MapGeocache::new(1, "GC1", "Paris", 48.8566, 2.3522);
        assert!(ok.validate().is_ok());

        let out_of_range = MapGeocache::new(2, "GC2", "Nowhere", 95.0, 2.0);
        assert!(matches!(
            out_of_range.validate(),
            Err(MapError::InvalidGeocache { id: 2, .. })
        ));

        let mut half_corrected = MapGeocache::new(3, "GC3", "Puzzle", 45.0, 4.0);
        half_corrected.is_corrected = true;
        half_corrected.original_latitude = Some(45.1);
        assert!(half_corrected.validate().is_err());

        let corrected = MapGeocache::new(4, "GC4", "Puzzle", 45.0, 4.0).with_correction(45.1, 4.1);
        assert!(corrected.validate().is_ok());
        assert_eq!(corrected.original_position(), Some(LatLng::new(45.1, 4.1)));
    }

    #[test]
    fn test_waypoint_position() {
        let unresolved = Waypoint::new(7).with_name("Parking");
        assert!(unresolved.position().is_none());
        assert_eq!(unresolved.display_name(), "Parking");

        let resolved = Waypoint::new(8).with_position(48.0, 2.0);
        assert_eq!(resolved.position(), Some(LatLng::new(48.0, 2.0)));
        assert_eq!(resolved.display_name(), "Waypoint 8");

        let nan = Waypoint::new(9).with_position(f64::NAN, 2.0);
        assert!(nan.position().is_none());
    }

    #[test]
    fn test_deserialize_backend_payload() {
        let json = r#"{
            "id": 12,
            "gc_code": "GC12AB",
            "name": "Bridge",
            "cache_type": "Multi-cache",
            "latitude": 45.75,
            "longitude": 4.85,
            "difficulty": 2.5,
            "is_corrected": true,
            "original_latitude": 45.7,
            "original_longitude": 4.8,
            "waypoints": [
                {"id": 1, "prefix": "PK", "name": "Parking", "type": "Parking Area",
                 "latitude": 45.751, "longitude": 4.851},
                {"id": 2, "name": "Stage 2", "latitude": null, "longitude": null}
            ]
        }"#;
        let geocache: MapGeocache = serde_json::from_str(json).unwrap();

        assert_eq!(geocache.category(), CacheCategory::Multi);
        assert_eq!(geocache.difficulty, Some(2.5));
        assert!(!geocache.found);
        assert_eq!(geocache.waypoints.len(), 2);
        assert_eq!(geocache.waypoints[0].display_name(), "PK - Parking");
        assert_eq!(geocache.waypoints[0].waypoint_type.as_deref(), Some("Parking Area"));
        assert!(geocache.waypoints[1].position().is_none());
        assert!(geocache.validate().is_ok());
    }
}
