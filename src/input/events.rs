use crate::{
    core::geo::LatLng,
    data::{
        format_degrees_minutes, DetectedCoordinateHighlight, MapGeocache, MapViewState,
        PreviewOverlay,
    },
    MapError, Result,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Version of the external event schema accepted by [`ExternalEvent::parse`]
pub const EXTERNAL_SCHEMA_VERSION: u64 = 1;

pub const HIGHLIGHT_COORDINATE_EVENT: &str = "geoapp-map-highlight-coordinate";
pub const CLEAR_HIGHLIGHT_EVENT: &str = "geoapp-map-highlight-clear";
pub const REMOVE_BRUTE_FORCE_POINT_EVENT: &str = "geoapp-map-remove-brute-force-point";
pub const FORMULA_PREVIEW_EVENT: &str = "geoapp-formula-preview";

/// Events emitted by the map service to its listeners
#[derive(Debug, Clone, PartialEq)]
pub enum MapServiceEvent {
    /// The whole loaded set was replaced
    GeocachesLoaded(Arc<Vec<MapGeocache>>),
    GeocacheSelected(MapGeocache),
    GeocacheDeselected,
    TileProviderChanged(String),
    /// Full list of highlights after the change
    HighlightsChanged(Vec<DetectedCoordinateHighlight>),
    /// Single-highlight view of the same change, `None` once cleared
    LastHighlightChanged(Option<DetectedCoordinateHighlight>),
    ViewChanged(MapViewState),
    PreviewChanged(Option<PreviewOverlay>),
}

/// Discriminant of [`MapServiceEvent`], used to filter listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GeocachesLoaded,
    GeocacheSelected,
    GeocacheDeselected,
    TileProviderChanged,
    HighlightsChanged,
    LastHighlightChanged,
    ViewChanged,
    PreviewChanged,
}

impl MapServiceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::GeocachesLoaded(_) => EventKind::GeocachesLoaded,
            Self::GeocacheSelected(_) => EventKind::GeocacheSelected,
            Self::GeocacheDeselected => EventKind::GeocacheDeselected,
            Self::TileProviderChanged(_) => EventKind::TileProviderChanged,
            Self::HighlightsChanged(_) => EventKind::HighlightsChanged,
            Self::LastHighlightChanged(_) => EventKind::LastHighlightChanged,
            Self::ViewChanged(_) => EventKind::ViewChanged,
            Self::PreviewChanged(_) => EventKind::PreviewChanged,
        }
    }
}

/// Typed form of the loosely typed events other subsystems broadcast
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalEvent {
    CoordinateDetected(DetectedCoordinateHighlight),
    ClearHighlight,
    RemoveBruteForcePoint { brute_force_id: String },
    FormulaPreview(PreviewOverlay),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoordinateDetectedPayload {
    #[serde(default)]
    gc_code: Option<String>,
    #[serde(default)]
    geocache_id: Option<i64>,
    #[serde(default)]
    plugin_name: Option<String>,
    coordinates: RawCoordinates,
    #[serde(default)]
    auto_saved: Option<bool>,
    #[serde(default)]
    replace_existing: Option<bool>,
    #[serde(default)]
    waypoint_title: Option<String>,
    #[serde(default)]
    waypoint_note: Option<String>,
    #[serde(default)]
    source_result_text: Option<String>,
    #[serde(default)]
    brute_force_id: Option<IdValue>,
}

/// Coordinates are kept raw so non-numeric values can be reported precisely
#[derive(Debug, Deserialize)]
struct RawCoordinates {
    #[serde(default)]
    latitude: Value,
    #[serde(default)]
    longitude: Value,
    #[serde(default)]
    formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(i64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveBruteForcePayload {
    brute_force_id: IdValue,
}

fn malformed(name: &str, reason: impl Into<String>) -> MapError {
    MapError::MalformedEvent {
        event: name.to_string(),
        reason: reason.into(),
    }
}

fn finite_number(name: &str, field: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed(name, format!("{} must be a finite number, got {}", field, value)))
}

impl ExternalEvent {
    /// Validate a raw payload against the closed schema
    pub fn parse(name: &str, detail: &Value) -> Result<Self> {
        if let Some(version) = detail.get("version") {
            if version.as_u64() != Some(EXTERNAL_SCHEMA_VERSION) {
                return Err(malformed(name, format!("unsupported schema version {}", version)));
            }
        }

        match name {
            HIGHLIGHT_COORDINATE_EVENT => Self::parse_coordinate(name, detail),
            CLEAR_HIGHLIGHT_EVENT => Ok(Self::ClearHighlight),
            REMOVE_BRUTE_FORCE_POINT_EVENT => {
                let payload: RemoveBruteForcePayload = serde_json::from_value(detail.clone())
                    .map_err(|e| malformed(name, e.to_string()))?;
                Ok(Self::RemoveBruteForcePoint {
                    brute_force_id: payload.brute_force_id.into_string(),
                })
            }
            FORMULA_PREVIEW_EVENT => {
                let overlay = if detail.is_null() {
                    PreviewOverlay::default()
                } else {
                    serde_json::from_value::<PreviewOverlay>(detail.clone())
                        .map_err(|e| malformed(name, e.to_string()))?
                };
                overlay
                    .validate()
                    .map_err(|e| malformed(name, e.to_string()))?;
                Ok(Self::FormulaPreview(overlay))
            }
            other => Err(malformed(other, "unknown event name")),
        }
    }

    fn parse_coordinate(name: &str, detail: &Value) -> Result<Self> {
        let payload: CoordinateDetectedPayload =
            serde_json::from_value(detail.clone()).map_err(|e| malformed(name, e.to_string()))?;

        let latitude = finite_number(name, "latitude", &payload.coordinates.latitude)?;
        let longitude = finite_number(name, "longitude", &payload.coordinates.longitude)?;
        let position = LatLng::new(latitude, longitude);
        if !position.is_valid() {
            return Err(malformed(
                name,
                format!("coordinates out of range: ({}, {})", latitude, longitude),
            ));
        }

        let formatted = payload
            .coordinates
            .formatted
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| format_degrees_minutes(position));

        Ok(Self::CoordinateDetected(DetectedCoordinateHighlight {
            latitude,
            longitude,
            formatted,
            plugin_name: payload.plugin_name,
            auto_saved: payload.auto_saved.unwrap_or(false),
            gc_code: payload.gc_code,
            geocache_id: payload.geocache_id,
            replace_existing: payload.replace_existing,
            waypoint_title: payload.waypoint_title,
            waypoint_note: payload.waypoint_note,
            source_result_text: payload.source_result_text,
            brute_force_id: payload.brute_force_id.map(IdValue::into_string),
        }))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CoordinateDetected(_) => HIGHLIGHT_COORDINATE_EVENT,
            Self::ClearHighlight => CLEAR_HIGHLIGHT_EVENT,
            Self::RemoveBruteForcePoint { .. } => REMOVE_BRUTE_FORCE_POINT_EVENT,
            Self::FormulaPreview(_) => FORMULA_PREVIEW_EVENT,
        }
    }
}
