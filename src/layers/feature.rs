use crate::{core::geo::LatLng, layers::style::FeatureStyle, prelude::HashMap};
use serde::Serialize;

/// Feature geometry in geographic coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Geometry {
    Point(LatLng),
    /// Circle drawn in projected map units: `radius` is already corrected
    /// for Web Mercator scale at `center`
    Circle { center: LatLng, radius: f64 },
    LineString(Vec<LatLng>),
    /// Closed exterior ring
    Polygon(Vec<LatLng>),
}

impl Geometry {
    /// Representative point, used for hit testing and clustering
    pub fn anchor(&self) -> Option<LatLng> {
        match self {
            Geometry::Point(position) => Some(*position),
            Geometry::Circle { center, .. } => Some(*center),
            Geometry::LineString(points) | Geometry::Polygon(points) => points.first().copied(),
        }
    }
}

/// A keyed renderable record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub id: String,
    pub geometry: Geometry,
    pub style: FeatureStyle,
    pub properties: HashMap<String, serde_json::Value>,
    pub selected: bool,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: Geometry, style: FeatureStyle) -> Self {
        Self {
            id: id.into(),
            geometry,
            style,
            properties: HashMap::default(),
            selected: false,
        }
    }

    pub fn point(id: impl Into<String>, position: LatLng, style: FeatureStyle) -> Self {
        Self::new(id, Geometry::Point(position), style)
    }

    /// Add a property to this feature
    pub fn with_property<V: Into<serde_json::Value>>(mut self, key: &str, value: V) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn get_property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

/// One step of a change batch pushed to the render port
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeatureChange {
    Add(Feature),
    Update(Feature),
    Remove(String),
    /// Drop every feature of the layer
    Clear,
}

impl FeatureChange {
    pub fn feature_id(&self) -> Option<&str> {
        match self {
            FeatureChange::Add(feature) | FeatureChange::Update(feature) => Some(&feature.id),
            FeatureChange::Remove(id) => Some(id),
            FeatureChange::Clear => None,
        }
    }
}
