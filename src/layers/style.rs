//! Plain-data feature styles
//!
//! The render port maps these onto whatever the engine understands. Keeping
//! them as serializable values lets the manager diff features by equality.

use crate::data::{CacheCategory, MapGeocache};
use serde::{Deserialize, Serialize};

/// Serializable color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// `#rrggbb`, alpha is dropped
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const WHITE: SerializableColor = SerializableColor::rgb(255, 255, 255);
pub const SELECTED: SerializableColor = SerializableColor::rgb(255, 204, 0);
pub const FOUND: SerializableColor = SerializableColor::rgb(120, 120, 120);
pub const WAYPOINT: SerializableColor = SerializableColor::rgb(52, 152, 219);
pub const ORIGINAL_POSITION: SerializableColor = SerializableColor::rgb(149, 165, 166);
pub const DETECTED: SerializableColor = SerializableColor::rgb(231, 76, 60);
pub const PREVIEW: SerializableColor = SerializableColor::rgb(155, 89, 182);

/// Style for point features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    pub fill_color: SerializableColor,
    pub stroke_color: SerializableColor,
    pub stroke_width: f32,
    /// Radius in screen pixels
    pub radius: f32,
    pub opacity: f32,
    /// Icon name from the geocache sprite set
    pub icon: Option<String>,
    pub label: Option<String>,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            fill_color: SerializableColor::rgb(255, 0, 0),
            stroke_color: WHITE,
            stroke_width: 2.0,
            radius: 6.0,
            opacity: 1.0,
            icon: None,
            label: None,
        }
    }
}

/// Style for line features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: SerializableColor,
    pub width: f32,
    pub opacity: f32,
    /// Line dash pattern (empty for solid line)
    pub dash_pattern: Vec<f32>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::rgb(0, 0, 255),
            width: 2.0,
            opacity: 1.0,
            dash_pattern: Vec::new(),
        }
    }
}

/// Style for filled areas: circles and polygons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaStyle {
    pub fill_color: SerializableColor,
    pub stroke_color: SerializableColor,
    pub stroke_width: f32,
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
}

impl Default for AreaStyle {
    fn default() -> Self {
        Self {
            fill_color: SerializableColor::new(0, 255, 0, 100),
            stroke_color: SerializableColor::rgb(0, 200, 0),
            stroke_width: 2.0,
            fill_opacity: 0.4,
            stroke_opacity: 1.0,
        }
    }
}

/// Combined style for all feature types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureStyle {
    Point(PointStyle),
    Line(LineStyle),
    Area(AreaStyle),
}

pub fn category_color(category: CacheCategory) -> SerializableColor {
    match category {
        CacheCategory::Traditional => SerializableColor::rgb(2, 135, 78),
        CacheCategory::Multi => SerializableColor::rgb(230, 126, 34),
        CacheCategory::Mystery => SerializableColor::rgb(41, 98, 255),
        CacheCategory::Letterbox => SerializableColor::rgb(30, 61, 138),
        CacheCategory::Wherigo => SerializableColor::rgb(0, 150, 200),
        CacheCategory::Earthcache => SerializableColor::rgb(139, 90, 43),
        CacheCategory::Virtual => SerializableColor::rgb(0, 170, 170),
        CacheCategory::Webcam => SerializableColor::rgb(90, 90, 90),
        CacheCategory::Event | CacheCategory::Cito => SerializableColor::rgb(200, 30, 120),
        CacheCategory::Other => SerializableColor::rgb(127, 127, 127),
    }
}

pub fn icon_name(category: CacheCategory) -> &'static str {
    match category {
        CacheCategory::Traditional => "traditional",
        CacheCategory::Multi => "multi",
        CacheCategory::Mystery => "mystery",
        CacheCategory::Letterbox => "letterbox",
        CacheCategory::Wherigo => "wherigo",
        CacheCategory::Earthcache => "earth",
        CacheCategory::Virtual => "virtual",
        CacheCategory::Webcam => "webcam",
        CacheCategory::Event => "event",
        CacheCategory::Cito => "cito",
        CacheCategory::Other => "traditional",
    }
}

pub fn geocache_style(geocache: &MapGeocache, selected: bool) -> FeatureStyle {
    let category = geocache.category();
    let fill_color = if geocache.found {
        FOUND
    } else {
        category_color(category)
    };
    FeatureStyle::Point(PointStyle {
        fill_color,
        stroke_color: if selected { SELECTED } else { WHITE },
        stroke_width: if selected { 4.0 } else { 2.0 },
        radius: if selected { 10.0 } else { 7.0 },
        icon: Some(icon_name(category).to_string()),
        label: selected.then(|| geocache.gc_code.clone()),
        ..PointStyle::default()
    })
}

pub fn waypoint_style() -> FeatureStyle {
    FeatureStyle::Point(PointStyle {
        fill_color: WAYPOINT,
        radius: 5.0,
        ..PointStyle::default()
    })
}

pub fn original_position_style() -> FeatureStyle {
    FeatureStyle::Point(PointStyle {
        fill_color: ORIGINAL_POSITION,
        radius: 5.0,
        opacity: 0.7,
        ..PointStyle::default()
    })
}

pub fn nearby_style(geocache: &MapGeocache) -> FeatureStyle {
    FeatureStyle::Point(PointStyle {
        fill_color: category_color(geocache.category()),
        radius: 5.0,
        opacity: 0.6,
        icon: Some(icon_name(geocache.category()).to_string()),
        ..PointStyle::default()
    })
}

pub fn detected_style(label: &str) -> FeatureStyle {
    FeatureStyle::Point(PointStyle {
        fill_color: DETECTED,
        stroke_color: WHITE,
        stroke_width: 3.0,
        radius: 8.0,
        label: Some(label.to_string()),
        ..PointStyle::default()
    })
}

pub fn exclusion_zone_style(color: SerializableColor) -> FeatureStyle {
    FeatureStyle::Area(AreaStyle {
        fill_color: color,
        stroke_color: color,
        stroke_width: 1.5,
        fill_opacity: 0.15,
        stroke_opacity: 0.8,
    })
}

/// Bubble for a cluster, grows with the member count
pub fn cluster_style(count: usize) -> FeatureStyle {
    let (color, radius) = match count {
        0..=9 => (SerializableColor::rgb(110, 204, 57), 14.0),
        10..=99 => (SerializableColor::rgb(240, 194, 12), 18.0),
        _ => (SerializableColor::rgb(241, 128, 23), 22.0),
    };
    FeatureStyle::Point(PointStyle {
        fill_color: color.with_alpha(200),
        radius,
        label: Some(count.to_string()),
        ..PointStyle::default()
    })
}

pub fn preview_point_style() -> FeatureStyle {
    FeatureStyle::Point(PointStyle {
        fill_color: PREVIEW,
        radius: 6.0,
        ..PointStyle::default()
    })
}

pub fn preview_line_style() -> FeatureStyle {
    FeatureStyle::Line(LineStyle {
        color: PREVIEW,
        width: 2.0,
        opacity: 0.9,
        dash_pattern: vec![6.0, 4.0],
    })
}

pub fn preview_area_style() -> FeatureStyle {
    FeatureStyle::Area(AreaStyle {
        fill_color: PREVIEW,
        stroke_color: PREVIEW,
        stroke_width: 2.0,
        fill_opacity: 0.1,
        stroke_opacity: 0.9,
    })
}
