use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// How a new highlight combines with the ones already shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMode {
    /// Drop previous highlights, show only the new one
    Replace,
    /// Keep previous highlights (brute force candidates)
    Accumulate,
}

/// Candidate coordinate surfaced by a plugin, shown until cleared or replaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedCoordinateHighlight {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub formatted: String,
    #[serde(default)]
    pub plugin_name: Option<String>,
    #[serde(default)]
    pub auto_saved: bool,
    #[serde(default)]
    pub gc_code: Option<String>,
    #[serde(default)]
    pub geocache_id: Option<i64>,
    /// `None` is treated as `Some(true)`
    #[serde(default)]
    pub replace_existing: Option<bool>,
    #[serde(default)]
    pub waypoint_title: Option<String>,
    #[serde(default)]
    pub waypoint_note: Option<String>,
    #[serde(default)]
    pub source_result_text: Option<String>,
    #[serde(default)]
    pub brute_force_id: Option<String>,
}

impl DetectedCoordinateHighlight {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            formatted: format_degrees_minutes(LatLng::new(latitude, longitude)),
            plugin_name: None,
            auto_saved: false,
            gc_code: None,
            geocache_id: None,
            replace_existing: None,
            waypoint_title: None,
            waypoint_note: None,
            source_result_text: None,
            brute_force_id: None,
        }
    }

    pub fn with_plugin(mut self, plugin_name: &str) -> Self {
        self.plugin_name = Some(plugin_name.to_string());
        self
    }

    /// Accumulating highlight identified by a brute force candidate id
    pub fn brute_force(mut self, id: &str) -> Self {
        self.brute_force_id = Some(id.to_string());
        self.replace_existing = Some(false);
        self
    }

    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = Some(replace);
        self
    }

    pub fn mode(&self) -> HighlightMode {
        match self.replace_existing {
            Some(false) => HighlightMode::Accumulate,
            Some(true) | None => HighlightMode::Replace,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        self.position().is_valid()
    }
}

/// Geocaching notation, e.g. `N 48° 51.396 E 002° 21.132`
pub fn format_degrees_minutes(position: LatLng) -> String {
    fn split(value: f64) -> (u32, f64) {
        let abs = value.abs();
        let degrees = abs.trunc();
        let mut minutes = (abs - degrees) * 60.0;
        let mut degrees = degrees as u32;
        // 59.9996 rounds to 60.000 in the output
        if (minutes * 1000.0).round() >= 60_000.0 {
            minutes = 0.0;
            degrees += 1;
        }
        (degrees, minutes)
    }

    let (lat_deg, lat_min) = split(position.lat);
    let (lng_deg, lng_min) = split(position.lng);
    let ns = if position.lat < 0.0 { 'S' } else { 'N' };
    let ew = if position.lng < 0.0 { 'W' } else { 'E' };
    format!(
        "{} {:02}° {:06.3} {} {:03}° {:06.3}",
        ns, lat_deg, lat_min, ew, lng_deg, lng_min
    )
}
