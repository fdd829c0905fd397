//! Exclusion zones
//!
//! A new physical cache may not be placed within 161 m of an existing one.
//! The zone is drawn around the displayed (corrected) position; categories
//! whose final location is unknown until solved only get a zone once
//! corrected.

use crate::{
    core::{constants::EXCLUSION_ZONE_RADIUS_METERS, geo::LatLng},
    data::{CacheCategory, MapGeocache},
    layers::style::{category_color, SerializableColor},
};

const ALWAYS_COLOR: SerializableColor = SerializableColor::rgb(220, 20, 20);

/// cos(lat) never drops below this, which caps the radius near the poles
const MIN_COS_LAT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionRule {
    Always,
    WhenCorrected,
    Never,
}

pub fn rule_for(category: CacheCategory) -> ExclusionRule {
    match category {
        _ if !category.is_physical() => ExclusionRule::Never,
        CacheCategory::Traditional => ExclusionRule::Always,
        // Final location known only once solved
        _ => ExclusionRule::WhenCorrected,
    }
}

/// Web Mercator map units covering `radius_m` metres of ground at `lat`
pub fn mercator_radius(radius_m: f64, lat: f64) -> f64 {
    let cos = lat.to_radians().cos().abs().max(MIN_COS_LAT);
    radius_m / cos
}

/// Rendered exclusion radius at `lat`
pub fn render_radius(lat: f64) -> f64 {
    mercator_radius(EXCLUSION_ZONE_RADIUS_METERS, lat)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionZone {
    pub geocache_id: i64,
    pub center: LatLng,
    /// Ground radius in metres
    pub radius_m: f64,
    /// Radius in projected map units
    pub render_radius: f64,
    pub color: SerializableColor,
}

impl ExclusionZone {
    pub fn feature_id(&self) -> String {
        format!("zone_{}", self.geocache_id)
    }
}

/// The zone a geocache produces, if any
pub fn zone_for(geocache: &MapGeocache) -> Option<ExclusionZone> {
    let center = geocache.position();
    if !center.is_valid() {
        return None;
    }
    let category = geocache.category();
    let color = match rule_for(category) {
        ExclusionRule::Always => ALWAYS_COLOR,
        ExclusionRule::WhenCorrected if geocache.is_corrected => category_color(category),
        ExclusionRule::WhenCorrected | ExclusionRule::Never => return None,
    };
    Some(ExclusionZone {
        geocache_id: geocache.id,
        center,
        radius_m: EXCLUSION_ZONE_RADIUS_METERS,
        render_radius: render_radius(center.lat),
        color,
    })
}

pub fn zones_for(geocaches: &[MapGeocache]) -> Vec<ExclusionZone> {
    geocaches.iter().filter_map(zone_for).collect()
}

/// Two zone-producing caches closer than the exclusion radius
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionConflict {
    pub first: i64,
    pub second: i64,
    pub distance_m: f64,
}

/// Pairs of zones whose centres violate the minimum distance
pub fn find_conflicts(geocaches: &[MapGeocache]) -> Vec<ExclusionConflict> {
    let zones = zones_for(geocaches);
    // One degree of latitude is ~111 km; skip pairs clearly out of range
    let lat_window = EXCLUSION_ZONE_RADIUS_METERS / 111_000.0 * 1.5;

    let mut conflicts = Vec::new();
    for (i, a) in zones.iter().enumerate() {
        for b in &zones[i + 1..] {
            if (a.center.lat - b.center.lat).abs() > lat_window {
                continue;
            }
            let distance_m = a.center.distance_to(&b.center);
            if distance_m < EXCLUSION_ZONE_RADIUS_METERS {
                conflicts.push(ExclusionConflict {
                    first: a.geocache_id,
                    second: b.geocache_id,
                    distance_m,
                });
            }
        }
    }
    conflicts
}
