use geo::HaversineDistance;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::constants::TILE_SIZE;

/// Web Mercator projection constants
const EARTH_RADIUS: f64 = 6378137.0;
const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to another coordinate in meters
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        geo_types::Point::from(*self).haversine_distance(&geo_types::Point::from(*other))
    }

    /// Clamps latitude to the range Web Mercator can represent
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Converts to Web Mercator projection (EPSG:3857)
    ///
    /// Latitudes beyond the projection limit are clamped to it.
    pub fn to_mercator(&self) -> Point {
        let lat = Self::clamp_lat(self.lat);
        let x = self.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + lat.to_radians() / 2.0).tan().ln()) * EARTH_RADIUS;
        Point::new(x, y)
    }

    /// Creates LatLng from Web Mercator coordinates
    pub fn from_mercator(point: Point) -> Self {
        let lng = (point.x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Self::new(lat, lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<LatLng> for geo_types::Point<f64> {
    fn from(value: LatLng) -> Self {
        geo_types::Point::new(value.lng, value.lat)
    }
}

/// Projects a WGS84 coordinate into the render space of the map (EPSG:3857 meters).
pub fn lon_lat_to_map_coordinate(position: LatLng) -> Point {
    position.to_mercator()
}

/// Inverse of [`lon_lat_to_map_coordinate`].
pub fn map_coordinate_to_lon_lat(point: Point) -> LatLng {
    LatLng::from_mercator(point)
}

/// Absolute pixel position of a coordinate in the world bitmap at `zoom`.
///
/// The origin is the north-west corner of the world, y grows southwards.
pub fn world_pixel(position: LatLng, zoom: f64) -> Point {
    let size = TILE_SIZE as f64 * 2_f64.powf(zoom);
    let lat_rad = LatLng::clamp_lat(position.lat).to_radians();
    let x = (position.lng + 180.0) / 360.0 * size;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * size;
    Point::new(x, y)
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Smallest bounds containing every point, `None` for an empty slice
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Creates a tile coordinate from a LatLng and zoom level
    pub fn from_lat_lng(lat_lng: &LatLng, zoom: u8) -> Self {
        let pixel = world_pixel(*lat_lng, zoom as f64);
        let max = 2_u32.pow(zoom as u32).saturating_sub(1);
        let x = ((pixel.x / TILE_SIZE as f64).floor() as u32).min(max);
        let y = ((pixel.y / TILE_SIZE as f64).floor() as u32).min(max);
        Self::new(x, y, zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(48.8566, 2.3522);
        assert_eq!(coord.lat, 48.8566);
        assert_eq!(coord.lng, 2.3522);
        assert!(coord.is_valid());
        assert!(!LatLng::new(f64::NAN, 2.0).is_valid());
        assert!(!LatLng::new(91.0, 2.0).is_valid());
        assert!(!LatLng::new(10.0, -180.5).is_valid());
    }

    #[test]
    fn test_lat_lng_distance() {
        let paris = LatLng::new(48.8566, 2.3522);
        let lyon = LatLng::new(45.75, 4.85);
        let distance = paris.distance_to(&lyon);

        // Roughly 392 km
        assert!((distance - 392_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_mercator_round_trip() {
        for lat in (-80..=80).step_by(5) {
            for lng in (-180..=180).step_by(15) {
                let original = LatLng::new(lat as f64 + 0.123, lng as f64);
                let back = map_coordinate_to_lon_lat(lon_lat_to_map_coordinate(original));
                assert!((back.lat - original.lat).abs() < 1e-9, "lat {:?}", original);
                assert!((back.lng - original.lng).abs() < 1e-9, "lng {:?}", original);
            }
        }
    }

    #[test]
    fn test_mercator_clamps_poles() {
        for (lat, expected) in [(90.0, MAX_LATITUDE), (-90.0, -MAX_LATITUDE)] {
            let projected = lon_lat_to_map_coordinate(LatLng::new(lat, 0.0));
            assert!(projected.y.is_finite());
            let back = map_coordinate_to_lon_lat(projected);
            assert!((back.lat - expected).abs() < 1e-9, "lat {}", lat);
        }

        let edge = lon_lat_to_map_coordinate(LatLng::new(MAX_LATITUDE, 0.0));
        assert!((edge.y - 20037508.342789244).abs() < 1e-3);
    }

    #[test]
    fn test_mercator_antimeridian() {
        let east = lon_lat_to_map_coordinate(LatLng::new(10.0, 180.0));
        let west = lon_lat_to_map_coordinate(LatLng::new(10.0, -180.0));
        assert!((east.x + west.x).abs() < 1e-6);
        assert!((east.y - west.y).abs() < 1e-9);

        for lng in [180.0, -180.0, 179.999, -179.999] {
            let back = map_coordinate_to_lon_lat(lon_lat_to_map_coordinate(LatLng::new(-33.9, lng)));
            assert!((back.lng - lng).abs() < 1e-9, "lng {}", lng);
            assert!((back.lat + 33.9).abs() < 1e-9, "lng {}", lng);
        }
    }

    #[test]
    fn test_mercator_origin() {
        let origin = lon_lat_to_map_coordinate(LatLng::new(0.0, 0.0));
        assert!(origin.x.abs() < 1e-6);
        assert!(origin.y.abs() < 1e-6);

        let east = lon_lat_to_map_coordinate(LatLng::new(0.0, 180.0));
        assert!((east.x - 20037508.342789244).abs() < 1e-3);
    }

    #[test]
    fn test_world_pixel() {
        let center = world_pixel(LatLng::new(0.0, 0.0), 0.0);
        assert!((center.x - 128.0).abs() < 1e-9);
        assert!((center.y - 128.0).abs() < 1e-9);

        let nw = world_pixel(LatLng::new(85.0511287798, -180.0), 1.0);
        assert!(nw.x.abs() < 1e-9);
        assert!(nw.y.abs() < 1e-6);
    }

    #[test]
    fn test_tile_coord_from_lat_lng() {
        let tile = TileCoord::from_lat_lng(&LatLng::new(48.8566, 2.3522), 10);
        assert_eq!(tile, TileCoord::new(518, 352, 10));

        let corner = TileCoord::from_lat_lng(&LatLng::new(-90.0, 180.0), 2);
        assert_eq!(corner, TileCoord::new(3, 3, 2));
    }

    #[test]
    fn test_bounds_from_points() {
        assert!(LatLngBounds::from_points(&[]).is_none());

        let bounds = LatLngBounds::from_points(&[
            LatLng::new(45.75, 4.85),
            LatLng::new(48.8566, 2.3522),
        ])
        .unwrap();
        assert_eq!(bounds.south_west, LatLng::new(45.75, 2.3522));
        assert_eq!(bounds.north_east, LatLng::new(48.8566, 4.85));
        assert!(bounds.contains(&LatLng::new(47.0, 3.0)));
        assert!(!bounds.contains(&LatLng::new(44.0, 3.0)));
    }
}
