pub mod config;
pub mod constants;
pub mod geo;

pub use config::{ClusteringProfile, MapConfig};
pub use geo::{
    lon_lat_to_map_coordinate, map_coordinate_to_lon_lat, world_pixel, LatLng, LatLngBounds,
    Point, TileCoord,
};
