//! Engine-wide constants for the geocache map layer.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Community rule: no other physical container within this distance of a cache.
pub const EXCLUSION_ZONE_RADIUS_METERS: f64 = 161.0;

/// Instance id prefix shared by every map widget.
pub const MAP_INSTANCE_PREFIX: &str = "geoapp-map";

/// Instance id of the single general-purpose map.
pub const GENERAL_MAP_ID: &str = "geoapp-map-general";

/// Backend used when no preference is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Basemap used when no preference is configured or an unknown id is requested.
pub const DEFAULT_TILE_PROVIDER: &str = "osm";

/// How long a freshly opened widget may take to become attached.
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;

/// Clustering distance in pixels used when adaptive distance is disabled.
pub const DEFAULT_CLUSTER_DISTANCE_PX: f64 = 40.0;

/// Zoom level from which clustering yields one cluster per feature.
pub const DEFAULT_DISABLE_CLUSTERING_AT_ZOOM: f64 = 17.0;

/// Zoom assumed for clustering until the view reports one.
pub const DEFAULT_VIEW_ZOOM: f64 = 13.0;
