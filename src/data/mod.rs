pub mod context;
pub mod geocache;
pub mod highlight;
pub mod preview;

// Re-export the essential types
pub use context::{MapContext, MapViewState};
pub use geocache::{CacheCategory, MapGeocache, Waypoint};
pub use highlight::{format_degrees_minutes, DetectedCoordinateHighlight, HighlightMode};
pub use preview::{PreviewBounds, PreviewOverlay, PreviewShape, SearchCircle};
