pub mod base;
pub mod exclusion;
pub mod feature;
pub mod manager;
pub mod source;
pub mod style;

pub use base::{LayerKind, LayerProperties};
pub use exclusion::{find_conflicts, render_radius, ExclusionConflict, ExclusionRule, ExclusionZone};
pub use feature::{Feature, FeatureChange, Geometry};
pub use manager::MapLayerManager;
pub use source::VectorSource;
pub use style::{FeatureStyle, SerializableColor};
