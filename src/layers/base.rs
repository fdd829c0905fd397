/// The vector layers every map instance owns, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    ExclusionZones,
    Preview,
    Nearby,
    Waypoints,
    Geocaches,
    DetectedCoordinates,
}

impl LayerKind {
    pub const ALL: [LayerKind; 6] = [
        LayerKind::ExclusionZones,
        LayerKind::Preview,
        LayerKind::Nearby,
        LayerKind::Waypoints,
        LayerKind::Geocaches,
        LayerKind::DetectedCoordinates,
    ];

    pub fn default_z_index(&self) -> i32 {
        match self {
            LayerKind::ExclusionZones => 10,
            LayerKind::Preview => 20,
            LayerKind::Nearby => 30,
            LayerKind::Waypoints => 40,
            LayerKind::Geocaches => 50,
            LayerKind::DetectedCoordinates => 60,
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::ExclusionZones => write!(f, "exclusion-zones"),
            LayerKind::Preview => write!(f, "preview"),
            LayerKind::Nearby => write!(f, "nearby"),
            LayerKind::Waypoints => write!(f, "waypoints"),
            LayerKind::Geocaches => write!(f, "geocaches"),
            LayerKind::DetectedCoordinates => write!(f, "detected-coordinates"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperties {
    pub id: String,
    pub kind: LayerKind,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
    pub interactive: bool,
}

impl LayerProperties {
    pub fn new(map_id: &str, kind: LayerKind) -> Self {
        Self {
            id: format!("{}-{}", map_id, kind),
            kind,
            z_index: kind.default_z_index(),
            opacity: 1.0,
            // Only geocache features answer clicks
            interactive: kind == LayerKind::Geocaches,
            visible: true,
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new("geoapp-map-zone-3", LayerKind::Geocaches);

        assert_eq!(props.id, "geoapp-map-zone-3-geocaches");
        assert_eq!(props.kind, LayerKind::Geocaches);
        assert_eq!(props.z_index, 50);
        assert_eq!(props.opacity, 1.0);
        assert!(props.visible);
        assert!(props.interactive);
        assert!(!LayerProperties::new("m", LayerKind::Waypoints).interactive);
    }

    #[test]
    fn test_opacity_clamped() {
        let mut props = LayerProperties::new("m", LayerKind::Preview);
        props.set_opacity(1.5);
        assert_eq!(props.opacity, 1.0);
        props.set_opacity(-0.5);
        assert_eq!(props.opacity, 0.0);
    }

    #[test]
    fn test_layer_kind_order() {
        let mut z: Vec<i32> = LayerKind::ALL.iter().map(|k| k.default_z_index()).collect();
        let sorted = {
            let mut s = z.clone();
            s.sort();
            s
        };
        assert_eq!(z, sorted);
        z.dedup();
        assert_eq!(z.len(), LayerKind::ALL.len());
        assert_eq!(LayerKind::DetectedCoordinates.to_string(), "detected-coordinates");
    }
}
