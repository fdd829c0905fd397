use crate::{
    layers::{
        base::LayerKind,
        feature::{Feature, FeatureChange},
    },
    prelude::{HashMap, HashSet},
};

/// Keyed feature store for one layer
///
/// Mutators return the [`FeatureChange`]s they caused so the caller can push
/// them to the render port in one batch. Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct VectorSource {
    kind: LayerKind,
    features: HashMap<String, Feature>,
    order: Vec<String>,
}

impl VectorSource {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            features: HashMap::default(),
            order: Vec::new(),
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.features.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.order.iter().filter_map(|id| self.features.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Insert or replace; `None` when an identical feature is already present
    pub fn upsert(&mut self, feature: Feature) -> Option<FeatureChange> {
        match self.features.get(&feature.id) {
            Some(existing) if *existing == feature => None,
            Some(_) => {
                self.features.insert(feature.id.clone(), feature.clone());
                Some(FeatureChange::Update(feature))
            }
            None => {
                self.order.push(feature.id.clone());
                self.features.insert(feature.id.clone(), feature.clone());
                Some(FeatureChange::Add(feature))
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FeatureChange> {
        self.features.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(FeatureChange::Remove(id.to_string()))
    }

    /// `None` when the source was already empty
    pub fn clear(&mut self) -> Option<FeatureChange> {
        if self.features.is_empty() {
            return None;
        }
        self.features.clear();
        self.order.clear();
        Some(FeatureChange::Clear)
    }

    /// Make the source hold exactly `features`, touching only what differs
    ///
    /// The resulting content and order equal a clear followed by inserting
    /// `features`; later duplicates of an id win.
    pub fn replace_all(&mut self, features: Vec<Feature>) -> Vec<FeatureChange> {
        let incoming: HashSet<&str> = features.iter().map(|f| f.id.as_str()).collect();
        let stale: Vec<String> = self
            .order
            .iter()
            .filter(|id| !incoming.contains(id.as_str()))
            .cloned()
            .collect();

        let mut changes: Vec<FeatureChange> =
            stale.iter().filter_map(|id| self.remove(id)).collect();

        let mut order = Vec::with_capacity(features.len());
        for feature in features {
            if !order.contains(&feature.id) {
                order.push(feature.id.clone());
            }
            changes.extend(self.upsert(feature));
        }
        self.order = order;
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::geo::LatLng, layers::style::waypoint_style};

    fn feature(id: &str, lat: f64) -> Feature {
        Feature::point(id, LatLng::new(lat, 2.0), waypoint_style())
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut source = VectorSource::new(LayerKind::Waypoints);
        assert!(matches!(source.upsert(feature("a", 1.0)), Some(FeatureChange::Add(_))));
        assert!(source.upsert(feature("a", 1.0)).is_none());
        assert!(matches!(source.upsert(feature("a", 2.0)), Some(FeatureChange::Update(_))));
        assert_eq!(source.len(), 1);

        assert_eq!(source.remove("a"), Some(FeatureChange::Remove("a".into())));
        assert!(source.remove("a").is_none());
        assert!(source.clear().is_none());
    }

    #[test]
    fn test_replace_all_is_minimal() {
        let mut source = VectorSource::new(LayerKind::Geocaches);
        source.replace_all(vec![feature("1", 1.0), feature("2", 2.0), feature("3", 3.0)]);

        let changes = source.replace_all(vec![feature("3", 3.0), feature("2", 2.5), feature("4", 4.0)]);
        assert_eq!(changes.len(), 3);
        assert!(changes.contains(&FeatureChange::Remove("1".into())));
        assert!(changes
            .iter()
            .any(|c| matches!(c, FeatureChange::Update(f) if f.id == "2")));
        assert!(changes
            .iter()
            .any(|c| matches!(c, FeatureChange::Add(f) if f.id == "4")));

        assert_eq!(source.ids().collect::<Vec<_>>(), vec!["3", "2", "4"]);
    }

    #[test]
    fn test_replace_all_with_empty_then_list() {
        let mut source = VectorSource::new(LayerKind::Geocaches);
        source.replace_all(vec![feature("1", 1.0)]);
        source.replace_all(Vec::new());
        assert!(source.is_empty());
        source.replace_all(vec![feature("1", 1.0), feature("2", 2.0)]);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_last_wins() {
        let mut source = VectorSource::new(LayerKind::Geocaches);
        source.replace_all(vec![feature("1", 1.0), feature("1", 5.0)]);
        assert_eq!(source.len(), 1);
        assert_eq!(source.ids().count(), 1);
        assert_eq!(
            source.get("1").and_then(|f| f.geometry.anchor()).map(|p| p.lat),
            Some(5.0)
        );
    }
}
