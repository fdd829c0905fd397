use crate::{
    core::{
        constants::{DEFAULT_CLUSTER_DISTANCE_PX, DEFAULT_DISABLE_CLUSTERING_AT_ZOOM},
        geo::{LatLng, Point},
    },
    prelude::HashSet,
    spatial::index::{SpatialIndex, SpatialItem},
};
use serde::{Deserialize, Serialize};

/// Represents a group of nearby point features
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    /// Identifier derived from the first member, stable while membership is
    pub id: String,
    /// Mean position of the members
    pub center: LatLng,
    /// Mean world-pixel position at the zoom the cluster was built for
    pub pixel_center: Point,
    /// Items in this cluster
    pub items: Vec<SpatialItem<T>>,
    /// Zoom level at which this cluster was created
    pub zoom_level: f64,
}

impl<T> Cluster<T> {
    fn from_items(items: Vec<SpatialItem<T>>, zoom_level: f64) -> Self {
        let count = items.len().max(1) as f64;
        let (lat, lng, x, y) = items.iter().fold((0.0, 0.0, 0.0, 0.0), |acc, item| {
            (
                acc.0 + item.lat_lng.lat,
                acc.1 + item.lat_lng.lng,
                acc.2 + item.pixel.x,
                acc.3 + item.pixel.y,
            )
        });
        let id = match items.first() {
            Some(first) if items.len() == 1 => first.id.clone(),
            Some(first) => format!("cluster_{}", first.id),
            None => "cluster_empty".to_string(),
        };

        Self {
            id,
            center: LatLng::new(lat / count, lng / count),
            pixel_center: Point::new(x / count, y / count),
            items,
            zoom_level,
        }
    }

    /// Get the number of items in the cluster
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Check if this is a single-item cluster
    pub fn is_single(&self) -> bool {
        self.items.len() == 1
    }

    pub fn member_ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }
}

/// Configuration for clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Distance in pixels within which features are grouped
    pub distance_px: f64,
    /// Clusters whose centers end up closer than this are merged
    pub min_distance_px: f64,
    /// Scale the distance with the zoom level
    pub adaptive: bool,
    /// Zoom level from which every feature is its own cluster
    pub disable_at_zoom: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            distance_px: DEFAULT_CLUSTER_DISTANCE_PX,
            min_distance_px: 0.0,
            adaptive: true,
            disable_at_zoom: DEFAULT_DISABLE_CLUSTERING_AT_ZOOM,
        }
    }
}

impl ClusteringConfig {
    /// Grouping distance to use at `zoom`
    pub fn effective_distance(&self, zoom: f64) -> f64 {
        if !self.adaptive {
            return self.distance_px;
        }
        let factor = if zoom <= 8.0 {
            1.5
        } else if zoom <= 12.0 {
            1.125
        } else if zoom <= 15.0 {
            0.75
        } else {
            0.5
        };
        self.distance_px * factor
    }

    pub fn is_disabled_at(&self, zoom: f64) -> bool {
        zoom >= self.disable_at_zoom
    }
}

/// Distance based point clustering
pub struct Clustering<T> {
    config: ClusteringConfig,
    items: Vec<(String, LatLng, T)>,
    /// Result of the last computation, keyed by zoom
    cached: Option<(f64, Vec<Cluster<T>>)>,
}

impl<T: Clone> Clustering<T> {
    /// Create a new clustering instance
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
            cached: None,
        }
    }

    /// Add an item to the clustering system
    pub fn add_item(&mut self, id: String, position: LatLng, data: T) {
        self.items.push((id, position, data));
        self.invalidate_cache();
    }

    /// Replace every item at once
    pub fn set_items<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (String, LatLng, T)>,
    {
        self.items = items.into_iter().collect();
        self.invalidate_cache();
    }

    /// Clear all items
    pub fn clear(&mut self) {
        self.items.clear();
        self.invalidate_cache();
    }

    fn invalidate_cache(&mut self) {
        self.cached = None;
    }

    /// Group items for the given zoom level, reusing the previous result when possible
    pub fn get_clusters(&mut self, zoom_level: f64) -> Vec<Cluster<T>> {
        if let Some((last_zoom, clusters)) = &self.cached {
            if (last_zoom - zoom_level).abs() < 0.01 {
                return clusters.clone();
            }
        }

        let clusters = if self.config.is_disabled_at(zoom_level) {
            self.singletons(zoom_level)
        } else {
            let distance = self.config.effective_distance(zoom_level);
            let grouped = Self::group(self.spatial_items(zoom_level), distance, zoom_level);
            Self::merge_close(grouped, self.config.min_distance_px, zoom_level)
        };

        self.cached = Some((zoom_level, clusters.clone()));
        clusters
    }

    /// Every item as its own cluster
    pub fn singletons(&self, zoom_level: f64) -> Vec<Cluster<T>> {
        self.spatial_items(zoom_level)
            .into_iter()
            .map(|item| Cluster::from_items(vec![item], zoom_level))
            .collect()
    }

    fn spatial_items(&self, zoom_level: f64) -> Vec<SpatialItem<T>> {
        self.items
            .iter()
            .enumerate()
            .map(|(order, (id, position, data))| {
                SpatialItem::new(id.clone(), order, *position, zoom_level, data.clone())
            })
            .collect()
    }

    /// Greedy pass in insertion order: every unclaimed item claims its unclaimed
    /// neighbours within `distance` pixels.
    fn group(items: Vec<SpatialItem<T>>, distance: f64, zoom_level: f64) -> Vec<Cluster<T>> {
        let index = SpatialIndex::bulk_load(items.clone());
        let mut claimed: HashSet<usize> = HashSet::default();
        let mut clusters = Vec::new();

        for item in &items {
            if claimed.contains(&item.order) {
                continue;
            }
            let members: Vec<SpatialItem<T>> = index
                .query_extent(&item.pixel, distance)
                .into_iter()
                .filter(|neighbour| !claimed.contains(&neighbour.order))
                .cloned()
                .collect();
            for member in &members {
                claimed.insert(member.order);
            }
            clusters.push(Cluster::from_items(members, zoom_level));
        }

        clusters
    }

    fn merge_close(
        clusters: Vec<Cluster<T>>,
        min_distance: f64,
        zoom_level: f64,
    ) -> Vec<Cluster<T>> {
        if min_distance <= 0.0 {
            return clusters;
        }

        let mut merged: Vec<Cluster<T>> = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            match merged
                .iter_mut()
                .find(|existing| existing.pixel_center.distance_to(&cluster.pixel_center) < min_distance)
            {
                Some(existing) => {
                    let mut items = std::mem::take(&mut existing.items);
                    items.extend(cluster.items);
                    items.sort_by_key(|item| item.order);
                    *existing = Cluster::from_items(items, zoom_level);
                }
                None => merged.push(cluster),
            }
        }
        merged
    }

    /// Get the number of items in the clustering system
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the clustering system is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> Default for Clustering<T> {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris_cluster() -> Clustering<i64> {
        let mut clustering = Clustering::default();
        clustering.add_item("1".to_string(), LatLng::new(48.8566, 2.3522), 1);
        clustering.add_item("2".to_string(), LatLng::new(48.8570, 2.3530), 2);
        clustering.add_item("3".to_string(), LatLng::new(45.75, 4.85), 3);
        clustering
    }

    #[test]
    fn test_effective_distance() {
        let config = ClusteringConfig::default();
        assert_eq!(config.effective_distance(5.0), 60.0);
        assert_eq!(config.effective_distance(10.0), 45.0);
        assert_eq!(config.effective_distance(14.0), 30.0);
        assert_eq!(config.effective_distance(16.0), 20.0);

        let fixed = ClusteringConfig {
            adaptive: false,
            ..ClusteringConfig::default()
        };
        assert_eq!(fixed.effective_distance(5.0), 40.0);
        assert_eq!(fixed.effective_distance(16.0), 40.0);
    }

    #[test]
    fn test_nearby_items_grouped_at_low_zoom() {
        let mut clustering = paris_cluster();
        let clusters = clustering.get_clusters(8.0);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count(), 2);
        assert_eq!(clusters[0].id, "cluster_1");
        assert_eq!(clusters[0].member_ids(), vec!["1", "2"]);
        assert!(clusters[1].is_single());
        assert_eq!(clusters[1].id, "3");
    }

    #[test]
    fn test_disabled_at_high_zoom() {
        let mut clustering = paris_cluster();
        let clusters = clustering.get_clusters(17.0);
        assert_eq!(clusters.len(), 3);
        assert!(clusters.iter().all(|c| c.is_single()));
    }

    #[test]
    fn test_cache_invalidated_on_change() {
        let mut clustering = paris_cluster();
        assert_eq!(clustering.get_clusters(8.0).len(), 2);

        clustering.set_items(vec![
            ("1".to_string(), LatLng::new(48.8566, 2.3522), 1),
            ("2".to_string(), LatLng::new(48.8570, 2.3530), 2),
        ]);
        assert_eq!(clustering.len(), 2);
        assert_eq!(clustering.get_clusters(8.0).len(), 1);

        clustering.clear();
        assert!(clustering.is_empty());
        assert!(clustering.get_clusters(8.0).is_empty());
    }

    #[test]
    fn test_every_item_in_exactly_one_cluster() {
        let mut clustering = Clustering::default();
        for i in 0..50 {
            let lat = 48.0 + (i % 7) as f64 * 0.01;
            let lng = 2.0 + (i / 7) as f64 * 0.01;
            clustering.add_item(i.to_string(), LatLng::new(lat, lng), i);
        }

        for zoom in [3.0, 9.0, 12.0, 14.0, 16.0] {
            let clusters = clustering.get_clusters(zoom);
            let total: usize = clusters.iter().map(|c| c.count()).sum();
            assert_eq!(total, 50, "zoom {}", zoom);
        }
    }

    #[test]
    fn test_min_distance_merges_clusters() {
        let config = ClusteringConfig {
            distance_px: 10.0,
            min_distance_px: 100.0,
            adaptive: false,
            disable_at_zoom: 20.0,
        };
        let mut clustering = Clustering::new(config);
        clustering.add_item("a".to_string(), LatLng::new(0.0, 0.0), ());
        clustering.add_item("b".to_string(), LatLng::new(0.0, 0.05), ());

        // ~36 px apart at zoom 10: separate groups, merged by min distance
        let clusters = clustering.get_clusters(10.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 2);
    }
}
