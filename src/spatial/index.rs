use crate::core::geo::{world_pixel, LatLng, Point};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A point item that can be indexed via an R-tree, positioned in world pixels
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    /// Insertion rank, used to keep results stable
    pub order: usize,
    pub lat_lng: LatLng,
    pub pixel: Point,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: String, order: usize, lat_lng: LatLng, zoom: f64, data: T) -> Self {
        Self {
            id,
            order,
            lat_lng,
            pixel: world_pixel(lat_lng, zoom),
            data,
        }
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SpatialItem<T> {}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.pixel.x, self.pixel.y])
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pixel.x - point[0];
        let dy = self.pixel.y - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over items projected at a single zoom level
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self { rtree: RTree::new() }
    }

    /// Build the index in one pass, faster than repeated inserts
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    /// Items whose pixel position lies inside the square of half-size `extent` around `center`
    pub fn query_extent(&self, center: &Point, extent: f64) -> Vec<&SpatialItem<T>> {
        let envelope = AABB::from_corners(
            [center.x - extent, center.y - extent],
            [center.x + extent, center.y + extent],
        );
        let mut items: Vec<_> = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .collect();
        items.sort_by_key(|item| item.order);
        items
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
