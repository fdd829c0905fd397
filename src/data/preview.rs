//! Formula solver preview overlay
//!
//! A formula with unknown letters narrows the final location down to a point,
//! a box or a line of constant latitude/longitude. The solver pushes up to two
//! such candidates plus an optional search circle.

use crate::{
    core::geo::{LatLng, LatLngBounds},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

pub const MAX_PREVIEW_CANDIDATES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl PreviewBounds {
    pub fn validate(&self) -> Result<()> {
        let corners = [
            LatLng::new(self.min_lat, self.min_lon),
            LatLng::new(self.max_lat, self.max_lon),
        ];
        if corners.iter().any(|c| !c.is_valid()) {
            return Err(MapError::InvalidCoordinates(format!("{:?}", self)));
        }
        if self.min_lat > self.max_lat || self.min_lon > self.max_lon {
            return Err(MapError::InvalidCoordinates(format!(
                "inverted bounds {:?}",
                self
            )));
        }
        Ok(())
    }

    pub fn to_lat_lng_bounds(&self) -> LatLngBounds {
        LatLngBounds::from_coords(self.min_lat, self.min_lon, self.max_lat, self.max_lon)
    }
}

/// One candidate location shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PreviewShape {
    Point { latitude: f64, longitude: f64 },
    BoundingBox { bounds: PreviewBounds },
    /// Known latitude, longitude spans the bounds
    LatitudeLine { latitude: f64, bounds: PreviewBounds },
    /// Known longitude, latitude spans the bounds
    LongitudeLine { longitude: f64, bounds: PreviewBounds },
}

impl PreviewShape {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Point {
                latitude,
                longitude,
            } => {
                let point = LatLng::new(*latitude, *longitude);
                if point.is_valid() {
                    Ok(())
                } else {
                    Err(MapError::InvalidCoordinates(format!("{:?}", point)))
                }
            }
            Self::BoundingBox { bounds } => bounds.validate(),
            Self::LatitudeLine { latitude, bounds } => {
                bounds.validate()?;
                if latitude.is_finite() && (-90.0..=90.0).contains(latitude) {
                    Ok(())
                } else {
                    Err(MapError::InvalidCoordinates(format!("latitude {}", latitude)))
                }
            }
            Self::LongitudeLine { longitude, bounds } => {
                bounds.validate()?;
                if longitude.is_finite() && (-180.0..=180.0).contains(longitude) {
                    Ok(())
                } else {
                    Err(MapError::InvalidCoordinates(format!("longitude {}", longitude)))
                }
            }
        }
    }

    /// Vertices of the shape: one for a point, two for a line, a closed ring for a box
    pub fn vertices(&self) -> Vec<LatLng> {
        match self {
            Self::Point {
                latitude,
                longitude,
            } => vec![LatLng::new(*latitude, *longitude)],
            Self::BoundingBox { bounds } => vec![
                LatLng::new(bounds.min_lat, bounds.min_lon),
                LatLng::new(bounds.min_lat, bounds.max_lon),
                LatLng::new(bounds.max_lat, bounds.max_lon),
                LatLng::new(bounds.max_lat, bounds.min_lon),
                LatLng::new(bounds.min_lat, bounds.min_lon),
            ],
            Self::LatitudeLine { latitude, bounds } => vec![
                LatLng::new(*latitude, bounds.min_lon),
                LatLng::new(*latitude, bounds.max_lon),
            ],
            Self::LongitudeLine { longitude, bounds } => vec![
                LatLng::new(bounds.min_lat, *longitude),
                LatLng::new(bounds.max_lat, *longitude),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCircle {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl SearchCircle {
    pub fn center(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOverlay {
    #[serde(default)]
    pub circle: Option<SearchCircle>,
    #[serde(default)]
    pub shapes: Vec<PreviewShape>,
}

impl PreviewOverlay {
    /// An overlay without circle or shapes clears the preview
    pub fn is_empty(&self) -> bool {
        self.circle.is_none() && self.shapes.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.shapes.len() > MAX_PREVIEW_CANDIDATES {
            return Err(MapError::InvalidCoordinates(format!(
                "at most {} preview candidates, got {}",
                MAX_PREVIEW_CANDIDATES,
                self.shapes.len()
            )));
        }
        if let Some(circle) = &self.circle {
            if !circle.center().is_valid() || !(circle.radius_m.is_finite() && circle.radius_m > 0.0)
            {
                return Err(MapError::InvalidCoordinates(format!("{:?}", circle)));
            }
        }
        self.shapes.iter().try_for_each(PreviewShape::validate)
    }
}
