//! Configuration for the map layer
//!
//! Values are resolved in three passes: built-in defaults, an optional TOML
//! file, then `GEOAPP_*` environment variables. Clustering behaviour can be
//! picked from presets or given explicitly.

use crate::{
    core::constants::{
        DEFAULT_BACKEND_URL, DEFAULT_CLUSTER_DISTANCE_PX, DEFAULT_DISABLE_CLUSTERING_AT_ZOOM,
        DEFAULT_READY_TIMEOUT_MS, DEFAULT_TILE_PROVIDER,
    },
    spatial::clustering::ClusteringConfig,
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

pub const ENV_BACKEND_URL: &str = "GEOAPP_BACKEND_URL";
pub const ENV_TILE_PROVIDER: &str = "GEOAPP_TILE_PROVIDER";
pub const ENV_READY_TIMEOUT_MS: &str = "GEOAPP_READY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringProfile {
    Balanced,
    Dense,
    Sparse,
    Custom(ClusteringConfig),
}

impl ClusteringProfile {
    pub fn resolve(&self) -> ClusteringConfig {
        match self {
            Self::Balanced => ClusteringConfig {
                distance_px: DEFAULT_CLUSTER_DISTANCE_PX,
                min_distance_px: 0.0,
                adaptive: true,
                disable_at_zoom: DEFAULT_DISABLE_CLUSTERING_AT_ZOOM,
            },
            // Many caches in a small area: group aggressively and keep grouping longer
            Self::Dense => ClusteringConfig {
                distance_px: 60.0,
                min_distance_px: 10.0,
                adaptive: true,
                disable_at_zoom: 18.0,
            },
            Self::Sparse => ClusteringConfig {
                distance_px: 25.0,
                min_distance_px: 0.0,
                adaptive: false,
                disable_at_zoom: 14.0,
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for ClusteringProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Base URL of the geocache backend
    pub backend_url: String,
    /// Basemap selected when a map opens
    pub default_tile_provider: String,
    /// Upper bound for a widget to become attached before data delivery fails
    pub ready_timeout_ms: u64,
    /// Whether new maps start with clustering on
    pub clustering_enabled: bool,
    pub clustering: ClusteringConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            default_tile_provider: DEFAULT_TILE_PROVIDER.to_string(),
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
            clustering_enabled: false,
            clustering: ClusteringProfile::default().resolve(),
        }
    }
}

impl MapConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MapConfig =
            toml::from_str(content).map_err(|e| MapError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Apply `GEOAPP_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, used for the environment
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            log::debug!("backend url overridden from environment: {}", url);
            self.backend_url = url;
        }
        if let Some(provider) = lookup(ENV_TILE_PROVIDER) {
            self.default_tile_provider = provider;
        }
        if let Some(timeout) = lookup(ENV_READY_TIMEOUT_MS) {
            self.ready_timeout_ms = timeout.trim().parse().map_err(|_| {
                MapError::Config(format!("{} must be an integer, got {:?}", ENV_READY_TIMEOUT_MS, timeout))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_clustering_profile(mut self, profile: ClusteringProfile) -> Self {
        self.clustering = profile.resolve();
        self
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(MapError::Config(format!(
                "backend_url must be an http(s) URL, got {:?}",
                self.backend_url
            )));
        }
        if self.ready_timeout_ms == 0 {
            return Err(MapError::Config("ready_timeout_ms must be positive".to_string()));
        }
        if !(self.clustering.distance_px > 0.0) || self.clustering.min_distance_px < 0.0 {
            return Err(MapError::Config(
                "clustering distances must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Backend URL without a trailing slash
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }
}
