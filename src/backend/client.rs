//! HTTP access to the geocache backend

use crate::{
    core::config::MapConfig,
    data::{MapContext, MapGeocache},
    traits::GeocacheSource,
    MapError, Result,
};
use async_trait::async_trait;
use serde::Deserialize;

/// Zone listings come either bare or wrapped
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeocacheList {
    Bare(Vec<MapGeocache>),
    Wrapped { geocaches: Vec<MapGeocache> },
}

impl GeocacheList {
    fn into_vec(self) -> Vec<MapGeocache> {
        match self {
            GeocacheList::Bare(list) | GeocacheList::Wrapped { geocaches: list } => list,
        }
    }
}

pub struct BackendClient {
    /// Base URL without trailing slash
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .user_agent(concat!("geoapp-map/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .build()?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &MapConfig) -> Result<Self> {
        Self::new(config.backend_base())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint serving the geocaches of `context`, `None` for the general map
    pub fn endpoint(&self, context: &MapContext) -> Option<String> {
        match context {
            MapContext::Zone { id, .. } => {
                Some(format!("{}/api/zones/{}/geocaches", self.base_url, id))
            }
            MapContext::Geocache { id, .. } => {
                Some(format!("{}/api/geocaches/{}", self.base_url, id))
            }
            MapContext::General { .. } => None,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MapError::Backend(format!("{} returned {}: {}", url, status, body.trim())));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl GeocacheSource for BackendClient {
    async fn fetch_geocaches(&self, context: &MapContext) -> Result<Vec<MapGeocache>> {
        let Some(url) = self.endpoint(context) else {
            return Ok(Vec::new());
        };
        let geocaches = match context {
            MapContext::Geocache { .. } => vec![self.get_json::<MapGeocache>(&url).await?],
            _ => self.get_json::<GeocacheList>(&url).await?.into_vec(),
        };
        log::debug!("fetched {} geocache(s) for {}", geocaches.len(), context);
        Ok(geocaches)
    }
}
