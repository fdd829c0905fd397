use crate::core::{constants::DEFAULT_TILE_PROVIDER, geo::TileCoord};
use once_cell::sync::Lazy;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// A named raster basemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileProvider {
    pub id: &'static str,
    pub name: &'static str,
    /// Template with `{s}`, `{z}`, `{x}` and `{y}` placeholders
    pub url_template: &'static str,
    pub subdomains: &'static [&'static str],
    pub attribution: &'static str,
    pub max_zoom: u8,
}

impl TileSource for TileProvider {
    fn url(&self, coord: TileCoord) -> String {
        let url = self
            .url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if self.subdomains.is_empty() {
            return url.replace("{s}", "");
        }
        let idx = ((coord.x + coord.y) % self.subdomains.len() as u32) as usize;
        url.replace("{s}", self.subdomains[idx])
    }
}

static PROVIDERS: Lazy<Vec<TileProvider>> = Lazy::new(|| {
    vec![
        TileProvider {
            id: "osm",
            name: "OpenStreetMap",
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            subdomains: &["a", "b", "c"],
            attribution: "© OpenStreetMap contributors",
            max_zoom: 19,
        },
        TileProvider {
            id: "osm-fr",
            name: "OpenStreetMap France",
            url_template: "https://{s}.tile.openstreetmap.fr/osmfr/{z}/{x}/{y}.png",
            subdomains: &["a", "b", "c"],
            attribution: "© OpenStreetMap France | © OpenStreetMap contributors",
            max_zoom: 20,
        },
        TileProvider {
            id: "opentopomap",
            name: "OpenTopoMap",
            url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
            subdomains: &["a", "b", "c"],
            attribution: "© OpenTopoMap (CC-BY-SA) | © OpenStreetMap contributors",
            max_zoom: 17,
        },
        TileProvider {
            id: "cyclosm",
            name: "CyclOSM",
            url_template: "https://{s}.tile-cyclosm.openstreetmap.fr/cyclosm/{z}/{x}/{y}.png",
            subdomains: &["a", "b", "c"],
            attribution: "CyclOSM | © OpenStreetMap contributors",
            max_zoom: 20,
        },
        TileProvider {
            id: "esri-satellite",
            name: "Esri World Imagery",
            url_template:
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            subdomains: &[],
            attribution: "Tiles © Esri",
            max_zoom: 19,
        },
    ]
});

/// Registry of the basemaps a map can switch between
pub struct TileProviders;

impl TileProviders {
    pub fn all() -> &'static [TileProvider] {
        &PROVIDERS
    }

    pub fn get(id: &str) -> Option<&'static TileProvider> {
        PROVIDERS.iter().find(|provider| provider.id == id)
    }

    pub fn default_provider() -> &'static TileProvider {
        // The registry is static and always holds the default id
        Self::get(DEFAULT_TILE_PROVIDER).unwrap_or(&PROVIDERS[0])
    }

    /// Look up `id`, falling back to the default provider
    pub fn resolve(id: &str) -> &'static TileProvider {
        Self::get(id).unwrap_or_else(|| {
            log::debug!(
                "unknown tile provider '{}', using '{}'",
                id,
                DEFAULT_TILE_PROVIDER
            );
            Self::default_provider()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        assert_eq!(TileProviders::resolve("opentopomap").id, "opentopomap");
        assert_eq!(TileProviders::resolve("nope").id, "osm");
        assert_eq!(TileProviders::all().len(), 5);
    }

    #[test]
    fn test_url_expansion() {
        let osm = TileProviders::resolve("osm");
        assert_eq!(
            osm.url(TileCoord::new(518, 352, 10)),
            "https://a.tile.openstreetmap.org/10/518/352.png"
        );

        let esri = TileProviders::resolve("esri-satellite");
        assert_eq!(
            esri.url(TileCoord::new(1, 2, 3)),
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/3/2/1"
        );
    }
}
