use anyhow::{anyhow, bail};
use clap::Parser;
use geoapp_map::MapContext;
use std::path::PathBuf;

/// Replay geocache data and plugin events through a headless map
#[derive(Parser, Debug)]
#[command(name = "geoapp-map-app")]
#[command(about = "Headless driver for the geoapp map layer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Map to open: zone:<id>, geocache:<id> or general
    #[arg(long, default_value = "general", value_parser = parse_context)]
    pub context: MapContext,

    /// JSON file holding an array of geocaches
    #[arg(long, conflicts_with = "backend")]
    pub geocaches: Option<PathBuf>,

    /// Fetch geocaches from the configured backend instead of a file
    #[arg(long)]
    pub backend: bool,

    /// JSON file holding an array of {"name", "detail"} plugin events
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Basemap to switch to after loading
    #[arg(long)]
    pub tile_provider: Option<String>,

    /// Geocache feature id to click after loading
    #[arg(long)]
    pub select: Option<String>,

    /// Draw exclusion zones and report conflicts
    #[arg(long)]
    pub zones: bool,

    /// Zoom level used for the cluster report
    #[arg(long, default_value_t = 12.0)]
    pub zoom: f64,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse_context(value: &str) -> anyhow::Result<MapContext> {
    if value == "general" {
        return Ok(MapContext::general());
    }
    let (kind, id) = value
        .split_once(':')
        .ok_or_else(|| anyhow!("expected zone:<id>, geocache:<id> or general, got '{}'", value))?;
    let id: i64 = id
        .parse()
        .map_err(|_| anyhow!("'{}' is not a numeric id", id))?;
    match kind {
        "zone" => Ok(MapContext::zone(id, &format!("Zone {}", id))),
        "geocache" => Ok(MapContext::geocache(id, &format!("Geocache {}", id))),
        other => bail!("unknown map context '{}'", other),
    }
}
