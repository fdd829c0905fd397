mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use geoapp_map::{
    layers::find_conflicts,
    prelude::*,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RecordedEvent {
    name: String,
    #[serde(default)]
    detail: serde_json::Value,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MapConfig> {
    let config = match path {
        Some(path) => MapConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MapConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    geoapp_map::init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let service = Arc::new(MapService::new(&config));
    let ports = Arc::new(HeadlessPortFactory::new());
    let factory = MapWidgetFactory::new(
        service.clone(),
        ports.clone(),
        Arc::new(LogNotifier),
        config.clone(),
    );

    let widget = factory.open(&cli.context);
    // Stand-in for the host laying out the view
    let host = {
        let widget = widget.clone();
        tokio::spawn(async move { widget.attach() })
    };

    let geocaches: Vec<MapGeocache> = if cli.backend {
        let client = BackendClient::from_config(&config)?;
        widget.wait_ready().await?;
        match widget.load_from_source(&client).await {
            LoadOutcome::Loaded(count) => log::info!("loaded {} geocache(s) from backend", count),
            LoadOutcome::Stale => log::warn!("backend response superseded"),
            LoadOutcome::Failed(reason) => anyhow::bail!("backend load failed: {}", reason),
        }
        service.loaded_geocaches().as_ref().clone()
    } else {
        let geocaches: Vec<MapGeocache> = match &cli.geocaches {
            Some(path) => read_json(path)?,
            None => Vec::new(),
        };
        factory.deliver(&cli.context, geocaches.clone()).await?;
        geocaches
    };
    host.await??;

    if let Some(provider) = &cli.tile_provider {
        service.change_tile_provider(provider);
    }
    if let Some(feature_id) = &cli.select {
        if widget.handle_feature_click(feature_id).is_none() {
            log::warn!("no geocache behind feature '{}'", feature_id);
        }
    }

    let conflicts = if cli.zones {
        widget.with_layers(|layers| layers.show_exclusion_zones(&geocaches));
        find_conflicts(&geocaches)
    } else {
        Vec::new()
    };

    let bridge = ExternalEventBridge::new(service.clone());
    if let Some(path) = &cli.events {
        let events: Vec<RecordedEvent> = read_json(path)?;
        let sender = bridge.sender();
        for event in events {
            sender.dispatch(&event.name, event.detail);
        }
    }
    let stats = bridge.pump();

    let port = ports
        .port(widget.instance_id())
        .context("render port missing for the open widget")?;
    let layers: serde_json::Map<String, serde_json::Value> = LayerKind::ALL
        .iter()
        .map(|kind| (kind.to_string(), port.feature_count(*kind).into()))
        .collect();
    let clusters = widget.with_layers(|layers| {
        layers.set_zoom(cli.zoom);
        layers.set_clustering_enabled(true);
        layers.clusters(cli.zoom)
    });
    let summary = serde_json::json!({
        "map": widget.instance_id(),
        "title": widget.title(),
        "layers": layers,
        "basemap": port.basemap(),
        "selected": service.selected_geocache().map(|g| g.gc_code),
        "highlights": service.highlighted_coordinates().len(),
        "events": {"applied": stats.applied, "dropped": stats.dropped},
        "clusters": clusters.iter().filter(|c| !c.is_single()).count(),
        "conflicts": conflicts
            .iter()
            .map(|c| serde_json::json!({"first": c.first, "second": c.second, "distanceM": c.distance_m}))
            .collect::<Vec<_>>(),
    });

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} ({})", widget.title(), widget.instance_id());
        for (layer, count) in &layers {
            println!("  {:<22} {}", layer, count);
        }
        println!("  basemap                {}", port.basemap().unwrap_or_default());
        println!(
            "  selected               {}",
            service
                .selected_geocache()
                .map(|g| g.gc_code)
                .unwrap_or_else(|| "-".to_string())
        );
        println!("  events applied/dropped {}/{}", stats.applied, stats.dropped);
        println!("  clusters at z{}        {}", cli.zoom, summary["clusters"]);
        for conflict in &conflicts {
            println!(
                "  conflict {} <-> {} at {:.0} m",
                conflict.first, conflict.second, conflict.distance_m
            );
        }
    }

    factory.dispose_all();
    Ok(())
}
