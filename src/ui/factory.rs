use crate::{
    core::config::MapConfig,
    data::{MapContext, MapGeocache},
    prelude::HashMap,
    service::MapService,
    traits::{GeocacheSource, Notifier, RenderPortFactory},
    ui::widget::{LoadOutcome, MapWidget, Registry, WidgetState},
    Result,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Creates map widgets and keeps at most one live widget per context
pub struct MapWidgetFactory {
    service: Arc<MapService>,
    ports: Arc<dyn RenderPortFactory>,
    notifier: Arc<dyn Notifier>,
    config: MapConfig,
    widgets: Arc<Registry>,
}

impl MapWidgetFactory {
    pub fn new(
        service: Arc<MapService>,
        ports: Arc<dyn RenderPortFactory>,
        notifier: Arc<dyn Notifier>,
        config: MapConfig,
    ) -> Self {
        Self {
            service,
            ports,
            notifier,
            config,
            widgets: Arc::new(Mutex::new(HashMap::default())),
        }
    }

    fn widgets(&self) -> MutexGuard<'_, HashMap<String, Arc<MapWidget>>> {
        self.widgets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn service(&self) -> &Arc<MapService> {
        &self.service
    }

    /// The live widget for `context`, created on first use
    pub fn open(&self, context: &MapContext) -> Arc<MapWidget> {
        let instance_id = context.instance_id();
        let mut widgets = self.widgets();
        if let Some(widget) = widgets.get(&instance_id) {
            if widget.state() != WidgetState::Disposed {
                log::debug!("{}: reusing open widget", instance_id);
                return widget.clone();
            }
        }

        log::debug!("{}: creating widget", instance_id);
        let widget = Arc::new(MapWidget::new(
            context.clone(),
            self.service.clone(),
            self.ports.create(&instance_id),
            self.notifier.clone(),
            &self.config,
            Arc::downgrade(&self.widgets),
        ));
        widgets.insert(instance_id, widget.clone());
        widget
    }

    pub fn get(&self, instance_id: &str) -> Option<Arc<MapWidget>> {
        self.widgets().get(instance_id).cloned()
    }

    pub fn open_count(&self) -> usize {
        self.widgets().len()
    }

    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.widgets().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Open the widget for `context`, wait for the host to attach it, then load
    pub async fn deliver(&self, context: &MapContext, geocaches: Vec<MapGeocache>) -> Result<usize> {
        let widget = self.open(context);
        widget.wait_ready().await?;
        widget.load(geocaches)
    }

    /// Reload every open widget from `source` concurrently
    pub async fn refresh_all(&self, source: &dyn GeocacheSource) -> Vec<(String, LoadOutcome)> {
        let widgets: Vec<Arc<MapWidget>> = self.widgets().values().cloned().collect();
        let outcomes = futures::future::join_all(
            widgets.iter().map(|widget| widget.load_from_source(source)),
        )
        .await;
        widgets
            .iter()
            .map(|widget| widget.instance_id().to_string())
            .zip(outcomes)
            .collect()
    }

    /// Dispose every open widget
    pub fn dispose_all(&self) {
        let widgets: Vec<Arc<MapWidget>> = self.widgets().values().cloned().collect();
        for widget in widgets {
            if let Err(e) = widget.dispose() {
                log::debug!("{}", e);
            }
        }
        self.widgets().clear();
    }
}
