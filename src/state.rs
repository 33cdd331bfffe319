use std::sync::Arc;

use crate::config::Config;
use crate::observability::metrics::Metrics;
use crate::store::EntityStore;
use crate::tracking::hub::TrackingHub;

pub struct AppState {
    pub store: Arc<EntityStore>,
    pub hub: TrackingHub,
    pub config: Config,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(EntityStore::new());
        let metrics = Metrics::new();
        let hub = TrackingHub::new(
            store.clone(),
            config.subscriber_buffer_size,
            config.location_history_limit,
            metrics.clone(),
        );

        Self {
            store,
            hub,
            config,
            metrics,
        }
    }
}
