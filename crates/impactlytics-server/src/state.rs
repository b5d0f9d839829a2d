use std::sync::Arc;

use impactlytics_core::{config::Config, AnalyticsSource, AnalyticsTables};
use impactlytics_duckdb::DuckDbBackend;

use crate::cache::SnapshotCache;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Kept alongside `source` for the health probe.
    pub db: Arc<DuckDbBackend>,

    pub source: Arc<dyn AnalyticsSource>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    pub cache: SnapshotCache,
}

impl AppState {
    /// Construct a new `AppState` reading tables from the given backend.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        let source: Arc<dyn AnalyticsSource> = db.clone();
        Self {
            cache: SnapshotCache::new(config.cache_ttl()),
            db,
            source,
            config: Arc::new(config),
        }
    }

    /// Current analytics tables, served from the snapshot cache.
    pub async fn tables(&self) -> anyhow::Result<Arc<AnalyticsTables>> {
        self.cache.get_or_load(self.source.as_ref()).await
    }
}
