use async_trait::async_trait;

use impactlytics_core::record::AnalyticsTables;
use impactlytics_core::source::AnalyticsSource;

use crate::DuckDbBackend;

#[async_trait]
impl AnalyticsSource for DuckDbBackend {
    async fn snapshot_version(&self) -> anyhow::Result<String> {
        crate::queries::snapshot::snapshot_version_inner(self).await
    }

    async fn load_tables(&self) -> anyhow::Result<AnalyticsTables> {
        crate::queries::tables::load_tables_inner(self).await
    }
}
