//! Storage abstraction for the three precomputed analytics tables.

use async_trait::async_trait;

use crate::record::AnalyticsTables;

/// Read-only access to the tables written by the upstream pipeline.
///
/// The DuckDB loader implements this; the server's snapshot cache and tests
/// only depend on the trait.
#[async_trait]
pub trait AnalyticsSource: Send + Sync + 'static {
    /// Identifier that changes whenever the upstream pipeline reloads data.
    async fn snapshot_version(&self) -> anyhow::Result<String>;

    async fn load_tables(&self) -> anyhow::Result<AnalyticsTables>;
}
