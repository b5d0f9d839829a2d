use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use impactlytics_core::{AnalyticsSource, AnalyticsTables};

struct CachedSnapshot {
    version: String,
    tables: Arc<AnalyticsTables>,
    loaded_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub version: String,
    pub age_secs: u64,
    pub rows: usize,
}

/// The three analytics tables, cached per source snapshot version.
///
/// An entry is served while the source still reports the same version and
/// the entry is younger than `ttl`. Loads are serialized through `load_lock`
/// so concurrent misses trigger a single read of the source.
pub struct SnapshotCache {
    ttl: Duration,
    current: RwLock<Option<CachedSnapshot>>,
    load_lock: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    async fn fresh(&self, version: &str) -> Option<Arc<AnalyticsTables>> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|c| c.version == version && c.loaded_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.tables))
    }

    /// Return the cached tables, reloading them from `source` when the
    /// snapshot version changed or the entry expired.
    ///
    /// A failed load leaves the previous entry untouched.
    pub async fn get_or_load(
        &self,
        source: &dyn AnalyticsSource,
    ) -> anyhow::Result<Arc<AnalyticsTables>> {
        let version = source.snapshot_version().await?;
        if let Some(tables) = self.fresh(&version).await {
            debug!(version = %version, "Snapshot cache hit");
            return Ok(tables);
        }

        let _guard = self.load_lock.lock().await;
        if let Some(tables) = self.fresh(&version).await {
            return Ok(tables);
        }

        let tables = Arc::new(source.load_tables().await?);
        info!(
            version = %version,
            rows = tables.row_count(),
            "Analytics snapshot loaded"
        );
        *self.current.write().await = Some(CachedSnapshot {
            version,
            tables: Arc::clone(&tables),
            loaded_at: Instant::now(),
        });
        Ok(tables)
    }

    /// Drop the cached entry. Returns whether one was present.
    pub async fn invalidate(&self) -> bool {
        let dropped = self.current.write().await.take().is_some();
        info!(dropped, "Snapshot cache invalidated");
        dropped
    }

    pub async fn status(&self) -> Option<CacheStatus> {
        let current = self.current.read().await;
        current.as_ref().map(|c| CacheStatus {
            version: c.version.clone(),
            age_secs: c.loaded_at.elapsed().as_secs(),
            rows: c.tables.row_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use impactlytics_core::record::SessionRecord;

    struct FakeSource {
        version: StdMutex<String>,
        loads: AtomicUsize,
        fail: AtomicBool,
    }

    impl FakeSource {
        fn new(version: &str) -> Self {
            Self {
                version: StdMutex::new(version.to_string()),
                loads: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn set_version(&self, version: &str) {
            *self.version.lock().expect("version lock") = version.to_string();
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalyticsSource for FakeSource {
        async fn snapshot_version(&self) -> anyhow::Result<String> {
            Ok(self.version.lock().expect("version lock").clone())
        }

        async fn load_tables(&self) -> anyhow::Result<AnalyticsTables> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("source unavailable");
            }
            Ok(AnalyticsTables {
                session_starts: vec![SessionRecord {
                    date: NaiveDate::from_ymd_opt(2023, 3, 9).expect("date"),
                    landing_page: "/a/".to_string(),
                    sessions: 1,
                }],
                page_views: vec![],
                channels: vec![],
            })
        }
    }

    #[tokio::test]
    async fn same_version_within_ttl_loads_once() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let source = FakeSource::new("v1");
        let first = cache.get_or_load(&source).await.expect("load");
        let second = cache.get_or_load(&source).await.expect("hit");
        assert_eq!(source.loads(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn version_change_reloads() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let source = FakeSource::new("v1");
        cache.get_or_load(&source).await.expect("load");
        source.set_version("v2");
        cache.get_or_load(&source).await.expect("reload");
        assert_eq!(source.loads(), 2);
        assert_eq!(cache.status().await.map(|s| s.version), Some("v2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_reloads() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let source = FakeSource::new("v1");
        cache.get_or_load(&source).await.expect("load");
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.get_or_load(&source).await.expect("reload");
        assert_eq!(source.loads(), 2);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_entry() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let source = FakeSource::new("v1");
        cache.get_or_load(&source).await.expect("load");
        source.set_version("v2");
        source.fail.store(true, Ordering::SeqCst);
        assert!(cache.get_or_load(&source).await.is_err());
        assert_eq!(cache.status().await.map(|s| s.version), Some("v1".to_string()));
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let source = FakeSource::new("v1");
        assert!(!cache.invalidate().await);
        cache.get_or_load(&source).await.expect("load");
        assert!(cache.invalidate().await);
        assert!(cache.status().await.is_none());
        cache.get_or_load(&source).await.expect("reload");
        assert_eq!(source.loads(), 2);
    }
}
