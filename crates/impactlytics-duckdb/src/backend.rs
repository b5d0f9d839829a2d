use std::sync::Arc;

use anyhow::{Context, Result};
use duckdb::{AccessMode, Config, Connection};
use tokio::sync::Mutex;
use tracing::info;

use crate::schema::{settings_sql, TABLES_SQL};

/// Read-only handle on the pipeline's DuckDB file.
///
/// The connection sits behind `Arc<Mutex<_>>` so the struct is cheap to share
/// across Axum handlers while queries run one at a time.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open an existing database file at `path` in read-only mode.
    ///
    /// `search_path` selects the pipeline dataset schema; `memory_limit` is a
    /// DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, search_path: &str, memory_limit: &str) -> Result<Self> {
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)
            .with_context(|| format!("failed to open DuckDB file {path}"))?;
        conn.execute_batch(&settings_sql(memory_limit, Some(search_path)))?;
        info!(path, search_path, memory_limit, "DuckDB opened read-only");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** database with the pipeline tables created empty.
    ///
    /// Intended for tests and fixtures; data is discarded on drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&settings_sql("1GB", None))?;
        conn.execute_batch(TABLES_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    ///
    /// Called by the `/health` endpoint.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to seed fixture rows.
    /// Production code should use the typed loaders.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
