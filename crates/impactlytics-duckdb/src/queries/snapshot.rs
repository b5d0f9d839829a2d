use anyhow::Result;

use crate::DuckDbBackend;

/// Version reported when the database has no pipeline load history.
pub const STATIC_VERSION: &str = "static";

/// Latest pipeline load id, read from the `_dlt_loads` bookkeeping table.
///
/// Databases without that table (fixtures, hand-built files) never change
/// version, so cached snapshots only expire through their TTL.
pub async fn snapshot_version_inner(db: &DuckDbBackend) -> Result<String> {
    let conn = db.conn.lock().await;
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = '_dlt_loads'",
    )?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    if count == 0 {
        return Ok(STATIC_VERSION.to_string());
    }

    let mut stmt =
        conn.prepare("SELECT COALESCE(CAST(MAX(load_id) AS VARCHAR), '') FROM _dlt_loads")?;
    let version: String = stmt.query_row([], |row| row.get(0))?;
    if version.is_empty() {
        return Ok(STATIC_VERSION.to_string());
    }
    Ok(version)
}
