use anyhow::{Context, Result};
use duckdb::Connection;
use tracing::debug;

use impactlytics_core::record::{
    parse_record_date, AnalyticsTables, ChannelRecord, PageViewRecord, SessionRecord, NOT_SET,
};

use crate::DuckDbBackend;

// Dates are read as text because the pipeline may store DATE, TIMESTAMP or
// TIMESTAMPTZ; `parse_record_date` reduces all of them to a calendar date.

const SESSION_START_SQL: &str = r#"
    SELECT
        CAST("date" AS VARCHAR),
        COALESCE(CAST(landing_page_plus_query_string AS VARCHAR), ?1),
        CAST(COALESCE(sessions_integer, 0) AS BIGINT)
    FROM session_start
    WHERE "date" IS NOT NULL
    ORDER BY "date"
"#;

const VIEWS_SQL: &str = r#"
    SELECT
        CAST("date" AS VARCHAR),
        COALESCE(CAST(page_path AS VARCHAR), ?1),
        CAST(COALESCE(screen_page_views_integer, 0) AS BIGINT),
        CAST(COALESCE(engaged_sessions_integer, 0) AS BIGINT)
    FROM views_and_bounce_rate
    WHERE "date" IS NOT NULL
    ORDER BY "date"
"#;

const CHANNELS_SQL: &str = r#"
    SELECT
        CAST("date" AS VARCHAR),
        COALESCE(CAST(session_default_channel_group AS VARCHAR), ?1),
        CAST(COALESCE(active_users_integer, 0) AS BIGINT)
    FROM channel_split
    WHERE "date" IS NOT NULL
    ORDER BY "date"
"#;

fn load_session_starts(conn: &Connection) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(SESSION_START_SQL)?;
    let rows = stmt.query_map(duckdb::params![NOT_SET], |row| {
        let date: String = row.get(0)?;
        let landing_page: String = row.get(1)?;
        let sessions: i64 = row.get(2)?;
        Ok((date, landing_page, sessions))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (date, landing_page, sessions) = row?;
        records.push(SessionRecord {
            date: parse_record_date(&date)?,
            landing_page,
            sessions,
        });
    }
    Ok(records)
}

fn load_page_views(conn: &Connection) -> Result<Vec<PageViewRecord>> {
    let mut stmt = conn.prepare(VIEWS_SQL)?;
    let rows = stmt.query_map(duckdb::params![NOT_SET], |row| {
        let date: String = row.get(0)?;
        let page_path: String = row.get(1)?;
        let page_views: i64 = row.get(2)?;
        let engaged_sessions: i64 = row.get(3)?;
        Ok((date, page_path, page_views, engaged_sessions))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (date, page_path, page_views, engaged_sessions) = row?;
        records.push(PageViewRecord {
            date: parse_record_date(&date)?,
            page_path,
            page_views,
            engaged_sessions,
        });
    }
    Ok(records)
}

fn load_channels(conn: &Connection) -> Result<Vec<ChannelRecord>> {
    let mut stmt = conn.prepare(CHANNELS_SQL)?;
    let rows = stmt.query_map(duckdb::params![NOT_SET], |row| {
        let date: String = row.get(0)?;
        let channel_group: String = row.get(1)?;
        let active_users: i64 = row.get(2)?;
        Ok((date, channel_group, active_users))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (date, channel_group, active_users) = row?;
        records.push(ChannelRecord {
            date: parse_record_date(&date)?,
            channel_group,
            active_users,
        });
    }
    Ok(records)
}

/// Read all three tables under a single lock so they form one snapshot.
pub async fn load_tables_inner(db: &DuckDbBackend) -> Result<AnalyticsTables> {
    let conn = db.conn.lock().await;
    let tables = AnalyticsTables {
        session_starts: load_session_starts(&conn).context("loading session_start")?,
        page_views: load_page_views(&conn).context("loading views_and_bounce_rate")?,
        channels: load_channels(&conn).context("loading channel_split")?,
    };
    debug!(
        session_starts = tables.session_starts.len(),
        page_views = tables.page_views.len(),
        channels = tables.channels.len(),
        "Loaded analytics tables"
    );
    Ok(tables)
}
