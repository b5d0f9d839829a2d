/// Session settings applied at open time.
///
/// The database file belongs to the upstream Google Analytics pipeline, so
/// nothing here creates or alters tables. `search_path` points at the
/// pipeline's dataset schema so the three tables resolve unqualified.
///
/// Always set an explicit memory limit: the DuckDB default (80% of system
/// RAM) is not acceptable for a server process.
pub fn settings_sql(memory_limit: &str, search_path: Option<&str>) -> String {
    let mut sql = format!(
        "SET memory_limit = '{}';\nSET threads = 2;\n",
        escape_literal(memory_limit)
    );
    if let Some(path) = search_path {
        sql.push_str(&format!("SET search_path = '{}';\n", escape_literal(path)));
    }
    sql
}

/// Double single quotes so a config value cannot terminate the SQL literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Table layout produced by the pipeline, for in-memory databases and fixtures.
///
/// Column names follow the pipeline's `<metric>_integer` convention. The
/// views table also carries `sessions_integer`, which the report ignores.
pub const TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS session_start (
    "date"                          DATE,
    landing_page_plus_query_string  VARCHAR,
    sessions_integer                BIGINT
);

CREATE TABLE IF NOT EXISTS views_and_bounce_rate (
    "date"                          DATE,
    page_path                       VARCHAR,
    screen_page_views_integer       BIGINT,
    engaged_sessions_integer        BIGINT,
    sessions_integer                BIGINT
);

CREATE TABLE IF NOT EXISTS channel_split (
    "date"                          DATE,
    session_default_channel_group   VARCHAR,
    active_users_integer            BIGINT
);
"#;
