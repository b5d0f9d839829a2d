use chrono::NaiveDate;

use impactlytics_core::record::NOT_SET;
use impactlytics_core::source::AnalyticsSource;
use impactlytics_duckdb::queries::snapshot::STATIC_VERSION;
use impactlytics_duckdb::DuckDbBackend;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

async fn seed_fixture(db: &DuckDbBackend) {
    let conn = db.conn_for_test().await;
    conn.execute_batch(
        r#"
        INSERT INTO session_start VALUES
            ('2023-03-08', '/blog', 12),
            ('2023-03-09', NULL, 3),
            ('2023-03-10', '/blog/', NULL);

        INSERT INTO views_and_bounce_rate VALUES
            ('2023-03-09', '/blog/', 40, 10, 20),
            ('2023-03-01', '/about', 5, NULL, 2);

        INSERT INTO channel_split VALUES
            ('2023-03-09', 'Organic Search', 17),
            ('2023-03-09', NULL, 1);
        "#,
    )
    .expect("seed fixture");
}

#[tokio::test]
async fn load_tables_reads_all_three_tables() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    seed_fixture(&db).await;

    let tables = db.load_tables().await.expect("load");
    assert_eq!(tables.session_starts.len(), 3);
    assert_eq!(tables.page_views.len(), 2);
    assert_eq!(tables.channels.len(), 2);
    assert_eq!(tables.row_count(), 7);

    let first = &tables.session_starts[0];
    assert_eq!(first.date, date(2023, 3, 8));
    assert_eq!(first.landing_page, "/blog");
    assert_eq!(first.sessions, 12);

    // Rows come back ordered by date.
    assert_eq!(tables.page_views[0].page_path, "/about");
    assert_eq!(tables.page_views[1].page_views, 40);
    assert_eq!(tables.page_views[1].engaged_sessions, 10);
}

#[tokio::test]
async fn nulls_become_not_set_keys_and_zero_counts() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    seed_fixture(&db).await;

    let tables = db.load_tables().await.expect("load");
    assert!(tables
        .session_starts
        .iter()
        .any(|r| r.landing_page == NOT_SET && r.sessions == 3));
    assert!(tables
        .session_starts
        .iter()
        .any(|r| r.date == date(2023, 3, 10) && r.sessions == 0));
    assert_eq!(tables.page_views[0].engaged_sessions, 0);
    assert!(tables.channels.iter().any(|r| r.channel_group == NOT_SET));
}

#[tokio::test]
async fn timestamp_columns_are_reduced_to_dates() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    {
        let conn = db.conn_for_test().await;
        conn.execute_batch(
            r#"
            DROP TABLE channel_split;
            CREATE TABLE channel_split (
                "date" TIMESTAMP,
                session_default_channel_group VARCHAR,
                active_users_integer BIGINT
            );
            INSERT INTO channel_split VALUES ('2023-03-09 17:45:00', 'Direct', 4);
            "#,
        )
        .expect("timestamp table");
    }

    let tables = db.load_tables().await.expect("load");
    assert_eq!(tables.channels.len(), 1);
    assert_eq!(tables.channels[0].date, date(2023, 3, 9));
}

#[tokio::test]
async fn empty_database_loads_empty_tables() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    let tables = db.load_tables().await.expect("load");
    assert_eq!(tables.row_count(), 0);
}

#[tokio::test]
async fn missing_table_is_an_error() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    {
        let conn = db.conn_for_test().await;
        conn.execute_batch("DROP TABLE session_start;")
            .expect("drop table");
    }
    assert!(db.load_tables().await.is_err());
}

#[tokio::test]
async fn snapshot_version_tracks_pipeline_loads() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    assert_eq!(db.snapshot_version().await.expect("version"), STATIC_VERSION);

    {
        let conn = db.conn_for_test().await;
        conn.execute_batch(
            "CREATE TABLE _dlt_loads (load_id VARCHAR, schema_name VARCHAR, status BIGINT);",
        )
        .expect("create loads table");
    }
    assert_eq!(db.snapshot_version().await.expect("version"), STATIC_VERSION);

    {
        let conn = db.conn_for_test().await;
        conn.execute(
            "INSERT INTO _dlt_loads VALUES (?1, 'google_analytics', 0)",
            impactlytics_duckdb::duckdb::params!["1700000000.123"],
        )
        .expect("insert load");
    }
    assert_eq!(
        db.snapshot_version().await.expect("version"),
        "1700000000.123"
    );
}

#[tokio::test]
async fn ping_succeeds_on_open_database() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.ping().await.expect("ping");
}
