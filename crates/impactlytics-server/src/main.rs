use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use impactlytics_server::state::AppState;

/// `impactlytics health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$IMPACTLYTICS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("IMPACTLYTICS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("impactlytics=info".parse()?),
        )
        .json()
        .init();

    let cfg = impactlytics_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let db = impactlytics_duckdb::DuckDbBackend::open(
        &cfg.db_path,
        &cfg.search_path,
        &cfg.duckdb_memory_limit,
    )?;

    let state = Arc::new(AppState::new(db, cfg.clone()));

    // Warm the snapshot cache; the first request retries on failure.
    match state.tables().await {
        Ok(tables) => info!(rows = tables.row_count(), "Snapshot cache warmed"),
        Err(e) => tracing::warn!(error = %e, "Initial snapshot load failed"),
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = impactlytics_server::app::build_app(Arc::clone(&state));

    info!(
        port = cfg.port,
        min_release_date = %cfg.min_release_date,
        timezone = %cfg.timezone,
        "Impactlytics listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
