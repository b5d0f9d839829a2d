use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use impactlytics_core::{metric::VALID_METRICS, report::page_options, Metric};

use super::{parse_release_date, SelectionQuery};
use crate::{error::AppError, state::AppState};

/// `GET /api/options`: choices for the selector controls.
///
/// The page list depends on the selected release date and metric, so it is
/// recomputed for each pair. `page` in the query is ignored here.
#[tracing::instrument(skip(state))]
pub async fn options(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let config = &state.config;
    let release_date = parse_release_date(query.release_date.as_deref(), config)?;
    let metric = Metric::parse(query.metric.as_deref())?;

    let tables = state.tables().await?;
    let pages = page_options(&tables, release_date, metric, &config.report);

    Ok(Json(json!({
        "data": {
            "metrics": VALID_METRICS,
            "release_date": {
                "min": config.min_release_date,
                "max": config.max_release_date(),
                "default": config.default_release_date,
            },
            "selected": {
                "release_date": release_date,
                "metric": metric,
            },
            "pages": pages,
        }
    })))
}
