use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use impactlytics_core::build_report;

use super::{resolve_selection, SelectionQuery};
use crate::{error::AppError, state::AppState};

/// `GET /api/report`: comparison tables and charts for one selection.
#[tracing::instrument(skip(state))]
pub async fn report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (tables, request) = resolve_selection(&state, &query).await?;
    let report = build_report(&tables, &request, &state.config.report);
    Ok(Json(json!({ "data": report })))
}
